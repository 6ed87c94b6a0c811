//! Decoded source caching with fingerprint-based invalidation.
//!
//! # Caching Strategy
//!
//! ```text
//! GLOBAL_SOURCE_CACHE (shared across all builds in the process)
//! └── FxHashMap<PathBuf, SlotCell<Arc<str>>>
//!     └── SlotCell ── fingerprint of the raw bytes decides whether
//!                     the decoded text can be reused
//! ```
//!
//! A stylesheet imported by many entries of a batch is decoded once. Files
//! are still re-read on every build, so edits are always picked up.

use std::hash::{Hash, Hasher};
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHasher};

use super::access::{current_generation, record_file_access};
use super::read::{decode_utf8, read_with_global_virtual};
use crate::diagnostic::FileResult;

// =============================================================================
// Global Source Cache
// =============================================================================

/// Global shared source cache - reused across all builds.
pub static GLOBAL_SOURCE_CACHE: LazyLock<Mutex<FxHashMap<PathBuf, SlotCell<Arc<str>>>>> =
    LazyLock::new(|| Mutex::new(FxHashMap::default()));

/// Clear the global source cache.
pub fn clear_source_cache() {
    GLOBAL_SOURCE_CACHE.lock().clear();
}

/// Read a stylesheet as text through the global VFS and source cache.
///
/// A UTF-8 BOM is stripped. The access is recorded for dependency tracking.
pub fn read_source(path: &Path) -> FileResult<Arc<str>> {
    let mut cache = GLOBAL_SOURCE_CACHE.lock();
    let slot = cache.entry(path.to_path_buf()).or_default();
    record_file_access(path);
    slot.get_or_init(
        || read_with_global_virtual(path),
        |data| decode_utf8(&data, path).map(Arc::from),
    )
}

// =============================================================================
// SlotCell
// =============================================================================

/// One cached, decoded file.
///
/// A cell remembers the fingerprint of the bytes it decoded and the build
/// generation that last touched it. The first read in a generation reloads
/// the bytes and decodes them again only if the fingerprint moved. Later
/// reads in the same generation skip the load entirely.
pub struct SlotCell<T> {
    data: Option<FileResult<T>>,
    fingerprint: u64,
    seen_in: u64,
}

impl<T: Clone> Default for SlotCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> SlotCell<T> {
    /// An empty cell; the first [`get_or_init`](Self::get_or_init) loads.
    pub const fn new() -> Self {
        Self { data: None, fingerprint: 0, seen_in: 0 }
    }

    /// Return the decoded value, loading and decoding only when needed.
    ///
    /// `load` fetches the raw bytes, `process` turns them into `T`. Errors
    /// from either are cached like values.
    pub fn get_or_init(
        &mut self,
        load: impl FnOnce() -> FileResult<Vec<u8>>,
        process: impl FnOnce(Vec<u8>) -> FileResult<T>,
    ) -> FileResult<T> {
        // Generation 0: no session, never trust the previous visit.
        let generation = current_generation();
        let seen = generation != 0 && self.seen_in == generation;
        self.seen_in = generation;

        if seen && let Some(data) = &self.data {
            return data.clone();
        }

        let loaded = load();
        let fingerprint = fingerprint(&loaded);
        let unchanged = mem::replace(&mut self.fingerprint, fingerprint) == fingerprint;

        match &self.data {
            Some(data) if unchanged => data.clone(),
            _ => {
                let value = loaded.and_then(process);
                self.data = Some(value.clone());
                value
            }
        }
    }
}

fn fingerprint(result: &FileResult<Vec<u8>>) -> u64 {
    let mut hasher = FxHasher::default();
    match result {
        Ok(bytes) => {
            0u8.hash(&mut hasher);
            bytes.hash(&mut hasher);
        }
        Err(err) => {
            1u8.hash(&mut hasher);
            err.to_string().hash(&mut hasher);
        }
    }
    hasher.finish()
}

// =============================================================================
// Tests
// =============================================================================
