//! Thread-local file access tracking.
//!
//! Tracks which files are read during a build so the driver can report
//! each output's dependencies.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashSet;

// =============================================================================
// Generation Counter
// =============================================================================

/// Global generation counter for cache invalidation.
///
/// Instead of iterating through all cache slots to reset access flags (O(n)),
/// we increment this counter (O(1)). Each slot compares its last-access
/// generation against the current generation to determine if it was accessed
/// in the current build.
static GENERATION: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Thread-local set of files read during the current build.
    static ACCESSED_FILES: RefCell<FxHashSet<PathBuf>> = RefCell::new(FxHashSet::default());

    /// Thread-local generation snapshot for the current build.
    static CURRENT_GENERATION: Cell<u64> = const { Cell::new(0) };
}

// =============================================================================
// Public API
// =============================================================================

/// Get the current generation for this thread's build.
pub(crate) fn current_generation() -> u64 {
    CURRENT_GENERATION.with(Cell::get)
}

/// Clear the thread-local accessed files set and advance the generation counter.
///
/// Call at the start of each build.
pub fn reset_access_flags() {
    let new_gen = GENERATION.fetch_add(1, Ordering::Relaxed) + 1;
    CURRENT_GENERATION.with(|current| current.set(new_gen));
    ACCESSED_FILES.with(|files| files.borrow_mut().clear());
}

/// Record a file access in the thread-local set.
pub fn record_file_access(path: &Path) {
    ACCESSED_FILES.with(|files| {
        let mut files = files.borrow_mut();
        if !files.contains(path) {
            files.insert(path.to_path_buf());
        }
    });
}

/// Get all files accessed during the current build, sorted.
///
/// Returns the paths recorded since the last `reset_access_flags()`.
/// Each thread has its own tracking.
pub fn get_accessed_files() -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> =
        ACCESSED_FILES.with(|files| files.borrow().iter().cloned().collect());
    files.sort();
    files
}
