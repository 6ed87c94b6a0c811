//! In-memory stylesheets that shadow the disk.
//!
//! A process has one overlay, installed with [`set_virtual_fs`]. Every
//! lookup made by the driver and by `import-inline` consults it before the
//! real file system, so generated files (theme variables, design tokens)
//! can be `@import`ed like any other partial.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::resource::path::clean_path;

// =============================================================================
// Overlay Trait
// =============================================================================

/// Source of virtual stylesheets.
///
/// Paths arrive lexically cleaned (`a/./b/../c.css` → `a/c.css`) but not
/// canonicalized: a relative import from `styles/main.css` asks for
/// `styles/_theme.css`, not an absolute path.
///
/// # Example
///
/// ```ignore
/// use css_batch::{VirtualFileSystem, set_virtual_fs};
/// use std::path::Path;
///
/// struct Tokens;
///
/// impl VirtualFileSystem for Tokens {
///     fn read(&self, path: &Path) -> Option<Vec<u8>> {
///         (path == Path::new("styles/_tokens.css"))
///             .then(|| b":root{--accent:#c00}".to_vec())
///     }
/// }
///
/// set_virtual_fs(Tokens);
/// ```
pub trait VirtualFileSystem: Send + Sync {
    /// Content of the virtual file at `path`, or `None` to use the disk.
    fn read(&self, path: &Path) -> Option<Vec<u8>>;

    /// Whether `path` is virtual. Override when `read` is expensive.
    fn exists(&self, path: &Path) -> bool {
        self.read(path).is_some()
    }
}

/// The empty overlay; everything comes from disk.
pub struct NoVirtualFS;

impl VirtualFileSystem for NoVirtualFS {
    fn read(&self, _path: &Path) -> Option<Vec<u8>> {
        None
    }

    fn exists(&self, _path: &Path) -> bool {
        false
    }
}

// =============================================================================
// MapVirtualFS
// =============================================================================

/// Overlay backed by a path → content map.
///
/// Paths are cleaned on insert and lookup, so `./styles/a.css` and
/// `styles/a.css` name the same entry.
///
/// ```ignore
/// let mut vfs = MapVirtualFS::new();
/// vfs.insert("styles/_theme.css", ":root{--accent:#c00}");
/// set_virtual_fs(vfs);
/// ```
#[derive(Debug, Default, Clone)]
pub struct MapVirtualFS {
    files: FxHashMap<PathBuf, Vec<u8>>,
}

impl MapVirtualFS {
    /// Create an empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a stylesheet.
    pub fn insert(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.insert_bytes(path, content.into().into_bytes());
    }

    /// Add or replace a file with raw bytes (decoded as UTF-8 on read).
    pub fn insert_bytes(&mut self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.files.insert(clean_path(path.as_ref()), content.into());
    }

    /// Remove a file, returning its content.
    pub fn remove(&mut self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.remove(&clean_path(path.as_ref()))
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the overlay has no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// All file paths, sorted.
    pub fn paths(&self) -> Vec<&Path> {
        let mut paths: Vec<&Path> = self.files.keys().map(PathBuf::as_path).collect();
        paths.sort_unstable();
        paths
    }
}

impl VirtualFileSystem for MapVirtualFS {
    fn read(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.get(&clean_path(path)).cloned()
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(&clean_path(path))
    }
}

// =============================================================================
// Process-wide Overlay
// =============================================================================

static GLOBAL_VFS: LazyLock<RwLock<Box<dyn VirtualFileSystem>>> =
    LazyLock::new(|| RwLock::new(Box::new(NoVirtualFS)));

/// Install the process-wide overlay, replacing the previous one.
///
/// Builds already running may observe either overlay.
pub fn set_virtual_fs<V: VirtualFileSystem + 'static>(fs: V) {
    *GLOBAL_VFS.write() = Box::new(fs);
}

pub(crate) fn read_virtual(path: &Path) -> Option<Vec<u8>> {
    GLOBAL_VFS.read().read(path)
}

/// Check if the installed overlay provides `path`.
pub fn is_virtual_path(path: &Path) -> bool {
    GLOBAL_VFS.read().exists(path)
}

/// Serializes tests that install a global overlay and removes it on drop,
/// even when an assertion fails.
#[cfg(test)]
pub(crate) struct VirtualFsGuard {
    _lock: parking_lot::MutexGuard<'static, ()>,
}

#[cfg(test)]
static TEST_VFS_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());

#[cfg(test)]
impl VirtualFsGuard {
    pub(crate) fn install<V: VirtualFileSystem + 'static>(fs: V) -> Self {
        let lock = TEST_VFS_LOCK.lock();
        set_virtual_fs(fs);
        Self { _lock: lock }
    }
}

#[cfg(test)]
impl Drop for VirtualFsGuard {
    fn drop(&mut self) {
        set_virtual_fs(NoVirtualFS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_vfs_cleans_paths() {
        let mut vfs = MapVirtualFS::new();
        assert!(vfs.is_empty());

        vfs.insert("./styles/_theme.css", ":root{}");
        vfs.insert_bytes("styles/raw.css", b"a{}".to_vec());

        assert_eq!(vfs.len(), 2);
        assert!(vfs.exists(Path::new("styles/sub/../_theme.css")));
        assert_eq!(vfs.read(Path::new("styles/_theme.css")), Some(b":root{}".to_vec()));
        assert_eq!(vfs.read(Path::new("styles/other.css")), None);

        assert_eq!(vfs.remove("styles/./raw.css"), Some(b"a{}".to_vec()));
        assert_eq!(vfs.paths(), [Path::new("styles/_theme.css")]);
    }

    #[test]
    fn test_guard_restores_empty_overlay() {
        let mut vfs = MapVirtualFS::new();
        vfs.insert("guarded/a.css", "a{}");
        {
            let _guard = VirtualFsGuard::install(vfs);
            assert!(is_virtual_path(Path::new("guarded/a.css")));
        }
        let _guard = VirtualFsGuard::install(NoVirtualFS);
        assert!(!is_virtual_path(Path::new("guarded/a.css")));
    }

    #[test]
    fn test_no_vfs() {
        assert!(!NoVirtualFS.exists(Path::new("anything.css")));
        assert!(NoVirtualFS.read(Path::new("anything.css")).is_none());
    }
}
