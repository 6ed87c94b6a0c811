//! File reading with virtual file system support.

use std::fs;
use std::path::{Path, PathBuf};

use super::access::record_file_access;
use super::vfs::{is_virtual_path, read_virtual, NoVirtualFS, VirtualFileSystem};
use crate::diagnostic::{FileError, FileResult};
use crate::resource::path::{clean_path, normalize_path};

/// Read a file from disk only (no virtual support).
pub fn read_file(path: &Path) -> FileResult<Vec<u8>> {
    read_with_virtual(path, &NoVirtualFS)
}

/// Read a file using the global virtual file system.
///
/// Resolution order:
/// 1. Virtual files
/// 2. Physical files
pub fn read_with_global_virtual(path: &Path) -> FileResult<Vec<u8>> {
    if let Some(content) = read_virtual(path) {
        record_file_access(path);
        return Ok(content);
    }

    let data = read_disk(path)?;
    record_file_access(path);
    Ok(data)
}

/// Read a file with an explicit virtual file system.
pub fn read_with_virtual<V: VirtualFileSystem>(path: &Path, virtual_fs: &V) -> FileResult<Vec<u8>> {
    if let Some(data) = virtual_fs.read(path) {
        record_file_access(path);
        return Ok(data);
    }

    let data = read_disk(path)?;
    record_file_access(path);
    Ok(data)
}

/// Decode bytes as UTF-8, stripping BOM if present.
pub fn decode_utf8<'a>(buf: &'a [u8], path: &Path) -> FileResult<&'a str> {
    let buf = buf.strip_prefix(b"\xef\xbb\xbf").unwrap_or(buf);
    std::str::from_utf8(buf).map_err(|_| FileError::InvalidUtf8(path.to_path_buf()))
}

/// Find the file a candidate path refers to.
///
/// Virtual files are matched on the lexically cleaned path and returned in
/// that form; physical files are returned canonicalized so that the same
/// file reached through different relative paths compares equal.
pub fn locate(candidate: &Path) -> Option<PathBuf> {
    let cleaned = clean_path(candidate);
    if is_virtual_path(&cleaned) {
        return Some(cleaned);
    }
    cleaned.is_file().then(|| normalize_path(&cleaned))
}

/// Read file from disk.
fn read_disk(path: &Path) -> FileResult<Vec<u8>> {
    let map_err = |e| FileError::from_io(e, path);
    fs::metadata(path).map_err(map_err).and_then(|m| {
        if m.is_dir() {
            Err(FileError::IsDirectory(path.to_path_buf()))
        } else {
            fs::read(path).map_err(map_err)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::file::access::{get_accessed_files, reset_access_flags};
    use crate::resource::file::vfs::MapVirtualFS;
    use tempfile::TempDir;

    #[test]
    fn test_decode_utf8_valid() {
        let text = "a::after{content:\"→\"}";
        assert_eq!(decode_utf8(text.as_bytes(), Path::new("a.css")).unwrap(), text);
    }

    #[test]
    fn test_decode_utf8_strips_bom() {
        let mut bytes = vec![0xef, 0xbb, 0xbf];
        bytes.extend_from_slice(b"a{}");
        assert_eq!(decode_utf8(&bytes, Path::new("a.css")).unwrap(), "a{}");
    }

    #[test]
    fn test_decode_utf8_invalid() {
        let err = decode_utf8(&[0xff, 0xfe], Path::new("bad.css")).unwrap_err();
        assert!(matches!(err, FileError::InvalidUtf8(p) if p == Path::new("bad.css")));
    }

    #[test]
    fn test_read_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.css");
        fs::write(&path, "a{}").unwrap();

        assert_eq!(read_disk(&path).unwrap(), b"a{}");
    }

    #[test]
    fn test_read_disk_directory() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(read_disk(dir.path()), Err(FileError::IsDirectory(_))));
    }

    #[test]
    fn test_read_disk_nonexistent() {
        assert!(matches!(
            read_disk(Path::new("/nonexistent/file.css")),
            Err(FileError::NotFound(_))
        ));
    }

    #[test]
    fn test_read_with_virtual_records_access() {
        let mut vfs = MapVirtualFS::new();
        vfs.insert("virtual/a.css", "a{}");

        reset_access_flags();
        let data = read_with_virtual(Path::new("virtual/a.css"), &vfs).unwrap();
        assert_eq!(data, b"a{}");
        assert_eq!(get_accessed_files(), vec![PathBuf::from("virtual/a.css")]);
    }

    #[test]
    fn test_locate_physical_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.css"), "").unwrap();

        let found = locate(&dir.path().join("sub/../a.css")).unwrap();
        assert_eq!(found, normalize_path(&dir.path().join("a.css")));
        assert!(locate(&dir.path().join("missing.css")).is_none());
        assert!(locate(dir.path()).is_none());
    }
}
