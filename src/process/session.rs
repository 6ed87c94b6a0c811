//! Build session for tracking file access.
//!
//! Encapsulates the side effects of `reset_access_flags()` and
//! `get_accessed_files()`.

use std::path::{Path, PathBuf};

use crate::resource::file::{get_accessed_files, reset_access_flags};

/// Tracks the files read during one build.
///
/// Create a session before running the pipeline, then call `finish()` to
/// collect results. Tracking is per thread, so a session must finish on
/// the thread that started it.
///
/// # Example
///
/// ```ignore
/// let session = BuildSession::start();
/// let output = runner.run(document)?;
/// let deps = session.finish();
/// // deps.files now lists the entry and every inlined import
/// ```
pub struct BuildSession {
    _private: (),
}

impl BuildSession {
    /// Start a new build session, resetting access tracking.
    #[inline]
    pub fn start() -> Self {
        reset_access_flags();
        Self { _private: () }
    }

    /// Finish the session and collect accessed files.
    #[inline]
    pub fn finish(self) -> AccessedDeps {
        AccessedDeps {
            files: get_accessed_files(),
        }
    }
}

/// Files read during a build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessedDeps {
    /// Files read during the build, sorted. Physical files are absolute;
    /// virtual files keep their registered path.
    pub files: Vec<PathBuf>,
}

impl AccessedDeps {
    /// Check if a file was read.
    pub fn contains(&self, path: &Path) -> bool {
        self.files.binary_search_by(|p| p.as_path().cmp(path)).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::file::record_file_access;

    #[test]
    fn test_session_resets_tracking() {
        record_file_access(Path::new("stale.css"));

        let session = BuildSession::start();
        record_file_access(Path::new("b.css"));
        record_file_access(Path::new("a.css"));
        let deps = session.finish();

        assert_eq!(deps.files, [PathBuf::from("a.css"), PathBuf::from("b.css")]);
        assert!(deps.contains(Path::new("b.css")));
        assert!(!deps.contains(Path::new("stale.css")));
    }
}
