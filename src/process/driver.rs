//! Pipeline driver: entry file in, output file out.
//!
//! ```text
//! entry.css ─► read_source ─► Document ─► Runner::run ─► write temp ─► rename ─► output.css
//!                  │
//!                  └─ BuildSession records every file read (entry + imports)
//! ```
//!
//! Nothing is written unless every stage succeeds, and the output appears
//! in one rename, so readers never see a partial file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use super::runner::Runner;
use super::session::{AccessedDeps, BuildSession};
use crate::diagnostic::{ConfigError, DriverError};
use crate::document::Document;
use crate::pipeline::Pipeline;
use crate::resource::file::{locate, read_source};

/// Suffix counter for temporary output files.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Result of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// The entry file, as resolved.
    pub entry: PathBuf,
    /// The file written.
    pub output: PathBuf,
    /// Size of the output in bytes.
    pub bytes: usize,
    /// Files read during the build.
    pub deps: AccessedDeps,
}

/// Builds entry files with one resolved pipeline.
///
/// # Example
///
/// ```ignore
/// let driver = Driver::new(&Pipeline::standard())?;
/// let report = driver.build("src/main.css", "dist/main.css")?;
/// println!("{} bytes, {} inputs", report.bytes, report.deps.files.len());
/// ```
#[derive(Debug)]
pub struct Driver {
    runner: Runner,
}

impl Driver {
    /// Resolve a pipeline against the built-in stages.
    pub fn new(pipeline: &Pipeline) -> Result<Self, ConfigError> {
        Ok(Self::with_runner(Runner::new(pipeline)?))
    }

    /// Drive an already resolved runner.
    pub fn with_runner(runner: Runner) -> Self {
        Self { runner }
    }

    /// The underlying runner.
    #[inline]
    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    /// Run the pipeline over an entry file without writing anything.
    pub fn render(&self, entry: impl AsRef<Path>) -> Result<(Document, AccessedDeps), DriverError> {
        let entry = entry.as_ref();
        let session = BuildSession::start();

        let path = locate(entry).unwrap_or_else(|| entry.to_path_buf());
        let source = read_source(&path)?;
        let output = self.runner.run(Document::new(path, &*source))?;

        Ok((output, session.finish()))
    }

    /// Build `entry` into `output`, replacing any existing file.
    ///
    /// Parent directories of `output` are created as needed.
    pub fn build(&self, entry: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<BuildReport, DriverError> {
        let output = output.as_ref();
        let (document, deps) = self.render(entry)?;

        write_atomic(output, document.content())?;
        log::debug!(
            "built {} -> {} ({} bytes, {} inputs)",
            document.path().display(),
            output.display(),
            document.len(),
            deps.files.len()
        );

        Ok(BuildReport {
            bytes: document.len(),
            entry: document.path().to_path_buf(),
            output: output.to_path_buf(),
            deps,
        })
    }
}

/// Build one entry file with the built-in stages.
///
/// Resolves the pipeline on every call; use a [`Driver`] for repeated builds.
pub fn build(
    entry: impl AsRef<Path>,
    output: impl AsRef<Path>,
    pipeline: &Pipeline,
) -> Result<BuildReport, DriverError> {
    Driver::new(pipeline)?.build(entry, output)
}

/// Write `content` to a sibling temporary file, then rename it over `path`.
fn write_atomic(path: &Path, content: &str) -> Result<(), DriverError> {
    let io_err = |source| DriverError::Io {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(io_err)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let temp = parent.join(format!(
        ".{file_name}.{}.{}.tmp",
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    fs::write(&temp, content).map_err(io_err)?;
    fs::rename(&temp, path).map_err(|e| {
        let _ = fs::remove_file(&temp);
        io_err(e)
    })
}
