//! Parallel builds over one shared runner.
//!
//! Every job gets its own document and build session on a rayon worker;
//! the resolved stages and the global source cache are shared, so a partial
//! imported by many entries is decoded once.
//!
//! # Example
//!
//! ```ignore
//! let batcher = Batcher::new(&Pipeline::standard())?;
//! let jobs = vec![
//!     BuildJob::new("src/site.css", "dist/site.css"),
//!     BuildJob::new("src/print.css", "dist/print.css"),
//! ];
//! for result in batcher.build_all(&jobs) {
//!     match result {
//!         Ok(report) => println!("{} ({} bytes)", report.output.display(), report.bytes),
//!         Err(e) => eprintln!("{}", format_error(&e, &DiagnosticOptions::default())),
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use super::driver::{BuildReport, Driver};
use super::runner::Runner;
use crate::diagnostic::{ConfigError, DriverError};
use crate::pipeline::Pipeline;

/// One entry file and where to write it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildJob {
    /// The entry stylesheet.
    pub entry: PathBuf,
    /// The output path.
    pub output: PathBuf,
}

impl BuildJob {
    /// Create a job.
    pub fn new(entry: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            entry: entry.into(),
            output: output.into(),
        }
    }

    /// Map each entry to `out_dir/<file name>`.
    pub fn into_dir<P: AsRef<Path>>(entries: &[P], out_dir: impl AsRef<Path>) -> Vec<Self> {
        let out_dir = out_dir.as_ref();
        entries
            .iter()
            .map(|entry| {
                let entry = entry.as_ref();
                let name = entry.file_name().unwrap_or(entry.as_os_str());
                Self::new(entry, out_dir.join(name))
            })
            .collect()
    }
}

/// Batch builder with a shared runner.
#[derive(Debug)]
pub struct Batcher {
    driver: Driver,
}

impl Batcher {
    /// Resolve a pipeline against the built-in stages.
    pub fn new(pipeline: &Pipeline) -> Result<Self, ConfigError> {
        Ok(Self {
            driver: Driver::new(pipeline)?,
        })
    }

    /// Build with an already resolved runner.
    pub fn with_runner(runner: Runner) -> Self {
        Self {
            driver: Driver::with_runner(runner),
        }
    }

    /// Build every job in parallel.
    ///
    /// Returns results in the same order as `jobs`. A failing job does not
    /// stop the others.
    pub fn build_all(&self, jobs: &[BuildJob]) -> Vec<Result<BuildReport, DriverError>> {
        self.build_all_each(jobs, |_, _| {})
    }

    /// Build every job in parallel with a callback after each job.
    ///
    /// Like `build_all`, but invokes the callback once per job with its
    /// result. Useful for progress tracking.
    pub fn build_all_each<F>(&self, jobs: &[BuildJob], on_each: F) -> Vec<Result<BuildReport, DriverError>>
    where
        F: Fn(&BuildJob, &Result<BuildReport, DriverError>) + Sync,
    {
        if jobs.is_empty() {
            return vec![];
        }

        log::debug!("building {} stylesheets", jobs.len());
        jobs.par_iter()
            .map(|job| {
                let result = self.driver.build(&job.entry, &job.output);
                on_each(job, &result);
                result
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[test]
    fn test_build_all_keeps_order_and_isolates_failures() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("_shared.css"), ".s { margin: 0px }").unwrap();
        for i in 0..8 {
            fs::write(
                dir.path().join(format!("e{i}.css")),
                format!("@import 'shared';\n.e{i} {{ color: red }}"),
            )
            .unwrap();
        }
        fs::write(dir.path().join("bad.css"), "@import 'missing';").unwrap();

        let mut entries: Vec<PathBuf> = (0..8).map(|i| dir.path().join(format!("e{i}.css"))).collect();
        entries.insert(3, dir.path().join("bad.css"));
        let jobs = BuildJob::into_dir(&entries, dir.path().join("dist"));

        let done = AtomicUsize::new(0);
        let batcher = Batcher::new(&Pipeline::standard()).unwrap();
        let results = batcher.build_all_each(&jobs, |_, _| {
            done.fetch_add(1, Ordering::Relaxed);
        });

        assert_eq!(results.len(), 9);
        assert_eq!(done.load(Ordering::Relaxed), 9);
        assert!(results[3].as_ref().unwrap_err().is_stage_failure());

        let e4 = results[4].as_ref().unwrap();
        assert!(e4.output.ends_with("dist/e3.css"));
        assert_eq!(fs::read_to_string(&e4.output).unwrap(), ".s{margin:0}.e3{color:red}");
        assert_eq!(e4.deps.files.len(), 2);
        assert!(!dir.path().join("dist/bad.css").exists());
    }

    #[test]
    fn test_empty_batch() {
        let batcher = Batcher::new(&Pipeline::empty()).unwrap();
        assert!(batcher.build_all(&[]).is_empty());
    }
}
