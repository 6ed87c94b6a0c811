//! Error types for configuration, stages, pipelines and builds.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

// ============================================================================
// Syntax Errors
// ============================================================================

/// A CSS syntax error with its resolved source location.
///
/// The offending source line is captured at creation time, so the error can
/// be rendered later without access to the original text
/// (see [`format_error`](super::format_error)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// File the error occurred in, if known.
    pub path: Option<PathBuf>,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number in characters (1-indexed).
    pub column: usize,
    /// Human-readable description.
    pub message: String,
    /// The full source line containing the error.
    pub snippet: String,
}

impl SyntaxError {
    /// Create an error at a byte offset into `source`.
    pub fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let offset = floor_char_boundary(source, offset.min(source.len()));
        let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
        let line_end = source[offset..]
            .find('\n')
            .map_or(source.len(), |i| offset + i);

        Self {
            path: None,
            line: source[..offset].matches('\n').count() + 1,
            column: source[line_start..offset].chars().count() + 1,
            message: message.into(),
            snippet: source[line_start..line_end].trim_end_matches('\r').to_string(),
        }
    }

    /// Attach the file path the error belongs to.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Path as displayed in messages (`<input>` when unknown).
    pub fn display_path(&self) -> String {
        self.path
            .as_deref()
            .map_or_else(|| "<input>".to_string(), |p| p.display().to_string())
    }
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}: {}", self.display_path(), self.line, self.column, self.message)
    }
}

impl std::error::Error for SyntaxError {}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

// ============================================================================
// File Errors
// ============================================================================

/// Error reading a file through the virtual or physical file system.
///
/// Cloneable so that results can be cached.
#[derive(Debug, Clone, Error)]
pub enum FileError {
    /// The file does not exist.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The path points at a directory.
    #[error("is a directory: {}", .0.display())]
    IsDirectory(PathBuf),

    /// The file is not valid UTF-8.
    #[error("file is not valid UTF-8: {}", .0.display())]
    InvalidUtf8(PathBuf),

    /// Any other I/O failure.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
}

impl FileError {
    /// Classify an I/O error for the given path.
    pub fn from_io(err: io::Error, path: &Path) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: Arc::new(err),
            },
        }
    }

    /// The path this error refers to.
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(path) | Self::IsDirectory(path) | Self::InvalidUtf8(path) => path,
            Self::Io { path, .. } => path,
        }
    }
}

/// Result type for file reads.
pub type FileResult<T> = Result<T, FileError>;

// ============================================================================
// Configuration Errors
// ============================================================================

/// A malformed pipeline or stage configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A pipeline file declared no stages.
    #[error("pipeline has no stages")]
    Empty,

    /// No transform is registered under this name.
    #[error("unknown stage `{name}`")]
    UnknownStage {
        /// The requested stage name.
        name: String,
    },

    /// A stage appears twice without `repeat: true`.
    #[error("stage `{name}` appears more than once (set `repeat: true` to run it again)")]
    DuplicateStage {
        /// The duplicated stage name.
        name: String,
    },

    /// The stage factory rejected its options.
    #[error("invalid options for stage `{stage}`: {message}")]
    InvalidOptions {
        /// The stage whose options were rejected.
        stage: String,
        /// Why the options were rejected.
        message: String,
    },

    /// The pipeline file is not valid JSON or has the wrong shape.
    #[error("invalid pipeline configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The pipeline file could not be read.
    #[error("failed to read pipeline configuration {}: {source}", .path.display())]
    Io {
        /// The configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

// ============================================================================
// Stage Errors
// ============================================================================

/// A transform rejected its input.
///
/// Transforms are deterministic, so none of these are transient.
#[derive(Debug, Error)]
pub enum StageError {
    /// The stylesheet is malformed.
    #[error("syntax error at {0}")]
    Syntax(#[from] SyntaxError),

    /// An `@import` target matched no file.
    #[error("cannot resolve import `{target}` from {}", .importer.display())]
    UnresolvedImport {
        /// The import target as written.
        target: String,
        /// The importing file.
        importer: PathBuf,
    },

    /// A file imports itself, directly or transitively.
    #[error("import cycle: {}", display_chain(.chain))]
    ImportCycle {
        /// The import chain, ending with the file that closes the cycle.
        chain: Vec<PathBuf>,
    },

    /// Imports are nested deeper than the configured limit.
    #[error("imports nested deeper than {limit} levels at {}", .path.display())]
    ImportDepth {
        /// The configured limit.
        limit: usize,
        /// The file that exceeded it.
        path: PathBuf,
    },

    /// An imported file could not be read.
    #[error(transparent)]
    File(#[from] FileError),

    /// A custom stage failed.
    #[error("{0}")]
    Custom(String),
}

impl StageError {
    /// Create a custom stage error.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// Get the syntax error if this is one.
    pub fn syntax(&self) -> Option<&SyntaxError> {
        match self {
            Self::Syntax(err) => Some(err),
            _ => None,
        }
    }
}

fn display_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

// ============================================================================
// Pipeline & Driver Errors
// ============================================================================

/// Error running a pipeline over a document.
///
/// # Example
///
/// ```ignore
/// match runner.run(document) {
///     Ok(output) => { /* success */ }
///     Err(PipelineError::StageFailed { stage, cause }) => {
///         eprintln!("{stage} rejected the stylesheet: {cause}");
///     }
///     Err(e) => eprintln!("{e}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The pipeline could not be resolved into transforms.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A stage rejected its input; later stages did not run.
    #[error("stage `{stage}` failed: {cause}")]
    StageFailed {
        /// Name of the failing stage.
        stage: String,
        /// What went wrong.
        #[source]
        cause: StageError,
    },
}

impl PipelineError {
    /// Name of the failed stage, if a stage failed.
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::StageFailed { stage, .. } => Some(stage),
            Self::Config(_) => None,
        }
    }
}

/// Error building an entry file to an output file.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The pipeline configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The pipeline failed; nothing was written.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The entry file could not be read.
    #[error("failed to read entry: {0}")]
    Read(#[from] FileError),

    /// The output could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        /// The destination path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl DriverError {
    /// Check if this error came from a failing stage.
    pub fn is_stage_failure(&self) -> bool {
        matches!(self, Self::Pipeline(PipelineError::StageFailed { .. }))
    }

    /// Get the stage error if a stage failed.
    pub fn stage_error(&self) -> Option<&StageError> {
        match self {
            Self::Pipeline(PipelineError::StageFailed { cause, .. }) => Some(cause),
            _ => None,
        }
    }
}
