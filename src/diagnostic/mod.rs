//! Error types and human-readable error formatting.

mod error;
mod format;

pub use error::{
    ConfigError, DriverError, FileError, FileResult, PipelineError, StageError, SyntaxError,
};
pub use format::{format_error, format_syntax_error, DiagnosticOptions, DisplayStyle};
