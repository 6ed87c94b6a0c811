//! Prelude module for convenient imports.
//!
//! ```ignore
//! use css_batch::prelude::*;
//! ```

// Pipeline
pub use crate::document::Document;
pub use crate::pipeline::{Pipeline, PipelineBuilder, Stage, StageOptions};

// Processing
pub use crate::process::{build, run, AccessedDeps, BuildReport, BuildSession, Driver, Runner};
#[cfg(feature = "batch")]
pub use crate::process::{Batcher, BuildJob};

// Stages
pub use crate::transform::{ImportInline, ImportOptions, Minify, Preset, Registry, Transform};

// Diagnostics
pub use crate::diagnostic::{
    format_error, format_syntax_error, ConfigError, DiagnosticOptions, DisplayStyle, DriverError,
    FileError, PipelineError, StageError, SyntaxError,
};

// VFS
pub use crate::resource::file::{
    clear_source_cache, set_virtual_fs, MapVirtualFS, NoVirtualFS, VirtualFileSystem,
};

// Config
pub use crate::config::ConfigBuilder;
