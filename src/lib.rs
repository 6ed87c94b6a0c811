//! # css-batch
//!
//! A CSS build pipeline library: an ordered list of named stages, each with
//! its own options, is applied to an entry stylesheet and the result is
//! written to an output file.
//!
//! Two stages are built in:
//!
//! - **`import-inline`**: Splices `@import`ed stylesheets in place,
//!   with partials, load paths, globs and media-wrapped imports
//! - **`minify`**: Strips comments and whitespace, rewrites values, and
//!   (with the `advanced` preset) merges adjacent rules
//!
//! Resources are shared across builds:
//!
//! - **Source cache**: Fingerprint-based invalidation, shared by parallel builds
//! - **Virtual files**: Generated stylesheets take precedence over the disk
//! - **Dependencies**: Every build reports the files it read
//!
//! ## Quick Start
//!
//! ```ignore
//! use css_batch::{build, Pipeline};
//!
//! let report = build("src/main.css", "dist/main.css", &Pipeline::standard())?;
//! println!("{} bytes from {} files", report.bytes, report.deps.files.len());
//! ```
//!
//! ## Pipelines from JSON
//!
//! ```ignore
//! let pipeline = Pipeline::from_file("pipeline.json")?;
//! let runner = Runner::new(&pipeline)?;
//! let output = runner.run(Document::new("main.css", source))?;
//! ```
//!
//! ## Modules
//!
//! - [`pipeline`]: Stage descriptors and pipeline files
//! - [`transform`]: The `Transform` trait, registry and built-in stages
//! - [`process`]: Runner, driver and batch builds
//! - [`css`]: Tokenizer and block parser
//! - [`resource`]: File access, virtual files and the source cache
//! - [`diagnostic`]: Error types and formatting
//! - [`config`]: Process-wide defaults

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod css;
pub mod diagnostic;
pub mod document;
pub mod pipeline;
pub mod prelude;
pub mod process;
pub mod resource;
pub mod transform;

// =============================================================================
// High-Level API
// =============================================================================

pub use document::Document;
pub use pipeline::{Pipeline, PipelineBuilder, Stage, StageOptions};
pub use process::{build, run, AccessedDeps, BuildReport, BuildSession, Driver, Runner};

#[cfg(feature = "batch")]
pub use process::{Batcher, BuildJob};

// =============================================================================
// Stages
// =============================================================================

pub use transform::{
    ImportInline, ImportOptions, Minify, Preset, Registry, StageFactory, Transform,
    BUILTIN_REGISTRY,
};

// =============================================================================
// Diagnostics
// =============================================================================

pub use diagnostic::{
    // Error types
    ConfigError, DriverError, FileError, PipelineError, StageError, SyntaxError,
    // Formatting
    format_error, DiagnosticOptions, DisplayStyle,
};

// =============================================================================
// Infrastructure
// =============================================================================

pub use config::{Config, ConfigBuilder};
pub use resource::file::{
    clear_source_cache, get_accessed_files, is_virtual_path, read_source, reset_access_flags,
    set_virtual_fs, MapVirtualFS, NoVirtualFS, VirtualFileSystem,
};
