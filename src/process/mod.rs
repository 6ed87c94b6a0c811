//! Document processing pipeline.
//!
//! - [`Runner`] - Applies resolved stages to a document
//! - [`Driver`] - Reads an entry file, runs the stages, writes the output
//! - [`Batcher`] - Parallel builds of many entry files

mod driver;
mod runner;
mod session;
#[cfg(feature = "batch")]
pub mod batch;

pub use driver::{build, BuildReport, Driver};
pub use runner::{run, Runner};
pub use session::{AccessedDeps, BuildSession};

#[cfg(feature = "batch")]
pub use batch::{BuildJob, Batcher};
