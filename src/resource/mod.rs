//! Shared resources for stylesheet builds (file access, source cache).

pub mod file;
pub mod path;
