//! The unit of work passed between stages.

use std::path::{Path, PathBuf};

/// A stylesheet and the path it was read from.
///
/// Documents are immutable: a stage consumes its input and returns a new
/// document. The path is what relative `@import`s resolve against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: PathBuf,
    content: String,
}

impl Document {
    /// Create a document.
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// The source path.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stylesheet text.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Consume the document, returning its text.
    #[inline]
    pub fn into_content(self) -> String {
        self.content
    }

    /// Replace the content, keeping the path.
    #[must_use]
    pub fn with_content(self, content: impl Into<String>) -> Self {
        Self {
            path: self.path,
            content: content.into(),
        }
    }

    /// Content length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Check if the content is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
