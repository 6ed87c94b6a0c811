//! Pipeline configuration: an ordered list of stages.
//!
//! Pipelines are built in code or loaded from JSON:
//!
//! ```json
//! {
//!   "stages": [
//!     "import-inline",
//!     { "stage": "minify", "options": { "preset": "default" } }
//!   ]
//! }
//! ```
//!
//! A bare array of stages is accepted too, and `plugins` is an alias of
//! `stages`.

mod stage;

use std::fs;
use std::path::Path;

use rustc_hash::FxHashSet;
use serde::Deserialize;

use crate::diagnostic::ConfigError;

pub use stage::{Stage, StageOptions};

/// An ordered sequence of stages.
///
/// Order is significant: each stage sees the output of the previous one.
/// A stage name may only appear again when the later stage is marked
/// [`repeated`](Stage::repeated).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Create a pipeline from stages, validating duplicates.
    pub fn new(stages: Vec<Stage>) -> Result<Self, ConfigError> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for stage in &stages {
            if !seen.insert(stage.name()) && !stage.is_repeat() {
                return Err(ConfigError::DuplicateStage {
                    name: stage.name().to_string(),
                });
            }
        }
        Ok(Self { stages })
    }

    /// A pipeline with no stages. Running it returns the input unchanged.
    pub fn empty() -> Self {
        Self::default()
    }

    /// `import-inline` followed by `minify` with the `default` preset.
    pub fn standard() -> Self {
        Self {
            stages: vec![
                Stage::new("import-inline"),
                Stage::new("minify").with_option("preset", "default"),
            ],
        }
    }

    /// Start building a pipeline.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let pipeline = Pipeline::builder()
    ///     .stage("import-inline")
    ///     .stage(Stage::new("minify").with_option("preset", "lite"))
    ///     .build()?;
    /// ```
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Parse a pipeline from JSON text.
    ///
    /// Rejects files that declare no stages.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let file: PipelineFile = serde_json::from_str(json)?;
        let stages: Vec<Stage> = match file {
            PipelineFile::List(entries) => entries,
            PipelineFile::Object(PipelineObject { stages }) => stages,
        }
        .into_iter()
        .map(StageEntry::into_stage)
        .collect();

        if stages.is_empty() {
            return Err(ConfigError::Empty);
        }
        Self::new(stages)
    }

    /// Load a pipeline from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// The stages in order.
    #[inline]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Number of stages.
    #[inline]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check if there are no stages.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Position of the first stage with this name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.name() == name)
    }
}

/// Builder for [`Pipeline`].
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    stages: Vec<Stage>,
}

impl PipelineBuilder {
    /// Append a stage.
    pub fn stage(mut self, stage: impl Into<Stage>) -> Self {
        self.stages.push(stage.into());
        self
    }

    /// Validate and build the pipeline.
    pub fn build(self) -> Result<Pipeline, ConfigError> {
        Pipeline::new(self.stages)
    }
}

// ============================================================================
// File Format
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum PipelineFile {
    List(Vec<StageEntry>),
    Object(PipelineObject),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PipelineObject {
    #[serde(alias = "plugins")]
    stages: Vec<StageEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StageEntry {
    Name(String),
    Full(Stage),
}

impl StageEntry {
    fn into_stage(self) -> Stage {
        match self {
            Self::Name(name) => Stage::new(name),
            Self::Full(stage) => stage,
        }
    }
}
