//! Stage descriptors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Options passed to a stage factory.
pub type StageOptions = Map<String, Value>;

/// One configured transform: a registered name plus its options.
///
/// # Example
///
/// ```ignore
/// let minify = Stage::new("minify").with_option("preset", "advanced");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Stage {
    #[serde(rename = "stage")]
    name: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    options: StageOptions,
    /// Allow this stage to run again when its name already appeared.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    repeat: bool,
}

impl Stage {
    /// Create a stage with no options.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: StageOptions::new(),
            repeat: false,
        }
    }

    /// Set a single option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Replace all options.
    pub fn with_options(mut self, options: StageOptions) -> Self {
        self.options = options;
        self
    }

    /// Mark this stage as an intentional repeat of an earlier one.
    pub fn repeated(mut self) -> Self {
        self.repeat = true;
        self
    }

    /// The registered stage name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The stage options.
    #[inline]
    pub fn options(&self) -> &StageOptions {
        &self.options
    }

    /// Whether this stage may repeat an earlier stage name.
    #[inline]
    pub fn is_repeat(&self) -> bool {
        self.repeat
    }
}

impl From<&str> for Stage {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
