//! Stage implementations and the name → factory registry.
//!
//! - [`ImportInline`] (`import-inline`) - Splice `@import`ed stylesheets in place
//! - [`Minify`] (`minify`) - Strip comments, whitespace and redundancy
//!
//! Stage lookup is static: the runner resolves every configured name
//! against a [`Registry`] once, before any document is processed.

pub mod import;
pub mod minify;

use std::sync::{Arc, LazyLock};

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::diagnostic::{ConfigError, StageError};
use crate::document::Document;
use crate::pipeline::{Stage, StageOptions};

pub use import::{ImportInline, ImportOptions};
pub use minify::{Minify, Preset};

/// A document transform.
///
/// Transforms must be deterministic; the runner never retries them.
pub trait Transform: Send + Sync {
    /// The stage name this transform was registered under.
    fn name(&self) -> &str;

    /// Transform a document.
    fn apply(&self, input: Document) -> Result<Document, StageError>;
}

/// Creates a transform from stage options.
///
/// Returns a message describing why the options were rejected.
pub type StageFactory =
    Arc<dyn Fn(&StageOptions) -> Result<Box<dyn Transform>, String> + Send + Sync>;

/// Registry of available stages.
///
/// # Example
///
/// ```ignore
/// let mut registry = Registry::with_builtins();
/// registry.register("banner", |_options| Ok(Box::new(Banner) as Box<dyn Transform>));
/// let runner = Runner::with_registry(&pipeline, &registry)?;
/// ```
#[derive(Clone, Default)]
pub struct Registry {
    factories: FxHashMap<String, StageFactory>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with `import-inline` and `minify`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(import::NAME, |options| {
            Ok(Box::new(ImportInline::from_options(options)?) as Box<dyn Transform>)
        });
        registry.register(minify::NAME, |options| {
            Ok(Box::new(Minify::from_options(options)?) as Box<dyn Transform>)
        });
        registry
    }

    /// Register a factory, replacing any previous one with the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&StageOptions) -> Result<Box<dyn Transform>, String> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Check if a stage name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered stage names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Instantiate the transform for a configured stage.
    pub fn create(&self, stage: &Stage) -> Result<Box<dyn Transform>, ConfigError> {
        let factory = self
            .factories
            .get(stage.name())
            .ok_or_else(|| ConfigError::UnknownStage {
                name: stage.name().to_string(),
            })?;

        factory(stage.options()).map_err(|message| ConfigError::InvalidOptions {
            stage: stage.name().to_string(),
            message,
        })
    }
}

/// The built-in registry, shared process-wide.
pub static BUILTIN_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::with_builtins);

/// Deserialize stage options into a typed struct.
pub(crate) fn parse_options<T: DeserializeOwned>(options: &StageOptions) -> Result<T, String> {
    serde_json::from_value(Value::Object(options.clone())).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl Transform for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn apply(&self, input: Document) -> Result<Document, StageError> {
            let content = input.content().to_uppercase();
            Ok(input.with_content(content))
        }
    }

    #[test]
    fn test_builtins() {
        let registry = Registry::with_builtins();
        assert_eq!(registry.names(), ["import-inline", "minify"]);
        assert!(registry.create(&Stage::new("minify")).is_ok());
    }

    #[test]
    fn test_unknown_stage() {
        let err = BUILTIN_REGISTRY.create(&Stage::new("autoprefix")).err().unwrap();
        assert!(matches!(err, ConfigError::UnknownStage { name } if name == "autoprefix"));
    }

    #[test]
    fn test_invalid_options() {
        let stage = Stage::new("minify").with_option("preset", "extreme");
        let err = BUILTIN_REGISTRY.create(&stage).err().unwrap();
        assert!(matches!(err, ConfigError::InvalidOptions { stage, .. } if stage == "minify"));
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = Registry::new();
        registry.register("upper", |_| Ok(Box::new(Upper) as Box<dyn Transform>));

        let transform = registry.create(&Stage::new("upper")).unwrap();
        let output = transform.apply(Document::new("a.css", "a{}")).unwrap();
        assert_eq!(output.content(), "A{}");
    }
}
