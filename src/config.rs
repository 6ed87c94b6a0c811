//! Process-wide configuration for css-batch.
//!
//! Use [`ConfigBuilder`] at application startup to change the defaults that
//! apply to every build: the import nesting limit and the load paths
//! searched by every `import-inline` stage.

use std::path::PathBuf;
use std::sync::OnceLock;

/// Global configuration, initialized via [`ConfigBuilder::init`].
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Default limit for nested `@import`s.
pub const DEFAULT_MAX_IMPORT_DEPTH: usize = 64;

/// Runtime configuration for css-batch.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum nesting of inlined imports before a build fails.
    pub max_import_depth: usize,
    /// Directories searched by every `import-inline` stage, after the
    /// stage's own `path` option.
    pub load_paths: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_import_depth: DEFAULT_MAX_IMPORT_DEPTH,
            load_paths: Vec::new(),
        }
    }
}

/// Collects settings for [`Config`] and installs them once per process.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    max_import_depth: Option<usize>,
    load_paths: Vec<PathBuf>,
}

impl ConfigBuilder {
    /// Start from the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit how deep `@import`s may nest (default 64).
    ///
    /// ```
    /// use css_batch::config::ConfigBuilder;
    ///
    /// let installed = ConfigBuilder::new()
    ///     .max_import_depth(16)
    ///     .load_path("node_modules")
    ///     .init();
    /// # let _ = installed;
    /// ```
    pub fn max_import_depth(mut self, depth: usize) -> Self {
        self.max_import_depth = Some(depth);
        self
    }

    /// Add a global load path.
    pub fn load_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.load_paths.push(path.into());
        self
    }

    /// Build the configuration without installing it.
    pub fn build(self) -> Config {
        Config {
            max_import_depth: self
                .max_import_depth
                .unwrap_or(DEFAULT_MAX_IMPORT_DEPTH),
            load_paths: self.load_paths,
        }
    }

    /// Install as the process configuration.
    ///
    /// Only the first call (or the first [`get`]) wins. Returns `false`, and
    /// logs a warning, when a configuration is already in place.
    pub fn init(self) -> bool {
        let installed = CONFIG.set(self.build()).is_ok();
        if !installed {
            log::warn!("css-batch configuration already initialized; ignoring");
        }
        installed
    }
}

/// Install the defaults, unless something was installed already.
pub fn init_default() -> bool {
    ConfigBuilder::new().init()
}

/// The process configuration. Falls back to (and locks in) the defaults.
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}
