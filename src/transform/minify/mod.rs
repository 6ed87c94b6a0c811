//! The `minify` stage.
//!
//! # Presets
//!
//! | Preset     | Whitespace & comments | Value optimizations | Rule merging |
//! |------------|-----------------------|---------------------|--------------|
//! | `lite`     | ✓                     |                     |              |
//! | `default`  | ✓                     | ✓                   |              |
//! | `advanced` | ✓                     | ✓                   | ✓            |
//!
//! Comments starting with `/*!` survive every preset. Output of every
//! preset is a fixed point: minifying it again changes nothing.

mod tree;
mod value;

use serde::Deserialize;

use super::{parse_options, Transform};
use crate::css::parse;
use crate::diagnostic::{StageError, SyntaxError};
use crate::document::Document;
use crate::pipeline::StageOptions;

/// Registered stage name.
pub const NAME: &str = "minify";

/// Minification aggressiveness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Whitespace, comments and empty rules only.
    Lite,
    /// Lite plus number, color and `!important` rewriting.
    #[default]
    Default,
    /// Default plus merging adjacent rules and dropping duplicate declarations.
    Advanced,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOptions {
    #[serde(default)]
    preset: Preset,
}

/// Stylesheet minifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct Minify {
    preset: Preset,
}

impl Minify {
    /// Create a minifier with the given preset.
    pub fn new(preset: Preset) -> Self {
        Self { preset }
    }

    /// Create a minifier from stage options (`{"preset": "lite"}`).
    pub fn from_options(options: &StageOptions) -> Result<Self, String> {
        let raw: RawOptions = parse_options(options)?;
        Ok(Self::new(raw.preset))
    }

    /// The configured preset.
    #[inline]
    pub fn preset(&self) -> Preset {
        self.preset
    }

    /// Minify stylesheet text.
    pub fn minify_str(&self, source: &str) -> Result<String, SyntaxError> {
        let sheet = parse(source)?;
        let mut nodes = tree::drop_empty(tree::build(&sheet.nodes, self.preset));
        if self.preset == Preset::Advanced {
            nodes = tree::drop_empty(tree::merge_adjacent(nodes));
        }

        let mut out = String::with_capacity(source.len() / 2);
        tree::write(&nodes, &mut out, true);
        Ok(out)
    }
}

impl Transform for Minify {
    fn name(&self) -> &str {
        NAME
    }

    fn apply(&self, input: Document) -> Result<Document, StageError> {
        let output = self
            .minify_str(input.content())
            .map_err(|e| e.with_path(input.path()))?;
        Ok(input.with_content(output))
    }
}
