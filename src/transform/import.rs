//! The `import-inline` stage.
//!
//! Replaces every top-level `@import` with the content of the stylesheet it
//! names, recursively:
//!
//! ```text
//! main.css                        output
//! ├── @import "base";        ──►  <base.css, its own imports inlined>
//! ├── @import "_grid" print; ──►  @media print{<_grid.css>}
//! ├── @import "x" layer(base); ─►  @layer base{<x.css>}
//! └── a { ... }                   a { ... }
//! ```
//!
//! Import conditions nest as `@media` around `@supports` around `@layer`.
//!
//! # Resolution
//!
//! For each base directory (the importing file's directory, then the load
//! paths) the following candidates are tried, first match wins:
//!
//! 1. the target as written
//! 2. the target plus each configured extension
//! 3. the file name with the partial prefix (`_base`)
//! 4. the prefixed name plus each extension
//!
//! Virtual files registered with [`set_virtual_fs`](crate::resource::file::set_virtual_fs)
//! are found before physical ones. Remote targets (`http:`, `//`, `data:`)
//! are not fetched: they move to the top of the output, after `@charset`,
//! carrying the conditions of the imports that led to them.
//!
//! With `skip_duplicates`, a file is inlined once per set of conditions.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use serde::Deserialize;

use super::{parse_options, Transform};
use crate::config;
use crate::css::{tokenize, trim_trivia, Token, TokenKind};
use crate::diagnostic::{StageError, SyntaxError};
use crate::document::Document;
use crate::pipeline::StageOptions;
use crate::resource::file::{locate, read_source};
use crate::resource::path::clean_path;

/// Registered stage name.
pub const NAME: &str = "import-inline";

const REMOTE_PREFIXES: &[&str] = &["http:", "https:", "//", "data:"];

// ============================================================================
// Options
// ============================================================================

/// Resolved `import-inline` options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// Directories searched after the importing file's directory.
    pub load_paths: Vec<PathBuf>,
    /// Extensions appended to targets that lack one, each with a leading dot.
    pub extensions: Vec<String>,
    /// Partial prefix tried on the file name, `None` to disable.
    pub prefix: Option<String>,
    /// Inline a file only the first time it is imported.
    pub skip_duplicates: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            load_paths: Vec::new(),
            extensions: vec![".css".to_string()],
            prefix: Some("_".to_string()),
            skip_duplicates: true,
        }
    }
}

/// Options as written in a pipeline file.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOptions {
    #[serde(default)]
    path: OneOrMany,
    #[serde(default)]
    extensions: Option<OneOrMany>,
    #[serde(default)]
    prefix: Option<Prefix>,
    #[serde(default = "default_true")]
    skip_duplicates: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(s) => vec![s],
            Self::Many(v) => v,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Prefix {
    Name(String),
    Enabled(bool),
}

fn default_true() -> bool {
    true
}

impl From<RawOptions> for ImportOptions {
    fn from(raw: RawOptions) -> Self {
        let defaults = Self::default();

        let extensions = match raw.extensions {
            Some(exts) => exts
                .into_vec()
                .into_iter()
                .filter(|e| !e.is_empty())
                .map(|e| if e.starts_with('.') { e } else { format!(".{e}") })
                .collect(),
            None => defaults.extensions,
        };

        let prefix = match raw.prefix {
            None | Some(Prefix::Enabled(true)) => defaults.prefix,
            Some(Prefix::Enabled(false)) => None,
            Some(Prefix::Name(name)) => (!name.is_empty()).then_some(name),
        };

        Self {
            load_paths: raw.path.into_vec().into_iter().map(PathBuf::from).collect(),
            extensions,
            prefix,
            skip_duplicates: raw.skip_duplicates,
        }
    }
}

// ============================================================================
// Stage
// ============================================================================

/// Inlines `@import`ed stylesheets.
#[derive(Debug, Clone, Default)]
pub struct ImportInline {
    options: ImportOptions,
}

impl ImportInline {
    /// Create the stage with explicit options.
    pub fn new(options: ImportOptions) -> Self {
        Self { options }
    }

    /// Create the stage from pipeline options.
    pub fn from_options(options: &StageOptions) -> Result<Self, String> {
        let raw: RawOptions = parse_options(options)?;
        Ok(Self::new(raw.into()))
    }

    /// The resolved options.
    #[inline]
    pub fn options(&self) -> &ImportOptions {
        &self.options
    }
}

impl Transform for ImportInline {
    fn name(&self) -> &str {
        NAME
    }

    fn apply(&self, input: Document) -> Result<Document, StageError> {
        let config = config::get();
        let entry = locate(input.path()).unwrap_or_else(|| clean_path(input.path()));
        let load_paths = self.options.load_paths.iter().chain(&config.load_paths).cloned().collect();

        let mut inliner = Inliner::new(&self.options, load_paths, config.max_import_depth, entry.clone());
        let inlined = inliner.inline(input.content(), &entry, false)?;

        let mut output = inlined.text;
        if !inliner.hoisted.is_empty() {
            output.insert_str(inlined.head, &inliner.hoisted.concat());
        }
        Ok(input.with_content(output))
    }
}

// ============================================================================
// Import Conditions
// ============================================================================

/// What follows the target of an `@import`: `layer`, `supports()` and a
/// media query list, in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
struct Conditions {
    /// `Some("")` for an anonymous layer.
    layer: Option<String>,
    supports: Option<String>,
    media: Option<String>,
}

impl Conditions {
    /// Wrap inlined content in the matching blocks, media outermost.
    fn wrap(&self, content: String) -> String {
        let mut out = match self.layer.as_deref() {
            Some("") => format!("@layer{{{content}}}"),
            Some(layer) => format!("@layer {layer}{{{content}}}"),
            None => content,
        };
        if let Some(supports) = &self.supports {
            out = format!("@supports ({supports}){{{out}}}");
        }
        if let Some(media) = &self.media {
            out = format!("@media {media}{{{out}}}");
        }
        out
    }

    /// Conditions in effect for an import made by a file that was itself
    /// imported under `self`.
    fn nest(&self, inner: &Self) -> Self {
        fn both(outer: &Option<String>, inner: &Option<String>, f: impl Fn(&str, &str) -> String) -> Option<String> {
            match (outer, inner) {
                (Some(a), Some(b)) => Some(f(a.as_str(), b.as_str())),
                (a, b) => a.clone().or_else(|| b.clone()),
            }
        }

        Self {
            layer: both(&self.layer, &inner.layer, |a, b| {
                if a.is_empty() || b.is_empty() { String::new() } else { format!("{a}.{b}") }
            }),
            supports: both(&self.supports, &inner.supports, |a, b| format!("({a}) and ({b})")),
            media: both(&self.media, &inner.media, |a, b| {
                a.split(',')
                    .flat_map(|outer| b.split(',').map(move |inner| format!("{} and {}", outer.trim(), inner.trim())))
                    .collect::<Vec<_>>()
                    .join(", ")
            }),
        }
    }

    /// Append the conditions in `@import` syntax, each preceded by a space.
    fn write_prelude(&self, out: &mut String) {
        match self.layer.as_deref() {
            Some("") => out.push_str(" layer"),
            Some(layer) => out.push_str(&format!(" layer({layer})")),
            None => {}
        }
        if let Some(supports) = &self.supports {
            out.push_str(&format!(" supports({supports})"));
        }
        if let Some(media) = &self.media {
            out.push(' ');
            out.push_str(media);
        }
    }
}

// ============================================================================
// Inliner
// ============================================================================

/// State of one inlining run.
struct Inliner<'a> {
    options: &'a ImportOptions,
    load_paths: Vec<PathBuf>,
    max_depth: usize,
    /// Files currently being inlined, outermost first, with the conditions
    /// in effect for each.
    stack: Vec<(PathBuf, Conditions)>,
    /// Files already inlined, per set of conditions.
    seen: FxHashSet<(PathBuf, Conditions)>,
    /// Remote imports moved to the top of the output.
    hoisted: Vec<String>,
}

/// A parsed `@import` statement.
struct ImportRule<'s> {
    target: String,
    /// The target as written (`"x"`, `url(x)`).
    target_src: &'s str,
    conditions: Conditions,
}

/// Output of [`Inliner::inline`].
#[derive(Debug)]
struct Inlined {
    text: String,
    /// Byte offset in `text` past any leading `@charset` and remote imports.
    head: usize,
}

impl<'a> Inliner<'a> {
    fn new(options: &'a ImportOptions, load_paths: Vec<PathBuf>, max_depth: usize, entry: PathBuf) -> Self {
        let mut seen = FxHashSet::default();
        seen.insert((entry.clone(), Conditions::default()));
        Self {
            options,
            load_paths,
            max_depth,
            stack: vec![(entry, Conditions::default())],
            seen,
            hoisted: Vec::new(),
        }
    }

    fn current_conditions(&self) -> Conditions {
        self.stack.last().map(|(_, c)| c.clone()).unwrap_or_default()
    }

    /// Inline the top-level imports of `source`, which lives at `path`.
    fn inline(&mut self, source: &str, path: &Path, nested: bool) -> Result<Inlined, StageError> {
        let syntax = |e: SyntaxError| StageError::from(e.with_path(path));
        let tokens = tokenize(source).map_err(syntax)?;

        let mut out = String::with_capacity(source.len());
        let mut copied = 0;
        let mut depth = 0usize;
        let mut head: Option<usize> = None;
        let mut after_rules = false;
        let mut i = 0;

        while let Some(&tok) = tokens.get(i) {
            i += 1;
            let here = out.len() + tok.offset - copied;
            match tok.kind {
                TokenKind::Delim(b'{') => depth += 1,
                TokenKind::Delim(b'}') => depth = depth.saturating_sub(1),
                TokenKind::AtKeyword if depth == 0 => {
                    let name = tok.at_name().unwrap_or_default();
                    let is_import = name.eq_ignore_ascii_case("import");
                    if !is_import && !name.eq_ignore_ascii_case("charset") {
                        head.get_or_insert(here);
                        after_rules = true;
                        continue;
                    }

                    let (end, stmt_end) = statement_end(source, &tokens, i).map_err(syntax)?;
                    let body = &tokens[i..end];
                    i = end + 1;

                    let replacement = if is_import {
                        let rule = parse_import(source, tok, body).map_err(syntax)?;
                        if is_remote(&rule.target) {
                            // Leading remote imports of the entry are already in place.
                            if !nested && head.is_none() {
                                continue;
                            }
                            self.hoist(&rule);
                            String::new()
                        } else {
                            if after_rules {
                                log::warn!(
                                    "{}: @import \"{}\" follows other rules; inlining anyway",
                                    path.display(),
                                    rule.target
                                );
                            }
                            head.get_or_insert(here);
                            self.import(&rule, path)?
                        }
                    } else if nested {
                        // `@charset` is only valid at the start of the entry file.
                        String::new()
                    } else {
                        continue;
                    };

                    out.push_str(&source[copied..tok.offset]);
                    out.push_str(&replacement);
                    copied = stmt_end;
                }
                TokenKind::Whitespace | TokenKind::Comment | TokenKind::Delim(b';') => {}
                _ if depth == 0 => {
                    head.get_or_insert(here);
                    after_rules = true;
                }
                _ => {}
            }
        }

        out.push_str(&source[copied..]);
        let head = head.unwrap_or(out.len());
        Ok(Inlined { text: out, head })
    }

    /// Queue a remote import for the top of the output, under the
    /// conditions of every import that led to it.
    fn hoist(&mut self, rule: &ImportRule<'_>) {
        let mut statement = format!("@import {}", rule.target_src);
        self.current_conditions().nest(&rule.conditions).write_prelude(&mut statement);
        statement.push_str(";\n");
        if !self.hoisted.contains(&statement) {
            self.hoisted.push(statement);
        }
    }

    /// Resolve and inline one import, returning the replacement text.
    fn import(&mut self, rule: &ImportRule<'_>, importer: &Path) -> Result<String, StageError> {
        let files = self.resolve(&rule.target, importer)?;
        let conditions = self.current_conditions().nest(&rule.conditions);
        let mut content = String::new();

        for file in files {
            if let Some(pos) = self.stack.iter().position(|(p, _)| *p == file) {
                let mut chain: Vec<PathBuf> = self.stack[pos..].iter().map(|(p, _)| p.clone()).collect();
                chain.push(file);
                return Err(StageError::ImportCycle { chain });
            }
            if self.options.skip_duplicates && !self.seen.insert((file.clone(), conditions.clone())) {
                log::debug!("skipping duplicate import of {}", file.display());
                continue;
            }
            if self.stack.len() > self.max_depth {
                return Err(StageError::ImportDepth {
                    limit: self.max_depth,
                    path: file,
                });
            }

            log::debug!("inlining {} into {}", file.display(), importer.display());
            let source = read_source(&file)?;
            self.stack.push((file.clone(), conditions.clone()));
            let inlined = self.inline(&source, &file, true)?;
            self.stack.pop();

            content.push_str(&inlined.text);
            terminate(&mut content);
        }

        if content.trim().is_empty() {
            return Ok(content);
        }
        Ok(rule.conditions.wrap(content))
    }

    /// Find the files an import target refers to.
    fn resolve(&self, target: &str, importer: &Path) -> Result<Vec<PathBuf>, StageError> {
        let dir = importer.parent().unwrap_or(Path::new(""));
        let bases: Vec<&Path> = std::iter::once(dir)
            .chain(self.load_paths.iter().map(PathBuf::as_path))
            .collect();

        let candidates = self.candidates(target);
        if let Some(found) = bases
            .iter()
            .find_map(|base| candidates.iter().find_map(|c| locate(&base.join(c))))
        {
            return Ok(vec![found]);
        }

        // A file literally named `a[1].css` wins over the pattern.
        #[cfg(feature = "glob")]
        if is_glob(target) {
            return self.expand_glob(target, &bases, importer);
        }

        Err(StageError::UnresolvedImport {
            target: target.to_string(),
            importer: importer.to_path_buf(),
        })
    }

    /// Candidate relative paths for a target, in lookup order.
    fn candidates(&self, target: &str) -> Vec<PathBuf> {
        let with_ext = |name: &str| -> Vec<String> {
            if self.has_extension(name) {
                Vec::new()
            } else {
                self.options.extensions.iter().map(|ext| format!("{name}{ext}")).collect()
            }
        };

        let mut out = vec![PathBuf::from(target)];
        out.extend(with_ext(target).into_iter().map(PathBuf::from));

        let target_path = Path::new(target);
        if let Some(prefix) = &self.options.prefix
            && let Some(name) = target_path.file_name().and_then(|n| n.to_str())
            && !name.starts_with(prefix.as_str())
        {
            let prefixed = format!("{prefix}{name}");
            out.push(target_path.with_file_name(&prefixed));
            out.extend(
                with_ext(&prefixed)
                    .into_iter()
                    .map(|name| target_path.with_file_name(name)),
            );
        }
        out
    }

    fn has_extension(&self, name: &str) -> bool {
        self.options.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
    }

    #[cfg(feature = "glob")]
    fn expand_glob(&self, target: &str, bases: &[&Path], importer: &Path) -> Result<Vec<PathBuf>, StageError> {
        for base in bases {
            let Some(base) = base.to_str() else {
                continue;
            };
            // Only the import target is a pattern, never the directory.
            let pattern = Path::new(&glob::Pattern::escape(base)).join(target);
            let Some(pattern) = pattern.to_str() else {
                continue;
            };
            let paths = glob::glob(pattern)
                .map_err(|e| StageError::custom(format!("invalid import pattern `{target}`: {e}")))?;

            let mut matches: Vec<PathBuf> = paths
                .filter_map(Result::ok)
                .filter(|p| self.has_extension(target) || p.to_str().is_some_and(|s| self.has_extension(s)))
                .filter_map(|p| locate(&p))
                .collect();
            if !matches.is_empty() {
                matches.sort();
                matches.dedup();
                return Ok(matches);
            }
        }

        Err(StageError::UnresolvedImport {
            target: target.to_string(),
            importer: importer.to_path_buf(),
        })
    }
}

// ============================================================================
// Statement Parsing
// ============================================================================

/// Find the `;` ending the statement whose tokens start at `start`.
///
/// Returns the index of the `;` (or `tokens.len()` at EOF) and the byte
/// offset just past the statement.
fn statement_end(source: &str, tokens: &[Token<'_>], start: usize) -> Result<(usize, usize), SyntaxError> {
    for (i, tok) in tokens.iter().enumerate().skip(start) {
        match tok.kind {
            TokenKind::Delim(b';') => return Ok((i, tok.end())),
            TokenKind::Delim(b'{' | b'}') => {
                return Err(SyntaxError::at(source, tok.offset, "expected `;` to end statement"));
            }
            _ => {}
        }
    }
    Ok((tokens.len(), source.len()))
}

/// Parse `"x" conditions`, `url(x) conditions` or `url("x") conditions`.
fn parse_import<'s>(source: &'s str, at: Token<'s>, body: &[Token<'s>]) -> Result<ImportRule<'s>, SyntaxError> {
    let body = trim_trivia(body);
    let missing = || SyntaxError::at(source, at.offset, "expected import target");
    let first = body.first().ok_or_else(missing)?;

    let (target, target_end, rest) = match first.kind {
        TokenKind::String => (unquote(first.text), first.end(), &body[1..]),
        TokenKind::Url => (unquote(first.text[4..first.text.len() - 1].trim()), first.end(), &body[1..]),
        TokenKind::Word if first.text.eq_ignore_ascii_case("url") => {
            let inner: Vec<&Token<'s>> = body[1..].iter().filter(|t| !t.is_trivia()).take(3).collect();
            match inner.as_slice() {
                [open, string, close]
                    if open.is_delim(b'(') && string.kind == TokenKind::String && close.is_delim(b')') =>
                {
                    let close_idx = body.iter().position(|t| t.offset == close.offset).unwrap_or(body.len() - 1);
                    (unquote(string.text), close.end(), &body[close_idx + 1..])
                }
                _ => return Err(missing()),
            }
        }
        _ => return Err(missing()),
    };

    Ok(ImportRule {
        target: target.to_string(),
        target_src: &source[first.offset..target_end],
        conditions: parse_conditions(source, rest)?,
    })
}

/// Split `layer`/`layer(x)`, `supports(...)` and the media query list.
fn parse_conditions(source: &str, tokens: &[Token<'_>]) -> Result<Conditions, SyntaxError> {
    let mut conditions = Conditions::default();
    let mut rest = trim_trivia(tokens);

    if let Some(first) = rest.first()
        && first.kind == TokenKind::Word
        && first.text.eq_ignore_ascii_case("layer")
    {
        if rest.get(1).is_some_and(|t| t.is_delim(b'(')) {
            let close = closing_paren(source, rest, 1)?;
            let name = slice(source, &rest[2..close]);
            if name.is_empty() {
                return Err(SyntaxError::at(source, first.offset, "expected layer name"));
            }
            conditions.layer = Some(name);
            rest = trim_trivia(&rest[close + 1..]);
        } else {
            conditions.layer = Some(String::new());
            rest = trim_trivia(&rest[1..]);
        }
    }

    if let Some(first) = rest.first()
        && first.kind == TokenKind::Word
        && first.text.eq_ignore_ascii_case("supports")
        && rest.get(1).is_some_and(|t| t.is_delim(b'('))
    {
        let close = closing_paren(source, rest, 1)?;
        conditions.supports = Some(slice(source, &rest[2..close]));
        rest = trim_trivia(&rest[close + 1..]);
    }

    if !rest.is_empty() {
        conditions.media = Some(slice(source, rest));
    }
    Ok(conditions)
}

/// Index of the `)` matching the `(` at `open`.
fn closing_paren(source: &str, tokens: &[Token<'_>], open: usize) -> Result<usize, SyntaxError> {
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate().skip(open) {
        match tok.kind {
            TokenKind::Delim(b'(') => depth += 1,
            TokenKind::Delim(b')') => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
    }
    Err(SyntaxError::at(source, tokens[open].offset, "unclosed `(`"))
}

/// Source text covered by `tokens`, without surrounding trivia.
fn slice(source: &str, tokens: &[Token<'_>]) -> String {
    let tokens = trim_trivia(tokens);
    match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => source[first.offset..last.end()].to_string(),
        _ => String::new(),
    }
}

fn unquote(text: &str) -> &str {
    let bytes = text.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(&q @ (b'"' | b'\'')), Some(&end)) if text.len() >= 2 && q == end => &text[1..text.len() - 1],
        _ => text,
    }
}

fn is_remote(target: &str) -> bool {
    REMOTE_PREFIXES.iter().any(|p| target.starts_with(p))
}

#[cfg(feature = "glob")]
fn is_glob(target: &str) -> bool {
    target.contains(['*', '?', '['])
}

/// Make sure inlined content cannot swallow the text that follows it.
fn terminate(content: &mut String) {
    let trimmed = content.trim_end();
    if !(trimmed.is_empty() || trimmed.ends_with('}') || trimmed.ends_with(';') || trimmed.ends_with("*/")) {
        content.push(';');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::file::{clear_source_cache, MapVirtualFS, VirtualFsGuard};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn inline(entry: &Path, content: &str) -> Result<String, StageError> {
        clear_source_cache();
        ImportInline::default()
            .apply(Document::new(entry, content))
            .map(Document::into_content)
    }

    #[test]
    fn test_options() {
        let mut options = StageOptions::new();
        options.insert("path".into(), json!("vendor"));
        options.insert("extensions".into(), json!(["css", ".pcss"]));
        options.insert("prefix".into(), json!(false));
        options.insert("skip_duplicates".into(), json!(false));

        let stage = ImportInline::from_options(&options).unwrap();
        assert_eq!(
            stage.options(),
            &ImportOptions {
                load_paths: vec![PathBuf::from("vendor")],
                extensions: vec![".css".into(), ".pcss".into()],
                prefix: None,
                skip_duplicates: false,
            }
        );

        let mut unknown = StageOptions::new();
        unknown.insert("root".into(), json!("."));
        assert!(ImportInline::from_options(&unknown).is_err());
        assert_eq!(
            ImportInline::from_options(&StageOptions::new()).unwrap().options(),
            &ImportOptions::default()
        );
    }

    #[test]
    fn test_inline_basic() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.css", ".x{margin:0;}");
        let entry = dir.path().join("main.css");

        let output = inline(&entry, "@import 'a.css'; body{color:red;}").unwrap();
        assert_eq!(output, ".x{margin:0;} body{color:red;}");
    }

    #[test]
    fn test_target_forms_and_resolution() {
        let dir = TempDir::new().unwrap();
        write(&dir, "plain.css", "p{}");
        write(&dir, "_partial.css", "q{}");
        write(&dir, "sub/nested.css", "@import \"../plain\";\nr{}");
        let entry = dir.path().join("main.css");

        let output = inline(
            &entry,
            "@import url(partial);\n@import url( \"sub/nested.css\" );\n@import \"plain.css\";",
        )
        .unwrap();
        // plain.css is inlined once: through sub/nested.css
        assert_eq!(output, "q{}\np{}\nr{}\n");
    }

    #[test]
    fn test_media_and_charset() {
        let dir = TempDir::new().unwrap();
        write(&dir, "print.css", "@charset \"utf-8\";\na{color:black}");
        let entry = dir.path().join("main.css");

        let output = inline(&entry, "@charset \"utf-8\";\n@import 'print' print, screen and (min-width: 1px);").unwrap();
        assert_eq!(
            output,
            "@charset \"utf-8\";\n@media print, screen and (min-width: 1px){\na{color:black}}"
        );
    }

    #[test]
    fn test_remote_and_nested_imports_untouched() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("main.css");
        let source = "@import url(https://fonts.example/x.css);\n@supports (display:grid) { @import 'y.css'; }";
        assert_eq!(inline(&entry, source).unwrap(), source);
    }

    #[test]
    fn test_unresolved() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("main.css");
        let err = inline(&entry, "@import 'missing.css';").unwrap_err();
        assert!(matches!(err, StageError::UnresolvedImport { ref target, .. } if target == "missing.css"));
    }

    #[test]
    fn test_cycle() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.css", "@import 'b';");
        write(&dir, "b.css", "@import 'a';");
        let entry = write(&dir, "main.css", "@import 'a';");

        let err = inline(&entry, "@import 'a';").unwrap_err();
        let StageError::ImportCycle { chain } = err else {
            panic!("expected cycle, got {err:?}");
        };
        let names: Vec<_> = chain.iter().map(|p| p.file_name().unwrap().to_str().unwrap()).collect();
        assert_eq!(names, ["a.css", "b.css", "a.css"]);
    }

    #[test]
    fn test_self_import_is_cycle() {
        let dir = TempDir::new().unwrap();
        let entry = write(&dir, "main.css", "@import 'main.css';");
        let err = inline(&entry, "@import 'main.css';").unwrap_err();
        assert!(matches!(err, StageError::ImportCycle { .. }));
    }

    #[test]
    fn test_duplicates() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.css", "a{}");
        let entry = dir.path().join("main.css");

        assert_eq!(inline(&entry, "@import 'a';@import 'a';").unwrap(), "a{}");

        let mut options = ImportOptions::default();
        options.skip_duplicates = false;
        let output = ImportInline::new(options)
            .apply(Document::new(&entry, "@import 'a';@import 'a';"))
            .unwrap();
        assert_eq!(output.content(), "a{}a{}");
    }

    #[test]
    fn test_load_paths() {
        let dir = TempDir::new().unwrap();
        write(&dir, "vendor/_reset.css", "*{margin:0}");
        let entry = dir.path().join("src/main.css");

        let options = ImportOptions {
            load_paths: vec![dir.path().join("vendor")],
            ..ImportOptions::default()
        };
        let output = ImportInline::new(options)
            .apply(Document::new(&entry, "@import 'reset';"))
            .unwrap();
        assert_eq!(output.content(), "*{margin:0}");
    }

    #[test]
    fn test_statement_without_target() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("main.css");
        let err = inline(&entry, "a{}\n@import ;").unwrap_err();
        let syntax = err.syntax().unwrap();
        assert_eq!((syntax.line, syntax.column), (2, 1));
    }

    #[test]
    fn test_unterminated_import_content() {
        let dir = TempDir::new().unwrap();
        write(&dir, "tail.css", "@layer base");
        let entry = dir.path().join("main.css");
        assert_eq!(inline(&entry, "@import 'tail';a{}").unwrap(), "@layer base;a{}");
    }

    #[test]
    fn test_remote_imports_are_hoisted() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.css", "a{x:y}");
        write(&dir, "b.css", "@import url(https://fonts.example/f.css);\nb{x:y}");
        write(&dir, "tail.css", "@import 'https://x/y.css'");
        let entry = dir.path().join("main.css");

        let output = inline(&entry, "@charset \"utf-8\";\n@import 'a';\n@import 'b' print;\nc{x:y}").unwrap();
        assert_eq!(
            output,
            "@charset \"utf-8\";\n@import url(https://fonts.example/f.css) print;\na{x:y}\n@media print{\nb{x:y}}\nc{x:y}"
        );

        let output = inline(&entry, "@import 'tail';\na{}\n@import url(//cdn.example/z.css);").unwrap();
        assert_eq!(output, "@import 'https://x/y.css';\n@import url(//cdn.example/z.css);\n\na{}\n");
    }

    #[test]
    fn test_layer_and_supports_conditions() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.css", "a{x:y}");
        let entry = dir.path().join("main.css");

        assert_eq!(inline(&entry, "@import 'a' layer(base);").unwrap(), "@layer base{a{x:y}}");
        assert_eq!(inline(&entry, "@import 'a' layer;").unwrap(), "@layer{a{x:y}}");
        assert_eq!(
            inline(&entry, "@import url(a.css) supports(display:grid) screen;").unwrap(),
            "@media screen{@supports (display:grid){a{x:y}}}"
        );
        assert_eq!(
            inline(&entry, "@import 'a' layer(x.y) supports(not (display: grid));").unwrap(),
            "@supports (not (display: grid)){@layer x.y{a{x:y}}}"
        );

        let err = inline(&entry, "@import 'a' layer();").unwrap_err();
        assert!(err.syntax().is_some());
    }

    #[test]
    fn test_nested_conditions_reach_hoisted_imports() {
        let dir = TempDir::new().unwrap();
        write(&dir, "outer.css", "@import 'inner' (min-width: 1px);");
        write(&dir, "inner.css", "@import url(https://x/f.css) layer(fonts) screen;\ni{}");
        let entry = dir.path().join("main.css");

        let output = inline(&entry, "@import 'outer' layer(site) print, tv;").unwrap();
        assert_eq!(
            output,
            "@import url(https://x/f.css) layer(site.fonts) \
             print and (min-width: 1px) and screen, tv and (min-width: 1px) and screen;\n\
             @media print, tv{@layer site{@media (min-width: 1px){\ni{}}}}"
        );
    }

    #[test]
    fn test_duplicates_keyed_on_conditions() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.css", "a{}");
        let entry = dir.path().join("main.css");

        assert_eq!(
            inline(&entry, "@import 'a' print;@import 'a' screen;").unwrap(),
            "@media print{a{}}@media screen{a{}}"
        );
        assert_eq!(inline(&entry, "@import 'a' print;@import 'a' print;").unwrap(), "@media print{a{}}");
        assert_eq!(inline(&entry, "@import 'a';@import 'a' layer(x);").unwrap(), "a{}@layer x{a{}}");
    }

    #[test]
    fn test_depth_limit() {
        let dir = TempDir::new().unwrap();
        for i in 0..4 {
            write(&dir, &format!("f{i}.css"), &format!("@import 'f{}';", i + 1));
        }
        write(&dir, "f4.css", "a{}");
        let entry = dir.path().join("main.css");

        let options = ImportOptions::default();
        let mut inliner = Inliner::new(&options, Vec::new(), 2, entry.clone());
        let err = inliner.inline("@import 'f0';", &entry, false).unwrap_err();
        assert!(matches!(err, StageError::ImportDepth { limit: 2, .. }));
    }

    #[cfg(feature = "glob")]
    #[test]
    fn test_glob() {
        let dir = TempDir::new().unwrap();
        write(&dir, "parts/b.css", "b{}");
        write(&dir, "parts/a.css", "a{}");
        write(&dir, "parts/notes.txt", "ignored");
        let entry = dir.path().join("main.css");

        assert_eq!(inline(&entry, "@import 'parts/*';").unwrap(), "a{}b{}");
    }

    #[cfg(feature = "glob")]
    #[test]
    fn test_literal_file_wins_over_pattern() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a[1].css", "literal{}");
        write(&dir, "a1.css", "pattern{}");
        let entry = dir.path().join("main.css");

        assert_eq!(inline(&entry, "@import 'a[1].css';").unwrap(), "literal{}");
        assert_eq!(inline(&entry, "@import 'a[1]';").unwrap(), "literal{}");
    }

    #[test]
    fn test_virtual_files() {
        let mut vfs = MapVirtualFS::new();
        vfs.insert("virtual-import/main.css", "@import 'theme';");
        vfs.insert("virtual-import/_theme.css", ":root{--c:red}");
        let _guard = VirtualFsGuard::install(vfs);

        let output = inline(Path::new("virtual-import/main.css"), "@import 'theme';").unwrap();
        assert_eq!(output, ":root{--c:red}");
    }
}
