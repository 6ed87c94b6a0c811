//! Human-readable rendering of build errors.

use std::error::Error;
use std::fmt::Write;

use super::error::{DriverError, PipelineError, SyntaxError};

// ============================================================================
// Options
// ============================================================================

/// Layout of a rendered error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayStyle {
    /// Header, the offending source line and a caret under the column.
    #[default]
    Rich,
    /// A single `path:line:col: message` line, as editors and CI parse it.
    Short,
}

/// How [`format_error`] renders a failure.
///
/// ```ignore
/// use css_batch::diagnostic::{format_error, DiagnosticOptions};
///
/// // For a log file
/// eprintln!("{}", format_error(&err, &DiagnosticOptions::plain()));
///
/// // For a problem matcher
/// eprintln!("{}", format_error(&err, &DiagnosticOptions::short().with_colored(false)));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticOptions {
    /// Emit ANSI colors. Ignored without the `colored-diagnostics` feature.
    pub colored: bool,
    /// Rich or short layout.
    pub style: DisplayStyle,
    /// Columns a tab in the source snippet expands to.
    pub tab_width: usize,
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        Self::colored()
    }
}

impl DiagnosticOptions {
    /// Rich layout with colors.
    pub fn colored() -> Self {
        Self { colored: true, style: DisplayStyle::Rich, tab_width: 2 }
    }

    /// Rich layout without colors.
    pub fn plain() -> Self {
        Self::colored().with_colored(false)
    }

    /// Short layout with colors.
    pub fn short() -> Self {
        Self::colored().with_style(DisplayStyle::Short)
    }

    /// Toggle colors.
    pub fn with_colored(self, colored: bool) -> Self {
        Self { colored, ..self }
    }

    /// Replace the layout.
    pub fn with_style(self, style: DisplayStyle) -> Self {
        Self { style, ..self }
    }

    /// Replace the tab width.
    pub fn with_tab_width(self, tab_width: usize) -> Self {
        Self { tab_width, ..self }
    }
}

// ============================================================================
// Gutter Characters
// ============================================================================

mod gutter {
    pub const HEADER: &str = "┌─";
    pub const BAR: &str = "│";
    pub const NOTE: &str = "=";
    pub const MARKER: &str = "^";
}

// ============================================================================
// Coloring
// ============================================================================

#[cfg(feature = "colored-diagnostics")]
fn colorize_error(text: &str) -> String {
    use owo_colors::OwoColorize;
    text.red().to_string()
}

#[cfg(feature = "colored-diagnostics")]
fn colorize_help(text: &str) -> String {
    use owo_colors::OwoColorize;
    text.cyan().to_string()
}

#[cfg(not(feature = "colored-diagnostics"))]
fn colorize_error(text: &str) -> String {
    text.to_owned()
}

#[cfg(not(feature = "colored-diagnostics"))]
fn colorize_help(text: &str) -> String {
    text.to_owned()
}

struct Painter {
    colored: bool,
}

impl Painter {
    fn error(&self, text: &str) -> String {
        if self.colored { colorize_error(text) } else { text.to_owned() }
    }

    fn help(&self, text: &str) -> String {
        if self.colored { colorize_help(text) } else { text.to_owned() }
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Format a syntax error with its source snippet.
///
/// Rich style:
///
/// ```text
/// error: unterminated string
///   ┌─ styles/main.css:3:6
///   │
/// 3 │   b: "x
///   │      ^
/// ```
pub fn format_syntax_error(err: &SyntaxError, options: &DiagnosticOptions) -> String {
    let paint = Painter { colored: options.colored };
    let mut out = String::new();
    write_syntax_error(&mut out, err, options, &paint);
    out
}

/// Format any error produced by this crate.
///
/// Syntax errors anywhere in the source chain are rendered with their
/// snippet; the failing stage, if any, is added as a note.
pub fn format_error(err: &(dyn Error + 'static), options: &DiagnosticOptions) -> String {
    let paint = Painter { colored: options.colored };
    let mut out = String::new();

    match find_syntax_error(err) {
        Some(syntax) => {
            write_syntax_error(&mut out, syntax, options, &paint);
            if let Some(stage) = failed_stage(err) {
                let width = line_num_width(syntax);
                _ = writeln!(
                    out,
                    "{:>width$} {} in stage `{}`",
                    "",
                    paint.help(gutter::NOTE),
                    stage,
                );
            }
        }
        None => {
            _ = writeln!(out, "{}: {}", paint.error("error"), err);
        }
    }

    out
}

// ============================================================================
// Rendering
// ============================================================================

fn write_syntax_error(
    out: &mut String,
    err: &SyntaxError,
    options: &DiagnosticOptions,
    paint: &Painter,
) {
    let path = err.display_path();

    if options.style == DisplayStyle::Short {
        _ = writeln!(
            out,
            "{}:{}:{}: {}: {}",
            path,
            err.line,
            err.column,
            paint.error("error"),
            err.message
        );
        return;
    }

    let width = line_num_width(err);
    let (line_text, marker_col) = expand_tabs(&err.snippet, err.column - 1, options.tab_width);

    _ = writeln!(out, "{}: {}", paint.error("error"), err.message);
    _ = writeln!(
        out,
        "{:>width$} {} {}:{}:{}",
        "",
        paint.error(gutter::HEADER),
        path,
        err.line,
        err.column,
    );
    _ = writeln!(out, "{:>width$} {}", "", paint.error(gutter::BAR));
    _ = writeln!(
        out,
        "{} {} {}",
        paint.error(&format!("{:>width$}", err.line)),
        paint.error(gutter::BAR),
        line_text,
    );
    _ = writeln!(
        out,
        "{:>width$} {} {}{}",
        "",
        paint.error(gutter::BAR),
        " ".repeat(marker_col),
        paint.error(gutter::MARKER),
    );
}

fn line_num_width(err: &SyntaxError) -> usize {
    err.line.to_string().len()
}

/// Replace tabs with spaces, returning the new text and the shifted column.
fn expand_tabs(text: &str, column: usize, tab_width: usize) -> (String, usize) {
    let mut expanded = String::with_capacity(text.len());
    let mut marker = column;
    for (i, c) in text.chars().enumerate() {
        if c == '\t' {
            expanded.push_str(&" ".repeat(tab_width));
            if i < column {
                marker += tab_width.saturating_sub(1);
            }
        } else {
            expanded.push(c);
        }
    }
    (expanded, marker)
}

fn find_syntax_error<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a SyntaxError> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(syntax) = e.downcast_ref::<SyntaxError>() {
            return Some(syntax);
        }
        current = e.source();
    }
    None
}

fn failed_stage<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a str> {
    let pipeline = match err.downcast_ref::<DriverError>() {
        Some(DriverError::Pipeline(p)) => Some(p),
        Some(_) => None,
        None => err.downcast_ref::<PipelineError>(),
    };
    pipeline.and_then(PipelineError::stage)
}
