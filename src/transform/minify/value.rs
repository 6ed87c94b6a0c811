//! Whitespace-minimal serialization of token lists, plus the word-level
//! value optimizations of the `default` preset.

use crate::css::{Token, TokenKind};

/// Where a token list appears; decides which spaces are significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Context {
    /// A rule selector. Space before `:` is a descendant combinator.
    Selector,
    /// An at-rule prelude. `and (` must keep its space.
    Prelude,
    /// A declaration property.
    Property,
    /// A declaration value.
    Value,
}

/// Serialization settings for one token list.
#[derive(Debug, Clone, Copy)]
pub(super) struct Join {
    pub context: Context,
    /// Apply number/color/keyword optimizations (values only).
    pub optimize: bool,
}

/// Serialize tokens with the minimum whitespace that keeps their meaning.
pub(super) fn join(tokens: &[Token<'_>], settings: Join) -> String {
    let mut out = String::new();
    let mut prev: Option<Token<'_>> = None;
    let mut pending_space = false;
    let mut depth = 0usize;

    for tok in tokens {
        if tok.is_trivia() {
            // In a selector only real whitespace is a combinator.
            pending_space |= tok.kind == TokenKind::Whitespace || settings.context != Context::Selector;
            continue;
        }

        if let Some(prev) = prev
            && pending_space
            && needs_space(prev, *tok, settings.context)
        {
            out.push(' ');
        }
        pending_space = false;

        match tok.kind {
            TokenKind::Url => out.push_str(&normalize_url(tok.text)),
            TokenKind::Word if settings.optimize && settings.context == Context::Value => {
                let after_bang = prev.is_some_and(|p| p.is_delim(b'!'));
                out.push_str(&optimize_word(tok.text, depth, after_bang));
            }
            _ => out.push_str(tok.text),
        }

        match tok.kind {
            TokenKind::Delim(b'(' | b'[') => depth += 1,
            TokenKind::Delim(b')' | b']') => depth = depth.saturating_sub(1),
            _ => {}
        }
        prev = Some(*tok);
    }

    out
}

/// Whether whitespace between `prev` and `next` must be kept.
fn needs_space(prev: Token<'_>, next: Token<'_>, context: Context) -> bool {
    const ALWAYS: &[u8] = b"{};,";

    let prev_delim = match prev.kind {
        TokenKind::Delim(c) => Some(c),
        _ => None,
    };
    let next_delim = match next.kind {
        TokenKind::Delim(c) => Some(c),
        _ => None,
    };

    if prev_delim.is_some_and(|c| ALWAYS.contains(&c)) || next_delim.is_some_and(|c| ALWAYS.contains(&c)) {
        return false;
    }

    match context {
        Context::Selector => {
            !(matches!(prev_delim, Some(b'>' | b'+' | b'~' | b'(' | b'[' | b':'))
                || matches!(next_delim, Some(b'>' | b'+' | b'~' | b')' | b']')))
        }
        Context::Prelude => {
            !(matches!(prev_delim, Some(b'(' | b':')) || matches!(next_delim, Some(b')' | b':')))
        }
        Context::Property => false,
        Context::Value => {
            !(matches!(prev_delim, Some(b'(' | b'/' | b'!' | b':'))
                || matches!(next_delim, Some(b')' | b'/' | b'!' | b':')))
        }
    }
}

/// `url(  a.png )` → `url(a.png)`.
fn normalize_url(text: &str) -> String {
    let inner = &text[4..text.len() - 1];
    format!("{}({})", &text[..3], inner.trim())
}

/// Optimize a single word in a declaration value.
fn optimize_word(word: &str, depth: usize, after_bang: bool) -> String {
    if after_bang {
        return word.to_ascii_lowercase();
    }
    if let Some(hex) = word.strip_prefix('#') {
        return shorten_hex(hex).map_or_else(|| word.to_string(), |h| format!("#{h}"));
    }
    minify_number(word, depth == 0).unwrap_or_else(|| word.to_string())
}

/// Lowercase and shorten a hex color (`AABBCC` → `abc`). `None` if the
/// word is not a hex color.
fn shorten_hex(hex: &str) -> Option<String> {
    if !matches!(hex.len(), 3 | 4 | 6 | 8) || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let lower = hex.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    if matches!(bytes.len(), 6 | 8) && bytes.chunks(2).all(|pair| pair[0] == pair[1]) {
        return Some(bytes.chunks(2).map(|pair| pair[0] as char).collect());
    }
    Some(lower)
}

const LENGTH_UNITS: &[&str] = &[
    "px", "em", "rem", "ex", "ch", "vw", "vh", "vmin", "vmax", "cm", "mm", "q", "in", "pt", "pc",
];

/// Minify a number or dimension. `None` if the word is not one.
///
/// - `0.50` → `.5`, `-0.5em` → `-.5em`, `10.0px` → `10px`
/// - zero lengths drop their unit when `strip_zero_unit` is set
///   (unitless zero is invalid inside `calc()` and friends)
fn minify_number(word: &str, strip_zero_unit: bool) -> Option<String> {
    let bytes = word.as_bytes();
    let mut i = 0;

    let sign = match bytes.first() {
        Some(b'+' | b'-') => {
            i = 1;
            &word[..1]
        }
        _ => "",
    };

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_part = &word[int_start..i];

    let mut frac_part = "";
    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        i = frac_start;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        frac_part = &word[frac_start..i];
        if frac_part.is_empty() {
            return None;
        }
    }

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let unit = &word[i..];
    if !(unit.is_empty() || unit == "%" || unit.bytes().all(|b| b.is_ascii_alphabetic())) {
        return None;
    }

    let int_trimmed = int_part.trim_start_matches('0');
    let frac_trimmed = frac_part.trim_end_matches('0');

    if int_trimmed.is_empty() && frac_trimmed.is_empty() {
        let is_length = LENGTH_UNITS.iter().any(|u| unit.eq_ignore_ascii_case(u));
        let unit = if strip_zero_unit && is_length { "" } else { unit };
        return Some(format!("0{unit}"));
    }

    let mut out = String::with_capacity(word.len());
    out.push_str(sign);
    out.push_str(int_trimmed);
    if !frac_trimmed.is_empty() {
        out.push('.');
        out.push_str(frac_trimmed);
    }
    out.push_str(unit);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::tokenize;

    fn join_str(source: &str, context: Context, optimize: bool) -> String {
        let tokens = tokenize(source).unwrap();
        join(&tokens, Join { context, optimize })
    }

    #[test]
    fn test_selector_spaces() {
        assert_eq!(join_str("a  >  .b ,  c + d ~ e", Context::Selector, false), "a>.b,c+d~e");
        assert_eq!(join_str("a :hover", Context::Selector, false), "a :hover");
        assert_eq!(join_str("a:not( .b , .c )", Context::Selector, false), "a:not(.b,.c)");
        assert_eq!(join_str("a * b", Context::Selector, false), "a * b");
        assert_eq!(join_str("[ href ]", Context::Selector, false), "[href]");
        assert_eq!(join_str(".a/**/.b", Context::Selector, false), ".a.b");
        assert_eq!(join_str("a/* c */:hover", Context::Selector, false), "a:hover");
        assert_eq!(join_str("a /* c */ b", Context::Selector, false), "a b");
        assert_eq!(join_str("1px/**/solid", Context::Value, false), "1px solid");
    }

    #[test]
    fn test_prelude_spaces() {
        assert_eq!(
            join_str("screen  and ( min-width : 100px ) ,  print", Context::Prelude, false),
            "screen and (min-width:100px),print"
        );
        assert_eq!(join_str("not (display: grid)", Context::Prelude, false), "not (display:grid)");
    }

    #[test]
    fn test_value_spaces() {
        assert_eq!(join_str("12px / 1.5  sans-serif", Context::Value, false), "12px/1.5 sans-serif");
        assert_eq!(join_str("calc( 1px + 2px )", Context::Value, false), "calc(1px + 2px)");
        assert_eq!(join_str("red ! important", Context::Value, false), "red!important");
        assert_eq!(join_str("rgb(0 , 0 , 0)", Context::Value, false), "rgb(0,0,0)");
        assert_eq!(join_str("url(  a.png  )", Context::Value, false), "url(a.png)");
    }

    #[test]
    fn test_value_optimizations() {
        assert_eq!(join_str("0px 0.50em 10.0px -0.5px", Context::Value, true), "0 .5em 10px -.5px");
        assert_eq!(join_str("calc(0px + 1px)", Context::Value, true), "calc(0px + 1px)");
        assert_eq!(join_str("0%", Context::Value, true), "0%");
        assert_eq!(join_str("#AABBCC #FfF #abcd12", Context::Value, true), "#abc #fff #abcd12");
        assert_eq!(join_str("red !IMPORTANT", Context::Value, true), "red!important");
        assert_eq!(join_str("rgba(0,0,0,0.5)", Context::Value, true), "rgba(0,0,0,.5)");
    }

    #[test]
    fn test_value_optimization_leaves_non_numbers() {
        assert_eq!(join_str("h1 e3 1e3 1.5.5 x2", Context::Value, true), "h1 e3 1e3 1.5.5 x2");
        assert_eq!(join_str("\"0.50\"", Context::Value, true), "\"0.50\"");
    }

    #[test]
    fn test_minify_number() {
        assert_eq!(minify_number("007", true).as_deref(), Some("7"));
        assert_eq!(minify_number("-0.0px", true).as_deref(), Some("0"));
        assert_eq!(minify_number("+.50", true).as_deref(), Some("+.5"));
        assert_eq!(minify_number("0deg", true).as_deref(), Some("0deg"));
        assert_eq!(minify_number("1.", true), None);
        assert_eq!(minify_number("px", true), None);
    }

    #[test]
    fn test_shorten_hex() {
        assert_eq!(shorten_hex("FFFFFF").as_deref(), Some("fff"));
        assert_eq!(shorten_hex("11223344").as_deref(), Some("1234"));
        assert_eq!(shorten_hex("xyz"), None);
        assert_eq!(shorten_hex("12345"), None);
    }
}
