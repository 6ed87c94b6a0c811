//! CSS tokenizer.
//!
//! Produces a flat, lossless token stream: concatenating the `text` of every
//! token reproduces the input exactly. Numbers, identifiers, hashes and
//! dimensions are all [`TokenKind::Word`]s; consumers that care about their
//! shape inspect the text.

use crate::diagnostic::SyntaxError;

/// Kind of a CSS token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A run of whitespace.
    Whitespace,
    /// `/* ... */`
    Comment,
    /// A quoted string, quotes included.
    String,
    /// An unquoted `url(...)`, including `url(` and `)`.
    Url,
    /// `@name`
    AtKeyword,
    /// Identifiers, numbers, dimensions, hashes and anything else.
    Word,
    /// One of `{ } ( ) [ ] : ; , > + ~ * / !`.
    Delim(u8),
}

/// A token borrowing its text from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// The token kind.
    pub kind: TokenKind,
    /// The exact source text.
    pub text: &'a str,
    /// Byte offset of the token in the source.
    pub offset: usize,
}

impl<'a> Token<'a> {
    /// Check if this is the given delimiter.
    #[inline]
    pub fn is_delim(&self, c: u8) -> bool {
        self.kind == TokenKind::Delim(c)
    }

    /// Check if this token is whitespace or a comment.
    #[inline]
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::Comment)
    }

    /// Byte offset just past the token.
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }

    /// The at-rule name without `@`, for at-keywords.
    pub fn at_name(&self) -> Option<&'a str> {
        match self.kind {
            TokenKind::AtKeyword => Some(&self.text[1..]),
            _ => None,
        }
    }

    /// Check if this is an important comment (`/*! ... */`).
    pub fn is_important_comment(&self) -> bool {
        self.kind == TokenKind::Comment && self.text.starts_with("/*!")
    }
}

const DELIMS: &[u8] = b"{}()[]:;,>+~*/!";

#[inline]
fn is_delim(b: u8) -> bool {
    DELIMS.contains(&b)
}

#[inline]
fn is_word_byte(b: u8) -> bool {
    !(b.is_ascii_whitespace() || is_delim(b) || b == b'"' || b == b'\'')
}

/// Tokenize a stylesheet.
///
/// Fails on unterminated comments, strings and `url(...)`.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, SyntaxError> {
    let mut lexer = Lexer {
        src: source,
        bytes: source.as_bytes(),
        pos: 0,
    };
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn next_token(&mut self) -> Result<Option<Token<'a>>, SyntaxError> {
        let start = self.pos;
        let Some(&b) = self.bytes.get(start) else {
            return Ok(None);
        };

        let kind = match b {
            b if b.is_ascii_whitespace() => {
                while self.peek(0).is_some_and(|b| b.is_ascii_whitespace()) {
                    self.pos += 1;
                }
                TokenKind::Whitespace
            }
            b'/' if self.peek(1) == Some(b'*') => {
                self.comment(start)?;
                TokenKind::Comment
            }
            b'"' | b'\'' => {
                self.string(b, start)?;
                TokenKind::String
            }
            b'@' if self.peek(1).is_some_and(|b| is_word_byte(b) || b == b'\\') => {
                self.pos += 1;
                self.word();
                TokenKind::AtKeyword
            }
            b if is_delim(b) => {
                self.pos += 1;
                TokenKind::Delim(b)
            }
            _ => {
                self.word();
                if self.src[start..self.pos].eq_ignore_ascii_case("url") && self.peek(0) == Some(b'(') {
                    self.unquoted_url(start)?
                } else {
                    TokenKind::Word
                }
            }
        };

        Ok(Some(Token {
            kind,
            text: &self.src[start..self.pos],
            offset: start,
        }))
    }

    #[inline]
    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn word(&mut self) {
        loop {
            match self.peek(0) {
                Some(b'\\') => self.pos = (self.pos + 2).min(self.bytes.len()),
                Some(b) if is_word_byte(b) => self.pos += 1,
                _ => break,
            }
        }
        // An escape may have stepped into a multi-byte character.
        while !self.src.is_char_boundary(self.pos) {
            self.pos += 1;
        }
    }

    fn comment(&mut self, start: usize) -> Result<(), SyntaxError> {
        match self.src[start + 2..].find("*/") {
            Some(i) => {
                self.pos = start + 2 + i + 2;
                Ok(())
            }
            None => Err(SyntaxError::at(self.src, start, "unterminated comment")),
        }
    }

    fn string(&mut self, quote: u8, start: usize) -> Result<(), SyntaxError> {
        self.pos = start + 1;
        loop {
            match self.peek(0) {
                Some(b) if b == quote => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(b'\\') => self.pos += 2,
                Some(b'\n') | None => {
                    return Err(SyntaxError::at(self.src, start, "unterminated string"));
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Handle `url(` after the `url` word. Quoted URLs are left to the
    /// regular tokens (`url`, `(`, string, `)`).
    fn unquoted_url(&mut self, start: usize) -> Result<TokenKind, SyntaxError> {
        let mut ahead = 1;
        while self.peek(ahead).is_some_and(|b| b.is_ascii_whitespace()) {
            ahead += 1;
        }
        if matches!(self.peek(ahead), Some(b'"' | b'\'')) {
            return Ok(TokenKind::Word);
        }

        self.pos += ahead;
        loop {
            match self.peek(0) {
                Some(b')') => {
                    self.pos += 1;
                    return Ok(TokenKind::Url);
                }
                Some(b'\\') => self.pos += 2,
                Some(_) => self.pos += 1,
                None => return Err(SyntaxError::at(self.src, start, "unterminated url()")),
            }
        }
    }
}

/// Strip leading and trailing whitespace/comment tokens.
pub fn trim_trivia<'s, 'a>(tokens: &'s [Token<'a>]) -> &'s [Token<'a>] {
    let start = tokens.iter().position(|t| !t.is_trivia()).unwrap_or(tokens.len());
    let end = tokens.iter().rposition(|t| !t.is_trivia()).map_or(start, |i| i + 1);
    &tokens[start..end]
}
