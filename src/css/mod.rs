//! CSS syntax shared by the built-in transforms.
//!
//! - [`tokenize`] - Lossless token stream with byte offsets
//! - [`parse`] - Block tree of rules, at-rules and declarations

mod parse;
mod token;

pub use parse::{parse, Node, Stylesheet};
pub use token::{tokenize, trim_trivia, Token, TokenKind};
