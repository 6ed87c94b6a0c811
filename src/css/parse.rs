//! Block-structure parser.
//!
//! Builds a tree of rules, at-rules and declarations on top of the token
//! stream. Blocks are parsed generically: an item ending in `{` is a rule or
//! at-rule with a block, an item ending in `;` or `}` is a declaration or an
//! at-rule statement. This covers nested `@media`, `@supports`, `@keyframes`
//! and `@font-face` without knowing each at-rule's grammar.

use super::token::{tokenize, trim_trivia, Token, TokenKind};
use crate::diagnostic::SyntaxError;

/// A parsed stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet<'a> {
    /// Top-level items in source order.
    pub nodes: Vec<Node<'a>>,
}

/// An item in a stylesheet or block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<'a> {
    /// `selector { ... }`
    Rule {
        /// Selector tokens, trimmed.
        selector: Vec<Token<'a>>,
        /// Block contents.
        block: Vec<Node<'a>>,
    },
    /// `@name prelude { ... }` or `@name prelude;`
    AtRule {
        /// The at-keyword token.
        name: Token<'a>,
        /// Prelude tokens, trimmed.
        prelude: Vec<Token<'a>>,
        /// Block contents, `None` for statements.
        block: Option<Vec<Node<'a>>>,
    },
    /// `property: value`
    Declaration {
        /// Property tokens, trimmed.
        property: Vec<Token<'a>>,
        /// Value tokens, trimmed.
        value: Vec<Token<'a>>,
    },
    /// A comment between items.
    Comment(Token<'a>),
}

/// Parse a stylesheet.
///
/// Fails on tokenizer errors, unbalanced brackets, stray `}`, unclosed
/// blocks and declarations without a `:`.
pub fn parse(source: &str) -> Result<Stylesheet<'_>, SyntaxError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
    };
    let nodes = parser.items(None)?;
    Ok(Stylesheet { nodes })
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    #[inline]
    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> SyntaxError {
        SyntaxError::at(self.source, offset, message)
    }

    /// Parse items until EOF (top level) or the `}` closing the block opened
    /// at `open`.
    fn items(&mut self, open: Option<usize>) -> Result<Vec<Node<'a>>, SyntaxError> {
        let mut nodes = Vec::new();
        loop {
            let Some(tok) = self.peek() else {
                return match open {
                    Some(offset) => Err(self.error(offset, "unclosed block")),
                    None => Ok(nodes),
                };
            };

            match tok.kind {
                TokenKind::Whitespace | TokenKind::Delim(b';') => self.pos += 1,
                TokenKind::Comment => {
                    nodes.push(Node::Comment(tok));
                    self.pos += 1;
                }
                TokenKind::Delim(b'}') => {
                    self.pos += 1;
                    return match open {
                        Some(_) => Ok(nodes),
                        None => Err(self.error(tok.offset, "unexpected `}`")),
                    };
                }
                _ => nodes.push(self.item(open.is_some())?),
            }
        }
    }

    fn item(&mut self, nested: bool) -> Result<Node<'a>, SyntaxError> {
        let mut brackets: Vec<Token<'a>> = Vec::new();
        let mut prelude: Vec<Token<'a>> = Vec::new();

        while let Some(tok) = self.peek() {
            match tok.kind {
                TokenKind::Delim(b'(' | b'[') => brackets.push(tok),
                TokenKind::Delim(close @ (b')' | b']')) => {
                    let expected = if close == b')' { b'(' } else { b'[' };
                    match brackets.pop() {
                        Some(open) if open.is_delim(expected) => {}
                        Some(open) => {
                            return Err(self.error(open.offset, format!("unclosed `{}`", open.text)));
                        }
                        None => {
                            return Err(self.error(tok.offset, format!("unexpected `{}`", tok.text)));
                        }
                    }
                }
                TokenKind::Delim(b'{' | b'}' | b';') => {
                    if let Some(open) = brackets.last() {
                        return Err(self.error(open.offset, format!("unclosed `{}`", open.text)));
                    }
                    if tok.is_delim(b'{') {
                        self.pos += 1;
                        let block = self.items(Some(tok.offset))?;
                        return Ok(block_node(prelude, block));
                    }
                    break;
                }
                _ => {}
            }
            prelude.push(tok);
            self.pos += 1;
        }

        if let Some(open) = brackets.last() {
            return Err(self.error(open.offset, format!("unclosed `{}`", open.text)));
        }
        if self.peek().is_some_and(|t| t.is_delim(b';')) {
            self.pos += 1;
        }
        self.statement_node(prelude, nested)
    }

    fn statement_node(&self, tokens: Vec<Token<'a>>, nested: bool) -> Result<Node<'a>, SyntaxError> {
        let tokens = trim_trivia(&tokens);
        let first = tokens[0];

        if first.kind == TokenKind::AtKeyword {
            return Ok(Node::AtRule {
                name: first,
                prelude: trim_trivia(&tokens[1..]).to_vec(),
                block: None,
            });
        }

        if !nested {
            let end = tokens.last().map_or(first.end(), Token::end);
            return Err(self.error(end, "expected `{` after selector"));
        }

        let Some(colon) = tokens.iter().position(|t| t.is_delim(b':')) else {
            return Err(self.error(first.offset, "expected `:` in declaration"));
        };
        let property = trim_trivia(&tokens[..colon]);
        if property.is_empty() {
            return Err(self.error(first.offset, "missing property name"));
        }

        Ok(Node::Declaration {
            property: property.to_vec(),
            value: trim_trivia(&tokens[colon + 1..]).to_vec(),
        })
    }
}

fn block_node<'a>(prelude: Vec<Token<'a>>, block: Vec<Node<'a>>) -> Node<'a> {
    let prelude = trim_trivia(&prelude);
    match prelude.first() {
        Some(first) if first.kind == TokenKind::AtKeyword => Node::AtRule {
            name: *first,
            prelude: trim_trivia(&prelude[1..]).to_vec(),
            block: Some(block),
        },
        _ => Node::Rule {
            selector: prelude.to_vec(),
            block,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token<'_>]) -> String {
        tokens.iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_rule_with_declarations() {
        let sheet = parse("a , b { color : red ; margin:0 }").unwrap();
        assert_eq!(sheet.nodes.len(), 1);
        let Node::Rule { selector, block } = &sheet.nodes[0] else {
            panic!("expected rule");
        };
        assert_eq!(texts(selector), "a , b");
        assert_eq!(block.len(), 2);
        let Node::Declaration { property, value } = &block[0] else {
            panic!("expected declaration");
        };
        assert_eq!(texts(property), "color");
        assert_eq!(texts(value), "red");
    }

    #[test]
    fn test_nested_at_rule() {
        let sheet = parse("@media screen and (min-width: 1px) { a :hover { x: y } }").unwrap();
        let Node::AtRule { name, prelude, block: Some(block) } = &sheet.nodes[0] else {
            panic!("expected at-rule with block");
        };
        assert_eq!(name.at_name(), Some("media"));
        assert_eq!(texts(prelude), "screen and (min-width: 1px)");
        let Node::Rule { selector, .. } = &block[0] else {
            panic!("expected nested rule");
        };
        assert_eq!(texts(selector), "a :hover");
    }

    #[test]
    fn test_statement_at_rule() {
        let sheet = parse("@charset \"utf-8\"; @import url(a.css) print").unwrap();
        assert_eq!(sheet.nodes.len(), 2);
        assert!(matches!(&sheet.nodes[1], Node::AtRule { block: None, .. }));
    }

    #[test]
    fn test_colon_in_parens_value() {
        let sheet = parse("a{background:url(data:image/png;base64,AA)}").unwrap();
        let Node::Rule { block, .. } = &sheet.nodes[0] else {
            panic!("expected rule");
        };
        let Node::Declaration { value, .. } = &block[0] else {
            panic!("expected declaration");
        };
        assert_eq!(texts(value), "url(data:image/png;base64,AA)");
    }

    #[test]
    fn test_comments_kept_between_items() {
        let sheet = parse("/*! license */ a{}").unwrap();
        assert!(matches!(&sheet.nodes[0], Node::Comment(t) if t.is_important_comment()));
    }

    #[test]
    fn test_unclosed_block() {
        let err = parse("a {\n  color: red;\n").unwrap_err();
        assert_eq!(err.message, "unclosed block");
        assert_eq!((err.line, err.column), (1, 3));
    }

    #[test]
    fn test_stray_close_brace() {
        let err = parse("a{}}").unwrap_err();
        assert_eq!(err.message, "unexpected `}`");
        assert_eq!(err.column, 4);
    }

    #[test]
    fn test_unbalanced_parens() {
        let err = parse("a{width:calc(1px + 2px}").unwrap_err();
        assert_eq!(err.message, "unclosed `(`");

        let err = parse("a{width:1px)}").unwrap_err();
        assert_eq!(err.message, "unexpected `)`");
    }

    #[test]
    fn test_missing_colon() {
        let err = parse("a{color red}").unwrap_err();
        assert_eq!(err.message, "expected `:` in declaration");
    }

    #[test]
    fn test_top_level_junk() {
        let err = parse("body").unwrap_err();
        assert_eq!(err.message, "expected `{` after selector");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").unwrap().nodes.is_empty());
        assert!(parse("  ;; ").unwrap().nodes.is_empty());
    }
}
