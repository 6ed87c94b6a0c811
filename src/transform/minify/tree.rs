//! Owned, minified stylesheet tree and the structural passes over it.

use rustc_hash::FxHashSet;

use super::value::{join, Context, Join};
use super::Preset;
use crate::css::Node;

/// A node whose selectors, preludes and values are already minified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum MinNode {
    Rule {
        selector: String,
        body: Vec<MinNode>,
    },
    AtRule {
        /// Lowercased name without `@`.
        name: String,
        /// `@name prelude`
        head: String,
        body: Option<Vec<MinNode>>,
    },
    Declaration {
        property: String,
        value: String,
    },
    Comment(String),
}

/// At-rules whose adjacent blocks can be merged when their heads match.
const MERGEABLE_AT_RULES: &[&str] = &["media", "supports", "layer", "container"];

// ============================================================================
// Building
// ============================================================================

/// Convert parsed nodes, dropping ordinary comments.
pub(super) fn build(nodes: &[Node<'_>], preset: Preset) -> Vec<MinNode> {
    nodes.iter().filter_map(|node| build_node(node, preset)).collect()
}

fn build_node(node: &Node<'_>, preset: Preset) -> Option<MinNode> {
    let plain = |context| Join {
        context,
        optimize: false,
    };

    let built = match node {
        Node::Comment(tok) => {
            if !tok.is_important_comment() {
                return None;
            }
            MinNode::Comment(tok.text.to_string())
        }
        Node::Rule { selector, block } => MinNode::Rule {
            selector: join(selector, plain(Context::Selector)),
            body: build(block, preset),
        },
        Node::AtRule {
            name,
            prelude,
            block,
        } => {
            let prelude = join(prelude, plain(Context::Prelude));
            let head = if prelude.is_empty() {
                name.text.to_string()
            } else {
                format!("{} {}", name.text, prelude)
            };
            MinNode::AtRule {
                name: name.at_name().unwrap_or_default().to_ascii_lowercase(),
                head,
                body: block.as_ref().map(|b| build(b, preset)),
            }
        }
        Node::Declaration { property, value } => {
            let property = join(property, plain(Context::Property));
            let optimize = preset >= Preset::Default && !property.starts_with("--");
            let value = join(
                value,
                Join {
                    context: Context::Value,
                    optimize,
                },
            );
            MinNode::Declaration { property, value }
        }
    };
    Some(built)
}

// ============================================================================
// Passes
// ============================================================================

/// Remove rules and at-rule blocks with nothing inside, innermost first.
pub(super) fn drop_empty(nodes: Vec<MinNode>) -> Vec<MinNode> {
    nodes
        .into_iter()
        .filter_map(|node| match node {
            MinNode::Rule { selector, body } => {
                let body = drop_empty(body);
                (!body.is_empty()).then_some(MinNode::Rule { selector, body })
            }
            MinNode::AtRule {
                name,
                head,
                body: Some(body),
            } => {
                let body = drop_empty(body);
                (!body.is_empty()).then_some(MinNode::AtRule {
                    name,
                    head,
                    body: Some(body),
                })
            }
            other => Some(other),
        })
        .collect()
}

/// Merge adjacent rules with identical selectors (and adjacent grouping
/// at-rules with identical heads), then drop exact duplicate declarations.
pub(super) fn merge_adjacent(nodes: Vec<MinNode>) -> Vec<MinNode> {
    let mut merged: Vec<MinNode> = Vec::with_capacity(nodes.len());

    for node in nodes {
        if let Some(last) = merged.last_mut()
            && let Some(target) = mergeable_body(last, &node)
        {
            target.extend(into_body(node));
            continue;
        }
        merged.push(node);
    }

    for node in &mut merged {
        match node {
            MinNode::Rule { body, .. }
            | MinNode::AtRule {
                body: Some(body), ..
            } => {
                let children = std::mem::take(body);
                *body = dedupe_declarations(merge_adjacent(children));
            }
            _ => {}
        }
    }

    merged
}

fn mergeable_body<'a>(last: &'a mut MinNode, next: &MinNode) -> Option<&'a mut Vec<MinNode>> {
    match (last, next) {
        (MinNode::Rule { selector: a, body }, MinNode::Rule { selector: b, .. }) if *a == *b => {
            Some(body)
        }
        // Anonymous `@layer{}` blocks are distinct layers.
        (
            MinNode::AtRule {
                name,
                head: a,
                body: Some(body),
            },
            MinNode::AtRule {
                head: b,
                body: Some(_),
                ..
            },
        ) if *a == *b && a.contains(' ') && MERGEABLE_AT_RULES.contains(&name.as_str()) => Some(body),
        _ => None,
    }
}

fn into_body(node: MinNode) -> Vec<MinNode> {
    match node {
        MinNode::Rule { body, .. } => body,
        MinNode::AtRule { body, .. } => body.unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Keep only the last of several identical `property:value` pairs.
fn dedupe_declarations(body: Vec<MinNode>) -> Vec<MinNode> {
    let mut seen: FxHashSet<(String, String)> = FxHashSet::default();
    let mut kept: Vec<MinNode> = body
        .into_iter()
        .rev()
        .filter(|node| match node {
            MinNode::Declaration { property, value } => {
                seen.insert((property.to_ascii_lowercase(), value.clone()))
            }
            _ => true,
        })
        .collect();
    kept.reverse();
    kept
}

// ============================================================================
// Writing
// ============================================================================

/// Serialize nodes. Semicolons only separate items; the last declaration
/// of a block gets none.
pub(super) fn write(nodes: &[MinNode], out: &mut String, top_level: bool) {
    for (i, node) in nodes.iter().enumerate() {
        let has_next = i + 1 < nodes.len();
        match node {
            MinNode::Rule { selector, body } => {
                out.push_str(selector);
                write_block(body, out);
            }
            MinNode::AtRule {
                head,
                body: Some(body),
                ..
            } => {
                out.push_str(head);
                write_block(body, out);
            }
            MinNode::AtRule {
                head, body: None, ..
            } => {
                out.push_str(head);
                if has_next || top_level {
                    out.push(';');
                }
            }
            MinNode::Declaration { property, value } => {
                out.push_str(property);
                out.push(':');
                out.push_str(value);
                if has_next {
                    out.push(';');
                }
            }
            MinNode::Comment(text) => out.push_str(text),
        }
    }
}

fn write_block(body: &[MinNode], out: &mut String) {
    out.push('{');
    write(body, out, false);
    out.push('}');
}
