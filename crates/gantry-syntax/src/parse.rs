//! Script parsing on top of tree-sitter.
//!
//! The document host's scripting surface is Python, so candidate code is
//! parsed with the Python grammar. Tree-sitter is error-tolerant: a parse
//! always yields a tree, and syntax errors appear as ERROR or missing nodes
//! inside it. `ScriptParser::parse` converts any such node into a rejection
//! message carrying line, column, and a source snippet.

use gantry_contracts::error::{GantryError, GantryResult};
use tree_sitter::Node;

use crate::command::ScriptTree;

/// A parser configured for the document host's scripting surface.
///
/// Construction loads the grammar and can fail; parsing itself cannot panic.
pub struct ScriptParser {
    inner: tree_sitter::Parser,
}

impl ScriptParser {
    /// Create a parser with the Python grammar loaded.
    pub fn new() -> GantryResult<Self> {
        let mut inner = tree_sitter::Parser::new();
        inner
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| GantryError::Config {
                reason: format!("failed to load script grammar: {}", e),
            })?;
        Ok(Self { inner })
    }

    /// Parse `source` into a retained syntax tree.
    ///
    /// Returns `Err(message)` when the source does not parse cleanly; the
    /// message describes the first error location. Callers treat the message
    /// as a validation finding, not a runtime fault.
    pub fn parse(&mut self, source: &str) -> Result<ScriptTree, String> {
        let tree = match self.inner.parse(source, None) {
            Some(tree) => tree,
            None => return Err("parser produced no syntax tree".to_string()),
        };

        if tree.root_node().has_error() {
            let message = first_error_message(tree.root_node(), source);
            return Err(message);
        }

        Ok(ScriptTree::new(tree, source.to_string()))
    }
}

/// Describe the first ERROR or missing node found in a depth-first walk.
fn first_error_message(node: Node<'_>, source: &str) -> String {
    if node.is_error() || node.is_missing() {
        let start = node.start_position();
        let snippet = error_context(node, source);
        if node.is_missing() {
            return format!(
                "missing {} at line {}, column {}",
                node.kind(),
                start.row + 1,
                start.column + 1
            );
        }
        return format!(
            "syntax error at line {}, column {}: {}",
            start.row + 1,
            start.column + 1,
            snippet
        );
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() || child.is_missing() {
            return first_error_message(child, source);
        }
    }

    // has_error() was set on the parent but no child carries it; report the
    // node itself.
    let start = node.start_position();
    format!(
        "syntax error at line {}, column {}",
        start.row + 1,
        start.column + 1
    )
}

/// The text of the offending node, truncated for readability.
fn error_context(node: Node<'_>, source: &str) -> String {
    let text = node.utf8_text(source.as_bytes()).unwrap_or_default();
    if text.len() > 50 {
        let truncated: String = text.chars().take(47).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}
