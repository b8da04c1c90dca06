//! Validated command types.
//!
//! A `ValidatedCommand` is built once per candidate batch by the static
//! validator and never mutated. Each surviving operation keeps its parsed
//! syntax tree so later stages (required-import inference, delete-target
//! inspection) never re-parse the source.

use gantry_contracts::operation::Operation;
use tree_sitter::Node;

/// A retained parse tree plus the exact source it was parsed from.
#[derive(Debug, Clone)]
pub struct ScriptTree {
    tree: tree_sitter::Tree,
    source: String,
}

impl ScriptTree {
    pub(crate) fn new(tree: tree_sitter::Tree, source: String) -> Self {
        Self { tree, source }
    }

    /// The root node of the syntax tree.
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// The source text the tree was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// One operation that passed schema and syntax screening.
#[derive(Debug, Clone)]
pub struct ValidatedOperation {
    /// The original operation fields, unchanged.
    pub operation: Operation,
    /// The retained parse tree of `operation.code`.
    pub syntax: ScriptTree,
}

/// The result of batch-level structural validation.
///
/// When `valid` is false, `errors` explains why and `operations` is empty.
#[derive(Debug, Clone)]
pub struct ValidatedCommand {
    pub valid: bool,
    pub operations: Vec<ValidatedOperation>,
    /// Capability names the translator declared. Metadata only: executable
    /// assembly derives imports from the syntax trees instead.
    pub imports: Vec<String>,
    pub requires_confirmation: bool,
    /// Translator's difficulty estimate, clamped to 0..=10.
    pub estimated_complexity: u8,
    pub errors: Vec<String>,
}

impl ValidatedCommand {
    /// An invalid command carrying only its rejection reasons.
    pub fn invalid(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            operations: Vec::new(),
            imports: Vec::new(),
            requires_confirmation: false,
            estimated_complexity: 0,
            errors,
        }
    }
}
