//! Derived analyses over validated operations.
//!
//! These utilities work on the retained syntax trees: inferring the minimal
//! set of capability modules a batch actually references, synthesizing the
//! import preamble, assembling final executable code, inferring delete
//! targets, and estimating execution time. The translator's own `imports`
//! field is never trusted for assembly; the trees are the source of truth.

use std::collections::BTreeSet;
use std::time::Duration;

use gantry_contracts::error::{GantryError, GantryResult};
use tree_sitter::Node;

use crate::command::{ValidatedCommand, ValidatedOperation};
use crate::screen::{attribute_name, is_allowed_module, node_text};

/// Hard ceiling on the heuristic execution-time estimate.
const MAX_ESTIMATED_SECS: f64 = 30.0;

/// The minimal set of allowed-module names referenced by the operations.
///
/// Any identifier in any tree whose text is an allowed module counts as a
/// reference; this covers both bare names and attribute roots like
/// `Arch.makeWall`.
pub fn referenced_modules(operations: &[ValidatedOperation]) -> BTreeSet<String> {
    let mut modules = BTreeSet::new();
    for op in operations {
        collect_identifiers(op.syntax.root(), op.syntax.source(), &mut modules);
    }
    modules
}

fn collect_identifiers(node: Node<'_>, source: &str, modules: &mut BTreeSet<String>) {
    if node.kind() == "identifier" {
        let name = node_text(node, source);
        if is_allowed_module(name) {
            modules.insert(name.to_string());
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_identifiers(child, source, modules);
    }
}

/// Synthesize `import` declarations for the given module set.
pub fn import_statements(modules: &BTreeSet<String>) -> String {
    modules
        .iter()
        .filter(|m| is_allowed_module(m))
        .map(|m| format!("import {}", m))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Assemble complete executable code for a validated command: synthesized
/// import preamble followed by each operation's code under a description
/// comment.
///
/// # Errors
///
/// Returns `GantryError::InvalidCommand` when the command failed validation.
pub fn assemble_executable(cmd: &ValidatedCommand) -> GantryResult<String> {
    if !cmd.valid {
        return Err(GantryError::InvalidCommand {
            reason: "cannot assemble executable code from an invalid command".to_string(),
        });
    }
    if cmd.operations.is_empty() {
        return Ok(String::new());
    }

    let preamble = import_statements(&referenced_modules(&cmd.operations));

    let mut blocks = Vec::new();
    for op in &cmd.operations {
        blocks.push(format!("# {}", op.operation.description));
        blocks.push(op.operation.code.clone());
        blocks.push(String::new());
    }

    Ok(format!("{}\n\n{}", preamble, blocks.join("\n"))
        .trim()
        .to_string())
}

/// Infer which objects a delete operation targets.
///
/// Prefers the operation's own `affected_objects`. Otherwise scans the tree
/// for removal-style attribute calls (`removeObject`, `delete`) with a
/// literal string first argument. Falls back to `["unknown"]` so downstream
/// checks stay conservative rather than treating inference failure as "no
/// targets".
pub fn infer_delete_targets(op: &ValidatedOperation) -> Vec<String> {
    if !op.operation.affected_objects.is_empty() {
        return op.operation.affected_objects.clone();
    }

    let mut targets = Vec::new();
    collect_removal_arguments(op.syntax.root(), op.syntax.source(), &mut targets);

    if targets.is_empty() {
        targets.push("unknown".to_string());
    }
    targets
}

fn collect_removal_arguments(node: Node<'_>, source: &str, targets: &mut Vec<String>) {
    if node.kind() == "call" {
        let is_removal = node
            .child_by_field_name("function")
            .filter(|f| f.kind() == "attribute")
            .and_then(|f| attribute_name(f, source))
            .map(|name| name == "removeObject" || name == "delete")
            .unwrap_or(false);

        if is_removal {
            if let Some(arg) = first_string_argument(node, source) {
                targets.push(arg);
            }
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_removal_arguments(child, source, targets);
    }
}

/// The literal text of a call's first argument, when it is a string.
fn first_string_argument(call: Node<'_>, source: &str) -> Option<String> {
    let arguments = call.child_by_field_name("arguments")?;
    let mut cursor = arguments.walk();
    let first = arguments.named_children(&mut cursor).next()?;
    if first.kind() != "string" {
        return None;
    }

    let mut content_cursor = first.walk();
    for child in first.named_children(&mut content_cursor) {
        if child.kind() == "string_content" {
            return Some(node_text(child, source).to_string());
        }
    }
    // Empty string literal or exotic quoting: strip the quote characters.
    Some(
        node_text(first, source)
            .trim_matches(|c| c == '\'' || c == '"')
            .to_string(),
    )
}

/// Heuristic wall-clock estimate: half a second per complexity point per
/// operation, capped at 30 seconds.
pub fn estimate_execution_time(cmd: &ValidatedCommand) -> Duration {
    let complexity = cmd.estimated_complexity.max(1) as f64;
    let estimated = complexity * cmd.operations.len() as f64 * 0.5;
    Duration::from_secs_f64(estimated.min(MAX_ESTIMATED_SECS))
}
