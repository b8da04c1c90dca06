//! # gantry-syntax
//!
//! The static validator: the first gate of the Gantry pipeline.
//!
//! ## Overview
//!
//! Candidate batches arrive as untrusted JSON from the translator
//! collaborator. This crate checks the batch shape, parses every
//! operation's code into a syntax tree (the host's scripting surface is
//! Python), and rejects operations that call forbidden functions or import
//! forbidden modules. Imports outside the allow-list and dunder attribute
//! access are warnings, not errors.
//!
//! The screen is purely analytic: no document is ever touched. Accepted
//! operations retain their parse trees so later stages can infer required
//! imports and inspect delete targets without re-parsing.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use gantry_syntax::StaticValidator;
//!
//! let mut validator = StaticValidator::new()?;
//! let command = validator.validate_and_parse(&candidate_json);
//! if !command.valid {
//!     eprintln!("rejected: {:?}", command.errors);
//! }
//! ```

pub mod analyze;
pub mod command;
pub mod parse;
pub mod screen;
pub mod validator;

pub use analyze::{
    assemble_executable, estimate_execution_time, import_statements, infer_delete_targets,
    referenced_modules,
};
pub use command::{ScriptTree, ValidatedCommand, ValidatedOperation};
pub use screen::{ALLOWED_MODULES, FORBIDDEN_FUNCTIONS, FORBIDDEN_MODULES};
pub use validator::StaticValidator;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use gantry_contracts::operation::OpKind;
    use serde_json::{json, Value};

    use crate::analyze::{
        assemble_executable, estimate_execution_time, import_statements, infer_delete_targets,
        referenced_modules,
    };
    use crate::validator::StaticValidator;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn validator() -> StaticValidator {
        StaticValidator::new().expect("script grammar must load")
    }

    /// A candidate batch with the given operations and no declared imports.
    fn candidate(operations: Value) -> Value {
        json!({ "operations": operations, "imports": [] })
    }

    /// One raw operation with sensible defaults.
    fn op(code: &str, kind: &str, affected: &[&str]) -> Value {
        json!({
            "code": code,
            "description": "test operation",
            "type": kind,
            "affected_objects": affected,
        })
    }

    // ── Happy path ────────────────────────────────────────────────────────────

    #[test]
    fn test_valid_create_operation() {
        let mut v = validator();
        let cmd = v.validate_and_parse(&candidate(json!([op(
            "wall = Arch.makeWall(None, 200, 20, 300)",
            "create",
            &[]
        )])));

        assert!(cmd.valid, "errors: {:?}", cmd.errors);
        assert_eq!(cmd.operations.len(), 1);
        assert_eq!(cmd.operations[0].operation.kind, OpKind::Create);
        assert!(cmd.errors.is_empty());
    }

    #[test]
    fn test_empty_batch_is_valid_with_no_operations() {
        let mut v = validator();
        let cmd = v.validate_and_parse(&candidate(json!([])));

        assert!(cmd.valid);
        assert!(cmd.operations.is_empty());
    }

    #[test]
    fn test_complexity_is_clamped_to_ten() {
        let mut v = validator();
        let cmd = v.validate_and_parse(&json!({
            "operations": [op("x = 1", "query", &[])],
            "imports": [],
            "estimated_complexity": 42,
        }));

        assert!(cmd.valid);
        assert_eq!(cmd.estimated_complexity, 10);
    }

    // ── Translator failure ────────────────────────────────────────────────────

    #[test]
    fn test_translator_error_is_immediately_invalid() {
        let mut v = validator();
        let cmd = v.validate_and_parse(&json!({ "error": "model returned malformed output" }));

        assert!(!cmd.valid);
        assert_eq!(cmd.errors, vec!["model returned malformed output"]);
        assert!(cmd.operations.is_empty());
    }

    // ── Batch shape ───────────────────────────────────────────────────────────

    #[test]
    fn test_missing_operations_field() {
        let mut v = validator();
        let cmd = v.validate_and_parse(&json!({ "imports": [] }));

        assert!(!cmd.valid);
        assert!(cmd
            .errors
            .iter()
            .any(|e| e.contains("missing required field: operations")));
    }

    #[test]
    fn test_operations_must_be_a_list() {
        let mut v = validator();
        let cmd = v.validate_and_parse(&json!({ "operations": "not a list", "imports": [] }));

        assert!(!cmd.valid);
        assert!(cmd.errors.iter().any(|e| e.contains("must be a list")));
    }

    #[test]
    fn test_operation_missing_code_field() {
        let mut v = validator();
        let cmd = v.validate_and_parse(&candidate(json!([{
            "description": "incomplete",
            "type": "create",
            "affected_objects": [],
        }])));

        assert!(!cmd.valid);
        assert!(cmd
            .errors
            .iter()
            .any(|e| e.contains("operation missing required field: code")));
    }

    #[test]
    fn test_invalid_operation_type_is_rejected() {
        let mut v = validator();
        let cmd = v.validate_and_parse(&candidate(json!([op("x = 1", "destroy", &[])])));

        assert!(!cmd.valid);
        assert!(cmd
            .errors
            .iter()
            .any(|e| e.contains("invalid operation type: destroy")));
    }

    // ── Capability screening ──────────────────────────────────────────────────

    /// Core security test: blacklisted calls never survive validation.
    #[test]
    fn test_forbidden_function_call_is_rejected() {
        let mut v = validator();
        let cmd = v.validate_and_parse(&candidate(json!([op(
            "eval('__import__(\"os\")')",
            "query",
            &[]
        )])));

        assert!(!cmd.valid);
        assert!(cmd
            .errors
            .iter()
            .any(|e| e.contains("forbidden function call: eval")));
    }

    #[test]
    fn test_forbidden_module_import_is_rejected() {
        let mut v = validator();
        let cmd = v.validate_and_parse(&candidate(json!([op(
            "import os\nos.getcwd()",
            "query",
            &[]
        )])));

        assert!(!cmd.valid);
        assert!(cmd
            .errors
            .iter()
            .any(|e| e.contains("forbidden module import: os")));
    }

    #[test]
    fn test_forbidden_from_import_is_rejected() {
        let mut v = validator();
        let cmd = v.validate_and_parse(&candidate(json!([op(
            "from subprocess import run",
            "query",
            &[]
        )])));

        assert!(!cmd.valid);
        assert!(cmd
            .errors
            .iter()
            .any(|e| e.contains("forbidden module import: subprocess")));
    }

    /// Unknown-but-not-dangerous imports are tolerated with a warning.
    #[test]
    fn test_unrecognized_import_warns_but_does_not_block() {
        let mut v = validator();
        let cmd = v.validate_and_parse(&candidate(json!([op(
            "import math\nx = 1",
            "query",
            &[]
        )])));

        assert!(cmd.valid, "errors: {:?}", cmd.errors);
        assert_eq!(cmd.operations.len(), 1);
    }

    /// Dunder attribute access is a heuristic signal, logged but not blocked.
    #[test]
    fn test_dunder_attribute_access_is_not_blocked() {
        let mut v = validator();
        let cmd = v.validate_and_parse(&candidate(json!([op(
            "t = doc.__class__",
            "query",
            &[]
        )])));

        assert!(cmd.valid, "errors: {:?}", cmd.errors);
    }

    #[test]
    fn test_syntax_error_is_rejected_with_location() {
        let mut v = validator();
        let cmd = v.validate_and_parse(&candidate(json!([op("def broken(", "create", &[])])));

        assert!(!cmd.valid);
        assert!(cmd
            .errors
            .iter()
            .any(|e| e.contains("syntax error in code")));
    }

    /// A non-empty batch in which every operation was dropped is invalid.
    #[test]
    fn test_all_operations_rejected_invalidates_batch() {
        let mut v = validator();
        let cmd = v.validate_and_parse(&candidate(json!([
            op("exec('pass')", "query", &[]),
            op("import socket", "query", &[]),
        ])));

        assert!(!cmd.valid);
        assert!(cmd.operations.is_empty());
        assert!(!cmd.errors.is_empty());
    }

    /// A batch with one bad and one good operation stays executable; the bad
    /// operation's errors are still reported.
    #[test]
    fn test_partially_valid_batch_keeps_surviving_operations() {
        let mut v = validator();
        let cmd = v.validate_and_parse(&candidate(json!([
            op("exec('pass')", "query", &[]),
            op("box = Part.makeBox(10, 10, 10)", "create", &[]),
        ])));

        assert!(cmd.valid);
        assert_eq!(cmd.operations.len(), 1);
        assert!(cmd
            .errors
            .iter()
            .any(|e| e.contains("forbidden function call: exec")));
    }

    // ── Derived analyses ──────────────────────────────────────────────────────

    #[test]
    fn test_referenced_modules_from_trees() {
        let mut v = validator();
        let cmd = v.validate_and_parse(&candidate(json!([op(
            "w = Arch.makeWall(None, 200, 20, 300)\nPart.show(w)",
            "create",
            &[]
        )])));

        let modules = referenced_modules(&cmd.operations);
        assert!(modules.contains("Arch"));
        assert!(modules.contains("Part"));
        assert_eq!(modules.len(), 2);
    }

    #[test]
    fn test_import_statements_are_sorted() {
        let modules = ["Part", "Arch"]
            .iter()
            .map(|s| s.to_string())
            .collect::<std::collections::BTreeSet<_>>();

        assert_eq!(import_statements(&modules), "import Arch\nimport Part");
    }

    #[test]
    fn test_assemble_executable_includes_preamble_and_descriptions() {
        let mut v = validator();
        let cmd = v.validate_and_parse(&candidate(json!([op(
            "w = Arch.makeWall(None, 200, 20, 300)",
            "create",
            &[]
        )])));

        let code = assemble_executable(&cmd).unwrap();
        assert!(code.starts_with("import Arch"));
        assert!(code.contains("# test operation"));
        assert!(code.contains("Arch.makeWall"));
    }

    #[test]
    fn test_assemble_executable_rejects_invalid_command() {
        let mut v = validator();
        let cmd = v.validate_and_parse(&json!({ "error": "nope" }));

        let result = assemble_executable(&cmd);
        match result {
            Err(gantry_contracts::error::GantryError::InvalidCommand { .. }) => {}
            other => panic!("expected InvalidCommand, got {:?}", other),
        }
    }

    #[test]
    fn test_delete_targets_prefer_affected_objects() {
        let mut v = validator();
        let cmd = v.validate_and_parse(&candidate(json!([op(
            "doc.removeObject('Window001')",
            "delete",
            &["Door001"]
        )])));

        assert_eq!(infer_delete_targets(&cmd.operations[0]), vec!["Door001"]);
    }

    #[test]
    fn test_delete_targets_inferred_from_removal_call() {
        let mut v = validator();
        let cmd = v.validate_and_parse(&candidate(json!([op(
            "doc.removeObject('Window001')",
            "delete",
            &[]
        )])));

        assert_eq!(infer_delete_targets(&cmd.operations[0]), vec!["Window001"]);
    }

    #[test]
    fn test_delete_targets_fall_back_to_unknown() {
        let mut v = validator();
        let cmd = v.validate_and_parse(&candidate(json!([op(
            "count = len(doc.Objects)",
            "delete",
            &[]
        )])));

        assert_eq!(infer_delete_targets(&cmd.operations[0]), vec!["unknown"]);
    }

    #[test]
    fn test_execution_time_estimate_is_capped() {
        let mut v = validator();
        let ops: Vec<Value> = (0..20).map(|_| op("x = 1", "query", &[])).collect();
        let cmd = v.validate_and_parse(&json!({
            "operations": ops,
            "imports": [],
            "estimated_complexity": 10,
        }));

        let estimate = estimate_execution_time(&cmd);
        assert_eq!(estimate.as_secs(), 30);
    }
}
