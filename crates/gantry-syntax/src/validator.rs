//! The static validator: schema checks plus per-operation syntax screening.
//!
//! This is the first gate of the pipeline. It is purely analytic: nothing
//! here touches a document. Rejections are collected as strings in the
//! returned `ValidatedCommand`, never raised, so the caller sees every
//! problem in one pass.

use gantry_contracts::error::GantryResult;
use gantry_contracts::operation::{OpKind, Operation};
use serde_json::Value;
use tracing::{debug, warn};

use crate::command::{ValidatedCommand, ValidatedOperation};
use crate::parse::ScriptParser;
use crate::screen::screen_tree;

/// Validates candidate batches from the translator collaborator.
///
/// Owns the script parser; construct once per session and reuse.
pub struct StaticValidator {
    parser: ScriptParser,
}

impl StaticValidator {
    /// Create a validator with the script grammar loaded.
    ///
    /// # Errors
    ///
    /// Returns `GantryError::Config` when the grammar cannot be loaded.
    pub fn new() -> GantryResult<Self> {
        Ok(Self {
            parser: ScriptParser::new()?,
        })
    }

    /// Validate and parse one candidate batch.
    ///
    /// The candidate is the translator's raw JSON. A candidate carrying an
    /// `error` field (the translator itself failed) is immediately invalid.
    /// Otherwise the batch shape is checked, then every operation is
    /// individually screened; operations that fail are dropped and their
    /// errors recorded. A non-empty batch in which no operation survives is
    /// itself invalid.
    pub fn validate_and_parse(&mut self, candidate: &Value) -> ValidatedCommand {
        if let Some(err) = candidate.get("error") {
            let message = err
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            return ValidatedCommand::invalid(vec![message]);
        }

        if let Err(errors) = check_batch_shape(candidate) {
            return ValidatedCommand::invalid(errors);
        }

        // Shape-checked above: `operations` exists and is an array.
        let raw_operations = candidate["operations"].as_array().cloned().unwrap_or_default();

        let mut errors = Vec::new();
        let mut operations = Vec::new();
        for raw in &raw_operations {
            match self.validate_operation(raw) {
                Ok(op) => operations.push(op),
                Err(op_errors) => errors.extend(op_errors),
            }
        }

        if operations.is_empty() && !raw_operations.is_empty() {
            if errors.is_empty() {
                errors.push("no valid operations found".to_string());
            }
            return ValidatedCommand::invalid(errors);
        }

        debug!(
            accepted = operations.len(),
            rejected = raw_operations.len() - operations.len(),
            "candidate batch validated"
        );

        let imports = candidate
            .get("imports")
            .and_then(Value::as_array)
            .map(|a| {
                a.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let complexity = candidate
            .get("estimated_complexity")
            .and_then(Value::as_u64)
            .unwrap_or(0)
            .min(10) as u8;

        ValidatedCommand {
            valid: true,
            operations,
            imports,
            requires_confirmation: candidate
                .get("requires_confirmation")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            estimated_complexity: complexity,
            errors,
        }
    }

    /// Screen one raw operation. Returns the rejection reasons on failure.
    fn validate_operation(&mut self, raw: &Value) -> Result<ValidatedOperation, Vec<String>> {
        let mut errors = Vec::new();
        for field in ["code", "description", "type", "affected_objects"] {
            if raw.get(field).is_none() {
                errors.push(format!("operation missing required field: {}", field));
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let code = match raw["code"].as_str() {
            Some(code) => code,
            None => return Err(vec!["operation field 'code' must be a string".to_string()]),
        };
        let description = match raw["description"].as_str() {
            Some(d) => d,
            None => {
                return Err(vec![
                    "operation field 'description' must be a string".to_string()
                ])
            }
        };
        let affected = match raw["affected_objects"].as_array() {
            Some(list) => list
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect::<Vec<_>>(),
            None => {
                return Err(vec![
                    "operation field 'affected_objects' must be a list".to_string()
                ])
            }
        };

        let syntax = self
            .parser
            .parse(code)
            .map_err(|e| vec![format!("syntax error in code: {}", e)])?;

        let findings = screen_tree(syntax.root(), code);
        if !findings.is_clean() {
            return Err(findings.errors);
        }
        if !findings.warnings.is_empty() {
            warn!(
                description = %description,
                warnings = %findings.warnings.join("; "),
                "code validation warnings"
            );
        }

        let kind = match raw["type"].as_str().and_then(OpKind::parse) {
            Some(kind) => kind,
            None => {
                return Err(vec![format!(
                    "invalid operation type: {}",
                    raw["type"].as_str().unwrap_or("<non-string>")
                )])
            }
        };

        Ok(ValidatedOperation {
            operation: Operation {
                code: code.to_string(),
                description: description.to_string(),
                kind,
                affected_objects: affected,
            },
            syntax,
        })
    }
}

/// Batch-level shape checks: `operations` and `imports` must exist and be
/// arrays.
fn check_batch_shape(candidate: &Value) -> Result<(), Vec<String>> {
    for field in ["operations", "imports"] {
        match candidate.get(field) {
            None => return Err(vec![format!("missing required field: {}", field)]),
            Some(value) if !value.is_array() => {
                return Err(vec![format!("'{}' must be a list", field)])
            }
            Some(_) => {}
        }
    }
    Ok(())
}
