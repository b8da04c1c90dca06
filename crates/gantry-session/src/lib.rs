//! # gantry-session
//!
//! The per-session orchestrator for the Gantry safety pipeline.
//!
//! A `Session` owns the static validator, safety validator, rollback
//! manager, executor, and audit chain for the lifetime of one document
//! engagement, and exposes the pipeline surface: `validate_and_parse`,
//! `validate_command`, `execute_operations`, snapshots/rollback, and the
//! one-way permission ratchet. `run` drives the whole pipeline for one raw
//! candidate batch.

pub mod session;

pub use session::Session;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use serde_json::{json, Value};

    use gantry_contracts::document::ObjectInfo;
    use gantry_contracts::error::{GantryError, GantryResult};
    use gantry_contracts::permission::PermissionLevel;
    use gantry_core::traits::{DocumentHost, ScriptOutcome, ScriptScope};
    use gantry_rules::{SafetyLimits, SafetyMode, SafetyRules};

    use crate::Session;

    // ── Simulated host ────────────────────────────────────────────────────────

    /// A document host whose document is a list of objects, persisted as
    /// JSON. Scripts containing `addObject` append one object; scripts
    /// containing `removeObject` drop the newest one.
    struct SimHost {
        document: Mutex<Option<Vec<ObjectInfo>>>,
    }

    impl SimHost {
        fn with_empty_document() -> Arc<Self> {
            Arc::new(Self {
                document: Mutex::new(Some(vec![])),
            })
        }
    }

    impl DocumentHost for SimHost {
        fn is_loaded(&self) -> bool {
            self.document.lock().unwrap().is_some()
        }

        fn document_path(&self) -> Option<String> {
            Some("/tmp/sim.json".to_string())
        }

        fn objects(&self) -> Vec<ObjectInfo> {
            self.document.lock().unwrap().clone().unwrap_or_default()
        }

        fn save_to(&self, path: &Path) -> GantryResult<()> {
            let doc = self.document.lock().unwrap();
            let objects = doc.as_ref().ok_or_else(|| GantryError::DocumentNotLoaded {
                reason: "save without document".to_string(),
            })?;
            std::fs::write(path, serde_json::to_vec(objects).unwrap()).unwrap();
            Ok(())
        }

        fn load_from(&self, path: &Path) -> GantryResult<()> {
            let bytes = std::fs::read(path).map_err(|e| GantryError::SnapshotUnavailable {
                reason: format!("cannot read snapshot: {}", e),
            })?;
            let objects: Vec<ObjectInfo> = serde_json::from_slice(&bytes).unwrap();
            *self.document.lock().unwrap() = Some(objects);
            Ok(())
        }

        fn close(&self) -> GantryResult<()> {
            *self.document.lock().unwrap() = None;
            Ok(())
        }

        fn recompute(&self) -> GantryResult<()> {
            Ok(())
        }

        fn run_script(&self, code: &str, _scope: &ScriptScope) -> GantryResult<ScriptOutcome> {
            let mut doc = self.document.lock().unwrap();
            let objects = doc.as_mut().ok_or_else(|| GantryError::DocumentNotLoaded {
                reason: "script without document".to_string(),
            })?;

            if code.contains("addObject") {
                let name = format!("Obj{:03}", objects.len() + 1);
                objects.push(ObjectInfo {
                    name: name.clone(),
                    type_id: "Part::Box".to_string(),
                    depends_on: vec![],
                });
                return Ok(ScriptOutcome {
                    created_objects: vec![name],
                });
            }
            if code.contains("removeObject") {
                objects.pop();
            }
            Ok(ScriptOutcome::default())
        }
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn session_with(host: Arc<SimHost>, permission: PermissionLevel) -> Session {
        Session::with_permission(host, SafetyRules::new(SafetyMode::Strict), permission).unwrap()
    }

    fn create_candidate() -> Value {
        json!({
            "operations": [{
                "code": "box = doc.addObject('Part::Box', 'Box001')",
                "description": "create a box",
                "type": "create",
                "affected_objects": [],
            }],
            "imports": [],
        })
    }

    fn delete_candidate(affected: &[&str]) -> Value {
        json!({
            "operations": [{
                "code": "doc.removeObject('Obj001')",
                "description": "remove the newest object",
                "type": "delete",
                "affected_objects": affected,
            }],
            "imports": [],
        })
    }

    // ── Scenarios ─────────────────────────────────────────────────────────────

    /// Happy path: safe create executes, is audited, and a restore point
    /// exists from before the mutation.
    #[test]
    fn test_happy_path_create() {
        let host = SimHost::with_empty_document();
        let mut session = session_with(host.clone(), PermissionLevel::Create);

        let result = session.run(&create_candidate(), false, false);

        assert!(result.success, "message: {}", result.message);
        assert_eq!(result.data["executed_count"], 1);
        assert_eq!(host.object_count(), 1);

        let trail = session.audit_trail();
        assert_eq!(trail.events.len(), 1);
        assert!(session.verify_audit());

        let snapshots = session.snapshot_history();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(
            snapshots[0].object_count, 0,
            "snapshot must capture the pre-mutation state"
        );
    }

    /// Permission denial: the executor is never reached and the document is
    /// untouched.
    #[test]
    fn test_permission_denial() {
        let host = SimHost::with_empty_document();
        let mut session = session_with(host.clone(), PermissionLevel::Read);

        let result = session.run(&create_candidate(), false, false);

        assert!(!result.success);
        assert!(result.message.contains("safety validation"));
        let violations = result.data["violations"].as_array().unwrap();
        assert!(violations
            .iter()
            .any(|v| v["rule"] == "require_permission_elevation"));
        assert_eq!(host.object_count(), 0);
        assert!(session.execution_history(10).is_empty());
    }

    /// Forbidden capability never executes: rejection happens before any
    /// snapshot or document access.
    #[test]
    fn test_forbidden_code_never_executes() {
        let host = SimHost::with_empty_document();
        let mut session = session_with(host.clone(), PermissionLevel::Delete);

        let candidate = json!({
            "operations": [{
                "code": "eval('doc.addObject(1)')",
                "description": "sneaky eval",
                "type": "create",
                "affected_objects": [],
            }],
            "imports": [],
        });
        let result = session.run(&candidate, false, false);

        assert!(!result.success);
        assert!(result.message.contains("command validation failed"));
        assert_eq!(host.object_count(), 0);
        assert!(session.snapshot_history().is_empty());
        assert!(session.audit_trail().events.is_empty());
    }

    /// Dry runs are idempotent: no mutation, no snapshot, no audit entry,
    /// however many times they run.
    #[test]
    fn test_dry_run_is_idempotent() {
        let host = SimHost::with_empty_document();
        let mut session = session_with(host.clone(), PermissionLevel::Create);

        for _ in 0..3 {
            let result = session.run(&create_candidate(), false, true);
            assert!(result.success);
            assert!(result.message.contains("dry run"));
        }

        assert_eq!(host.object_count(), 0);
        assert!(session.snapshot_history().is_empty());
        assert!(session.audit_trail().events.is_empty());
    }

    /// The §8 restore walk: S0, create (0→1), S1, delete (1→0), restore S0.
    /// Restoring S0 drops everything newer than it.
    #[test]
    fn test_restore_scenario() {
        let host = SimHost::with_empty_document();
        let mut session = session_with(host.clone(), PermissionLevel::Delete);

        session.create_snapshot("S0").unwrap();

        let create = session.run(&create_candidate(), false, false);
        assert!(create.success, "message: {}", create.message);
        assert_eq!(host.object_count(), 1);

        session.create_snapshot("S1").unwrap();

        let delete = session.run(&delete_candidate(&["Obj001"]), true, false);
        assert!(delete.success, "message: {}", delete.message);
        assert_eq!(host.object_count(), 0);

        session.rollback_to_snapshot(0).unwrap();

        assert_eq!(host.object_count(), 0, "S0 had zero objects");
        // Only S0 survives; S1 and the automatic pre-batch snapshots are
        // dropped with the future they belong to.
        let history = session.snapshot_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].description, "S0");
    }

    /// Timeout: the first operation's results survive, the rest are
    /// aborted, and the error names the timeout.
    #[test]
    fn test_timeout_scenario() {
        let host = SimHost::with_empty_document();
        let rules = SafetyRules::with_limits(
            SafetyMode::Strict,
            SafetyLimits {
                max_operations_per_batch: 50,
                max_execution_secs: 0.0,
                max_delete_objects: 10,
            },
        );
        let mut session =
            Session::with_permission(host.clone(), rules, PermissionLevel::Create).unwrap();

        let ops: Vec<Value> = (0..3)
            .map(|i| {
                json!({
                    "code": "box = doc.addObject('Part::Box', 'Box')",
                    "description": format!("create box {}", i),
                    "type": "create",
                    "affected_objects": [],
                })
            })
            .collect();
        let result = session.run(&json!({ "operations": ops, "imports": [] }), false, false);

        assert!(!result.success);
        assert!(result.error.as_deref().unwrap_or("").contains("timeout"));
        assert_eq!(result.data["executed_count"], 1);
        assert_eq!(host.object_count(), 1, "completed work is preserved");

        // The aborted batch is still audited, with per-operation flags.
        let trail = session.audit_trail();
        assert_eq!(trail.events.len(), 1);
        assert_eq!(trail.events[0].record.executed_count, 1);
        assert_eq!(trail.events[0].record.failure_count, 2);
    }

    /// Mass-delete guardrail end to end.
    #[test]
    fn test_mass_delete_guardrail() {
        let host = SimHost::with_empty_document();
        let mut session = session_with(host.clone(), PermissionLevel::Delete);

        let affected: Vec<String> = (0..15).map(|i| format!("Obj{:03}", i)).collect();
        let affected_refs: Vec<&str> = affected.iter().map(String::as_str).collect();

        let blocked = session.run(&delete_candidate(&affected_refs), false, false);
        assert!(!blocked.success);
        let violations = blocked.data["violations"].as_array().unwrap();
        assert!(violations.iter().any(|v| v["rule"] == "no_mass_delete"));

        // Confirmed and under the cap: no mass-delete violation.
        let allowed = session.run(&delete_candidate(&["Obj001"]), true, false);
        assert!(allowed.success, "message: {}", allowed.message);
    }

    /// The explicit three-call surface behaves like `run`.
    #[test]
    fn test_explicit_pipeline_surface() {
        let host = SimHost::with_empty_document();
        let mut session = session_with(host.clone(), PermissionLevel::Create);

        let command = session.validate_and_parse(&create_candidate());
        assert!(command.valid);

        let report = session.validate_command(&command, false);
        assert!(report.safe, "violations: {:?}", report.violations);

        let result = session.execute_operations(&command, false);
        assert!(result.success);
        assert_eq!(host.object_count(), 1);
        assert_eq!(session.audit_trail().events.len(), 1);
        assert_eq!(session.execution_history(10).len(), 1);
    }

    /// The session-level permission ratchet is monotonic.
    #[test]
    fn test_permission_ratchet_via_session() {
        let host = SimHost::with_empty_document();
        let mut session = session_with(host, PermissionLevel::Modify);

        assert_eq!(session.permission(), PermissionLevel::Modify);
        session.elevate_permission(PermissionLevel::Delete);
        assert_eq!(session.permission(), PermissionLevel::Delete);
        session.elevate_permission(PermissionLevel::Read);
        assert_eq!(session.permission(), PermissionLevel::Delete);
    }

    /// Several batches chain into a verifiable audit trail.
    #[test]
    fn test_audit_chain_over_multiple_batches() {
        let host = SimHost::with_empty_document();
        let mut session = session_with(host, PermissionLevel::Create);

        for _ in 0..3 {
            let result = session.run(&create_candidate(), false, false);
            assert!(result.success);
        }

        let trail = session.audit_trail();
        assert_eq!(trail.events.len(), 3);
        assert!(session.verify_audit());
        assert_eq!(trail.events[2].sequence, 2);
    }
}
