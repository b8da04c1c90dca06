//! Scenario 2: Guardrails.
//!
//! Three distinct refusals over a seeded mock building:
//!
//! Sub-case A — create at READ permission → permission violation
//! Sub-case B — mass delete without confirmation → confirmation + cap gates
//! Sub-case C — structural delete with confirmation → still blocked
//!
//! Sub-case C is the hard guardrail: `confirmed = true` clears the data
//! gates but can never clear a load-bearing deletion.

use std::sync::Arc;

use serde_json::json;

use gantry_contracts::error::GantryResult;
use gantry_contracts::permission::PermissionLevel;
use gantry_core::traits::DocumentHost;
use gantry_rules::{SafetyMode, SafetyRules};
use gantry_session::Session;

use crate::host::MemoryDocumentHost;

pub fn run_scenario() -> GantryResult<()> {
    println!("=== Scenario 2: Guardrails ===");
    println!();

    let host = Arc::new(MemoryDocumentHost::small_building());
    let mut session = Session::with_permission(
        host.clone(),
        SafetyRules::new(SafetyMode::Strict),
        PermissionLevel::Read,
    )?;
    let initial_count = host.object_count();
    println!("  Seeded building: {} objects", initial_count);
    println!();

    // ── Sub-case A: permission denial ────────────────────────────────────────
    println!("  Sub-case A: create at READ permission");
    let create = json!({
        "operations": [{
            "code": "w = Arch.makeWall(None, 100, 10, 200)",
            "description": "Add another wall",
            "type": "create",
            "affected_objects": [],
        }],
        "imports": ["Arch"],
    });
    let denied = session.run(&create, false, false);
    print_refusal(&denied);
    println!();

    // ── Sub-case B: mass delete without confirmation ─────────────────────────
    session.elevate_permission(PermissionLevel::Delete);
    println!("  Sub-case B: delete 12 panels without confirmation (cap: 10)");
    let affected: Vec<String> = (0..12).map(|i| format!("Panel{:03}", i)).collect();
    let mass_delete = json!({
        "operations": [{
            "code": "for name in panels: doc.removeObject(name)",
            "description": "Clear all panels",
            "type": "delete",
            "affected_objects": affected,
        }],
        "imports": [],
    });
    let blocked = session.run(&mass_delete, false, false);
    print_refusal(&blocked);
    println!();

    // ── Sub-case C: structural delete is confirmation-proof ──────────────────
    println!("  Sub-case C: delete a load-bearing wall WITH confirmation");
    let structural = json!({
        "operations": [{
            "code": "doc.removeObject('Wall001')  # demolish wall",
            "description": "Demolish Wall001",
            "type": "delete",
            "affected_objects": ["Wall001"],
        }],
        "imports": [],
    });
    let still_blocked = session.run(&structural, true, false);
    print_refusal(&still_blocked);
    println!("  {}", session.violations_summary());
    println!();

    if !denied.success && !blocked.success && !still_blocked.success {
        println!(
            "  RESULT: all three refused, document untouched ({} objects)",
            host.object_count()
        );
    } else {
        println!("  RESULT: unexpected outcome, a guardrail did not hold");
    }
    println!();
    Ok(())
}

fn print_refusal(result: &gantry_contracts::result::ExecutionResult) {
    println!("    {}", result.message);
    if let Some(violations) = result.data["violations"].as_array() {
        for v in violations {
            println!(
                "    BLOCKED [{}] {}",
                v["rule"].as_str().unwrap_or("?"),
                v["message"].as_str().unwrap_or_default()
            );
        }
    }
}
