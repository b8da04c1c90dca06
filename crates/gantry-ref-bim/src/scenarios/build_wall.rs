//! Scenario 1: Build a Wall (happy path).
//!
//! A well-formed create batch flows through every gate: static validation,
//! automatic pre-batch snapshot, safety evaluation at CREATE permission,
//! execution against the host, and an audit-chain entry. A dry run is shown
//! first to demonstrate the plan output.

use std::sync::Arc;

use serde_json::json;

use gantry_contracts::error::GantryResult;
use gantry_contracts::permission::PermissionLevel;
use gantry_core::traits::DocumentHost;
use gantry_rules::{SafetyMode, SafetyRules};
use gantry_session::Session;

use crate::host::MemoryDocumentHost;

pub fn run_scenario() -> GantryResult<()> {
    println!("=== Scenario 1: Build a Wall (happy path) ===");
    println!();

    let host = Arc::new(MemoryDocumentHost::with_document("/virtual/site.json"));
    let mut session = Session::with_permission(
        host.clone(),
        SafetyRules::new(SafetyMode::Strict),
        PermissionLevel::Create,
    )?;

    let candidate = json!({
        "operations": [{
            "code": "wall = Arch.makeWall(None, 200, 20, 300)",
            "description": "Create a 200x20x300 wall",
            "type": "create",
            "affected_objects": [],
        }],
        "imports": ["Arch"],
        "estimated_complexity": 2,
    });

    // Dry run first: plan only, nothing is touched.
    let plan = session.run(&candidate, false, true);
    println!("  Dry run:  {}", plan.message);
    if let Some(lines) = plan.data["operations"].as_array() {
        for line in lines {
            println!("    {}", line.as_str().unwrap_or_default());
        }
    }
    println!("  Objects after dry run: {}", host.object_count());
    println!();

    // Live run: snapshot, evaluate, execute, audit.
    let result = session.run(&candidate, false, false);
    println!("  Live run: {}", result.message);
    println!("  Objects after live run: {}", host.object_count());
    println!(
        "  Pre-batch snapshots retained: {}",
        session.snapshot_history().len()
    );
    println!(
        "  Audit chain: {} event(s), integrity {}",
        session.audit_trail().events.len(),
        if session.verify_audit() { "OK" } else { "BROKEN" }
    );

    if result.success && host.object_count() == 1 {
        println!("  RESULT: SUCCESS (expected)");
    } else {
        println!("  RESULT: unexpected outcome");
    }
    println!();
    Ok(())
}
