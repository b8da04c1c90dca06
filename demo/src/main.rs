//! Gantry BIM Reference Runtime — Demo CLI
//!
//! Runs one or all of the three BIM demo scenarios. Each scenario uses real
//! Gantry components (static validator, safety rules, rollback manager,
//! executor, audit chain) wired together through a `Session` against the
//! in-memory reference host.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- build-wall
//!   cargo run -p demo -- guardrails
//!   cargo run -p demo -- rollback-walk

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gantry_ref_bim::scenarios::{build_wall, guardrails, rollback_walk};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Gantry — safety-gated execution pipeline for agent-proposed CAD
/// operations.
///
/// Each subcommand runs one or all of the three BIM scenarios,
/// demonstrating syntax screening, layered safety rules, snapshots, and
/// audited execution.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Gantry BIM reference runtime demo",
    long_about = "Runs Gantry BIM demo scenarios showing capability screening,\n\
                  layered safety rules, snapshot-before-mutation, and the audit chain."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all three BIM scenarios in sequence.
    RunAll,
    /// Scenario 1: Build a Wall (happy path with dry run).
    BuildWall,
    /// Scenario 2: Guardrails (permission, mass delete, structural block).
    Guardrails,
    /// Scenario 3: Snapshot and Rollback Walk.
    RollbackWalk,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging. Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all(),
        Command::BuildWall => build_wall::run_scenario(),
        Command::Guardrails => guardrails::run_scenario(),
        Command::RollbackWalk => rollback_walk::run_scenario(),
    };

    match result {
        Ok(()) => {
            println!("All selected scenarios completed successfully.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn run_all() -> gantry_contracts::error::GantryResult<()> {
    build_wall::run_scenario()?;
    guardrails::run_scenario()?;
    rollback_walk::run_scenario()?;
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("GANTRY — Safety-Gated CAD Execution Pipeline");
    println!("BIM Reference Demo");
    println!("============================================");
    println!();
    println!("Gantry pipeline per batch:");
    println!("  [1] Static validator parses candidate code and screens capabilities");
    println!("  [2] Rollback manager snapshots the document (restore point before mutation)");
    println!("  [3] Safety validator evaluates structural / data / operational / permission rules");
    println!("  [4] Executor runs approved operations under a wall-clock budget");
    println!("  [5] Host recomputes once; the batch is sealed into the SHA-256 audit chain");
    println!();
}
