//! `capec-conformance` — Runs the catalog schema gate and, optionally, checks
//! rendered artifacts.
//!
//! **Usage:**
//! ```text
//! capec-conformance [--input <xml>] [--schema <xsd>] [--artifacts <dir>] [--report <json>]
//! ```
//!
//! Exits non-zero if any check fails.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use capec_conformance::{run_all, CatalogPaths};
use clap::Parser;

/// Check a CAPEC catalog and its generated artifacts.
#[derive(Parser)]
#[command(
    name = "capec-conformance",
    about = "Validate a CAPEC catalog and the ontology generated from it"
)]
struct Args {
    /// CAPEC catalog XML document.
    #[arg(long, default_value = "data/capec.xml")]
    input: PathBuf,

    /// Catalog XSD for external validation with `xmllint`.
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Output directory whose artifacts should be checked.
    #[arg(long)]
    artifacts: Option<PathBuf>,

    /// Write every check result as JSON to this path.
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    capec_clients::init_logging();
    let args = Args::parse();

    let report = run_all(&CatalogPaths {
        input: args.input,
        schema: args.schema,
        artifacts: args.artifacts,
    })?;

    println!("CAPEC Conformance Report");
    println!("========================");
    println!();

    let failed = capec_clients::print_report(&report);

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report)
            .context("Failed to serialize conformance report")?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Written: {}", path.display());
    }

    if failed > 0 {
        eprintln!("Conformance FAILED: {failed} check(s) did not pass.");
        process::exit(1);
    }

    println!("Conformance PASSED.");
    Ok(())
}
