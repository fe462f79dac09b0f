//! `capec-build` — Generates the CAPEC ontology from a catalog document.
//!
//! **Outputs:**
//! - `<out>/capec.ttl` — the shell template filled with every attack pattern,
//!   category, view and child individual
//! - `<out>/cwe.ttl` — with `--weaknesses`, the referenced CWE entries
//!
//! **Usage:**
//! ```text
//! capec-build [--input <xml>] [--shell <ttl>] [--out <dir>] [--schema <xsd>]
//!             [--weaknesses] [--cwe-shell <ttl>] [--report <json>]
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use capec_clients::build::{run, BuildOptions};
use clap::Parser;
use tracing::info;

/// Build the CAPEC ontology.
#[derive(Parser)]
#[command(name = "capec-build", about = "Generate the CAPEC OWL ontology in Turtle")]
struct Args {
    /// CAPEC catalog XML document.
    #[arg(long, default_value = "data/capec.xml")]
    input: PathBuf,

    /// Shell template wrapped around the generated individuals.
    #[arg(long, default_value = "shell.ttl")]
    shell: PathBuf,

    /// Output directory for generated artifacts.
    #[arg(long, default_value = "results")]
    out: PathBuf,

    /// Catalog XSD; when given, `xmllint` validates the input first.
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Also write the weakness companion ontology.
    #[arg(long)]
    weaknesses: bool,

    /// Shell template for the weakness companion ontology.
    #[arg(long, default_value = "cwe_shell.ttl")]
    cwe_shell: PathBuf,

    /// Write the generation report as JSON to this path.
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    capec_clients::init_logging();
    let args = Args::parse();

    let options = BuildOptions {
        input: args.input,
        shell: args.shell,
        out: args.out,
        schema: args.schema,
        weaknesses: args.weaknesses.then_some(args.cwe_shell),
    };
    info!(input = %options.input.display(), "build started");

    let output = run(&options)?;
    let report = &output.report;
    println!(
        "CAPEC ontology: {} attack patterns, {} categories, {} views, {} sub-individuals",
        report.attack_patterns, report.categories, report.views, report.sub_individuals
    );
    for file in &output.files {
        println!("  Written: {}", file.display());
    }

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(report)
            .context("Failed to serialize generation report")?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("  Written: {}", path.display());
    }

    println!("Build complete.");
    Ok(())
}
