//! CAPEC ontology conformance.
//!
//! Two gates surround a generation run. The schema gate runs before
//! extraction: it checks the catalog document for the structure every record
//! program relies on and, when a schema is supplied, delegates full XSD
//! validation to `xmllint`. The artifact checks run after rendering and
//! confirm the written Turtle holds what the generator reported.
//!
//! | Check                  | Input |
//! |------------------------|-------|
//! | `catalog/root`         | root element, `Name`, `Version`, `Date` (`YYYY-MM-DD`) |
//! | `catalog/collections`  | `Attack_Patterns`, `Categories`, `Views` |
//! | `catalog/identity`     | numeric, catalog-unique `ID` on every record |
//! | `catalog/attributes`   | attributes each record kind requires |
//! | `catalog/relationships`| `CAPEC_ID` targets resolve |
//! | `catalog/weaknesses`   | `CWE_ID` is numeric |
//! | `catalog/schema`       | `xmllint --noout --schema` |
//! | `artifact/*`           | prefixes, block termination, block count |
//!
//! # Entry Point
//!
//! ```no_run
//! use capec_conformance::{run_all, CatalogPaths};
//! use std::path::PathBuf;
//!
//! let paths = CatalogPaths {
//!     input: PathBuf::from("data/capec.xml"),
//!     schema: None,
//!     artifacts: Some(PathBuf::from("results")),
//! };
//! let report = run_all(&paths)?;
//! assert!(report.all_passed());
//! # Ok::<(), anyhow::Error>(())
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod report;
pub mod validators;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use capec_codegen::{GenerationReport, SourceTree};
use tracing::info;

pub use report::{ConformanceReport, Severity, TestResult};

/// File name of the catalog artifact inside the output directory.
pub const CATALOG_ARTIFACT: &str = "capec.ttl";
/// File name of the weakness companion artifact.
pub const WEAKNESS_ARTIFACT: &str = "cwe.ttl";

/// Paths required by the conformance runner.
#[derive(Debug, Clone)]
pub struct CatalogPaths {
    /// Catalog document.
    pub input: PathBuf,
    /// XSD for external validation, if any.
    pub schema: Option<PathBuf>,
    /// Output directory holding rendered artifacts, if they should be checked.
    pub artifacts: Option<PathBuf>,
}

/// Runs the schema gate on a parsed catalog.
///
/// # Errors
///
/// Returns an error only if a validator cannot run at all.
pub fn gate(tree: &SourceTree, input: &Path, schema: Option<&Path>) -> Result<ConformanceReport> {
    let mut report = validators::catalog::validate(tree.root())?;
    if let Some(schema) = schema {
        report.extend(validators::schema::validate(input, schema)?);
    }
    info!(
        checks = report.results.len(),
        failures = report.failure_count(),
        "schema gate"
    );
    Ok(report)
}

/// Checks the artifacts in `dir` against a generation report.
///
/// The weakness artifact is checked only when present.
///
/// # Errors
///
/// Returns an error if an artifact exists but cannot be read.
pub fn check_artifacts(dir: &Path, generated: &GenerationReport) -> Result<ConformanceReport> {
    let mut report =
        validators::turtle::validate(&dir.join(CATALOG_ARTIFACT), Some(generated.individuals()))?;
    let weaknesses = dir.join(WEAKNESS_ARTIFACT);
    if weaknesses.exists() {
        report.extend(validators::turtle::validate(
            &weaknesses,
            Some(generated.weaknesses),
        )?);
    }
    Ok(report)
}

/// Runs the schema gate and, when requested, the artifact checks.
///
/// Artifact checks regenerate the catalog in memory to learn the expected
/// counts; they are skipped when the gate has already failed.
///
/// # Errors
///
/// Returns an error if the catalog cannot be read or parsed, or if a
/// validator cannot run.
pub fn run_all(paths: &CatalogPaths) -> Result<ConformanceReport> {
    let xml = std::fs::read_to_string(&paths.input)
        .with_context(|| format!("Failed to read {}", paths.input.display()))?;
    let tree = SourceTree::parse(&xml)
        .with_context(|| format!("Failed to parse {}", paths.input.display()))?;

    let mut report = gate(&tree, &paths.input, paths.schema.as_deref())?;
    if let Some(dir) = &paths.artifacts {
        if report.all_passed() {
            let (_, generated) = capec_codegen::generate(&tree)
                .with_context(|| format!("Failed to generate from {}", paths.input.display()))?;
            report.extend(check_artifacts(dir, &generated)?);
        }
    }
    Ok(report)
}
