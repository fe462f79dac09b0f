//! External XSD validation.
//!
//! Full validation against the published catalog schema is delegated to
//! `xmllint`. Its diagnostics become detail lines of a single result.

use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use tracing::debug;

use crate::report::{ConformanceReport, TestResult};

/// Validator program invoked for schema checks.
pub const VALIDATOR: &str = "xmllint";

/// Validates `document` against the XSD at `schema`.
///
/// A missing `xmllint` is reported as a failure: a schema was requested and
/// could not be checked.
///
/// # Errors
///
/// Returns an error if the validator cannot be started for a reason other
/// than being absent.
pub fn validate(document: &Path, schema: &Path) -> Result<ConformanceReport> {
    validate_with(VALIDATOR, document, schema)
}

/// Same as [`validate`] with an explicit validator program.
///
/// # Errors
///
/// Returns an error if the validator cannot be started for a reason other
/// than being absent.
pub fn validate_with(program: &str, document: &Path, schema: &Path) -> Result<ConformanceReport> {
    let mut report = ConformanceReport::new();
    debug!(
        program,
        document = %document.display(),
        schema = %schema.display(),
        "schema validation"
    );

    let output = match Command::new(program)
        .arg("--noout")
        .arg("--schema")
        .arg(schema)
        .arg(document)
        .output()
    {
        Ok(output) => output,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            report.push(TestResult::fail(
                "catalog/schema",
                format!("`{program}` not found; cannot validate against {}", schema.display()),
            ));
            return Ok(report);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to run {program}"));
        }
    };

    if output.status.success() {
        report.push(TestResult::pass(
            "catalog/schema",
            format!("{} validates against {}", document.display(), schema.display()),
        ));
    } else {
        let details = String::from_utf8_lossy(&output.stderr)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        report.push(TestResult::fail_with_details(
            "catalog/schema",
            format!("{} does not validate against {}", document.display(), schema.display()),
            details,
        ));
    }
    Ok(report)
}
