//! Checks on a rendered Turtle artifact.
//!
//! These do not parse Turtle. They confirm the artifact looks like what the
//! serializer writes: prefixes up front, every individual block closed, and
//! as many blocks as the generator reported.

use std::path::Path;

use anyhow::{Context, Result};

use crate::report::{ConformanceReport, TestResult};

/// Validates the artifact at `path`.
///
/// With `expected` set, the number of individual blocks must match it.
///
/// # Errors
///
/// Returns an error if the artifact exists but cannot be read.
pub fn validate(path: &Path, expected: Option<usize>) -> Result<ConformanceReport> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    if !path.exists() {
        let mut report = ConformanceReport::new();
        report.push(TestResult::fail(
            "artifact/turtle",
            format!("{name} not found"),
        ));
        return Ok(report);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(validate_str(&name, &content, expected))
}

/// Validates artifact text.
pub fn validate_str(name: &str, content: &str, expected: Option<usize>) -> ConformanceReport {
    let mut report = ConformanceReport::new();

    let mut issues = Vec::new();
    if content.trim().is_empty() {
        issues.push("File is empty".to_string());
    }
    if !content.lines().any(|l| l.trim_start().starts_with("@prefix")) {
        issues.push("No @prefix declarations found".to_string());
    }
    if !content.contains("@prefix owl:") || !content.contains("@prefix rdf:") {
        issues.push("Missing owl: or rdf: prefix".to_string());
    }
    report.push(TestResult::check(
        "artifact/turtle",
        issues,
        format!("{name} has Turtle structure ({} bytes)", content.len()),
        format!("{name} has structural issues"),
    ));

    let blocks: Vec<&str> = content.split("\n### ").skip(1).collect();
    let unterminated: Vec<String> = blocks
        .iter()
        .filter(|b| !terminated(b))
        .map(|b| b.lines().next().unwrap_or_default().to_string())
        .collect();
    report.push(TestResult::check(
        "artifact/blocks",
        unterminated,
        format!("{} individual blocks are terminated", blocks.len()),
        format!("{name} has unterminated individual blocks"),
    ));

    if let Some(expected) = expected {
        if blocks.len() == expected {
            report.push(TestResult::pass(
                "artifact/count",
                format!("{name} holds {expected} individuals"),
            ));
        } else {
            report.push(TestResult::fail(
                "artifact/count",
                format!("{name} holds {} individuals, expected {expected}", blocks.len()),
            ));
        }
    }
    report
}

/// A block is terminated when its statement list ends with ` .` before the
/// next blank line or the end of the text.
fn terminated(block: &str) -> bool {
    block
        .split("\n\n")
        .next()
        .is_some_and(|statements| statements.trim_end().ends_with(" ."))
}
