//! Shared plumbing for the CAPEC client binaries.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod build;

use capec_conformance::{ConformanceReport, Severity};
use tracing_subscriber::EnvFilter;

/// Installs the `tracing` subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second install (in tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Prints every result and a summary line; returns the failure count.
pub fn print_report(report: &ConformanceReport) -> usize {
    let mut passed = 0usize;
    let mut failed = 0usize;
    let mut warned = 0usize;

    for result in &report.results {
        let status = match result.severity {
            Severity::Pass => {
                passed += 1;
                "PASS"
            }
            Severity::Warning => {
                warned += 1;
                "WARN"
            }
            Severity::Failure => {
                failed += 1;
                "FAIL"
            }
        };
        println!("[{status}] {} — {}", result.validator, result.message);
        for detail in &result.details {
            println!("       {detail}");
        }
    }

    println!();
    println!("Summary: {passed} passed, {warned} warnings, {failed} failed");
    failed
}
