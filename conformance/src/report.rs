//! Check results and their aggregation into a gate decision.

use serde::Serialize;

/// Outcome of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// The check passed.
    Pass,
    /// Suspicious but not blocking.
    Warning,
    /// The check failed; the gate is closed.
    Failure,
}

/// A single check result.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    /// Validator that produced the result, e.g. `catalog/identity`.
    pub validator: String,
    /// One-line outcome.
    pub message: String,
    /// Outcome severity.
    pub severity: Severity,
    /// Offending records or diagnostics, one per line.
    pub details: Vec<String>,
}

impl TestResult {
    /// Creates a passing result.
    pub fn pass(validator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(validator, message, Severity::Pass, Vec::new())
    }

    /// Creates a failure result.
    pub fn fail(validator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(validator, message, Severity::Failure, Vec::new())
    }

    /// Creates a failure result with detail lines.
    pub fn fail_with_details(
        validator: impl Into<String>,
        message: impl Into<String>,
        details: Vec<String>,
    ) -> Self {
        Self::new(validator, message, Severity::Failure, details)
    }

    /// Creates a warning result.
    pub fn warn(validator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(validator, message, Severity::Warning, Vec::new())
    }

    /// Passes with `ok` when `problems` is empty, otherwise fails with
    /// `failed` and the problems as details.
    pub fn check(
        validator: &str,
        problems: Vec<String>,
        ok: impl Into<String>,
        failed: impl Into<String>,
    ) -> Self {
        if problems.is_empty() {
            Self::pass(validator, ok)
        } else {
            Self::fail_with_details(validator, failed, problems)
        }
    }

    fn new(
        validator: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
        details: Vec<String>,
    ) -> Self {
        Self {
            validator: validator.into(),
            message: message.into(),
            severity,
            details,
        }
    }

    /// Returns true if this result closes the gate.
    pub fn is_failure(&self) -> bool {
        self.severity == Severity::Failure
    }
}

/// Results of every check that ran.
#[derive(Debug, Default, Serialize)]
pub struct ConformanceReport {
    /// Results in the order the checks ran.
    pub results: Vec<TestResult>,
}

impl ConformanceReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a result.
    pub fn push(&mut self, result: TestResult) {
        self.results.push(result);
    }

    /// Appends every result of `other`.
    pub fn extend(&mut self, other: ConformanceReport) {
        self.results.extend(other.results);
    }

    /// Failed results.
    pub fn failures(&self) -> impl Iterator<Item = &TestResult> {
        self.results.iter().filter(|r| r.is_failure())
    }

    /// Number of failed checks.
    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// True when nothing failed.
    pub fn all_passed(&self) -> bool {
        self.failure_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_turns_problems_into_details() {
        let ok = TestResult::check("catalog/root", Vec::new(), "fine", "broken");
        assert_eq!(ok.severity, Severity::Pass);
        assert_eq!(ok.message, "fine");

        let bad = TestResult::check("catalog/root", vec!["CAPEC-1".into()], "fine", "broken");
        assert!(bad.is_failure());
        assert_eq!(bad.details, vec!["CAPEC-1"]);
    }

    #[test]
    fn warnings_do_not_close_the_gate() {
        let mut report = ConformanceReport::new();
        report.push(TestResult::pass("a", "ok"));
        report.push(TestResult::warn("b", "hmm"));
        assert!(report.all_passed());
        report.push(TestResult::fail("c", "no"));
        assert_eq!(report.failure_count(), 1);
        assert!(!report.all_passed());
    }

    #[test]
    fn report_serializes_as_json() -> Result<(), serde_json::Error> {
        let mut report = ConformanceReport::new();
        report.push(TestResult::fail_with_details(
            "catalog/identity",
            "record identifiers are duplicated",
            vec!["duplicate ID 1".into()],
        ));
        let json = serde_json::to_value(&report)?;
        assert_eq!(json["results"][0]["validator"], "catalog/identity");
        assert_eq!(json["results"][0]["severity"], "Failure");
        assert_eq!(json["results"][0]["details"][0], "duplicate ID 1");
        Ok(())
    }
}
