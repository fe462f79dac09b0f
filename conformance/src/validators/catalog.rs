//! Structural checks on the catalog document.
//!
//! These are the subset of the published catalog schema that extraction
//! depends on: the root metadata, the three record collections, record
//! identity, the attributes every record program requires, and that
//! relationship targets resolve inside the catalog.

use std::collections::HashSet;

use anyhow::Result;
use capec_codegen::catalog::{
    ATTACK_PATTERNS, ATTACK_PATTERN_PATH, CATEGORIES, CATEGORY_PATH, VIEWS, VIEW_PATH,
};
use capec_codegen::source::Element;
use regex::Regex;

use crate::report::{ConformanceReport, TestResult};

/// Root element of a catalog document.
pub const ROOT: &str = "Attack_Pattern_Catalog";

/// Record kinds with the attributes their extraction program requires.
const REQUIRED: &[(&str, &[&str])] = &[
    (ATTACK_PATTERN_PATH, &["Name", "Abstraction", "Status"]),
    (CATEGORY_PATH, &["Name", "Status"]),
    (VIEW_PATH, &["Name", "Type", "Status"]),
];

/// Record-local paths whose `CAPEC_ID` must name a record in the catalog.
const LINKS: &[&str] = &[
    "Related_Attack_Patterns/Related_Attack_Pattern",
    "Execution_Flow/Attack_Step/Technique",
    "Relationships/Member_Of",
    "Relationships/Has_Member",
    "Members/Member_Of",
    "Members/Has_Member",
];

/// Runs every structural check against the document root.
///
/// # Errors
///
/// Returns an error only if a check pattern fails to compile.
pub fn validate(root: &Element) -> Result<ConformanceReport> {
    let numeric = Regex::new(r"^\d+$")?;
    let date = Regex::new(r"^\d{4}-\d{2}-\d{2}$")?;
    let mut report = ConformanceReport::new();

    report.push(check_root(root, &date));
    report.push(check_collections(root));

    let ids = check_identity(root, &numeric, &mut report);
    report.push(check_attributes(root));
    report.push(check_links(root, &ids));
    report.push(check_weaknesses(root, &numeric));

    Ok(report)
}

fn records(root: &Element) -> impl Iterator<Item = &Element> {
    REQUIRED
        .iter()
        .flat_map(move |(path, _)| root.find_all(path))
}

fn label(record: &Element) -> String {
    match record.attr("ID") {
        Some(id) => format!("{} {}", record.name, id),
        None => record.name.clone(),
    }
}

fn check_root(root: &Element, date: &Regex) -> TestResult {
    let mut problems = Vec::new();
    if root.name != ROOT {
        problems.push(format!("root element is <{}>, expected <{ROOT}>", root.name));
    }
    for attribute in ["Name", "Version", "Date"] {
        if !root.attr(attribute).is_some_and(|v| !v.trim().is_empty()) {
            problems.push(format!("root lacks `{attribute}`"));
        }
    }
    if let Some(value) = root.attr("Date") {
        if !value.trim().is_empty() && !date.is_match(value.trim()) {
            problems.push(format!("root `Date` {value:?} is not YYYY-MM-DD"));
        }
    }
    TestResult::check(
        "catalog/root",
        problems,
        "catalog root carries name, version and date",
        "catalog root metadata is incomplete",
    )
}

fn check_collections(root: &Element) -> TestResult {
    let problems = [ATTACK_PATTERNS, CATEGORIES, VIEWS]
        .into_iter()
        .filter(|c| root.find(c).is_none())
        .map(|c| format!("missing <{c}>"))
        .collect();
    TestResult::check(
        "catalog/collections",
        problems,
        "all record collections are present",
        "record collections are missing",
    )
}

fn check_identity<'a>(
    root: &'a Element,
    numeric: &Regex,
    report: &mut ConformanceReport,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    let mut problems = Vec::new();
    let mut count = 0usize;
    for record in records(root) {
        count += 1;
        match record.attr("ID").map(str::trim) {
            None => problems.push(format!("{} without `ID`", record.name)),
            Some(id) if !numeric.is_match(id) => {
                problems.push(format!("{} has non-numeric ID {id:?}", record.name));
            }
            Some(id) => {
                if !seen.insert(id) {
                    problems.push(format!("duplicate ID {id}"));
                }
            }
        }
    }
    report.push(TestResult::check(
        "catalog/identity",
        problems,
        format!("{count} records carry unique numeric identifiers"),
        "record identifiers are missing, malformed or duplicated",
    ));
    seen
}

fn check_attributes(root: &Element) -> TestResult {
    let mut problems = Vec::new();
    for (path, attributes) in REQUIRED {
        for record in root.find_all(path) {
            for attribute in attributes.iter() {
                if record.attr(attribute).is_none() {
                    problems.push(format!("{} lacks `{attribute}`", label(record)));
                }
            }
        }
    }
    TestResult::check(
        "catalog/attributes",
        problems,
        "every record carries its required attributes",
        "records lack required attributes",
    )
}

fn check_links(root: &Element, ids: &HashSet<&str>) -> TestResult {
    let mut problems = Vec::new();
    for record in records(root) {
        for path in LINKS {
            for link in record.find_all(path) {
                match link.attr("CAPEC_ID").map(str::trim) {
                    Some(target) if ids.contains(target) => {}
                    Some(target) => problems.push(format!(
                        "{} {} → unknown CAPEC-{target}",
                        label(record),
                        link.name
                    )),
                    // A free-text technique carries no link.
                    None if link.name == "Technique" => {}
                    None => problems.push(format!(
                        "{} {} without `CAPEC_ID`",
                        label(record),
                        link.name
                    )),
                }
            }
        }
    }
    TestResult::check(
        "catalog/relationships",
        problems,
        "every relationship target resolves",
        "relationships point outside the catalog",
    )
}

fn check_weaknesses(root: &Element, numeric: &Regex) -> TestResult {
    let mut problems = Vec::new();
    for pattern in root.find_all(ATTACK_PATTERN_PATH) {
        for weakness in pattern.find_all("Related_Weaknesses/Related_Weakness") {
            let id = weakness.attr("CWE_ID").unwrap_or_default();
            if !numeric.is_match(id.trim()) {
                problems.push(format!("{} has weakness link {id:?}", label(pattern)));
            }
        }
    }
    TestResult::check(
        "catalog/weaknesses",
        problems,
        "weakness links are numeric CWE identifiers",
        "weakness links are malformed",
    )
}
