//! Companion weakness ontology.
//!
//! Attack patterns point at weaknesses through `cwe:CWE-<n>` references. The
//! companion document declares each referenced weakness as a named
//! individual of class `:Weakness` so those references resolve.

use crate::model::WEAKNESS_PREFIX;
use crate::serializer::turtle::block;

/// Renders one weakness individual.
#[must_use]
pub fn render_weakness(cwe_id: &str) -> String {
    block(
        &format!("{WEAKNESS_PREFIX}{}", cwe_id.trim()),
        &[
            "rdf:type owl:NamedIndividual".to_string(),
            "rdf:type :Weakness".to_string(),
        ],
    )
}

/// Renders the weakness document: the shell text followed by every weakness.
#[must_use]
pub fn to_weakness_turtle(shell: &str, cwe_ids: &[String]) -> String {
    let mut out = String::with_capacity(shell.len() + cwe_ids.len() * 96);
    out.push_str(shell);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    for id in cwe_ids {
        out.push_str(&render_weakness(id));
    }
    out
}
