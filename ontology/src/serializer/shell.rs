//! Static shell template around the generated individuals.
//!
//! The shell carries prefix declarations, the ontology header and the class
//! and property vocabulary. It is maintained by hand; the generator only
//! fills in these placeholders:
//!
//! | Placeholder               | Replacement |
//! |---------------------------|-------------|
//! | `{{NAME}}`                | catalog name (escaped literal body) |
//! | `{{VERSION}}`             | catalog version |
//! | `{{DATE}}`                | catalog date |
//! | `{{EXTERNAL_REFERENCES}}` | one `:External_Reference` statement per bibliographic entry |
//! | `{{INDIVIDUALS}}`         | optional split point: text after it is a footer |
//!
//! Without `{{INDIVIDUALS}}` the individuals are appended after the template.

use crate::encoder::escape;
use crate::model::{Catalog, CatalogHeader, ExternalReference, Literal};

/// Catalog name placeholder.
pub const NAME: &str = "{{NAME}}";
/// Catalog version placeholder.
pub const VERSION: &str = "{{VERSION}}";
/// Catalog date placeholder.
pub const DATE: &str = "{{DATE}}";
/// Bibliographic reference list placeholder.
pub const EXTERNAL_REFERENCES: &str = "{{EXTERNAL_REFERENCES}}";
/// Header/footer split point.
pub const INDIVIDUALS: &str = "{{INDIVIDUALS}}";

/// A loaded shell template.
#[derive(Debug, Clone)]
pub struct Shell {
    template: String,
}

impl Shell {
    /// Wraps template text.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Fills the placeholders and places `individuals` at the split point.
    ///
    /// The template is split before any substitution, and each part is filled
    /// in a single pass, so catalog text that looks like a placeholder is
    /// emitted as written.
    #[must_use]
    pub fn render(
        &self,
        header: &CatalogHeader,
        references: &[ExternalReference],
        individuals: &str,
    ) -> String {
        let values = [
            (NAME, escape(&header.name)),
            (VERSION, escape(&header.version)),
            (DATE, escape(&header.date)),
            (EXTERNAL_REFERENCES, external_references(references)),
        ];

        match self.template.split_once(INDIVIDUALS) {
            Some((head, tail)) => {
                let mut out = fill(head, &values);
                out.push_str(individuals);
                out.push_str(&fill(tail, &values));
                out
            }
            None => {
                let mut out = fill(&self.template, &values);
                if !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(individuals);
                out
            }
        }
    }

    /// Renders a complete catalog document.
    #[must_use]
    pub fn render_catalog(&self, catalog: &Catalog) -> String {
        let individuals = super::turtle::render_individuals(catalog);
        self.render(&catalog.header, &catalog.external_references, &individuals)
    }
}

/// Replaces known tokens left to right; inserted values are never rescanned.
fn fill(text: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(token, _)| tail.starts_with(token)) {
            Some((token, value)) => {
                out.push_str(value);
                rest = &tail[token.len()..];
            }
            None => {
                out.push_str("{{");
                rest = &tail[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// One `:External_Reference "..."^^rdfs:Literal ;` statement per entry.
#[must_use]
pub fn external_references(references: &[ExternalReference]) -> String {
    references
        .iter()
        .map(|r| {
            format!(
                ":External_Reference {}^^rdfs:Literal ;",
                Literal::paragraphs(r.paragraphs())
            )
        })
        .collect::<Vec<_>>()
        .join("\n    ")
}
