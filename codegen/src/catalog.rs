//! Catalog-level extraction: collection paths, root metadata, the global
//! bibliography and the weakness identifiers referenced by attack patterns.

use capec_ontology::model::{CatalogHeader, ExternalReference};
use indexmap::IndexSet;

use crate::error::Result;
use crate::source::Element;

/// Attack pattern collection.
pub const ATTACK_PATTERNS: &str = "Attack_Patterns";
/// Category collection.
pub const CATEGORIES: &str = "Categories";
/// View collection.
pub const VIEWS: &str = "Views";

/// Path from the root to every attack pattern.
pub const ATTACK_PATTERN_PATH: &str = "Attack_Patterns/Attack_Pattern";
/// Path from the root to every category.
pub const CATEGORY_PATH: &str = "Categories/Category";
/// Path from the root to every view.
pub const VIEW_PATH: &str = "Views/View";

/// Reads the catalog name, version and date from the root element.
#[must_use]
pub fn header(root: &Element) -> CatalogHeader {
    let attr = |name: &str| root.attr(name).unwrap_or_default().trim().to_string();
    CatalogHeader {
        name: attr("Name"),
        version: attr("Version"),
        date: attr("Date"),
    }
}

/// Reads the global bibliography.
#[must_use]
pub fn external_references(root: &Element) -> Vec<ExternalReference> {
    root.find_all("External_References/External_Reference")
        .into_iter()
        .map(|e| {
            let field = |tag: &str| e.find(tag).map(Element::text);
            ExternalReference {
                reference_id: e.attr("Reference_ID").map(str::to_string),
                authors: e.children("Author").map(Element::text).collect(),
                title: field("Title"),
                edition: field("Edition"),
                publication: field("Publication"),
                publication_year: field("Publication_Year"),
                publication_month: field("Publication_Month"),
                publication_day: field("Publication_Day"),
                publisher: field("Publisher"),
                url: field("URL"),
                url_date: field("URL_Date"),
            }
        })
        .collect()
}

/// Distinct weakness identifiers referenced by attack patterns, in
/// first-seen order.
///
/// # Errors
///
/// Fails when a weakness link lacks `CWE_ID`.
pub fn weaknesses(root: &Element) -> Result<Vec<String>> {
    let mut ids = IndexSet::new();
    for pattern in root.find_all(ATTACK_PATTERN_PATH) {
        for weakness in pattern.find_all("Related_Weaknesses/Related_Weakness") {
            ids.insert(weakness.require_attr("CWE_ID")?.trim().to_string());
        }
    }
    Ok(ids.into_iter().collect())
}
