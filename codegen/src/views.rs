//! View membership resolver.
//!
//! Views that carry a `Filter` element select their content by a predicate
//! over the whole catalog. The predicate for each view is fixed here, keyed
//! by view identifier; it is the only place catalog policy lives in code
//! rather than in the catalog itself.

use crate::catalog::{ATTACK_PATTERN_PATH, CATEGORY_PATH, VIEW_PATH};
use crate::source::Element;

/// Attack patterns in the "Deprecated Entries"-style allow-list view.
pub const ALLOW_LIST: &[u32] = &[
    187, 498, 604, 605, 606, 608, 609, 610, 612, 613, 614, 615, 617, 618, 619, 621, 622, 623, 625,
    626, 627, 628, 629,
];

/// A membership predicate over the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewRule {
    /// Every attack pattern, category and view.
    Everything,
    /// Attack patterns whose `Abstraction` equals the given level.
    Abstraction(&'static str),
    /// Attack patterns mapped at least once into the named external taxonomy.
    Taxonomy(&'static str),
    /// Every record whose `Status` is deprecated.
    Deprecated,
    /// A literal list of attack pattern identifiers.
    AllowList(&'static [u32]),
}

/// View identifier → membership rule.
pub const VIEW_RULES: &[(u32, ViewRule)] = &[
    (2000, ViewRule::Everything),
    (282, ViewRule::Abstraction("Meta")),
    (283, ViewRule::Abstraction("Standard")),
    (284, ViewRule::Abstraction("Detailed")),
    (333, ViewRule::Taxonomy("WASC")),
    (483, ViewRule::Deprecated),
    (553, ViewRule::AllowList(ALLOW_LIST)),
    (658, ViewRule::Taxonomy("ATTACK")),
    (659, ViewRule::Taxonomy("OWASP Attacks")),
];

/// Looks up the rule for a view identifier.
///
/// Returns `None` for identifiers without a computed membership; those views
/// keep only the members listed in the catalog.
#[must_use]
pub fn rule_for(view_id: &str) -> Option<ViewRule> {
    let id: u32 = view_id.trim().parse().ok()?;
    VIEW_RULES
        .iter()
        .find(|(key, _)| *key == id)
        .map(|(_, rule)| *rule)
}

impl ViewRule {
    /// Identifiers of the records selected by this rule, in document order.
    #[must_use]
    pub fn members(self, catalog: &Element) -> Vec<String> {
        let patterns = catalog.find_all(ATTACK_PATTERN_PATH);
        match self {
            ViewRule::Everything => ids(all_records(catalog)),
            ViewRule::Abstraction(level) => ids(
                patterns
                    .into_iter()
                    .filter(|p| p.attr("Abstraction").map(str::trim) == Some(level)),
            ),
            ViewRule::Taxonomy(name) => ids(patterns.into_iter().filter(|p| {
                p.find_all("Taxonomy_Mappings/Taxonomy_Mapping")
                    .iter()
                    .any(|m| m.attr("Taxonomy_Name").map(str::trim) == Some(name))
            })),
            ViewRule::Deprecated => ids(all_records(catalog).filter(|r| {
                r.attr("Status")
                    .is_some_and(|s| s.trim().eq_ignore_ascii_case("deprecated"))
            })),
            ViewRule::AllowList(list) => list.iter().map(u32::to_string).collect(),
        }
    }
}

fn all_records(catalog: &Element) -> impl Iterator<Item = &Element> {
    catalog
        .find_all(ATTACK_PATTERN_PATH)
        .into_iter()
        .chain(catalog.find_all(CATEGORY_PATH))
        .chain(catalog.find_all(VIEW_PATH))
}

fn ids<'a>(records: impl Iterator<Item = &'a Element>) -> Vec<String> {
    records
        .filter_map(|r| r.attr("ID"))
        .map(|id| id.trim().to_string())
        .collect()
}
