//! CAPEC ontology generator.
//!
//! Reads a CAPEC attack-pattern catalog into a [`SourceTree`], runs one
//! extraction program per record, and collects the resulting entities and
//! child individuals into a [`Catalog`] ready for the Turtle serializer in
//! `capec-ontology`.
//!
//! ```
//! let xml = r#"<Attack_Pattern_Catalog Name="CAPEC" Version="3.9" Date="2023-01-24">
//!   <Attack_Patterns><Attack_Pattern ID="1" Name="Probe" Abstraction="Meta" Status="Draft"/></Attack_Patterns>
//!   <Categories/>
//!   <Views/>
//! </Attack_Pattern_Catalog>"#;
//! let (catalog, report) = capec_codegen::generate_str(xml)?;
//! assert_eq!(catalog.entities.len(), 1);
//! assert_eq!(report.attack_patterns, 1);
//! # Ok::<(), capec_codegen::Error>(())
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod catalog;
pub mod error;
pub mod records;
pub mod rules;
pub mod source;
pub mod views;

pub use error::{Error, Result};
pub use source::SourceTree;

use capec_ontology::model::{Catalog, Entity, Registry};
use serde::Serialize;
use tracing::info;

use crate::source::Element;

/// Report of what was generated.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Number of attack pattern entities.
    pub attack_patterns: usize,
    /// Number of category entities.
    pub categories: usize,
    /// Number of view entities.
    pub views: usize,
    /// Number of registered child individuals.
    pub sub_individuals: usize,
    /// Computed memberships per filtered view, in document order.
    pub view_members: Vec<ViewMembers>,
    /// Distinct weakness identifiers referenced by attack patterns.
    pub weaknesses: usize,
}

/// Members computed for one filtered view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewMembers {
    /// View identifier.
    pub view: String,
    /// Number of `Has_Member` links computed from the view's filter.
    pub members: usize,
}

impl GenerationReport {
    /// Total number of individual blocks in the rendered document.
    #[must_use]
    pub fn individuals(&self) -> usize {
        self.attack_patterns + self.categories + self.views + self.sub_individuals
    }
}

/// Parses `xml` and generates the catalog.
///
/// # Errors
///
/// Fails on malformed XML or on any error [`generate`] reports.
pub fn generate_str(xml: &str) -> Result<(Catalog, GenerationReport)> {
    generate(&SourceTree::parse(xml)?)
}

/// Generates every entity and child individual in the catalog.
///
/// Attack patterns come first, then categories, then views, each in document
/// order. Child individuals are registered in the order their parents are
/// processed.
///
/// # Errors
///
/// Fails when a collection is absent or a record lacks a required attribute;
/// the failing record is named in [`Error::Record`].
pub fn generate(tree: &SourceTree) -> Result<(Catalog, GenerationReport)> {
    let root = tree.root();
    for collection in [catalog::ATTACK_PATTERNS, catalog::CATEGORIES, catalog::VIEWS] {
        if root.find(collection).is_none() {
            return Err(Error::MissingCollection(collection));
        }
    }

    let mut registry = Registry::new();
    let mut entities: Vec<Entity> = Vec::new();
    let mut report = GenerationReport::default();

    info!("generate attack patterns");
    for (index, element) in root.find_all(catalog::ATTACK_PATTERN_PATH).into_iter().enumerate() {
        entities.push(in_record(element, index, || {
            records::attack_pattern(element, &mut registry)
        })?);
        report.attack_patterns += 1;
    }

    info!("generate categories");
    for (index, element) in root.find_all(catalog::CATEGORY_PATH).into_iter().enumerate() {
        entities.push(in_record(element, index, || {
            records::category(element, &mut registry)
        })?);
        report.categories += 1;
    }

    info!("generate views");
    for (index, element) in root.find_all(catalog::VIEW_PATH).into_iter().enumerate() {
        let (entity, members) = in_record(element, index, || {
            records::view(element, root, &mut registry)
        })?;
        if element.find("Filter").is_some() {
            report.view_members.push(ViewMembers {
                view: entity.id.clone(),
                members,
            });
        }
        entities.push(entity);
        report.views += 1;
    }

    report.sub_individuals = registry.len();
    report.weaknesses = catalog::weaknesses(root)?.len();
    info!(
        entities = entities.len(),
        sub_individuals = report.sub_individuals,
        "generation complete"
    );

    let catalog = Catalog {
        header: catalog::header(root),
        external_references: catalog::external_references(root),
        entities,
        registry,
    };
    Ok((catalog, report))
}

/// Runs one record program, labelling any failure with the record.
fn in_record<T>(element: &Element, index: usize, program: impl FnOnce() -> Result<T>) -> Result<T> {
    program().map_err(|source| Error::Record {
        record: match element.attr("ID") {
            Some(id) => capec_ontology::model::record_name(id),
            None => format!("{} #{}", element.name, index + 1),
        },
        source: Box::new(source),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"<Attack_Pattern_Catalog Name="CAPEC" Version="3.9" Date="2023-01-24">
  <Attack_Patterns>
    <Attack_Pattern ID="1" Name="Probe" Abstraction="Meta" Status="Draft">
      <Related_Weaknesses><Related_Weakness CWE_ID="200"/></Related_Weaknesses>
      <Notes><Note Type="Other">n</Note></Notes>
    </Attack_Pattern>
  </Attack_Patterns>
  <Categories>
    <Category ID="100" Name="Group" Status="Draft">
      <Relationships><Has_Member CAPEC_ID="1"/></Relationships>
    </Category>
  </Categories>
  <Views>
    <View ID="2000" Name="All" Type="Implicit" Status="Draft"><Filter>all</Filter></View>
  </Views>
</Attack_Pattern_Catalog>"#;

    #[test]
    fn report_counts_every_kind() -> Result<()> {
        let (catalog, report) = generate_str(CATALOG)?;
        assert_eq!(report.attack_patterns, 1);
        assert_eq!(report.categories, 1);
        assert_eq!(report.views, 1);
        assert_eq!(report.sub_individuals, 1);
        assert_eq!(report.weaknesses, 1);
        assert_eq!(
            report.view_members,
            vec![ViewMembers {
                view: "2000".into(),
                members: 3
            }]
        );
        assert_eq!(report.individuals(), catalog.individual_count());
        Ok(())
    }

    #[test]
    fn entities_keep_collection_order() -> Result<()> {
        let (catalog, _) = generate_str(CATALOG)?;
        let names: Vec<&str> = catalog.entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["CAPEC-1", "CAPEC-100", "CAPEC-2000"]);
        assert_eq!(catalog.header.version, "3.9");
        Ok(())
    }

    #[test]
    fn missing_collection_is_fatal() {
        let err =
            generate_str("<Attack_Pattern_Catalog><Attack_Patterns/></Attack_Pattern_Catalog>")
                .err();
        assert!(matches!(err, Some(Error::MissingCollection("Categories"))));
    }

    #[test]
    fn failing_record_is_named() {
        let xml = CATALOG.replace(
            r#"<Category ID="100" Name="Group" Status="Draft">"#,
            r#"<Category ID="100" Name="Group">"#,
        );
        let err = generate_str(&xml).err();
        assert!(matches!(err, Some(Error::Record { ref record, .. }) if record == "CAPEC-100"));
    }

    #[test]
    fn record_without_id_is_named_by_position() {
        let xml = CATALOG.replace(r#"<View ID="2000""#, r#"<View"#);
        let err = generate_str(&xml).err();
        assert!(matches!(err, Some(Error::Record { ref record, .. }) if record == "View #1"));
    }
}
