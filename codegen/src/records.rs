//! Extraction programs, one per record kind.
//!
//! Each program is a fixed sequence of [`RecordExtractor`] calls; the order
//! of the calls is the order the facts appear in the rendered block.

use capec_ontology::model::{Entity, Registry};
use tracing::{debug, warn};

use crate::error::Result;
use crate::rules::{AnnotatedValue, ChildAnnotation, ChildRule, RecordExtractor, Text};
use crate::source::Element;
use crate::views;

const ALTERNATE_TERM: AnnotatedValue = AnnotatedValue {
    parent: "Alternate_Terms/Alternate_Term",
    value: "Term",
    annotation: "Description",
    name: "Alternate_Term",
    annotation_name: "Alternate_Term_Description",
    text: Text::Structured,
};

const AUDIENCE: AnnotatedValue = AnnotatedValue {
    parent: "Audience/Stakeholder",
    value: "Type",
    annotation: "Description",
    name: "Audience",
    annotation_name: "Audience_Description",
    text: Text::Plain,
};

const ATTACK_STEP: ChildRule = ChildRule {
    path: "Execution_Flow/Attack_Step",
    fact: "Execution_Flow",
    kind: "Attack_Step",
    attributes: &[],
    elements: &[("Step", "Step"), ("Phase", "Phase")],
    annotations: &[
        ChildAnnotation {
            element: "Description",
            name: "Attack_Step_Description",
            text: Text::Structured,
            link: None,
        },
        ChildAnnotation {
            element: "Technique",
            name: "Technique_Description",
            text: Text::Structured,
            link: Some("CAPEC_ID"),
        },
    ],
    own_text: None,
};

const CONSEQUENCE: ChildRule = ChildRule {
    path: "Consequences/Consequence",
    fact: "Consequence",
    kind: "Consequence",
    attributes: &[("Consequence_ID", "Consequence_ID")],
    elements: &[
        ("Scope", "Scope"),
        ("Impact", "Impact"),
        ("Likelihood", "Likelihood"),
    ],
    annotations: &[ChildAnnotation {
        element: "Note",
        name: "Consequence_Note",
        text: Text::Structured,
        link: None,
    }],
    own_text: None,
};

const TAXONOMY_MAPPING: ChildRule = ChildRule {
    path: "Taxonomy_Mappings/Taxonomy_Mapping",
    fact: "Taxonomy_Mapping",
    kind: "Taxonomy_Mapping",
    attributes: &[("Taxonomy_Name", "Taxonomy_Name")],
    elements: &[
        ("Entry_ID", "Entry_ID"),
        ("Entry_Name", "Entry_Name"),
        ("Mapping_Fit", "Mapping_Fit"),
    ],
    annotations: &[],
    own_text: None,
};

const NOTE: ChildRule = ChildRule {
    path: "Notes/Note",
    fact: "Note",
    kind: "Note",
    attributes: &[("Type", "Type")],
    elements: &[],
    annotations: &[],
    own_text: Some("Note_Description"),
};

/// Builds the entity for one `Attack_Pattern` record.
///
/// # Errors
///
/// Fails when the record or one of its links lacks a required attribute.
pub fn attack_pattern(element: &Element, registry: &mut Registry) -> Result<Entity> {
    let mut record = RecordExtractor::new(element, registry)?;
    debug!(record = record.name(), "attack pattern");

    record.add_annotation("Description", "Attack_Pattern_Description", Text::Structured);
    record.add_annotation("Extended_Description", "Extended_Description", Text::Structured);
    record.add_annotated_values(&ALTERNATE_TERM);
    record.add_data_fact("Likelihood_Of_Attack", "Likelihood_Of_Attack");
    record.add_data_fact("Typical_Severity", "Typical_Severity");
    record.add_data_fact_from_attribute("Name");
    record.add_related_attack_patterns()?;
    record.add_type_from_attribute("Abstraction")?;
    record.add_type_from_attribute("Status")?;
    record.add_children(&ATTACK_STEP);
    record.add_annotation("Prerequisites/Prerequisite", "Prerequisite", Text::Structured);
    record.add_attribute_values("Skills_Required/Skill", "Level", "Skill", "Skill_Description")?;
    record.add_annotation("Resources_Required/Resource", "Resource", Text::Structured);
    record.add_annotation("Indicators/Indicator", "Indicator", Text::Structured);
    record.add_children(&CONSEQUENCE);
    record.add_annotation("Mitigations/Mitigation", "Mitigation", Text::Structured);
    record.add_annotation("Example_Instances/Example", "Example", Text::Structured);
    record.add_related_weaknesses()?;
    record.add_children(&TAXONOMY_MAPPING);
    record.add_references()?;
    record.add_children(&NOTE);
    record.add_content_history()?;

    Ok(record.finish())
}

/// Builds the entity for one `Category` record.
///
/// # Errors
///
/// Fails when the record or one of its links lacks a required attribute.
pub fn category(element: &Element, registry: &mut Registry) -> Result<Entity> {
    let mut record = RecordExtractor::new(element, registry)?;
    debug!(record = record.name(), "category");

    record.add_fixed_type("Category");
    record.add_type_from_attribute("Status")?;
    record.add_data_fact_from_attribute("Name");
    record.add_annotation("Summary", "Summary", Text::Structured);
    record.add_members("Relationships")?;
    record.add_children(&TAXONOMY_MAPPING);
    record.add_references()?;
    record.add_children(&NOTE);
    record.add_content_history()?;

    Ok(record.finish())
}

/// Builds the entity for one `View` record.
///
/// Returns the entity and the number of members computed from the view's
/// filter; zero when the view has no filter or no known rule.
///
/// # Errors
///
/// Fails when the record or one of its links lacks a required attribute.
pub fn view(
    element: &Element,
    catalog: &Element,
    registry: &mut Registry,
) -> Result<(Entity, usize)> {
    let mut record = RecordExtractor::new(element, registry)?;
    debug!(record = record.name(), "view");

    record.add_type_from_attribute("Type")?;
    record.add_type_from_attribute("Status")?;
    record.add_data_fact_from_attribute("Name");
    record.add_annotation("Objective", "Objective", Text::Structured);
    record.add_annotated_values(&AUDIENCE);
    record.add_members("Members")?;
    record.add_annotation("Filter", "Filter", Text::Plain);

    let mut computed = 0;
    if element.find("Filter").is_some() {
        let id = element.attr("ID").unwrap_or_default();
        match views::rule_for(id) {
            Some(rule) => {
                let members = rule.members(catalog);
                computed = members.len();
                record.add_content(members);
            }
            None => warn!(view = id, "view carries a filter but has no membership rule"),
        }
    }

    record.add_references()?;
    record.add_children(&NOTE);
    record.add_content_history()?;

    Ok((record.finish(), computed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::source::SourceTree;
    use capec_ontology::serializer::turtle;
    use capec_ontology::Literal;

    const PATTERN: &str = r#"<Attack_Pattern ID="10" Name="Buffer Overflow via Environment Variables" Abstraction="Detailed" Status="Draft">
  <Description>Targets <xhtml:b>environment</xhtml:b> variables.</Description>
  <Likelihood_Of_Attack>High</Likelihood_Of_Attack>
  <Typical_Severity>High</Typical_Severity>
  <Related_Attack_Patterns>
    <Related_Attack_Pattern Nature="ChildOf" CAPEC_ID="100">
      <Exclude_Related Exclude_ID="282"/>
    </Related_Attack_Pattern>
    <Related_Attack_Pattern Nature="CanPrecede" CAPEC_ID="13"/>
  </Related_Attack_Patterns>
  <Execution_Flow>
    <Attack_Step><Step>1</Step><Phase>Explore</Phase><Description>Probe the target.</Description></Attack_Step>
  </Execution_Flow>
  <Skills_Required><Skill Level="Low">Find the variable.</Skill></Skills_Required>
  <Consequences>
    <Consequence><Scope>Availability</Scope><Impact>Unreliable Execution</Impact></Consequence>
  </Consequences>
  <Related_Weaknesses><Related_Weakness CWE_ID="120"/></Related_Weaknesses>
  <Taxonomy_Mappings>
    <Taxonomy_Mapping Taxonomy_Name="WASC"><Entry_ID>07</Entry_ID><Entry_Name>Buffer Overflow</Entry_Name></Taxonomy_Mapping>
  </Taxonomy_Mappings>
  <References><Reference External_Reference_ID="REF-1" Section="Chapter 3"/></References>
  <Notes><Note Type="Other">Seen <xhtml:i>often</xhtml:i>.</Note></Notes>
  <Content_History>
    <Submission><Submission_Name>CAPEC Content Team</Submission_Name><Submission_Date>2014-06-23</Submission_Date></Submission>
  </Content_History>
</Attack_Pattern>"#;

    #[test]
    fn attack_pattern_program() -> Result<()> {
        let tree = SourceTree::parse(PATTERN)?;
        let mut registry = Registry::new();
        let entity = attack_pattern(tree.root(), &mut registry)?;

        assert_eq!(entity.name, "CAPEC-10");
        assert_eq!(entity.facts.types().collect::<Vec<_>>(), vec!["Detailed", "Draft"]);
        assert!(entity.facts.object_fact("ChildOf").is_some());
        assert!(entity.facts.object_fact("CanPrecede").is_some());
        assert!(entity.facts.object_fact("Exclude_Related").is_some());
        assert_eq!(
            registry.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            vec![
                "CAPEC-10_Attack_Step_0",
                "CAPEC-10_Consequence_0",
                "CAPEC-10_Taxonomy_Mapping_0",
                "CAPEC-10_Note_0",
            ]
        );

        let block = turtle::render_entity(&entity);
        assert!(block.contains(":Attack_Pattern_Description \"Targets environment variables.\""));
        assert!(block.contains(":Skill_Description \"Find the variable.\";\n\t:Skill \"Low\""));
        assert!(block.contains(":Reference \"External reference ID: REF-1\\nSection: Chapter 3\""));
        assert!(block.contains(":Related_Weakness cwe:CWE-120"));
        assert!(block.contains(":Execution_Flow :CAPEC-10_Attack_Step_0"));
        assert!(block.contains(
            ":Content_History \"Submission:\\n\\tSubmission Name: CAPEC Content Team"
        ));

        let description = block.find(":Attack_Pattern_Description").unwrap_or(usize::MAX);
        let history = block.find(":Content_History").unwrap_or(0);
        assert!(description < history);
        Ok(())
    }

    #[test]
    fn note_child_keeps_its_own_text() -> Result<()> {
        let tree = SourceTree::parse(PATTERN)?;
        let mut registry = Registry::new();
        attack_pattern(tree.root(), &mut registry)?;
        let note = registry.get("CAPEC-10_Note_0");
        let texts: Vec<&str> = note
            .and_then(|n| n.facts.annotation("Note_Description"))
            .map(|s| s.iter().map(Literal::as_str).collect())
            .unwrap_or_default();
        assert_eq!(texts, vec!["Seen often."]);
        assert!(note.is_some_and(|n| n.facts.has_type("Note")));
        Ok(())
    }

    #[test]
    fn pattern_without_status_is_fatal() -> Result<()> {
        let tree = SourceTree::parse(r#"<Attack_Pattern ID="1" Abstraction="Meta"/>"#)?;
        let mut registry = Registry::new();
        let err = attack_pattern(tree.root(), &mut registry).err();
        assert!(matches!(
            err,
            Some(Error::MissingAttribute { ref attribute, .. }) if attribute == "Status"
        ));
        Ok(())
    }

    #[test]
    fn category_program() -> Result<()> {
        let tree = SourceTree::parse(
            r#"<Category ID="100" Name="Overflow" Status="Draft">
                <Summary>Overflows.</Summary>
                <Relationships><Has_Member CAPEC_ID="10"/><Member_Of CAPEC_ID="1000"/></Relationships>
            </Category>"#,
        )?;
        let mut registry = Registry::new();
        let entity = category(tree.root(), &mut registry)?;
        let block = turtle::render_entity(&entity);
        assert!(block.contains("\trdf:type :Category;\n\trdf:type :Draft;"));
        assert!(block.contains(":Summary \"Overflows.\""));
        assert!(block.contains(":Member_Of :CAPEC-1000;\n\t:Has_Member :CAPEC-10"));
        assert!(registry.is_empty());
        Ok(())
    }

    #[test]
    fn filtered_view_gets_computed_members() -> Result<()> {
        let tree = SourceTree::parse(
            r#"<Attack_Pattern_Catalog>
                <Attack_Patterns><Attack_Pattern ID="1" Abstraction="Meta" Status="Stable"/></Attack_Patterns>
                <Categories/>
                <Views>
                  <View ID="282" Name="Meta" Type="Implicit" Status="Draft">
                    <Objective>Meta patterns.</Objective>
                    <Audience><Stakeholder><Type>Academic</Type><Description>Study</Description></Stakeholder></Audience>
                    <Filter>/Attack_Pattern_Catalog/Attack_Patterns/Attack_Pattern[@Abstraction='Meta']</Filter>
                  </View>
                </Views>
            </Attack_Pattern_Catalog>"#,
        )?;
        let catalog = tree.root();
        let element = catalog.find("Views/View");
        let mut registry = Registry::new();
        let (entity, computed) = match element {
            Some(e) => view(e, catalog, &mut registry)?,
            None => return Err(Error::MissingCollection("Views")),
        };
        assert_eq!(computed, 1);
        let block = turtle::render_entity(&entity);
        assert!(block.contains(":Audience_Description \"Study\";\n\t:Audience \"Academic\""));
        assert!(block.contains(":Has_Member :CAPEC-1"));
        assert!(block.contains(":Filter \"/Attack_Pattern_Catalog"));
        Ok(())
    }

    #[test]
    fn unknown_filtered_view_keeps_listed_members_only() -> Result<()> {
        let tree = SourceTree::parse(
            r#"<View ID="9999" Name="Custom" Type="Graph" Status="Draft">
                <Members><Has_Member CAPEC_ID="5"/></Members>
                <Filter>anything</Filter>
            </View>"#,
        )?;
        let mut registry = Registry::new();
        let (entity, computed) = view(tree.root(), tree.root(), &mut registry)?;
        assert_eq!(computed, 0);
        assert_eq!(entity.facts.object_fact("Has_Member").map(|s| s.len()), Some(1));
        Ok(())
    }
}
