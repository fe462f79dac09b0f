//! Whole-catalog runs from fixture documents to rendered Turtle.

use capec_codegen::{generate_str, Error, Result};
use capec_ontology::serializer::shell::Shell;
use capec_ontology::serializer::turtle;

const MINIMAL: &str = include_str!("fixtures/minimal.xml");
const CATALOG: &str = include_str!("fixtures/catalog.xml");
const SHELL: &str = include_str!("../../shell.ttl");

fn render(xml: &str) -> Result<String> {
    let (catalog, _) = generate_str(xml)?;
    Ok(Shell::new(SHELL).render_catalog(&catalog))
}

fn block<'a>(document: &'a str, name: &str) -> &'a str {
    let header = format!("\n### {name}\n");
    document
        .find(&header)
        .and_then(|start| {
            let rest = &document[start..];
            rest.find(" .\n").map(|end| &rest[..end + 3])
        })
        .unwrap_or("")
}

#[test]
fn minimal_catalog_renders_three_records() -> Result<()> {
    let document = render(MINIMAL)?;
    assert_eq!(document.matches("\n### ").count(), 3);

    let pattern = block(&document, "CAPEC-1");
    assert!(pattern.contains("\t:ID 1;"));
    assert!(pattern.contains(":Name \"Probe\""));
    assert!(pattern.contains("rdf:type :Meta"));

    assert!(block(&document, "CAPEC-100").contains(":Has_Member :CAPEC-1 ."));

    let view = block(&document, "CAPEC-2000");
    assert!(view.contains(":Has_Member :CAPEC-1;"));
    assert!(view.contains(":Has_Member :CAPEC-100;"));
    assert!(view.contains(":Has_Member :CAPEC-2000"));
    Ok(())
}

#[test]
fn header_placeholders_are_filled() -> Result<()> {
    let document = render(CATALOG)?;
    assert!(!document.contains("{{"));
    assert!(document.contains("owl:versionInfo \"3.9\""));
    assert!(document.contains(
        ":External_Reference \"Reference_ID: REF-1\\nAuthor: G. Hoglund\\nAuthor: G. McGraw"
    ));
    Ok(())
}

#[test]
fn rendering_is_reproducible() -> Result<()> {
    assert_eq!(render(CATALOG)?, render(CATALOG)?);
    Ok(())
}

#[test]
fn full_record_blocks() -> Result<()> {
    let document = render(CATALOG)?;

    let pattern = block(&document, "CAPEC-10");
    assert!(pattern.contains(
        ":Extended_Description \"The adversary first finds a variable. Then the adversary \\\"overflows\\\" it.\""
    ));
    assert!(pattern.contains(
        ":Alternate_Term_Description \"Shorthand\";\n\t:Alternate_Term \"Env overflow\""
    ));
    assert!(pattern.contains(":ChildOf :CAPEC-100"));
    assert!(pattern.contains(
        ":Execution_Flow :CAPEC-10_Attack_Step_0;\n\t:Execution_Flow :CAPEC-10_Attack_Step_1"
    ));
    assert!(pattern.contains(":Consequence :CAPEC-10_Consequence_1"));
    assert!(pattern.contains(":Related_Weakness cwe:CWE-120;\n\t:Related_Weakness cwe:CWE-302"));
    assert!(pattern.contains("Modification:\\n\\tModification Name: CAPEC Content Team"));

    let step = block(&document, "CAPEC-10_Attack_Step_1");
    assert!(step.contains(":Step \"2\"^^xsd:positiveInteger"));
    assert!(step.contains(
        ":Technique_Description \"Use a generic overflow.\";\n\t:Technique :CAPEC-100 ."
    ));

    let consequence = block(&document, "CAPEC-10_Consequence_1");
    assert!(consequence.contains(":Consequence_Note \"Memory may be disclosed.\""));
    assert!(consequence.contains(":Impact \"Read Data\""));

    let note = block(&document, "CAPEC-262_Note_0");
    assert!(note.contains(":Type \"Maintenance\""));
    assert!(note.contains(":Note_Description \"Under review.\""));
    Ok(())
}

#[test]
fn views_resolve_members() -> Result<()> {
    let (catalog, report) = generate_str(CATALOG)?;
    let members: Vec<(String, usize)> = report
        .view_members
        .iter()
        .map(|v| (v.view.clone(), v.members))
        .collect();
    assert_eq!(members, vec![("2000".to_string(), 7), ("483".to_string(), 1)]);

    let deprecated = catalog
        .find_entity("CAPEC-483")
        .map(turtle::render_entity)
        .unwrap_or_default();
    assert!(deprecated.contains(":Has_Member :CAPEC-13"));
    assert!(!deprecated.contains(":Has_Member :CAPEC-10;"));

    let graph = catalog
        .find_entity("CAPEC-1000")
        .map(turtle::render_entity)
        .unwrap_or_default();
    assert!(graph.contains(":Audience_Description \"Study the hierarchy.\""));
    assert!(graph.contains(":Has_Member :CAPEC-262"));
    Ok(())
}

#[test]
fn individual_count_matches_blocks() -> Result<()> {
    let (catalog, report) = generate_str(CATALOG)?;
    let document = Shell::new(SHELL).render_catalog(&catalog);
    let body = document.split("\n### ").count() - 1;
    assert_eq!(body, report.individuals());
    assert_eq!(report.weaknesses, 2);
    Ok(())
}

#[test]
fn report_serializes() -> Result<()> {
    let (_, report) = generate_str(MINIMAL)?;
    let json = serde_json::to_value(&report).unwrap_or_default();
    assert_eq!(json["attack_patterns"], 1);
    assert_eq!(json["view_members"][0]["view"], "2000");
    assert_eq!(json["view_members"][0]["members"], 3);
    Ok(())
}

#[test]
fn missing_identifier_aborts_the_run() {
    let xml = MINIMAL.replace(r#"<Attack_Pattern ID="1" "#, "<Attack_Pattern ");
    let err = generate_str(&xml).err();
    assert!(matches!(&err, Some(Error::Record { record, .. }) if record == "Attack_Pattern #1"));
    assert!(matches!(
        err,
        Some(Error::Record { source, .. }) if matches!(*source, Error::MissingAttribute { .. })
    ));
}

#[test]
fn malformed_document_is_an_xml_error() {
    let err = generate_str("<Attack_Pattern_Catalog><Attack_Patterns>").err();
    assert!(matches!(err, Some(Error::EmptyDocument | Error::Xml { .. })));
}
