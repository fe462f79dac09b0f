//! Turtle serializer for records and child individuals.
//!
//! Each individual renders as one self-contained block:
//!
//! ```text
//! ### CAPEC-1
//! :CAPEC-1
//! 	rdf:type owl:NamedIndividual;
//! 	:ID 1;
//! 	rdf:type :Standard;
//! 	:Name "Probe" .
//! ```
//!
//! Statements appear in a fixed category order: types, annotations, data
//! facts (each preceded by the annotations scoped to that value), object
//! facts, then annotated object facts. Within a category the insertion order
//! of the [`FactSet`] is kept, so identical input renders byte-identical
//! output.

use crate::encoder::local_name;
use crate::model::{Catalog, Entity, FactSet, Reference, SubIndividual};
use crate::serializer::cpe;

/// Data fact rendered as `xsd:positiveInteger` instead of a plain string.
pub const POSITIVE_INTEGER_FACT: &str = "Step";

/// Object fact rendered through the platform namespace transform.
pub const PLATFORM_FACT: &str = "CPE_ID";

/// Renders one record block.
#[must_use]
pub fn render_entity(entity: &Entity) -> String {
    let mut statements = vec![
        "rdf:type owl:NamedIndividual".to_string(),
        format!(":ID {}", id_literal(&entity.id)),
    ];
    push_facts(&entity.facts, &mut statements);
    block(&entity.name, &statements)
}

/// Renders one child individual block.
#[must_use]
pub fn render_sub_individual(individual: &SubIndividual) -> String {
    let mut statements = vec!["rdf:type owl:NamedIndividual".to_string()];
    push_facts(&individual.facts, &mut statements);
    block(&individual.name, &statements)
}

/// Renders every record, then every registered child, in order.
#[must_use]
pub fn render_individuals(catalog: &Catalog) -> String {
    let mut out = String::with_capacity(catalog.individual_count() * 512);
    for entity in &catalog.entities {
        out.push_str(&render_entity(entity));
    }
    for individual in catalog.registry.iter() {
        out.push_str(&render_sub_individual(individual));
    }
    out
}

/// Renders a reference as a prefixed name.
#[must_use]
pub fn reference(reference: &Reference) -> String {
    match reference {
        Reference::Local(name) => format!(":{}", local_name(name)),
        Reference::External { namespace, local } => {
            format!("{}:{}", namespace.prefix(), local_name(local))
        }
    }
}

/// Assembles a block from its subject and statements.
pub(crate) fn block(name: &str, statements: &[String]) -> String {
    let name = local_name(name);
    format!("\n### {name}\n:{name}\n\t{} .\n", statements.join(";\n\t"))
}

fn push_facts(facts: &FactSet, out: &mut Vec<String>) {
    for kind in facts.types() {
        out.push(format!("rdf:type :{}", local_name(kind)));
    }

    for (name, values) in facts.annotations() {
        let name = local_name(name);
        for value in values {
            out.push(format!(":{name} {value}"));
        }
    }

    for (name, values) in facts.data_facts() {
        let local = local_name(name);
        for (value, annotations) in values {
            for (annotation, texts) in annotations {
                let annotation = local_name(annotation);
                for text in texts {
                    out.push(format!(":{annotation} {text}"));
                }
            }
            if name == POSITIVE_INTEGER_FACT {
                out.push(format!(":{local} {value}^^xsd:positiveInteger"));
            } else {
                out.push(format!(":{local} {value}"));
            }
        }
    }

    for (name, references) in facts.object_facts() {
        let local = local_name(name);
        for target in references {
            match target {
                Reference::External { local: formatted, .. } if name == PLATFORM_FACT => {
                    out.push(format!("cpe:{PLATFORM_FACT} <{}>", cpe::to_uri(formatted)));
                }
                _ => out.push(format!(":{local} {}", reference(target))),
            }
        }
    }

    for (name, references) in facts.annotated_object_facts() {
        let local = local_name(name);
        for annotated in references {
            if !annotated.text.is_empty() {
                out.push(format!(
                    ":{} {}",
                    local_name(&annotated.annotation),
                    annotated.text
                ));
            }
            out.push(format!(":{local} {}", reference(&annotated.reference)));
        }
    }
}

/// Record identifiers are numeric in the catalog; anything else is quoted.
fn id_literal(id: &str) -> String {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        id.to_string()
    } else {
        crate::model::Literal::text(id).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Literal, Registry};

    fn sample_entity() -> Entity {
        let mut entity = Entity::new("1");
        entity.facts.add_type("Standard");
        entity.facts.add_type("Draft");
        entity
            .facts
            .add_annotation("Attack_Pattern_Description", Literal::text("Say \"hi\""));
        entity.facts.annotate_data_fact(
            "Alternate_Term",
            Literal::text("Recon"),
            "Alternate_Term_Description",
            Literal::text("Looking around"),
        );
        entity.facts.add_data_fact("Name", Literal::text("Probe"));
        entity.facts.add_object_fact("ChildOf", Reference::record("2"));
        entity
            .facts
            .add_object_fact("Related_Weakness", Reference::weakness("79"));
        entity
    }

    #[test]
    fn entity_block_has_fixed_statement_order() {
        let text = render_entity(&sample_entity());
        let expected = "\n### CAPEC-1\n:CAPEC-1\n\
            \trdf:type owl:NamedIndividual;\n\
            \t:ID 1;\n\
            \trdf:type :Standard;\n\
            \trdf:type :Draft;\n\
            \t:Attack_Pattern_Description \"Say \\\"hi\\\"\";\n\
            \t:Alternate_Term_Description \"Looking around\";\n\
            \t:Alternate_Term \"Recon\";\n\
            \t:Name \"Probe\";\n\
            \t:ChildOf :CAPEC-2;\n\
            \t:Related_Weakness cwe:CWE-79 .\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn rendering_is_deterministic() {
        assert_eq!(render_entity(&sample_entity()), render_entity(&sample_entity()));
    }

    #[test]
    fn step_is_a_positive_integer() {
        let mut step = SubIndividual::new("CAPEC-1", "Attack_Step", 0);
        step.facts.add_data_fact("Step", Literal::text("1"));
        step.facts.add_data_fact("Phase", Literal::text("Explore"));
        let text = render_sub_individual(&step);
        assert!(text.contains(":Step \"1\"^^xsd:positiveInteger"));
        assert!(text.contains(":Phase \"Explore\""));
        assert!(text.starts_with("\n### CAPEC-1_Attack_Step_0\n:CAPEC-1_Attack_Step_0\n"));
        assert!(!text.contains(":ID"));
    }

    #[test]
    fn annotated_object_fact_puts_annotation_first() {
        let mut step = SubIndividual::new("CAPEC-1", "Attack_Step", 0);
        step.facts.add_annotated_object_fact(
            "Technique",
            Reference::record("7"),
            "Technique_Description",
            Literal::text("Use 7"),
        );
        let text = render_sub_individual(&step);
        assert!(text.contains(";\n\t:Technique_Description \"Use 7\";\n\t:Technique :CAPEC-7 .\n"));
    }

    #[test]
    fn platform_fact_uses_cpe_transform() {
        let mut ind = SubIndividual::new("CAPEC-1", "Platform", 0);
        ind.facts.add_object_fact(
            PLATFORM_FACT,
            Reference::platform("cpe:2.3:a:vendor:product:1.0:*:*:*:*:*:*:*"),
        );
        ind.facts
            .add_object_fact("Observed_Example", Reference::vulnerability("CVE-2021-44228"));
        let text = render_sub_individual(&ind);
        assert!(text.contains("cpe:CPE_ID <cpe:/a:vendor:product:1.0>"));
        assert!(text.contains(":Observed_Example cve:CVE-2021-44228"));
    }

    #[test]
    fn non_numeric_identifier_is_quoted() {
        assert!(render_entity(&Entity::new("x\"1")).contains(":ID \"x\\\"1\""));
    }

    #[test]
    fn individuals_render_entities_before_children() {
        let mut registry = Registry::new();
        registry.register(SubIndividual::new("CAPEC-1", "Note", 0));
        let catalog = Catalog {
            entities: vec![sample_entity()],
            registry,
            ..Catalog::default()
        };
        let text = render_individuals(&catalog);
        let entity_at = text.find("### CAPEC-1\n").unwrap_or(usize::MAX);
        let note_at = text.find("### CAPEC-1_Note_0\n").unwrap_or(0);
        assert!(entity_at < note_at);
        assert_eq!(text.matches("\n### ").count(), 2);
    }
}
