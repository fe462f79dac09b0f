//! Extraction primitives shared by the record programs.
//!
//! A [`RecordExtractor`] wraps one catalog record element and the [`Entity`]
//! being built from it. Each method pulls one kind of sub-element into one
//! fact name. Absent optional elements are skipped; an absent required
//! attribute is an [`Error::MissingAttribute`](crate::Error::MissingAttribute).

use capec_ontology::model::{Entity, Literal, Reference, Registry, SubIndividual};

use crate::error::Result;
use crate::source::Element;

/// How the text of a sub-element is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    /// Direct text only.
    Plain,
    /// Whole subtree with XHTML markup stripped.
    Structured,
}

impl Text {
    fn read(self, element: &Element) -> String {
        match self {
            Text::Plain => element.text(),
            Text::Structured => element.structured_text(),
        }
    }
}

/// A data fact whose values carry annotations from a sibling element.
///
/// For every `parent` element, each `value` child becomes a value of fact
/// `name`, annotated under `annotation_name` with the `annotation` children
/// of the same parent.
#[derive(Debug, Clone, Copy)]
pub struct AnnotatedValue {
    /// Path to the elements holding value and annotation side by side.
    pub parent: &'static str,
    /// Child supplying the value.
    pub value: &'static str,
    /// Child supplying the annotation.
    pub annotation: &'static str,
    /// Data fact name.
    pub name: &'static str,
    /// Annotation name.
    pub annotation_name: &'static str,
    /// How the annotation text is read.
    pub text: Text,
}

/// An annotation read from a child of a nested structure.
#[derive(Debug, Clone, Copy)]
pub struct ChildAnnotation {
    /// Child element name.
    pub element: &'static str,
    /// Annotation name.
    pub name: &'static str,
    /// How the text is read.
    pub text: Text,
    /// Attribute that, when present, turns the annotation into an annotated
    /// object fact (named after `element`) pointing at the referenced record.
    pub link: Option<&'static str>,
}

/// A nested structure extracted as child individuals.
#[derive(Debug, Clone, Copy)]
pub struct ChildRule {
    /// Path from the record to each child element.
    pub path: &'static str,
    /// Object fact linking the record to each child.
    pub fact: &'static str,
    /// Child kind: type label and name component.
    pub kind: &'static str,
    /// Attribute → data fact.
    pub attributes: &'static [(&'static str, &'static str)],
    /// Child element → data fact.
    pub elements: &'static [(&'static str, &'static str)],
    /// Child element → annotation.
    pub annotations: &'static [ChildAnnotation],
    /// Annotation receiving the child's own structured text, if any.
    pub own_text: Option<&'static str>,
}

/// Builds one [`Entity`] from one record element.
pub struct RecordExtractor<'a> {
    element: &'a Element,
    entity: Entity,
    registry: &'a mut Registry,
}

impl<'a> RecordExtractor<'a> {
    /// Starts extraction of a record.
    ///
    /// # Errors
    ///
    /// Fails when the record has no `ID` attribute.
    pub fn new(element: &'a Element, registry: &'a mut Registry) -> Result<Self> {
        let id = element.require_attr("ID")?;
        Ok(Self {
            element,
            entity: Entity::new(id),
            registry,
        })
    }

    /// The entity's local name (`CAPEC-<ID>`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.entity.name
    }

    /// Adds the value of a required attribute as a type assertion.
    ///
    /// # Errors
    ///
    /// Fails when the attribute is absent.
    pub fn add_type_from_attribute(&mut self, attribute: &str) -> Result<()> {
        let kind = self.element.require_attr(attribute)?;
        self.entity.facts.add_type(kind.trim());
        Ok(())
    }

    /// Adds a fixed type label that does not depend on the record.
    pub fn add_fixed_type(&mut self, label: &str) {
        self.entity.facts.add_type(label);
    }

    /// Adds every element at `path` as annotation `name`.
    pub fn add_annotation(&mut self, path: &str, name: &str, text: Text) {
        for e in self.element.find_all(path) {
            self.entity
                .facts
                .add_annotation(name, Literal::text(&text.read(e)));
        }
    }

    /// Adds the text of every element at `path` as data fact `name`.
    pub fn add_data_fact(&mut self, path: &str, name: &str) {
        for e in self.element.find_all(path) {
            self.entity
                .facts
                .add_data_fact(name, Literal::text(&e.text()));
        }
    }

    /// Adds an optional attribute of the record as a data fact of the same name.
    pub fn add_data_fact_from_attribute(&mut self, attribute: &str) {
        if let Some(value) = self.element.attr(attribute) {
            self.entity
                .facts
                .add_data_fact(attribute, Literal::text(value));
        }
    }

    /// Adds values paired with sibling annotations.
    pub fn add_annotated_values(&mut self, rule: &AnnotatedValue) {
        for parent in self.element.find_all(rule.parent) {
            let annotations: Vec<Literal> = parent
                .children(rule.annotation)
                .map(|a| Literal::text(&rule.text.read(a)))
                .collect();
            for value in parent.children(rule.value) {
                let value = Literal::text(&value.text());
                if annotations.is_empty() {
                    self.entity.facts.add_data_fact(rule.name, value);
                    continue;
                }
                for annotation in &annotations {
                    self.entity.facts.annotate_data_fact(
                        rule.name,
                        value.clone(),
                        rule.annotation_name,
                        annotation.clone(),
                    );
                }
            }
        }
    }

    /// Adds a required attribute of each element at `path` as data fact
    /// `name`, annotated with the element's own text.
    ///
    /// # Errors
    ///
    /// Fails when an element lacks the attribute.
    pub fn add_attribute_values(
        &mut self,
        path: &str,
        attribute: &str,
        name: &str,
        annotation_name: &str,
    ) -> Result<()> {
        for e in self.element.find_all(path) {
            let value = Literal::text(e.require_attr(attribute)?);
            self.entity.facts.annotate_data_fact(
                name,
                value,
                annotation_name,
                Literal::text(&e.text()),
            );
        }
        Ok(())
    }

    /// Adds relationships to other attack patterns, one object fact per
    /// relationship nature, plus the exclusions declared under `ChildOf`.
    ///
    /// # Errors
    ///
    /// Fails when a relationship lacks `Nature`, `CAPEC_ID` or `Exclude_ID`.
    pub fn add_related_attack_patterns(&mut self) -> Result<()> {
        for related in self
            .element
            .find_all("Related_Attack_Patterns/Related_Attack_Pattern")
        {
            let nature = related.require_attr("Nature")?.trim();
            let target = related.require_attr("CAPEC_ID")?;
            self.entity
                .facts
                .add_object_fact(nature, Reference::record(target));
            if nature == "ChildOf" {
                for excluded in related.children("Exclude_Related") {
                    let id = excluded.require_attr("Exclude_ID")?;
                    self.entity
                        .facts
                        .add_object_fact("Exclude_Related", Reference::record(id));
                }
            }
        }
        Ok(())
    }

    /// Adds `Member_Of` and `Has_Member` links declared under `container`.
    ///
    /// # Errors
    ///
    /// Fails when a link lacks `CAPEC_ID`.
    pub fn add_members(&mut self, container: &str) -> Result<()> {
        let Some(members) = self.element.find(container) else {
            return Ok(());
        };
        for relation in ["Member_Of", "Has_Member"] {
            for link in members.children(relation) {
                let id = link.require_attr("CAPEC_ID")?;
                self.entity
                    .facts
                    .add_object_fact(relation, Reference::record(id));
            }
        }
        Ok(())
    }

    /// Adds computed view content as `Has_Member` links.
    pub fn add_content<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            self.entity
                .facts
                .add_object_fact("Has_Member", Reference::record(id.as_ref()));
        }
    }

    /// Adds links into the weakness catalog.
    ///
    /// # Errors
    ///
    /// Fails when a weakness link lacks `CWE_ID`.
    pub fn add_related_weaknesses(&mut self) -> Result<()> {
        for weakness in self
            .element
            .find_all("Related_Weaknesses/Related_Weakness")
        {
            let id = weakness.require_attr("CWE_ID")?;
            self.entity
                .facts
                .add_object_fact("Related_Weakness", Reference::weakness(id));
        }
        Ok(())
    }

    /// Extracts each element at `rule.path` as a registered child individual.
    ///
    /// Children are named `<record>_<kind>_<ordinal>` with the ordinal
    /// counting siblings of the same kind from zero.
    pub fn add_children(&mut self, rule: &ChildRule) {
        for (ordinal, e) in self.element.find_all(rule.path).into_iter().enumerate() {
            let mut child = SubIndividual::new(&self.entity.name, rule.kind, ordinal);

            for (attribute, fact) in rule.attributes {
                if let Some(value) = e.attr(attribute) {
                    child.facts.add_data_fact(*fact, Literal::text(value));
                }
            }
            for (tag, fact) in rule.elements {
                for field in e.children(tag) {
                    child.facts.add_data_fact(*fact, Literal::text(&field.text()));
                }
            }
            for annotation in rule.annotations {
                for field in e.children(annotation.element) {
                    let text = Literal::text(&annotation.text.read(field));
                    match annotation.link.and_then(|link| field.attr(link)) {
                        Some(target) => child.facts.add_annotated_object_fact(
                            annotation.element,
                            Reference::record(target),
                            annotation.name,
                            text,
                        ),
                        None => child.facts.add_annotation(annotation.name, text),
                    }
                }
            }
            if let Some(name) = rule.own_text {
                child
                    .facts
                    .add_annotation(name, Literal::text(&e.structured_text()));
            }

            let reference = self.registry.register(child);
            self.entity.facts.add_object_fact(rule.fact, reference);
        }
    }

    /// Adds each reference into the global bibliography as a `Reference`
    /// annotation.
    ///
    /// # Errors
    ///
    /// Fails when a reference lacks `External_Reference_ID`.
    pub fn add_references(&mut self) -> Result<()> {
        for reference in self.element.find_all("References/Reference") {
            let mut paragraphs = vec![format!(
                "External reference ID: {}",
                reference.require_attr("External_Reference_ID")?
            )];
            if let Some(section) = reference.attr("Section") {
                paragraphs.push(format!("Section: {section}"));
            }
            self.entity
                .facts
                .add_annotation("Reference", Literal::paragraphs(paragraphs));
        }
        Ok(())
    }

    /// Adds the record's submission and modification log as one
    /// `Content_History` annotation.
    ///
    /// # Errors
    ///
    /// Fails when a contribution lacks `Type` or a previous entry name
    /// lacks `Date`.
    pub fn add_content_history(&mut self) -> Result<()> {
        let Some(history) = self.element.find("Content_History") else {
            return Ok(());
        };
        let mut log: Vec<String> = Vec::new();

        if let Some(submission) = history.find("Submission") {
            log.push("Submission:".to_string());
            push_all(&mut log, submission, "Submission_Name", "Submission Name");
            push_all(
                &mut log,
                submission,
                "Submission_Organization",
                "Submission Organization",
            );
            push_first(&mut log, submission, "Submission_Date", "Submission Date");
            push_first(&mut log, submission, "Submission_Comment", "Submission Comment");
        }
        for modification in history.children("Modification") {
            log.push("Modification:".to_string());
            for (tag, label) in [
                ("Modification_Name", "Modification Name"),
                ("Modification_Organization", "Modification Organization"),
                ("Modification_Date", "Modification Date"),
                ("Modification_Importance", "Modification Importance"),
                ("Modification_Comment", "Modification Comment"),
            ] {
                push_first(&mut log, modification, tag, label);
            }
        }
        for contribution in history.children("Contribution") {
            log.push("Contribution:".to_string());
            for (tag, label) in [
                ("Contribution_Name", "Contribution Name"),
                ("Contribution_Organization", "Contribution Organization"),
                ("Contribution_Date", "Contribution Date"),
                ("Contribution_Comment", "Contribution Comment"),
            ] {
                push_first(&mut log, contribution, tag, label);
            }
            log.push(format!("\tType: {}", contribution.require_attr("Type")?));
        }
        for previous in history.children("Previous_Entry_Name") {
            log.push(format!("Previous Entry Name: {}", previous.text()));
            log.push(format!("\tDate: {}", previous.require_attr("Date")?));
        }

        if !log.is_empty() {
            self.entity
                .facts
                .add_annotation("Content_History", Literal::paragraphs(log));
        }
        Ok(())
    }

    /// Finishes extraction and hands back the entity.
    #[must_use]
    pub fn finish(self) -> Entity {
        self.entity
    }
}

fn push_all(log: &mut Vec<String>, parent: &Element, tag: &str, label: &str) {
    for e in parent.children(tag) {
        log.push(format!("\t{label}: {}", e.text()));
    }
}

fn push_first(log: &mut Vec<String>, parent: &Element, tag: &str, label: &str) {
    if let Some(e) = parent.children(tag).next() {
        log.push(format!("\t{label}: {}", e.text()));
    }
}
