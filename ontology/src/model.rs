//! Core fact model.
//!
//! Every catalog record becomes an [`Entity`]; every nested structural child
//! (an attack step, a consequence, a taxonomy mapping, a note) becomes a
//! [`SubIndividual`] owned by the run's [`Registry`]. Both carry a [`FactSet`]:
//! ordered, duplicate-free collections of type assertions, annotations, data
//! facts and object facts. Insertion order is the output order.

use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::encoder;

/// Prefix of every catalog record's local name (`CAPEC-<ID>`).
pub const RECORD_PREFIX: &str = "CAPEC-";

/// Prefix of every weakness local name in the companion ontology (`CWE-<ID>`).
pub const WEAKNESS_PREFIX: &str = "CWE-";

/// Returns the local name of the catalog record with native identifier `id`.
#[must_use]
pub fn record_name(id: &str) -> String {
    format!("{RECORD_PREFIX}{}", id.trim())
}

/// Returns the deterministic name of a nested child individual.
///
/// `ordinal` is the 0-based position of the child among its siblings of the
/// same `kind` under the same parent.
#[must_use]
pub fn child_name(parent: &str, kind: &str, ordinal: usize) -> String {
    format!("{parent}_{kind}_{ordinal}")
}

/// An encoded literal body: flattened, escaped, without surrounding quotes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal(String);

impl Literal {
    /// Encodes raw text as a single-line literal.
    #[must_use]
    pub fn text(raw: &str) -> Self {
        Self(encoder::escape(raw))
    }

    /// Encodes a multi-paragraph literal joined with the `\n` marker.
    #[must_use]
    pub fn paragraphs<I, S>(paragraphs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(encoder::escape_paragraphs(paragraphs))
    }

    /// The encoded body.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the encoded body is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

/// Namespaces of the catalogs an external reference can point into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// The companion weakness ontology (`cwe:`).
    Cwe,
    /// Vulnerability identifiers (`cve:`).
    Cve,
    /// Platform enumeration (`cpe:`).
    Cpe,
}

impl Namespace {
    /// The Turtle prefix bound to this namespace.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Namespace::Cwe => "cwe",
            Namespace::Cve => "cve",
            Namespace::Cpe => "cpe",
        }
    }
}

/// The target of an object fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Reference {
    /// An individual in this ontology: a record or a registered child.
    Local(String),
    /// A namespaced pointer into another catalog.
    External {
        /// Catalog the pointer belongs to.
        namespace: Namespace,
        /// Identifier inside that catalog.
        local: String,
    },
}

impl Reference {
    /// A reference to the catalog record with native identifier `id`.
    #[must_use]
    pub fn record(id: &str) -> Self {
        Reference::Local(record_name(id))
    }

    /// A reference to weakness `id` in the companion weakness ontology.
    #[must_use]
    pub fn weakness(id: &str) -> Self {
        Reference::External {
            namespace: Namespace::Cwe,
            local: format!("{WEAKNESS_PREFIX}{}", id.trim()),
        }
    }

    /// A reference to a vulnerability identifier such as `CVE-2021-44228`.
    #[must_use]
    pub fn vulnerability(id: &str) -> Self {
        Reference::External {
            namespace: Namespace::Cve,
            local: id.trim().to_string(),
        }
    }

    /// A reference to a platform, given as a CPE 2.3 formatted string.
    #[must_use]
    pub fn platform(formatted: &str) -> Self {
        Reference::External {
            namespace: Namespace::Cpe,
            local: formatted.trim().to_string(),
        }
    }
}

/// Annotations scoped to one data-fact value, keyed by annotation name.
pub type ValueAnnotations = IndexMap<String, IndexSet<Literal>>;

/// An object fact whose annotation belongs to that single reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotatedReference {
    /// The referenced individual.
    pub reference: Reference,
    /// Annotation property name.
    pub annotation: String,
    /// Annotation text.
    pub text: Literal,
}

/// Accumulated facts of one individual.
///
/// Adding a (name, value) pair that is already present is a no-op.
#[derive(Debug, Clone, Default)]
pub struct FactSet {
    types: IndexSet<String>,
    annotations: IndexMap<String, IndexSet<Literal>>,
    data: IndexMap<String, IndexMap<Literal, ValueAnnotations>>,
    objects: IndexMap<String, IndexSet<Reference>>,
    annotated_objects: IndexMap<String, IndexSet<AnnotatedReference>>,
}

impl FactSet {
    /// Creates an empty fact set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a type assertion.
    pub fn add_type(&mut self, kind: impl Into<String>) {
        self.types.insert(kind.into());
    }

    /// Adds a free-text annotation. Empty text is ignored.
    pub fn add_annotation(&mut self, name: impl Into<String>, text: Literal) {
        if text.is_empty() {
            return;
        }
        self.annotations.entry(name.into()).or_default().insert(text);
    }

    /// Adds a data fact value. Empty values are ignored.
    pub fn add_data_fact(&mut self, name: impl Into<String>, value: Literal) {
        if value.is_empty() {
            return;
        }
        self.data
            .entry(name.into())
            .or_default()
            .entry(value)
            .or_default();
    }

    /// Adds a data fact value together with an annotation scoped to it.
    ///
    /// The value is registered even when `text` is empty.
    pub fn annotate_data_fact(
        &mut self,
        name: impl Into<String>,
        value: Literal,
        annotation: impl Into<String>,
        text: Literal,
    ) {
        if value.is_empty() {
            return;
        }
        let annotations = self
            .data
            .entry(name.into())
            .or_default()
            .entry(value)
            .or_default();
        let texts = annotations.entry(annotation.into()).or_default();
        if !text.is_empty() {
            texts.insert(text);
        }
    }

    /// Adds an object fact.
    pub fn add_object_fact(&mut self, name: impl Into<String>, reference: Reference) {
        self.objects.entry(name.into()).or_default().insert(reference);
    }

    /// Adds an object fact carrying its own inline annotation.
    pub fn add_annotated_object_fact(
        &mut self,
        name: impl Into<String>,
        reference: Reference,
        annotation: impl Into<String>,
        text: Literal,
    ) {
        self.annotated_objects
            .entry(name.into())
            .or_default()
            .insert(AnnotatedReference {
                reference,
                annotation: annotation.into(),
                text,
            });
    }

    /// Type assertions in insertion order.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(String::as_str)
    }

    /// Annotations grouped by name.
    pub fn annotations(&self) -> impl Iterator<Item = (&str, &IndexSet<Literal>)> {
        self.annotations.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Data facts grouped by name, each value with its own annotations.
    pub fn data_facts(
        &self,
    ) -> impl Iterator<Item = (&str, &IndexMap<Literal, ValueAnnotations>)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Object facts grouped by name.
    pub fn object_facts(&self) -> impl Iterator<Item = (&str, &IndexSet<Reference>)> {
        self.objects.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Annotated object facts grouped by name.
    pub fn annotated_object_facts(
        &self,
    ) -> impl Iterator<Item = (&str, &IndexSet<AnnotatedReference>)> {
        self.annotated_objects.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns true if `kind` has been asserted.
    #[must_use]
    pub fn has_type(&self, kind: &str) -> bool {
        self.types.contains(kind)
    }

    /// Annotation values stored under `name`.
    #[must_use]
    pub fn annotation(&self, name: &str) -> Option<&IndexSet<Literal>> {
        self.annotations.get(name)
    }

    /// Data fact values stored under `name`.
    #[must_use]
    pub fn data_fact(&self, name: &str) -> Option<&IndexMap<Literal, ValueAnnotations>> {
        self.data.get(name)
    }

    /// Object fact references stored under `name`.
    #[must_use]
    pub fn object_fact(&self, name: &str) -> Option<&IndexSet<Reference>> {
        self.objects.get(name)
    }

    /// Annotated object fact references stored under `name`.
    #[must_use]
    pub fn annotated_object_fact(&self, name: &str) -> Option<&IndexSet<AnnotatedReference>> {
        self.annotated_objects.get(name)
    }
}

/// One catalog record (attack pattern, category or view).
#[derive(Debug, Clone)]
pub struct Entity {
    /// Native identifier taken from the record's `ID` attribute.
    pub id: String,
    /// Local name (`CAPEC-<ID>`).
    pub name: String,
    /// Accumulated facts.
    pub facts: FactSet,
}

impl Entity {
    /// Creates an entity for the record with native identifier `id`.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            id: id.trim().to_string(),
            name: record_name(id),
            facts: FactSet::new(),
        }
    }
}

/// One nested structural child of a record.
#[derive(Debug, Clone)]
pub struct SubIndividual {
    /// Local name (`<parent>_<kind>_<ordinal>`).
    pub name: String,
    /// Accumulated facts.
    pub facts: FactSet,
}

impl SubIndividual {
    /// Creates the `ordinal`-th child of `kind` under `parent`, typed as `kind`.
    #[must_use]
    pub fn new(parent: &str, kind: &str, ordinal: usize) -> Self {
        let mut facts = FactSet::new();
        facts.add_type(kind);
        Self {
            name: child_name(parent, kind, ordinal),
            facts,
        }
    }
}

/// Emission registry for the child individuals of one run.
///
/// A registry is created per run and handed down the extraction chain, so
/// two runs in one process never see each other's children.
#[derive(Debug, Default)]
pub struct Registry {
    individuals: IndexMap<String, SubIndividual>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a child and returns a local reference to it.
    ///
    /// A child whose name is already registered is dropped; the first
    /// registration wins.
    pub fn register(&mut self, individual: SubIndividual) -> Reference {
        let reference = Reference::Local(individual.name.clone());
        self.individuals
            .entry(individual.name.clone())
            .or_insert(individual);
        reference
    }

    /// Looks up a registered child by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SubIndividual> {
        self.individuals.get(name)
    }

    /// Registered children in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &SubIndividual> {
        self.individuals.values()
    }

    /// Number of registered children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    /// Returns true when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }
}

/// Root-level catalog metadata substituted into the shell template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogHeader {
    /// Catalog name (`Name` attribute of the root element).
    pub name: String,
    /// Catalog version.
    pub version: String,
    /// Catalog publication date.
    pub date: String,
}

/// A bibliographic entry from the catalog's global reference list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalReference {
    /// `Reference_ID` attribute.
    pub reference_id: Option<String>,
    /// Authors in document order.
    pub authors: Vec<String>,
    /// Title.
    pub title: Option<String>,
    /// Edition.
    pub edition: Option<String>,
    /// Publication (journal, proceedings).
    pub publication: Option<String>,
    /// Publication year.
    pub publication_year: Option<String>,
    /// Publication month.
    pub publication_month: Option<String>,
    /// Publication day.
    pub publication_day: Option<String>,
    /// Publisher.
    pub publisher: Option<String>,
    /// URL.
    pub url: Option<String>,
    /// Date the URL was accessed.
    pub url_date: Option<String>,
}

impl ExternalReference {
    /// The reference as `Label: value` paragraphs, absent fields skipped.
    #[must_use]
    pub fn paragraphs(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut push = |label: &str, value: &Option<String>| {
            if let Some(v) = value {
                out.push(format!("{label}: {v}"));
            }
        };
        push("Reference_ID", &self.reference_id);
        for author in &self.authors {
            push("Author", &Some(author.clone()));
        }
        push("Title", &self.title);
        push("Edition", &self.edition);
        push("Publication", &self.publication);
        push("Publication year", &self.publication_year);
        push("Publication month", &self.publication_month);
        push("Publication day", &self.publication_day);
        push("Publisher", &self.publisher);
        push("URL", &self.url);
        push("URL date", &self.url_date);
        out
    }
}

/// The extracted catalog: everything the serializer needs for one run.
#[derive(Debug, Default)]
pub struct Catalog {
    /// Root-level metadata.
    pub header: CatalogHeader,
    /// Global bibliographic references.
    pub external_references: Vec<ExternalReference>,
    /// Records in extraction order: patterns, categories, views.
    pub entities: Vec<Entity>,
    /// Child individuals registered while extracting `entities`.
    pub registry: Registry,
}

impl Catalog {
    /// Looks up an entity by local name.
    #[must_use]
    pub fn find_entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Number of blocks the serializer emits: entities plus children.
    #[must_use]
    pub fn individual_count(&self) -> usize {
        self.entities.len() + self.registry.len()
    }
}
