//! CAPEC catalog individuals as typed Rust facts.
//!
//! The `capec-ontology` crate holds the in-memory fact model built from a
//! CAPEC attack-pattern catalog and the serializers that render it as Turtle
//! named individuals for an OWL reasoner.
//!
//! # Entry Point
//!
//! ```
//! use capec_ontology::{Entity, Literal, Reference};
//! use capec_ontology::serializer::turtle;
//!
//! let mut entity = Entity::new("1");
//! entity.facts.add_type("Standard");
//! entity.facts.add_data_fact("Name", Literal::text("Probe"));
//! entity.facts.add_object_fact("Related_Weakness", Reference::weakness("200"));
//!
//! let block = turtle::render_entity(&entity);
//! assert!(block.contains(":Name \"Probe\""));
//! assert!(block.contains("cwe:CWE-200"));
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod encoder;
pub mod model;
pub mod serializer;

pub use model::{
    AnnotatedReference, Catalog, CatalogHeader, Entity, ExternalReference, FactSet, Literal,
    Namespace, Reference, Registry, SubIndividual,
};
