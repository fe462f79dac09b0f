//! Serializers for the extracted catalog.
//!
//! - **Turtle** ([`turtle`]): one block per record and per child individual
//! - **Shell** ([`shell`]): the static header/footer template around the blocks
//! - **Weaknesses** ([`weakness`]): the companion weakness ontology
//! - **CPE** ([`cpe`]): the platform-name transform used by `CPE_ID` facts

pub mod cpe;
pub mod shell;
pub mod turtle;
pub mod weakness;
