//! Catalog and artifact validators.

pub mod catalog;
pub mod schema;
pub mod turtle;
