//! Generator error type.

/// Failures that abort a generation run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The catalog document is not well-formed XML.
    #[error("malformed catalog XML near byte {position}: {source}")]
    Xml {
        /// Byte offset reported by the reader.
        position: usize,
        /// Underlying reader error.
        #[source]
        source: quick_xml::Error,
    },

    /// The document has no root element.
    #[error("catalog document has no root element")]
    EmptyDocument,

    /// An element lacks an attribute the record cannot be rendered without.
    #[error("<{element}> is missing required attribute `{attribute}`")]
    MissingAttribute {
        /// Local name of the element.
        element: String,
        /// Name of the missing attribute.
        attribute: String,
    },

    /// A top-level record collection is absent.
    #[error("catalog has no <{0}> collection")]
    MissingCollection(&'static str),

    /// Extraction of one record failed.
    #[error("failed to extract {record}: {source}")]
    Record {
        /// Record label: `CAPEC-<ID>`, or the element name and position when
        /// the identifier itself is missing.
        record: String,
        /// What went wrong.
        #[source]
        source: Box<Error>,
    },
}

/// Result alias for generator operations.
pub type Result<T> = std::result::Result<T, Error>;
