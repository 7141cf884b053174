//! Error types for the postprocessing library.
//!
//! This module defines the errors that can occur while loading, annotating and
//! exporting an analyzed document. Matching failures (a citation or figure
//! mention that cannot be resolved) are not errors and never appear here.

/// Result type alias for postprocessing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during postprocessing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed XML
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed XML attribute
    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    /// Table export failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required element is absent from the document
    #[error("Missing element: {0}")]
    MissingElement(String),

    /// A required attribute is absent from an element
    #[error("Element '{element}' has no '{attribute}' attribute")]
    MissingAttribute {
        /// Identifier (or name) of the element
        element: String,
        /// Attribute that was expected
        attribute: &'static str,
    },

    /// An attribute is present but cannot be interpreted
    #[error("Element '{element}' has an invalid '{attribute}' attribute: '{value}'")]
    InvalidAttribute {
        /// Identifier (or name) of the element
        element: String,
        /// Attribute that failed to parse
        attribute: &'static str,
        /// The offending value
        value: String,
    },

    /// The document already carries position annotations
    #[error("Document '{0}' is already tagged")]
    AlreadyTagged(String),
}
