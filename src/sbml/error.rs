use std::string::FromUtf8Error;

use thiserror::Error;

/// Errors that can occur during SBML parsing, serialization, and extraction
#[derive(Debug, Error)]
pub enum SbmlError {
    /// Error when reading or writing raw bytes fails
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error raised by the underlying XML reader
    #[error("Malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Error raised while decoding XML attributes
    #[error("Malformed XML attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    /// Error when serialized SBML is not valid UTF-8
    #[error("SBML output is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    /// Error when the input is not an SBML document at all
    #[error("Not an SBML document: {0}")]
    InvalidDocument(String),

    /// Error when the SBML document doesn't contain a model
    #[error("SBML document has no model")]
    MissingModel,

    /// Error when a required attribute is absent from an element
    #[error("Element <{element}> is missing required attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    /// Error when a numeric attribute or MathML number cannot be parsed
    #[error("Invalid number '{0}'")]
    InvalidNumber(String),

    /// Error when a reaction id cannot be resolved in the model
    #[error("Unknown reaction: {0}")]
    UnknownReaction(String),

    /// Error when a species referenced by a reaction is absent from the model
    #[error("Unknown species: {0}")]
    UnknownSpecies(String),

    /// Error when an element id cannot be resolved in the model
    #[error("Unknown element: {0}")]
    UnknownElement(String),

    /// Error when a MathML construct outside the supported subset is found
    #[error("Unsupported MathML element: <{0}>")]
    UnsupportedMathElement(String),

    /// Error when MathML content is structurally invalid
    #[error("Malformed MathML: {0}")]
    MalformedMath(String),

    /// Error when the document ends before an element is closed
    #[error("Unexpected end of document while parsing <{0}>")]
    UnexpectedEof(String),
}
