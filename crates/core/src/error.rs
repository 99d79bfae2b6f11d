//! Error types for DOCX to PPTX conversion.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting a document into a deck.
///
/// Nothing in the conversion pipeline recovers from these locally; every
/// failure aborts the run and is surfaced to the caller unchanged.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The source document, or a value inside it, could not be parsed.
    #[error("Format error: {0}")]
    FormatError(String),

    /// An attribute value the slide styling model cannot represent.
    #[error("Unsupported {attribute} value: {value}")]
    UnsupportedAttribute {
        /// Name of the offending attribute (e.g. "highlight").
        attribute: &'static str,
        /// The value as found in the source.
        value: String,
    },
}

impl Error {
    /// Shorthand for building a [`Error::FormatError`].
    pub fn format(msg: impl Into<String>) -> Self {
        Self::FormatError(msg.into())
    }

    /// Shorthand for building a [`Error::UnsupportedAttribute`].
    pub fn unsupported(attribute: &'static str, value: impl Into<String>) -> Self {
        Self::UnsupportedAttribute {
            attribute,
            value: value.into(),
        }
    }
}
