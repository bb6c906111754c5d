//! Document error types

use thiserror::Error;

/// Errors raised while parsing or interpreting a structured document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// The input is not well formed
    #[error("Malformed document at byte {offset}: {detail}")]
    Malformed {
        /// Byte offset where parsing stopped
        offset: usize,
        /// Human-readable error description
        detail: String,
    },

    /// The input is not valid UTF-8
    #[error("Document is not valid UTF-8: {0}")]
    Encoding(String),

    /// Nesting exceeds the parser limit
    #[error("Document nesting exceeds {max} levels")]
    TooDeep {
        /// Configured limit
        max: usize,
    },

    /// Root element is not one of the accepted names
    #[error("Root element is <{found}>, expected {expected}")]
    WrongRoot {
        /// Root element found
        found: String,
        /// Accepted root names
        expected: String,
    },

    /// An element appeared where it is not allowed
    #[error("Unexpected element <{found}> in <{parent}>")]
    UnexpectedElement {
        /// Enclosing element
        parent: String,
        /// Offending element
        found: String,
    },

    /// A required element is absent
    #[error("Missing element <{name}> in <{parent}>")]
    MissingElement {
        /// Enclosing element
        parent: String,
        /// Required element
        name: String,
    },

    /// Text holds an unknown or unterminated entity
    #[error("Bad entity in <{element}>: {detail}")]
    BadEntity {
        /// Element whose text failed to decode
        element: String,
        /// Decoder message
        detail: String,
    },
}

impl DocumentError {
    /// Create a malformed-input error
    pub fn malformed(offset: usize, detail: impl Into<String>) -> Self {
        DocumentError::Malformed {
            offset,
            detail: detail.into(),
        }
    }

    /// Create an unexpected-element error
    pub fn unexpected(parent: impl Into<String>, found: impl Into<String>) -> Self {
        DocumentError::UnexpectedElement {
            parent: parent.into(),
            found: found.into(),
        }
    }

    /// Create a missing-element error
    pub fn missing(parent: impl Into<String>, name: impl Into<String>) -> Self {
        DocumentError::MissingElement {
            parent: parent.into(),
            name: name.into(),
        }
    }
}

impl From<DocumentError> for undolog_core::Error {
    fn from(e: DocumentError) -> Self {
        undolog_core::Error::document(e.to_string())
    }
}
