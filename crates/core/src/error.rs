//! Error types for the undo log
//!
//! This module defines the error taxonomy shared by every layer.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! All errors are synchronous and surface to the direct caller. Construction
//! is all-or-nothing: an operation that fails validation is never partially
//! registered in a store.

use std::io;
use thiserror::Error;

/// Result type alias for undo log operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the undo log
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input: unknown type code, wrong value role for an operation
    /// kind, malformed token sequence, missing label or value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An update needs a before-image, none was supplied and no matching
    /// select was recorded in its batch
    #[error("no prior read recorded for update on entity {entity}; cannot derive restore values")]
    MissingCorrelation {
        /// Entity of the update
        entity: String,
    },

    /// Malformed document: wrong root, bad nesting, unknown element
    #[error("Document error: {0}")]
    Document(String),

    /// Persistence backend failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// An operation was logged before any batch was selected
    #[error("Batch not initialized")]
    BatchNotSelected,

    /// A batch handle was used after the store was flushed or cleaned
    #[error("Batch handle for digest '{digest}' is no longer valid")]
    StaleBatch {
        /// Digest the handle was issued for
        digest: String,
    },

    /// I/O error (file save/load)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create an `InvalidInput` error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a `MissingCorrelation` error
    pub fn missing_correlation(entity: impl Into<String>) -> Self {
        Error::MissingCorrelation {
            entity: entity.into(),
        }
    }

    /// Create a `Document` error
    pub fn document(msg: impl Into<String>) -> Self {
        Error::Document(msg.into())
    }

    /// Create a `Persistence` error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Error::Persistence(msg.into())
    }

    /// Check for `InvalidInput`
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }

    /// Check for `MissingCorrelation`
    pub fn is_missing_correlation(&self) -> bool {
        matches!(self, Error::MissingCorrelation { .. })
    }

    /// Check for `Document`
    pub fn is_document(&self) -> bool {
        matches!(self, Error::Document(_))
    }

    /// Check for `Persistence`
    pub fn is_persistence(&self) -> bool {
        matches!(self, Error::Persistence(_))
    }
}
