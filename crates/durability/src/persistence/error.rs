//! Persistence error types

use std::io;
use thiserror::Error;

/// Errors raised by a persistence backend
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A record could not be encoded for storage
    #[error("Record serialization error: {0}")]
    Serialization(String),

    /// A stored record could not be decoded
    #[error("Corrupt record at line {line}: {detail}")]
    Corrupt {
        /// 1-based line of the record
        line: usize,
        /// Decoder message
        detail: String,
    },

    /// The backend refused the record
    #[error("Record rejected by {backend} backend: {reason}")]
    Rejected {
        /// Backend identifier
        backend: String,
        /// Reason reported by the backend
        reason: String,
    },
}

impl PersistenceError {
    /// Create a rejection error
    pub fn rejected(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        PersistenceError::Rejected {
            backend: backend.into(),
            reason: reason.into(),
        }
    }
}

impl From<PersistenceError> for undolog_core::Error {
    fn from(e: PersistenceError) -> Self {
        undolog_core::Error::persistence(e.to_string())
    }
}
