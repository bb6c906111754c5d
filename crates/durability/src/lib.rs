//! Durability layer for the undo log
//!
//! This crate handles everything that leaves the in-memory store:
//!
//! - Document: element tree and the parser seam used to read undo documents
//! - Persistence: flush records, recovery filters and the backend trait,
//!   with in-memory and JSON-lines file backends

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod persistence;

pub use document::{DocumentError, DocumentParser, Element, MarkupParser};
pub use persistence::{
    FileBackend, FlushRecord, MemoryBackend, PersistenceBackend, PersistenceError, RecordFilter,
};
