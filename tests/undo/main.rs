//! Integration tests for undo logging.
//!
//! These tests drive the public API end to end: batch selection and
//! ingestion, forward and inverse documents, flush through real backends,
//! and recovery of flushed records into a fresh store.

#[path = "../common/mod.rs"]
mod common;

mod correlation;
mod documents;
mod flush;
mod ingestion;
mod recovery;
