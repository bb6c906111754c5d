//! In-memory persistence backend
//!
//! Records appended since the last commit are pending; `commit` makes them
//! visible to `load`, `rollback` discards them. Used by tests and by jobs
//! that only need the undo log for the lifetime of the process.

use super::error::PersistenceError;
use super::record::{FlushRecord, RecordFilter};
use super::PersistenceBackend;

/// Backend identifier
pub const MEMORY_BACKEND_ID: &str = "memory";

/// In-memory persistence backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    committed: Vec<FlushRecord>,
    pending: Vec<FlushRecord>,
    commits: usize,
    accept_limit: Option<usize>,
    accepted: usize,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that accepts `limit` appends over its lifetime and rejects
    /// every append after that
    pub fn failing_after(limit: usize) -> Self {
        MemoryBackend {
            accept_limit: Some(limit),
            ..Default::default()
        }
    }

    /// Lift the append limit
    pub fn heal(&mut self) {
        self.accept_limit = None;
    }

    /// Committed records in append order
    pub fn records(&self) -> &[FlushRecord] {
        &self.committed
    }

    /// Records appended since the last commit
    pub fn pending(&self) -> &[FlushRecord] {
        &self.pending
    }

    /// Number of commits so far
    pub fn commit_count(&self) -> usize {
        self.commits
    }
}

impl PersistenceBackend for MemoryBackend {
    fn append(&mut self, record: &FlushRecord) -> Result<(), PersistenceError> {
        if let Some(limit) = self.accept_limit {
            if self.accepted >= limit {
                return Err(PersistenceError::rejected(
                    MEMORY_BACKEND_ID,
                    format!("append limit of {} reached", limit),
                ));
            }
        }
        self.accepted += 1;
        self.pending.push(record.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), PersistenceError> {
        self.committed.append(&mut self.pending);
        self.commits += 1;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), PersistenceError> {
        self.pending.clear();
        Ok(())
    }

    fn load(&self, filter: &RecordFilter) -> Result<Vec<FlushRecord>, PersistenceError> {
        Ok(self
            .committed
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    fn backend_id(&self) -> &str {
        MEMORY_BACKEND_ID
    }
}
