//! Persistence of flushed batches
//!
//! A flush hands one `FlushRecord` per batch to a `PersistenceBackend`,
//! then calls `commit` once. On the first failed append the caller invokes
//! `rollback` and stops; the backend must not expose any record of the
//! aborted flush afterwards.
//!
//! | backend         | storage                    | survives restart |
//! |-----------------|----------------------------|------------------|
//! | `MemoryBackend` | process memory             | no               |
//! | `FileBackend`   | JSON lines, one per batch  | yes              |

mod error;
mod file;
mod memory;
mod record;

pub use error::PersistenceError;
pub use file::{FileBackend, FILE_BACKEND_ID};
pub use memory::{MemoryBackend, MEMORY_BACKEND_ID};
pub use record::{FlushRecord, RecordFilter};

/// Persistence backend trait.
///
/// Backends are `Send` so a session holding one can move across threads.
pub trait PersistenceBackend: Send {
    /// Store one record. Not visible to `load` before `commit`.
    fn append(&mut self, record: &FlushRecord) -> Result<(), PersistenceError>;

    /// Make every record appended since the last commit durable
    fn commit(&mut self) -> Result<(), PersistenceError> {
        Ok(())
    }

    /// Discard every record appended since the last commit
    fn rollback(&mut self) -> Result<(), PersistenceError> {
        Ok(())
    }

    /// Stored records matching `filter`, in append order
    fn load(&self, filter: &RecordFilter) -> Result<Vec<FlushRecord>, PersistenceError>;

    /// Unique backend identifier
    fn backend_id(&self) -> &str;
}
