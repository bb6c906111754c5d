//! Shared undo log session
//!
//! `UndoLogSession` is the process-level entry point: one session per job
//! run, opened from configuration, shared by reference between the code
//! paths that log operations, and closed when the run ends. The store and
//! the backend each sit behind a `parking_lot::Mutex`; when both are held
//! the store is locked first.

use crate::config::UndoLogConfig;
use crate::ingest::{OperationRequest, Token};
use crate::store::{BatchHandle, LogStore};
use crate::telemetry;
use parking_lot::Mutex;
use tracing::{info, warn};
use undolog_core::{OperationKind, Result, ValueSet};
use undolog_durability::{FlushRecord, PersistenceBackend, RecordFilter};

/// Undo log store plus its persistence backend
pub struct UndoLogSession {
    store: Mutex<LogStore>,
    backend: Mutex<Option<Box<dyn PersistenceBackend>>>,
}

impl UndoLogSession {
    /// Open a session: install tracing and build the configured backend
    pub fn open(config: &UndoLogConfig) -> Result<Self> {
        let backend = config.open_backend()?;
        Ok(Self::assemble(config, backend))
    }

    /// Open a session that flushes to `backend` instead of the configured one
    pub fn with_backend(config: &UndoLogConfig, backend: Box<dyn PersistenceBackend>) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, Some(backend)))
    }

    fn assemble(config: &UndoLogConfig, backend: Option<Box<dyn PersistenceBackend>>) -> Self {
        telemetry::init(config.trace_level);
        let mut store = LogStore::new().with_date_format_mask(config.date_format_mask.as_str());
        if let Some(fields) = &config.correlation_fields {
            store = store.with_correlation_fields(fields.clone());
        }
        info!(
            target: "undolog::store",
            backend = backend.as_ref().map_or("none", |b| b.backend_id()),
            "Undo log session opened"
        );
        UndoLogSession {
            store: Mutex::new(store),
            backend: Mutex::new(backend),
        }
    }

    /// Select (creating if needed) the batch for `key`
    pub fn select_batch(&self, key: ValueSet) -> BatchHandle {
        self.store.lock().select_batch(key)
    }

    /// Select the billing-cycle batch
    pub fn select_cycle(&self, customer_id: i32, bill_seq_no: i32) -> BatchHandle {
        self.store.lock().select_cycle(customer_id, bill_seq_no)
    }

    /// Log a request to the current batch
    pub fn log(&self, request: OperationRequest) -> Result<()> {
        self.store.lock().log(request)
    }

    /// Log a request to the batch behind `handle`
    pub fn log_to(&self, handle: &BatchHandle, request: OperationRequest) -> Result<()> {
        self.store.lock().log_to(handle, request)
    }

    /// Read one operation from protocol tokens and log it to the current batch
    pub fn log_tokens<I>(&self, kind: OperationKind, entity: &str, tokens: I) -> Result<()>
    where
        I: IntoIterator<Item = Token>,
    {
        self.store.lock().log_tokens(kind, entity, tokens)
    }

    /// Run `f` with exclusive access to the store
    pub fn with_store<R>(&self, f: impl FnOnce(&mut LogStore) -> R) -> R {
        f(&mut self.store.lock())
    }

    /// Number of batches awaiting flush
    pub fn batch_count(&self) -> usize {
        self.store.lock().batch_count()
    }

    /// Number of operations awaiting flush
    pub fn operation_count(&self) -> usize {
        self.store.lock().operation_count()
    }

    /// Whole-store inverse document
    pub fn inverse_document(&self) -> Result<String> {
        self.store.lock().inverse_document()
    }

    /// Whole-store forward document
    pub fn forward_document(&self) -> String {
        self.store.lock().forward_document()
    }

    /// Flush every batch to the backend.
    ///
    /// Without a backend the store is only cleared. Returns the number of
    /// records written.
    pub fn flush(&self) -> Result<usize> {
        let mut store = self.store.lock();
        let mut backend = self.backend.lock();
        match backend.as_mut() {
            Some(backend) => store.flush(&mut **backend),
            None => {
                if !store.is_empty() {
                    warn!(target: "undolog::flush", batches = store.batch_count(), "No persistence backend, discarding batches");
                }
                store.clean();
                Ok(0)
            }
        }
    }

    /// Stored records matching `filter`; empty without a backend
    pub fn load(&self, filter: &RecordFilter) -> Result<Vec<FlushRecord>> {
        match self.backend.lock().as_ref() {
            Some(backend) => Ok(backend.load(filter)?),
            None => Ok(Vec::new()),
        }
    }

    /// Decode stored records matching `filter` back into the store
    pub fn restore(&self, filter: &RecordFilter) -> Result<usize> {
        let mut store = self.store.lock();
        let records = self.load(filter)?;
        store.restore(&records)
    }

    /// Flush what is left before the session is dropped.
    ///
    /// On failure the batches stay in the session and `close` can be
    /// retried.
    pub fn close(&self) -> Result<()> {
        let written = self.flush()?;
        info!(target: "undolog::store", records = written, "Undo log session closed");
        Ok(())
    }
}

impl std::fmt::Debug for UndoLogSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UndoLogSession")
            .field("batches", &self.batch_count())
            .finish_non_exhaustive()
    }
}
