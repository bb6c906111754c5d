//! The undo log store
//!
//! A LogStore owns every Batch of one job run, keyed by digest. Logging is
//! a two-step protocol: select a batch, then log operations against it.
//!
//! ## Batch Handles
//!
//! Selecting a batch returns a `BatchHandle` and remembers it as current.
//! Handles carry the store generation they were issued in. `clean` (and a
//! successful `flush`) drops every batch, forgets the current selection
//! and bumps the generation, so an old handle fails with `StaleBatch`
//! instead of silently creating a fresh batch.
//!
//! ## Flush
//!
//! 1. Build one record per batch (digest, correlation fields, inverse
//!    document). A batch that cannot be inverted fails the flush before
//!    anything is handed to the backend.
//! 2. Append the records one by one. On the first failure roll the backend
//!    back and return the error; the store is left intact for a retry.
//! 3. Commit, then clear the store.

use crate::batch::Batch;
use crate::codec;
use crate::ingest::{OperationRequest, Token, TokenReader};
use crate::operation::Operation;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};
use undolog_core::{
    CycleKey, Error, OperationKind, Result, ValueSet, DEFAULT_DATE_FORMAT_MASK,
};
use undolog_durability::{DocumentParser, FlushRecord, MarkupParser, PersistenceBackend};

/// Reference to a batch selected in a LogStore
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BatchHandle {
    digest: String,
    generation: u64,
}

impl BatchHandle {
    /// Digest of the selected batch
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

/// Digest-keyed collection of batches
#[derive(Debug, Clone)]
pub struct LogStore {
    batches: BTreeMap<String, Batch>,
    current: Option<BatchHandle>,
    generation: u64,
    date_format_mask: String,
    correlation_fields: Option<Vec<String>>,
}

impl Default for LogStore {
    fn default() -> Self {
        LogStore {
            batches: BTreeMap::new(),
            current: None,
            generation: 0,
            date_format_mask: DEFAULT_DATE_FORMAT_MASK.to_string(),
            correlation_fields: None,
        }
    }
}

impl LogStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Format mask applied to dates read from tokens
    pub fn with_date_format_mask(mut self, mask: impl Into<String>) -> Self {
        self.date_format_mask = mask.into();
        self
    }

    /// Batch-key labels copied into flush records (default: the whole key)
    pub fn with_correlation_fields(mut self, fields: Vec<String>) -> Self {
        self.correlation_fields = Some(fields);
        self
    }

    /// Format mask applied to dates read from tokens
    pub fn date_format_mask(&self) -> &str {
        &self.date_format_mask
    }

    // ========================================================================
    // Batches
    // ========================================================================

    /// Resolve the batch for `key`, creating it on first use.
    ///
    /// Logically equal keys share one batch.
    pub fn get_or_create_batch(&mut self, key: ValueSet) -> BatchHandle {
        let digest = key.digest();
        if let Entry::Vacant(entry) = self.batches.entry(digest.clone()) {
            debug!(target: "undolog::store", digest = %digest, "Created batch");
            entry.insert(Batch::new(key));
        }
        BatchHandle {
            digest,
            generation: self.generation,
        }
    }

    /// Resolve the batch for `key` and make it current for `log`
    pub fn select_batch(&mut self, key: ValueSet) -> BatchHandle {
        let handle = self.get_or_create_batch(key);
        debug!(target: "undolog::store", digest = %handle.digest, "Selected batch");
        self.current = Some(handle.clone());
        handle
    }

    /// Select the billing-cycle batch `{BILLSEQNO, CUSTOMER_ID}`
    pub fn select_cycle(&mut self, customer_id: i32, bill_seq_no: i32) -> BatchHandle {
        self.select_batch(CycleKey::new(customer_id, bill_seq_no).into())
    }

    /// Currently selected batch
    pub fn current_batch(&self) -> Option<&BatchHandle> {
        self.current.as_ref()
    }

    fn check(&self, handle: &BatchHandle) -> Result<()> {
        if handle.generation != self.generation || !self.batches.contains_key(&handle.digest) {
            return Err(Error::StaleBatch {
                digest: handle.digest.clone(),
            });
        }
        Ok(())
    }

    /// Batch behind `handle`
    pub fn batch(&self, handle: &BatchHandle) -> Result<&Batch> {
        self.check(handle)?;
        self.batches.get(&handle.digest).ok_or_else(|| Error::StaleBatch {
            digest: handle.digest.clone(),
        })
    }

    fn batch_mut(&mut self, handle: &BatchHandle) -> Result<&mut Batch> {
        self.check(handle)?;
        self.batches
            .get_mut(&handle.digest)
            .ok_or_else(|| Error::StaleBatch {
                digest: handle.digest.clone(),
            })
    }

    /// Batch with the given digest
    pub fn get(&self, digest: &str) -> Option<&Batch> {
        self.batches.get(digest)
    }

    /// Batches in digest order
    pub fn batches(&self) -> impl Iterator<Item = &Batch> {
        self.batches.values()
    }

    /// Number of batches
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Number of operations over all batches
    pub fn operation_count(&self) -> usize {
        self.batches.values().map(Batch::len).sum()
    }

    /// Check if the store holds no batches
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Append a fresh, empty operation to the batch behind `handle` and
    /// return it for population
    pub fn create_operation(
        &mut self,
        handle: &BatchHandle,
        kind: OperationKind,
        entity: &str,
    ) -> Result<&mut Operation> {
        let batch = self.batch_mut(handle)?;
        Ok(batch.push(Operation::new(kind, entity)))
    }

    /// Append a populated operation to the batch behind `handle`
    pub fn append(&mut self, handle: &BatchHandle, operation: Operation) -> Result<()> {
        self.batch_mut(handle)?.append(operation);
        Ok(())
    }

    /// Validate `request` and append it to the current batch
    pub fn log(&mut self, request: OperationRequest) -> Result<()> {
        let handle = self.current.clone().ok_or(Error::BatchNotSelected)?;
        self.log_to(&handle, request)
    }

    /// Validate `request` and append it to the batch behind `handle`.
    ///
    /// An Update without a before-image requires a Select on the same
    /// entity earlier in the batch whose image covers every updated label.
    /// Otherwise nothing is registered and `MissingCorrelation` or
    /// `InvalidInput` is returned.
    pub fn log_to(&mut self, handle: &BatchHandle, request: OperationRequest) -> Result<()> {
        self.check(handle)?;
        let operation = request.into_operation()?;
        let batch = self.batch_mut(handle)?;
        if operation.needs_correlation() {
            operation.restore_image(batch)?;
        }
        debug!(
            target: "undolog::ingest",
            kind = %operation.kind(),
            entity = operation.entity(),
            digest = batch.digest(),
            "Logged operation"
        );
        batch.append(operation);
        Ok(())
    }

    /// Read one operation from protocol tokens and log it to the current batch
    pub fn log_tokens<I>(&mut self, kind: OperationKind, entity: &str, tokens: I) -> Result<()>
    where
        I: IntoIterator<Item = Token>,
    {
        let handle = self.current.clone().ok_or(Error::BatchNotSelected)?;
        let request = TokenReader::new()
            .with_date_format_mask(self.date_format_mask.as_str())
            .read(kind, entity, tokens)?;
        self.log_to(&handle, request)
    }

    // ========================================================================
    // Documents
    // ========================================================================

    /// Whole-store forward (`REDOLOG`) document
    pub fn forward_document(&self) -> String {
        codec::serialize_forward(self)
    }

    /// Whole-store inverse (`UNDOLOG`) document
    pub fn inverse_document(&self) -> Result<String> {
        codec::serialize_inverse(self)
    }

    /// SQL statement of every operation, batch by batch in append order
    pub fn sql_statements(&self) -> Vec<String> {
        self.batches.values().flat_map(Batch::sql_statements).collect()
    }

    /// Write the inverse document to `path`
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let document = self.inverse_document()?;
        std::fs::write(path.as_ref(), document)?;
        info!(target: "undolog::codec", path = %path.as_ref().display(), batches = self.batches.len(), "Saved undo document");
        Ok(())
    }

    /// Load a document file into the store; returns the number of operations read
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let bytes = std::fs::read(path.as_ref())?;
        self.load_document(&bytes)
    }

    /// Load a document into the store; returns the number of operations read
    pub fn load_document(&mut self, input: &[u8]) -> Result<usize> {
        self.load_with(&MarkupParser::new(), input)
    }

    /// Load a document with a specific parser.
    ///
    /// All-or-nothing: a malformed document leaves the store untouched.
    pub fn load_with(&mut self, parser: &dyn DocumentParser, input: &[u8]) -> Result<usize> {
        let staged = codec::deserialize_with(parser, input)?;
        let count = staged.operation_count();
        self.absorb(staged);
        Ok(count)
    }

    /// Move every batch of `other` into this store, appending to batches
    /// with the same digest
    pub fn absorb(&mut self, other: LogStore) {
        for (digest, batch) in other.batches {
            match self.batches.entry(digest) {
                Entry::Vacant(entry) => {
                    entry.insert(batch);
                }
                Entry::Occupied(mut entry) => entry.get_mut().absorb(batch),
            }
        }
    }

    // ========================================================================
    // Flush and recovery
    // ========================================================================

    fn correlation_of(&self, batch: &Batch) -> Vec<(String, String)> {
        match &self.correlation_fields {
            None => batch
                .key()
                .iter()
                .map(|v| (v.label().to_string(), v.raw().to_string()))
                .collect(),
            Some(fields) => fields
                .iter()
                .filter_map(|label| {
                    batch
                        .key()
                        .get(label)
                        .map(|v| (label.clone(), v.raw().to_string()))
                })
                .collect(),
        }
    }

    /// One flush record per batch, in digest order
    pub fn flush_records(&self) -> Result<Vec<FlushRecord>> {
        self.batches
            .values()
            .map(|batch| {
                Ok(FlushRecord::new(
                    batch.digest(),
                    self.correlation_of(batch),
                    codec::batch_record_document(batch)?,
                ))
            })
            .collect()
    }

    /// Persist every batch through `backend`, then clear the store.
    ///
    /// Returns the number of records written. On failure the store is left
    /// intact and the backend is rolled back.
    pub fn flush(&mut self, backend: &mut dyn PersistenceBackend) -> Result<usize> {
        info!(target: "undolog::flush", batches = self.batches.len(), backend = backend.backend_id(), "Flush started");
        let records = self.flush_records()?;

        for record in &records {
            if let Err(e) = backend.append(record) {
                warn!(target: "undolog::flush", digest = %record.digest, error = %e, "Append failed, flush aborted");
                rollback(backend);
                return Err(e.into());
            }
        }
        if let Err(e) = backend.commit() {
            warn!(target: "undolog::flush", error = %e, "Commit failed, flush aborted");
            rollback(backend);
            return Err(e.into());
        }

        self.clean();
        info!(target: "undolog::flush", records = records.len(), "Flush completed");
        Ok(records.len())
    }

    /// Drop every batch and invalidate all handles
    pub fn clean(&mut self) {
        self.batches.clear();
        self.current = None;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Decode stored records back into the store (cascaded undo).
    ///
    /// All-or-nothing; returns the number of operations restored.
    pub fn restore(&mut self, records: &[FlushRecord]) -> Result<usize> {
        let parser = MarkupParser::new();
        let mut staged = LogStore::new();
        for record in records {
            staged.absorb(codec::deserialize_with(&parser, record.document.as_bytes())?);
        }
        let count = staged.operation_count();
        self.absorb(staged);
        info!(target: "undolog::flush", records = records.len(), operations = count, "Restored records");
        Ok(count)
    }
}

fn rollback(backend: &mut dyn PersistenceBackend) {
    if let Err(e) = backend.rollback() {
        warn!(target: "undolog::flush", error = %e, "Rollback failed");
    }
}
