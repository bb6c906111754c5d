//! Undolog - embedded undo logging for batch data-processing jobs
//!
//! As a job inserts, updates and deletes rows, it records each operation
//! under a correlation key (customer + billing cycle, say). The log can be
//! rendered as it happened (forward, `REDOLOG`) or as the sequence that
//! restores the prior state (inverse, `UNDOLOG`), and flushed one record
//! per batch to a persistence backend.
//!
//! # Quick Start
//!
//! ```
//! use undolog::{LogStore, OperationRequest, TypedValue};
//!
//! let mut store = LogStore::new();
//! store.select_cycle(42, 7);
//! store.log(
//!     OperationRequest::insert("CUSTOMER")
//!         .key(TypedValue::integer("ID", 1))
//!         .value(TypedValue::char("NAME", "Bob")),
//! )?;
//!
//! let undo = store.inverse_document()?;
//! assert!(undo.contains("<DELETE><ENTITY>CUSTOMER</ENTITY>"));
//! # Ok::<(), undolog::Error>(())
//! ```
//!
//! # Architecture
//!
//! - `undolog-core`: typed values, value sets and the error taxonomy
//! - `undolog-durability`: document tree and parser, persistence backends
//! - `undolog-engine`: operations, batches, the store, ingestion, codec,
//!   configuration and the shared session

pub use undolog_core::{
    CycleKey, Error, HostField, NativeValue, OperationKind, Result, Scalar, TypeCode, TypedValue,
    ValueKind, ValueRole, ValueSet,
};
pub use undolog_durability::{
    DocumentParser, Element, FileBackend, FlushRecord, MarkupParser, MemoryBackend,
    PersistenceBackend, PersistenceError, RecordFilter,
};
pub use undolog_engine::codec;
pub use undolog_engine::telemetry;
pub use undolog_engine::{
    BackendKind, Batch, BatchHandle, Images, LogStore, Operation, OperationRequest,
    PersistenceConfig, Token, TokenReader, UndoLogConfig, UndoLogSession, CONFIG_FILE_NAME,
};
