//! Undo log engine
//!
//! This crate holds the logging model and everything that drives it:
//! - Operation: one recorded row access and its forward/inverse forms
//! - Batch: operations sharing a correlation key
//! - LogStore: digest-keyed batches, selection, flush and recovery
//! - Ingestion: token-stream and builder construction of validated requests
//! - Codec: REDOLOG/UNDOLOG documents and their decoding
//! - Session: configuration-driven lifecycle shared between threads

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod codec;
pub mod config;
pub mod ingest;
pub mod operation;
pub mod session;
pub mod store;
pub mod telemetry;

pub use batch::Batch;
pub use config::{BackendKind, PersistenceConfig, UndoLogConfig, CONFIG_FILE_NAME};
pub use ingest::{OperationRequest, Token, TokenReader};
pub use operation::{Images, Operation};
pub use session::UndoLogSession;
pub use store::{BatchHandle, LogStore};
