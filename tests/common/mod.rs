//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::path::{Path, PathBuf};
pub use undolog::{
    BackendKind, CycleKey, Error, FlushRecord, LogStore, MemoryBackend, OperationKind,
    OperationRequest, PersistenceBackend, PersistenceConfig, RecordFilter, Token, TypedValue,
    UndoLogConfig, UndoLogSession, ValueRole, ValueSet,
};
use tempfile::TempDir;

// ============================================================================
// Requests
// ============================================================================

/// Insert into CUSTOMER keyed by ID
pub fn insert_customer(id: i32, name: &str) -> OperationRequest {
    OperationRequest::insert("CUSTOMER")
        .key(TypedValue::integer("ID", id))
        .value(TypedValue::char("NAME", name))
}

/// Delete from CUSTOMER keyed by ID
pub fn delete_customer(id: i32, name: &str) -> OperationRequest {
    OperationRequest::delete("CUSTOMER")
        .key(TypedValue::integer("ID", id))
        .value(TypedValue::char("NAME", name))
}

/// Read of ACCOUNT.BALANCE keyed by ID
pub fn select_balance(id: i32, balance: i32) -> OperationRequest {
    OperationRequest::select("ACCOUNT")
        .key(TypedValue::integer("ID", id))
        .value(TypedValue::integer("BALANCE", balance))
}

/// Update of ACCOUNT.BALANCE with only the after-image
pub fn update_balance(id: i32, balance: i32) -> OperationRequest {
    OperationRequest::update("ACCOUNT")
        .key(TypedValue::integer("ID", id))
        .value(TypedValue::integer("BALANCE", balance))
}

/// Update of ACCOUNT.BALANCE with both images
pub fn update_balance_explicit(id: i32, before: i32, after: i32) -> OperationRequest {
    OperationRequest::update("ACCOUNT")
        .key(TypedValue::integer("ID", id))
        .value(TypedValue::integer("BALANCE", before))
        .next_section()
        .value(TypedValue::integer("BALANCE", after))
}

// ============================================================================
// Stores and sessions
// ============================================================================

/// Store with one insert per customer in billing cycle 1
pub fn store_with_customers(customers: &[i32]) -> LogStore {
    let mut store = LogStore::new();
    for &customer in customers {
        store.select_cycle(customer, 1);
        store
            .log(insert_customer(customer, "Bob"))
            .expect("insert should log");
    }
    store
}

/// Config using the in-memory backend
pub fn memory_config() -> UndoLogConfig {
    UndoLogConfig {
        persistence: PersistenceConfig {
            backend: BackendKind::Memory,
            path: None,
        },
        ..UndoLogConfig::default()
    }
}

/// Config using a record file under `dir`
pub fn file_config(dir: &Path) -> UndoLogConfig {
    UndoLogConfig {
        persistence: PersistenceConfig {
            backend: BackendKind::File,
            path: Some(record_path(dir).to_string_lossy().into_owned()),
        },
        ..UndoLogConfig::default()
    }
}

/// Record file location used by `file_config`
pub fn record_path(dir: &Path) -> PathBuf {
    dir.join("undo-records.jsonl")
}

/// Fresh temporary directory
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("temp dir")
}

/// Position of `needle` in `haystack`, panicking with context when absent
pub fn position(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("{:?} not found in {}", needle, haystack))
}
