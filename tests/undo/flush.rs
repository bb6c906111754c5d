//! Flush Tests
//!
//! One record per batch, commit once, abort and roll back on the first
//! backend failure with the store left intact for a retry.

use crate::common::*;
use undolog::FileBackend;

#[test]
fn flush_writes_one_record_per_batch() {
    let mut store = store_with_customers(&[1, 2, 3]);
    let mut backend = MemoryBackend::new();

    assert_eq!(store.flush(&mut backend).unwrap(), 3);
    assert!(store.is_empty());
    assert!(store.current_batch().is_none());

    let records = backend.records();
    assert_eq!(records.len(), 3);
    assert_eq!(backend.commit_count(), 1);
    for record in records {
        assert!(record.document.starts_with("<UNDOLOG><BATCH><DIGEST>"));
        assert!(record.document.ends_with("</BATCH></UNDOLOG>"));
        assert_eq!(record.correlation.len(), 2);
    }
}

#[test]
fn failed_flush_keeps_store_and_discards_partial_records() {
    let mut store = store_with_customers(&[1, 2, 3]);
    let before = store.inverse_document().unwrap();
    let mut backend = MemoryBackend::failing_after(2);

    let err = store.flush(&mut backend).unwrap_err();
    assert!(err.is_persistence());
    assert_eq!(store.batch_count(), 3);
    assert_eq!(store.inverse_document().unwrap(), before);
    assert!(backend.records().is_empty());
    assert!(backend.pending().is_empty());
    assert_eq!(backend.commit_count(), 0);
}

#[test]
fn retry_after_failure_succeeds() {
    let mut store = store_with_customers(&[1, 2]);
    let mut backend = MemoryBackend::failing_after(0);
    assert!(store.flush(&mut backend).is_err());

    backend.heal();
    assert_eq!(store.flush(&mut backend).unwrap(), 2);
    assert_eq!(backend.records().len(), 2);
}

#[test]
fn selection_required_again_after_flush() {
    let mut store = store_with_customers(&[1]);
    let handle = store.current_batch().cloned().unwrap();
    store.flush(&mut MemoryBackend::new()).unwrap();

    assert!(matches!(
        store.log(insert_customer(2, "Ann")).unwrap_err(),
        Error::BatchNotSelected
    ));
    assert!(matches!(
        store.log_to(&handle, insert_customer(2, "Ann")).unwrap_err(),
        Error::StaleBatch { .. }
    ));
}

#[test]
fn uninvertible_batch_aborts_before_any_append() {
    let mut store = store_with_customers(&[1]);
    let handle = store.select_cycle(2, 1);
    let update = store
        .create_operation(&handle, OperationKind::Update, "ACCOUNT")
        .unwrap();
    update.add_key_value(TypedValue::integer("ID", 1));
    update
        .add_value(TypedValue::integer("BALANCE", 100), ValueRole::After)
        .unwrap();

    let mut backend = MemoryBackend::new();
    assert!(store.flush(&mut backend).unwrap_err().is_missing_correlation());
    assert!(backend.pending().is_empty());
    assert_eq!(store.batch_count(), 2);
}

#[test]
fn flush_to_file_backend_survives_reopen() {
    let dir = temp_dir();
    let path = record_path(dir.path());
    {
        let mut backend = FileBackend::open(&path).unwrap();
        let mut store = store_with_customers(&[42, 43]);
        store.flush(&mut backend).unwrap();
    }

    let backend = FileBackend::open(&path).unwrap();
    let records = backend
        .load(&RecordFilter::all().with_field("CUSTOMER_ID", "43"))
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].digest, "BILLSEQNO/1.CUSTOMER_ID/43");
}

#[test]
fn session_flush_through_configured_file_backend() {
    let dir = temp_dir();
    let session = UndoLogSession::open(&file_config(dir.path())).unwrap();
    session.select_cycle(7, 3);
    session.log(insert_customer(1, "Bob")).unwrap();
    session.log(delete_customer(2, "Ann")).unwrap();
    assert_eq!(session.flush().unwrap(), 1);
    session.close().unwrap();

    let content = std::fs::read_to_string(record_path(dir.path())).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(content.contains("BILLSEQNO/3.CUSTOMER_ID/7"));
}

#[test]
fn correlation_fields_from_config() {
    let config = UndoLogConfig {
        correlation_fields: Some(vec!["CUSTOMER_ID".to_string()]),
        ..memory_config()
    };
    let session = UndoLogSession::open(&config).unwrap();
    session.select_cycle(7, 3);
    session.log(insert_customer(1, "Bob")).unwrap();
    session.flush().unwrap();

    let records = session.load(&RecordFilter::all()).unwrap();
    assert_eq!(
        records[0].correlation,
        vec![("CUSTOMER_ID".to_string(), "7".to_string())]
    );
}
