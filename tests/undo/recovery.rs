//! Recovery Tests
//!
//! Documents and flushed records decode back into a store; an inverse
//! document replays as the forward log of the undo.

use crate::common::*;
use proptest::prelude::*;
use undolog::{codec, FileBackend};

#[test]
fn forward_round_trip_preserves_document() {
    let mut store = LogStore::new();
    store.select_cycle(1, 1);
    store.log(insert_customer(1, "O'Neil & Sons")).unwrap();
    store.log(select_balance(1, 50)).unwrap();
    store.log(update_balance(1, 100)).unwrap();
    store.log(update_balance_explicit(1, 100, 150)).unwrap();
    store.select_cycle(2, 1);
    store.log(delete_customer(5, "Ann")).unwrap();

    let forward = store.forward_document();
    let reloaded = codec::deserialize(forward.as_bytes()).unwrap();
    assert_eq!(reloaded.forward_document(), forward);
}

#[test]
fn inverse_replays_as_forward_log() {
    let mut store = LogStore::new();
    store.select_cycle(1, 1);
    store.log(insert_customer(1, "Bob")).unwrap();
    store.log(delete_customer(2, "Ann")).unwrap();

    let replay = codec::deserialize(store.inverse_document().unwrap().as_bytes()).unwrap();
    let forward = replay.forward_document();
    assert!(position(&forward, "<INSERT>") < position(&forward, "<DELETE>"));
    assert!(forward.contains(r#"<INSERT><ENTITY>CUSTOMER</ENTITY><KEY><ID TypeId="4">2</ID></KEY>"#));

    // undo of the undo restores the original effects
    let cascaded = replay.inverse_document().unwrap();
    assert!(cascaded.contains(r#"<DELETE><ENTITY>CUSTOMER</ENTITY><KEY><ID TypeId="4">2</ID></KEY>"#));
}

#[test]
fn save_and_load_file() {
    let dir = temp_dir();
    let path = dir.path().join("undo.xml");
    let store = store_with_customers(&[1, 2]);
    store.save_to_file(&path).unwrap();

    let mut loaded = LogStore::new();
    assert_eq!(loaded.load_file(&path).unwrap(), 2);
    assert_eq!(loaded.batch_count(), 2);
    assert_eq!(
        loaded.sql_statements(),
        vec![
            "DELETE FROM CUSTOMER WHERE ID=1 AND NAME='Bob'".to_string(),
            "DELETE FROM CUSTOMER WHERE ID=2 AND NAME='Bob'".to_string(),
        ]
    );
}

#[test]
fn load_missing_file_is_io_error() {
    let dir = temp_dir();
    let err = LogStore::new()
        .load_file(dir.path().join("absent.xml"))
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn loading_appends_to_existing_batches() {
    let mut store = store_with_customers(&[1]);
    let document = store_with_customers(&[1]).forward_document();
    store.load_document(document.as_bytes()).unwrap();
    assert_eq!(store.batch_count(), 1);
    assert_eq!(store.operation_count(), 2);
}

#[test]
fn restore_from_file_records() {
    let dir = temp_dir();
    let path = record_path(dir.path());
    let mut backend = FileBackend::open(&path).unwrap();
    store_with_customers(&[10, 11, 12]).flush(&mut backend).unwrap();

    let records = backend
        .load(&RecordFilter::all().with_digest("BILLSEQNO/1.CUSTOMER_ID/11"))
        .unwrap();
    let mut recovered = LogStore::new();
    assert_eq!(recovered.restore(&records).unwrap(), 1);
    assert!(recovered.get("BILLSEQNO/1.CUSTOMER_ID/11").is_some());
    assert!(recovered.get("BILLSEQNO/1.CUSTOMER_ID/10").is_none());
}

#[test]
fn corrupt_record_restores_nothing() {
    let good = store_with_customers(&[1]).flush_records().unwrap();
    let bad = FlushRecord::new("x", Vec::new(), "<UNDOLOG><BATCH>");
    let records = vec![good[0].clone(), bad];

    let mut recovered = LogStore::new();
    assert!(recovered.restore(&records).unwrap_err().is_document());
    assert!(recovered.is_empty());
}

#[test]
fn session_restore_after_flush() {
    let session = UndoLogSession::open(&memory_config()).unwrap();
    session.select_cycle(42, 7);
    session.log(select_balance(1, 50)).unwrap();
    session.log(update_balance(1, 100)).unwrap();
    session.flush().unwrap();

    assert_eq!(
        session
            .restore(&RecordFilter::all().with_field("BILLSEQNO", "7"))
            .unwrap(),
        1
    );
    assert_eq!(
        session.with_store(|store| store.sql_statements()),
        vec!["UPDATE ACCOUNT SET BALANCE=50 WHERE ID=1".to_string()]
    );
}

proptest! {
    #[test]
    fn digest_equal_keys_share_batch(customer in any::<i32>(), cycle in any::<i32>(), n in 1usize..5) {
        let mut store = LogStore::new();
        for id in 0..n {
            store.select_batch(CycleKey::new(customer, cycle).to_value_set());
            store.log(insert_customer(id as i32, "Bob")).unwrap();
        }
        prop_assert_eq!(store.batch_count(), 1);
        prop_assert_eq!(store.operation_count(), n);
    }
}
