//! Correlation Tests
//!
//! Updates logged without a before-image restore the values read by the
//! first Select on the same entity in the same batch.

use crate::common::*;

#[test]
fn update_restores_selected_balance() {
    let mut store = LogStore::new();
    store.select_cycle(42, 7);
    store.log(select_balance(1, 50)).unwrap();
    store.log(update_balance(1, 100)).unwrap();

    let inverse = store.inverse_document().unwrap();
    assert!(inverse.contains(
        r#"<UPDATE><ENTITY>ACCOUNT</ENTITY><KEY><ID TypeId="4">1</ID></KEY><VALUE><BALANCE TypeId="4">50</BALANCE></VALUE></UPDATE>"#
    ));
}

#[test]
fn update_without_select_is_rejected_at_log_time() {
    let mut store = LogStore::new();
    store.select_cycle(42, 7);
    let err = store.log(update_balance(1, 100)).unwrap_err();
    assert!(err.is_missing_correlation());
    assert!(err.to_string().contains("ACCOUNT"));
    assert_eq!(store.operation_count(), 0);
}

#[test]
fn update_with_explicit_before_needs_no_select() {
    let mut store = LogStore::new();
    store.select_cycle(42, 7);
    store.log(update_balance_explicit(1, 50, 100)).unwrap();
    assert!(store
        .inverse_document()
        .unwrap()
        .contains(r#"<VALUE><BALANCE TypeId="4">50</BALANCE></VALUE>"#));
}

#[test]
fn select_in_another_batch_does_not_correlate() {
    let mut store = LogStore::new();
    store.select_cycle(1, 1);
    store.log(select_balance(1, 50)).unwrap();
    store.select_cycle(2, 1);
    assert!(store
        .log(update_balance(1, 100))
        .unwrap_err()
        .is_missing_correlation());
}

#[test]
fn first_select_wins() {
    let mut store = LogStore::new();
    store.select_cycle(1, 1);
    store.log(select_balance(1, 50)).unwrap();
    store.log(select_balance(1, 75)).unwrap();
    store.log(update_balance(1, 100)).unwrap();
    let inverse = store.inverse_document().unwrap();
    assert!(inverse.contains(r#"<BALANCE TypeId="4">50</BALANCE>"#));
    assert!(!inverse.contains(r#"<BALANCE TypeId="4">75</BALANCE>"#));
}

#[test]
fn restore_image_keeps_update_labels_only() {
    let mut store = LogStore::new();
    store.select_cycle(1, 1);
    store
        .log(
            OperationRequest::select("ACCOUNT")
                .key(TypedValue::integer("ID", 1))
                .value(TypedValue::char("STATUS", "OPEN"))
                .value(TypedValue::integer("BALANCE", 50))
                .value(TypedValue::char("CURRENCY", "EUR")),
        )
        .unwrap();
    store
        .log(
            OperationRequest::update("ACCOUNT")
                .key(TypedValue::integer("ID", 1))
                .value(TypedValue::char("CURRENCY", "USD"))
                .value(TypedValue::integer("BALANCE", 100)),
        )
        .unwrap();

    let inverse = store.inverse_document().unwrap();
    assert!(inverse.contains(
        r#"<VALUE><CURRENCY TypeId="1">EUR</CURRENCY><BALANCE TypeId="4">50</BALANCE></VALUE>"#
    ));
    assert!(!inverse.contains("STATUS"));
}

#[test]
fn update_beyond_select_image_is_rejected_at_log_time() {
    let mut store = LogStore::new();
    store.select_cycle(1, 1);
    store.log(select_balance(1, 50)).unwrap();
    let err = store
        .log(
            OperationRequest::update("ACCOUNT")
                .key(TypedValue::integer("ID", 1))
                .value(TypedValue::integer("BALANCE", 100))
                .value(TypedValue::char("STATUS", "CLOSED")),
        )
        .unwrap_err();

    assert!(err.is_invalid_input());
    assert!(err.to_string().contains("unable to assign value to STATUS"));
    assert_eq!(store.operation_count(), 1);
    assert!(store.inverse_document().is_ok());
}
