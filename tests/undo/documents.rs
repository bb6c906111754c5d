//! Forward and Inverse Document Tests
//!
//! Exact document text for the basic operation kinds, batch envelopes and
//! the ordering of undo elements.

use crate::common::*;

const CUSTOMER_FIELDS: &str =
    r#"<ENTITY>CUSTOMER</ENTITY><KEY><ID TypeId="4">1</ID></KEY><VALUE><NAME TypeId="1">Bob</NAME></VALUE>"#;

#[test]
fn insert_forward_and_inverse_text() {
    let mut store = LogStore::new();
    store.select_cycle(42, 7);
    store.log(insert_customer(1, "Bob")).unwrap();

    let forward = store.forward_document();
    assert!(forward.contains(&format!("<INSERT>{}</INSERT>", CUSTOMER_FIELDS)));

    let inverse = store.inverse_document().unwrap();
    assert!(inverse.contains(&format!("<DELETE>{}</DELETE>", CUSTOMER_FIELDS)));
    assert!(!inverse.contains("<INSERT>"));
}

#[test]
fn delete_inverts_to_insert() {
    let mut store = LogStore::new();
    store.select_cycle(42, 7);
    store.log(delete_customer(1, "Bob")).unwrap();

    assert!(store
        .forward_document()
        .contains(&format!("<DELETE>{}</DELETE>", CUSTOMER_FIELDS)));
    assert!(store
        .inverse_document()
        .unwrap()
        .contains(&format!("<INSERT>{}</INSERT>", CUSTOMER_FIELDS)));
}

#[test]
fn whole_store_envelopes() {
    let store = store_with_customers(&[42]);
    let key = r#"<KEY><BILLSEQNO TypeId="4">1</BILLSEQNO><CUSTOMER_ID TypeId="4">42</CUSTOMER_ID></KEY>"#;

    assert_eq!(
        store.forward_document(),
        format!(
            "<REDOLOG><BATCH><DIGEST>BILLSEQNO/1.CUSTOMER_ID/42</DIGEST>{}<INSERT>{}</INSERT></BATCH></REDOLOG>",
            key, CUSTOMER_FIELDS
        )
    );
    assert_eq!(
        store.inverse_document().unwrap(),
        format!(
            "<UNDOLOG><BATCH><DIGEST>BILLSEQNO/1.CUSTOMER_ID/42</DIGEST>{}<DELETE>{}</DELETE></BATCH></UNDOLOG>",
            key, CUSTOMER_FIELDS
        )
    );
}

#[test]
fn empty_store_documents() {
    let store = LogStore::new();
    assert_eq!(store.forward_document(), "<REDOLOG></REDOLOG>");
    assert_eq!(store.inverse_document().unwrap(), "<UNDOLOG></UNDOLOG>");
}

#[test]
fn undo_elements_are_newest_first() {
    let mut store = LogStore::new();
    store.select_cycle(1, 1);
    store
        .log(
            OperationRequest::insert("ACCOUNT")
                .key(TypedValue::integer("ID", 1))
                .value(TypedValue::integer("BALANCE", 50)),
        )
        .unwrap();
    store.log(update_balance_explicit(1, 50, 100)).unwrap();
    store.log(update_balance_explicit(1, 100, 150)).unwrap();

    let forward = store.forward_document();
    assert!(position(&forward, "<INSERT>") < position(&forward, "<UPDATE>"));

    let inverse = store.inverse_document().unwrap();
    let restore_100 = position(&inverse, r#"<BALANCE TypeId="4">100</BALANCE>"#);
    let restore_50 = position(&inverse, r#"<UPDATE><ENTITY>ACCOUNT</ENTITY><KEY><ID TypeId="4">1</ID></KEY><VALUE><BALANCE TypeId="4">50</BALANCE>"#);
    let delete = position(&inverse, "<DELETE>");
    assert!(restore_100 < restore_50);
    assert!(restore_50 < delete);
}

#[test]
fn select_never_appears_in_documents() {
    let mut store = LogStore::new();
    store.select_cycle(1, 1);
    store.log(select_balance(1, 50)).unwrap();
    assert!(!store.forward_document().contains("SELECT"));
    assert!(!store.inverse_document().unwrap().contains("SELECT"));
    assert_eq!(store.operation_count(), 1);
}

#[test]
fn batches_in_digest_order() {
    let store = store_with_customers(&[43, 42]);
    let forward = store.forward_document();
    assert!(
        position(&forward, "CUSTOMER_ID/42") < position(&forward, "CUSTOMER_ID/43"),
        "batches should be sorted by digest"
    );
}

#[test]
fn textual_values_escaped_numeric_values_not() {
    let mut store = LogStore::new();
    store.select_cycle(1, 1);
    store
        .log(
            OperationRequest::insert("NOTE")
                .key(TypedValue::long("ID", 9_000_000_000))
                .value(TypedValue::varchar("BODY", "a<b & \"c\""))
                .value(TypedValue::double("RATE", 0.5)),
        )
        .unwrap();
    let forward = store.forward_document();
    assert!(forward.contains(r#"<ID TypeId="13">9000000000</ID>"#));
    assert!(forward.contains("a&lt;b &amp; &quot;c&quot;"));
    assert!(forward.contains(">0.5</RATE>"));
}

#[test]
fn dates_carry_format_mask() {
    let mut store = LogStore::new();
    store.select_cycle(1, 1);
    store
        .log(
            OperationRequest::insert("RUN")
                .key(TypedValue::integer("ID", 1))
                .value(TypedValue::date("RUN_DATE", "20150108120000")),
        )
        .unwrap();
    assert!(store
        .forward_document()
        .contains(r#"FormatMask="YYYYMMDDHH24MISS">20150108120000</RUN_DATE>"#));
}

#[test]
fn sql_statements_follow_append_order() {
    let mut store = LogStore::new();
    store.select_cycle(1, 1);
    store.log(insert_customer(1, "Bob")).unwrap();
    store.log(select_balance(1, 50)).unwrap();
    store.log(update_balance(1, 100)).unwrap();
    store.log(delete_customer(2, "Ann")).unwrap();

    assert_eq!(
        store.sql_statements(),
        vec![
            "INSERT INTO CUSTOMER (ID,NAME) VALUES (1,'Bob')".to_string(),
            "SELECT BALANCE FROM ACCOUNT WHERE ID=1 AND BALANCE=50".to_string(),
            "UPDATE ACCOUNT SET BALANCE=100 WHERE ID=1".to_string(),
            "DELETE FROM CUSTOMER WHERE ID=2 AND NAME='Ann'".to_string(),
        ]
    );
}
