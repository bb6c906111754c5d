//! Ingestion Protocol Tests
//!
//! Token streams and builder requests go through the same validation;
//! a rejected request never leaves a partial operation behind.

use crate::common::*;
use undolog::NativeValue;

fn balance_tokens(sections: usize) -> Vec<Token> {
    let mut tokens = vec![Token::Key, Token::native("ID", 1i32)];
    for i in 0..sections {
        tokens.push(Token::Value);
        tokens.push(Token::native("BALANCE", 50i32 * (i as i32 + 1)));
    }
    tokens.push(Token::End);
    tokens
}

#[test]
fn logging_before_selection_fails() {
    let mut store = LogStore::new();
    let err = store
        .log_tokens(OperationKind::Insert, "ACCOUNT", balance_tokens(1))
        .unwrap_err();
    assert!(matches!(err, Error::BatchNotSelected));
    assert_eq!(err.to_string(), "Batch not initialized");
}

#[test]
fn slot_counts_for_single_image_kinds() {
    for kind in [OperationKind::Insert, OperationKind::Delete, OperationKind::Select] {
        let mut store = LogStore::new();
        store.select_cycle(1, 1);
        for sections in [0, 2] {
            let err = store
                .log_tokens(kind, "ACCOUNT", balance_tokens(sections))
                .unwrap_err();
            assert!(err.is_invalid_input(), "{} with {} sections", kind, sections);
        }
        store
            .log_tokens(kind, "ACCOUNT", balance_tokens(1))
            .unwrap();
        assert_eq!(store.operation_count(), 1);
    }
}

#[test]
fn slot_counts_for_update() {
    let mut store = LogStore::new();
    store.select_cycle(1, 1);
    for sections in [0, 3] {
        assert!(store
            .log_tokens(OperationKind::Update, "ACCOUNT", balance_tokens(sections))
            .unwrap_err()
            .is_invalid_input());
    }

    // one slot needs a correlated select
    assert!(store
        .log_tokens(OperationKind::Update, "ACCOUNT", balance_tokens(1))
        .unwrap_err()
        .is_missing_correlation());

    // two slots are before then after
    store
        .log_tokens(OperationKind::Update, "ACCOUNT", balance_tokens(2))
        .unwrap();
    assert!(store
        .inverse_document()
        .unwrap()
        .contains(r#"<VALUE><BALANCE TypeId="4">50</BALANCE></VALUE>"#));

    store
        .log_tokens(OperationKind::Select, "ACCOUNT", balance_tokens(1))
        .unwrap();
    store
        .log_tokens(OperationKind::Update, "ACCOUNT", balance_tokens(1))
        .unwrap();
    assert_eq!(store.operation_count(), 3);
}

#[test]
fn missing_key_section() {
    let mut store = LogStore::new();
    store.select_cycle(1, 1);
    let err = store
        .log_tokens(
            OperationKind::Insert,
            "ACCOUNT",
            vec![Token::Value, Token::native("BALANCE", 1i32), Token::End],
        )
        .unwrap_err();
    assert!(err.to_string().contains("key section not defined"));
}

#[test]
fn missing_value_section() {
    let mut store = LogStore::new();
    store.select_cycle(1, 1);
    let err = store
        .log_tokens(OperationKind::Insert, "ACCOUNT", balance_tokens(0))
        .unwrap_err();
    assert!(err.to_string().contains("value section not defined"));
}

#[test]
fn field_without_value_handle() {
    let mut store = LogStore::new();
    store.select_cycle(1, 1);
    let tokens = vec![
        Token::Key,
        Token::Field {
            field: undolog::HostField::Integer,
            label: Some("ID".to_string()),
            value: None,
        },
        Token::Value,
        Token::native("BALANCE", 1i32),
        Token::End,
    ];
    let err = store
        .log_tokens(OperationKind::Insert, "ACCOUNT", tokens)
        .unwrap_err();
    assert!(err.to_string().contains("missing label or value"));
    assert_eq!(store.operation_count(), 0);
}

#[test]
fn unrecognized_token_stops_parsing() {
    let mut store = LogStore::new();
    store.select_cycle(1, 1);
    let mut tokens = balance_tokens(1);
    tokens.insert(2, Token::from_code(99));
    let err = store
        .log_tokens(OperationKind::Insert, "ACCOUNT", tokens)
        .unwrap_err();
    assert!(err.is_invalid_input());
    assert_eq!(store.operation_count(), 0);
}

#[test]
fn mismatched_native_handle_rejected() {
    let mut store = LogStore::new();
    store.select_cycle(1, 1);
    let tokens = vec![
        Token::Key,
        Token::field(undolog::HostField::Integer, "ID", NativeValue::from("one")),
        Token::Value,
        Token::native("BALANCE", 1i32),
        Token::End,
    ];
    assert!(store
        .log_tokens(OperationKind::Insert, "ACCOUNT", tokens)
        .unwrap_err()
        .is_invalid_input());
}

#[test]
fn tokens_and_builder_agree() {
    let mut from_tokens = LogStore::new();
    from_tokens.select_cycle(1, 1);
    from_tokens
        .log_tokens(
            OperationKind::Insert,
            "CUSTOMER",
            vec![
                Token::Key,
                Token::native("ID", 1i32),
                Token::Value,
                Token::native("NAME", "Bob"),
                Token::End,
            ],
        )
        .unwrap();

    let mut from_builder = LogStore::new();
    from_builder.select_cycle(1, 1);
    from_builder
        .log(
            OperationRequest::insert("CUSTOMER")
                .key(TypedValue::integer("ID", 1))
                .value(TypedValue::char("NAME", "Bob")),
        )
        .unwrap();

    assert_eq!(from_tokens.forward_document(), from_builder.forward_document());
}

#[test]
fn configured_date_mask_applies_to_token_dates() {
    let mut store = LogStore::new().with_date_format_mask("YYYY-MM-DD");
    store.select_cycle(1, 1);
    store
        .log_tokens(
            OperationKind::Insert,
            "RUN",
            vec![
                Token::Key,
                Token::native("ID", 1i32),
                Token::Value,
                Token::field(
                    undolog::HostField::Date,
                    "RUN_DATE",
                    NativeValue::date("2015-01-08"),
                ),
                Token::End,
            ],
        )
        .unwrap();
    assert!(store
        .forward_document()
        .contains(r#"<RUN_DATE TypeId="9" FormatMask="YYYY-MM-DD">2015-01-08</RUN_DATE>"#));
}
