//! Undo document codec
//!
//! # Document Shape
//!
//! ```text
//! <UNDOLOG>                       (REDOLOG for the forward form)
//!   <BATCH>
//!     <DIGEST>BILLSEQNO/7.CUSTOMER_ID/42</DIGEST>
//!     <KEY><BILLSEQNO TypeId="4">7</BILLSEQNO>...</KEY>
//!     <DELETE>
//!       <ENTITY>CUSTOMER</ENTITY>
//!       <KEY><ID TypeId="4">1</ID></KEY>
//!       <VALUE><NAME TypeId="1">Bob</NAME></VALUE>
//!     </DELETE>
//!   </BATCH>
//! </UNDOLOG>
//! ```
//!
//! Documents are written compact, without whitespace between elements.
//! Batches appear in digest order.
//!
//! # Decoding
//!
//! Either root is accepted. DIGEST is informational; the batch digest is
//! recomputed from KEY, which must come before the first operation.
//! Values are rebuilt from their `TypeId` attribute, never from content.
//! A forward UPDATE (`<VALUE><BEFORE>..</BEFORE><AFTER>..</AFTER></VALUE>`)
//! loads both images; an inverse UPDATE loads its single value block as
//! the after-image.

use crate::operation::{tags, Operation};
use crate::store::{BatchHandle, LogStore};
use crate::Batch;
use tracing::debug;
use undolog_core::{
    markup, Error, OperationKind, Result, TypedValue, ValueRole, ValueSet, TYPE_ID_ATTRIBUTE,
};
use undolog_durability::{DocumentError, DocumentParser, Element, MarkupParser};

/// Root element of an inverse document
pub const INVERSE_ROOT: &str = "UNDOLOG";

/// Root element of a forward document
pub const FORWARD_ROOT: &str = "REDOLOG";

/// Batch element
pub const BATCH_TAG: &str = "BATCH";

/// Batch digest element
pub const DIGEST_TAG: &str = "DIGEST";

fn open_batch(batch: &Batch, out: &mut String) {
    markup::open_tag(out, BATCH_TAG);
    markup::open_tag(out, DIGEST_TAG);
    out.push_str(&markup::escape(batch.digest()));
    markup::close_tag(out, DIGEST_TAG);
    markup::open_tag(out, tags::KEY);
    batch.key().write_fragments(out);
    markup::close_tag(out, tags::KEY);
}

fn close_batch(out: &mut String) {
    markup::close_tag(out, BATCH_TAG);
}

/// Forward document of the whole store
pub fn serialize_forward(store: &LogStore) -> String {
    let mut out = String::new();
    markup::open_tag(&mut out, FORWARD_ROOT);
    for batch in store.batches() {
        open_batch(batch, &mut out);
        batch.write_forward(&mut out);
        close_batch(&mut out);
    }
    markup::close_tag(&mut out, FORWARD_ROOT);
    out
}

/// Inverse document of the whole store.
///
/// Fails with `MissingCorrelation` if any Update cannot be inverted.
pub fn serialize_inverse(store: &LogStore) -> Result<String> {
    let mut out = String::new();
    markup::open_tag(&mut out, INVERSE_ROOT);
    for batch in store.batches() {
        write_inverse_batch(batch, &mut out)?;
    }
    markup::close_tag(&mut out, INVERSE_ROOT);
    Ok(out)
}

fn write_inverse_batch(batch: &Batch, out: &mut String) -> Result<()> {
    open_batch(batch, out);
    batch.write_inverse(out)?;
    close_batch(out);
    Ok(())
}

/// Inverse document holding a single batch, as persisted at flush
pub fn batch_record_document(batch: &Batch) -> Result<String> {
    let mut out = String::new();
    markup::open_tag(&mut out, INVERSE_ROOT);
    write_inverse_batch(batch, &mut out)?;
    markup::close_tag(&mut out, INVERSE_ROOT);
    Ok(out)
}

/// Decode a document with the built-in parser
pub fn deserialize(input: &[u8]) -> Result<LogStore> {
    deserialize_with(&MarkupParser::new(), input)
}

/// Decode a document with `parser`
pub fn deserialize_with(parser: &dyn DocumentParser, input: &[u8]) -> Result<LogStore> {
    let root = parser.parse(input)?;
    let store = decode(&root)?;
    debug!(
        target: "undolog::codec",
        parser = parser.parser_id(),
        root = root.name(),
        batches = store.batch_count(),
        operations = store.operation_count(),
        "Decoded document"
    );
    Ok(store)
}

/// Rebuild a store from a parsed root element
pub fn decode(root: &Element) -> Result<LogStore> {
    if root.name() != INVERSE_ROOT && root.name() != FORWARD_ROOT {
        return Err(DocumentError::WrongRoot {
            found: root.name().to_string(),
            expected: format!("{} or {}", INVERSE_ROOT, FORWARD_ROOT),
        }
        .into());
    }
    let mut store = LogStore::new();
    for element in root.children() {
        if element.name() != BATCH_TAG {
            return Err(DocumentError::unexpected(root.name(), element.name()).into());
        }
        decode_batch(element, &mut store)?;
    }
    Ok(store)
}

fn decode_batch(element: &Element, store: &mut LogStore) -> Result<()> {
    let mut handle: Option<BatchHandle> = None;
    for child in element.children() {
        match child.name() {
            DIGEST_TAG => {}
            tags::KEY => {
                if handle.is_some() {
                    return Err(DocumentError::unexpected(BATCH_TAG, tags::KEY).into());
                }
                handle = Some(store.get_or_create_batch(decode_values(child)?));
            }
            name => {
                let kind = operation_kind(name)?;
                let handle = handle
                    .as_ref()
                    .ok_or_else(|| DocumentError::missing(BATCH_TAG, tags::KEY))?;
                store.append(handle, decode_operation(kind, child)?)?;
            }
        }
    }
    if handle.is_none() {
        return Err(DocumentError::missing(BATCH_TAG, tags::KEY).into());
    }
    Ok(())
}

fn operation_kind(name: &str) -> Result<OperationKind> {
    match name.parse::<OperationKind>() {
        Ok(OperationKind::Select) | Err(_) => {
            Err(DocumentError::unexpected(BATCH_TAG, name).into())
        }
        Ok(kind) => Ok(kind),
    }
}

fn required<'a>(parent: &'a Element, name: &str) -> Result<&'a Element> {
    parent
        .child(name)
        .ok_or_else(|| DocumentError::missing(parent.name(), name).into())
}

fn decode_operation(kind: OperationKind, element: &Element) -> Result<Operation> {
    for child in element.children() {
        if ![tags::ENTITY, tags::KEY, tags::VALUE].contains(&child.name()) {
            return Err(DocumentError::unexpected(element.name(), child.name()).into());
        }
    }

    let entity = required(element, tags::ENTITY)?.decoded_text()?;
    let entity = entity.trim();
    if entity.is_empty() {
        return Err(Error::document(format!("empty entity name in <{}>", kind)));
    }

    let mut operation = Operation::new(kind, entity);
    operation.set_key(&decode_values(required(element, tags::KEY)?)?);

    let value = required(element, tags::VALUE)?;
    match kind {
        OperationKind::Update if is_forward_update(value) => {
            let before = match value.child(tags::BEFORE) {
                Some(block) => decode_values(block)?,
                None => ValueSet::new(),
            };
            let after = decode_values(required(value, tags::AFTER)?)?;
            operation.add_values(&before, ValueRole::Before)?;
            operation.add_values(&after, ValueRole::After)?;
        }
        OperationKind::Insert | OperationKind::Update => {
            operation.add_values(&decode_values(value)?, ValueRole::After)?;
        }
        OperationKind::Delete | OperationKind::Select => {
            operation.add_values(&decode_values(value)?, ValueRole::Before)?;
        }
    }
    Ok(operation)
}

/// A forward UPDATE wraps its images in BEFORE/AFTER blocks, which carry
/// no type attribute
fn is_forward_update(value: &Element) -> bool {
    !value.children().is_empty()
        && value.children().iter().all(|child| {
            (child.name() == tags::BEFORE || child.name() == tags::AFTER)
                && child.attribute(TYPE_ID_ATTRIBUTE).is_none()
        })
}

fn decode_values(block: &Element) -> Result<ValueSet> {
    block.children().iter().map(decode_value).collect()
}

fn decode_value(field: &Element) -> Result<TypedValue> {
    if !field.is_leaf() {
        return Err(DocumentError::unexpected(field.name(), field.children()[0].name()).into());
    }
    let type_id = field.attribute(TYPE_ID_ATTRIBUTE).ok_or_else(|| {
        Error::document(format!(
            "missing {} attribute on <{}>",
            TYPE_ID_ATTRIBUTE,
            field.name()
        ))
    })?;
    let attributes = field
        .attribute_pairs()
        .filter(|(name, _)| *name != TYPE_ID_ATTRIBUTE);
    TypedValue::from_fragment(type_id, field.name(), field.text(), attributes)
        .map_err(|e| Error::document(format!("<{}>: {}", field.name(), e)))
}
