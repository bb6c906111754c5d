//! Ingestion protocol: validated operation requests
//!
//! A request describes one row operation: kind, entity, one key section
//! and one or two value sections. It can be assembled with the builder
//! methods or read from a flat token sequence:
//!
//! ```text
//! KEY {field}* VALUE {field}* [VALUE {field}*] END
//! ```
//!
//! where a field token is one of the eight host-variable tokens with a
//! label and a native value. `NOP` tokens are ignored anywhere.
//!
//! ## Value Sections
//!
//! | kind           | sections | interpretation               |
//! |----------------|----------|------------------------------|
//! | Insert         | 1        | after-image                  |
//! | Delete, Select | 1        | before-image / snapshot      |
//! | Update         | 1        | after-image (before derived) |
//! | Update         | 2        | before-image, after-image    |
//!
//! Validation runs completely before anything is registered in a store.

use crate::operation::Operation;
use tracing::trace;
use undolog_core::{
    Error, HostField, NativeValue, OperationKind, Result, Scalar, TypedValue, ValueRole, ValueSet,
    DEFAULT_DATE_FORMAT_MASK,
};

/// Marker code of the `KEY` token
pub const KEY_CODE: u8 = 1;
/// Marker code of the `VALUE` token
pub const VALUE_CODE: u8 = 2;
/// Marker code of the `END` token
pub const END_CODE: u8 = 3;
/// Marker code of the `NOP` token
pub const NOP_CODE: u8 = 4;

/// Maximum number of value sections in one request
pub const MAX_VALUE_SECTIONS: usize = 2;

/// One token of the flat ingestion protocol
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Start the key section
    Key,
    /// Start the next value section
    Value,
    /// Terminate the request
    End,
    /// Ignored
    Nop,
    /// Typed field added to the active section
    Field {
        /// Host variable type
        field: HostField,
        /// Column label
        label: Option<String>,
        /// Native value handle
        value: Option<NativeValue>,
    },
    /// Any code the protocol does not define
    Unrecognized(u8),
}

impl Token {
    /// Complete field token
    pub fn field(field: HostField, label: impl Into<String>, value: NativeValue) -> Self {
        Token::Field {
            field,
            label: Some(label.into()),
            value: Some(value),
        }
    }

    /// Field token whose host field is the natural one for `value`
    pub fn native(label: impl Into<String>, value: impl Into<NativeValue>) -> Self {
        let value = value.into();
        Token::field(value.host_field(), label, value)
    }

    /// Marker token for a protocol code; field codes need `field`
    pub fn from_code(code: u8) -> Self {
        match code {
            KEY_CODE => Token::Key,
            VALUE_CODE => Token::Value,
            END_CODE => Token::End,
            NOP_CODE => Token::Nop,
            other => Token::Unrecognized(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,
    Key,
    Value1,
    Value2,
    End,
}

/// Reads a token sequence into an `OperationRequest`
#[derive(Debug, Clone)]
pub struct TokenReader {
    date_format_mask: String,
}

impl Default for TokenReader {
    fn default() -> Self {
        TokenReader {
            date_format_mask: DEFAULT_DATE_FORMAT_MASK.to_string(),
        }
    }
}

impl TokenReader {
    /// Reader with the default date format mask
    pub fn new() -> Self {
        Self::default()
    }

    /// Format mask applied to date fields
    pub fn with_date_format_mask(mut self, mask: impl Into<String>) -> Self {
        self.date_format_mask = mask.into();
        self
    }

    /// Run the state machine over `tokens`.
    ///
    /// Fails with `InvalidInput` on the first bad token, on a missing
    /// section, or on a section count the kind does not allow.
    pub fn read<I>(&self, kind: OperationKind, entity: &str, tokens: I) -> Result<OperationRequest>
    where
        I: IntoIterator<Item = Token>,
    {
        let mut state = State::Init;
        let mut key: Option<ValueSet> = None;
        let mut sections: Vec<ValueSet> = Vec::new();

        for (position, token) in tokens.into_iter().enumerate() {
            trace!(target: "undolog::ingest", position, ?token, ?state, "Token");
            if state == State::End {
                return Err(Error::invalid_input(format!(
                    "token after END at position {}",
                    position
                )));
            }
            match token {
                Token::Nop => {}
                Token::Key => {
                    if state != State::Init {
                        return Err(Error::invalid_input("KEY section defined more than once"));
                    }
                    state = State::Key;
                    key = Some(ValueSet::new());
                }
                Token::Value => {
                    state = match state {
                        State::Init => return Err(Error::invalid_input("key section not defined")),
                        State::Key => State::Value1,
                        State::Value1 => State::Value2,
                        _ => {
                            return Err(Error::invalid_input(format!(
                                "VALUE section used more than {} times",
                                MAX_VALUE_SECTIONS
                            )))
                        }
                    };
                    sections.push(ValueSet::new());
                }
                Token::End => state = State::End,
                Token::Field {
                    field,
                    label,
                    value,
                } => {
                    let (label, value) = match (label, value) {
                        (Some(label), Some(value)) if !label.is_empty() => (label, value),
                        _ => return Err(Error::invalid_input("missing label or value")),
                    };
                    let value = self.decode(field, label, value)?;
                    match (state, key.as_mut(), sections.last_mut()) {
                        (State::Key, Some(key), _) => key.push(value),
                        (State::Value1 | State::Value2, _, Some(section)) => section.push(value),
                        _ => {
                            return Err(Error::invalid_input(format!(
                                "{} field outside KEY and VALUE sections",
                                field
                            )))
                        }
                    }
                }
                Token::Unrecognized(code) => {
                    return Err(Error::invalid_input(format!(
                        "unrecognized token {} at position {}",
                        code, position
                    )))
                }
            }
        }

        if state != State::End {
            return Err(Error::invalid_input("invalid state reached, expecting END"));
        }

        let request = OperationRequest {
            kind,
            entity: entity.to_string(),
            key,
            sections,
        };
        request.validate()?;
        Ok(request)
    }

    fn decode(&self, field: HostField, label: String, value: NativeValue) -> Result<TypedValue> {
        let value = TypedValue::from_native(field, label, value)?;
        match value.scalar() {
            Scalar::Date { value: text, format_mask } if *format_mask != self.date_format_mask => {
                Ok(TypedValue::date_with_mask(
                    value.label(),
                    text.as_str(),
                    self.date_format_mask.as_str(),
                ))
            }
            _ => Ok(value),
        }
    }
}

/// A validated description of one row operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRequest {
    kind: OperationKind,
    entity: String,
    key: Option<ValueSet>,
    sections: Vec<ValueSet>,
}

impl OperationRequest {
    /// Empty request; add sections with the builder methods
    pub fn new(kind: OperationKind, entity: impl Into<String>) -> Self {
        OperationRequest {
            kind,
            entity: entity.into(),
            key: None,
            sections: Vec::new(),
        }
    }

    /// Insert request
    pub fn insert(entity: impl Into<String>) -> Self {
        Self::new(OperationKind::Insert, entity)
    }

    /// Update request
    pub fn update(entity: impl Into<String>) -> Self {
        Self::new(OperationKind::Update, entity)
    }

    /// Delete request
    pub fn delete(entity: impl Into<String>) -> Self {
        Self::new(OperationKind::Delete, entity)
    }

    /// Select request
    pub fn select(entity: impl Into<String>) -> Self {
        Self::new(OperationKind::Select, entity)
    }

    /// Read a request from protocol tokens with the default date format mask
    pub fn from_tokens<I>(kind: OperationKind, entity: &str, tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = Token>,
    {
        TokenReader::new().read(kind, entity, tokens)
    }

    /// Add a field to the key section
    pub fn key(mut self, value: TypedValue) -> Self {
        self.key.get_or_insert_with(ValueSet::new).push(value);
        self
    }

    /// Use `key` as the whole key section
    pub fn key_set(mut self, key: ValueSet) -> Self {
        self.key = Some(key);
        self
    }

    /// Add a field to the current value section, opening one if needed
    pub fn value(mut self, value: TypedValue) -> Self {
        if self.sections.is_empty() {
            self.sections.push(ValueSet::new());
        }
        if let Some(section) = self.sections.last_mut() {
            section.push(value);
        }
        self
    }

    /// Open the next value section
    pub fn next_section(mut self) -> Self {
        self.sections.push(ValueSet::new());
        self
    }

    /// Append `values` as a whole value section
    pub fn section(mut self, values: ValueSet) -> Self {
        self.sections.push(values);
        self
    }

    /// Operation kind
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Entity name
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Number of value sections
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Whether the operation will need a correlated Select for its undo
    pub fn needs_correlation(&self) -> bool {
        self.kind == OperationKind::Update && self.sections.len() == 1
    }

    /// Check sections against the kind
    pub fn validate(&self) -> Result<()> {
        if self.entity.is_empty() {
            return Err(Error::invalid_input("missing entity name"));
        }
        if self.key.is_none() {
            return Err(Error::invalid_input("key section not defined"));
        }
        if self.sections.is_empty() {
            return Err(Error::invalid_input("value section not defined"));
        }
        let allowed = match self.kind {
            OperationKind::Update => 1..=2,
            _ => 1..=1,
        };
        if !allowed.contains(&self.sections.len()) {
            return Err(Error::invalid_input(format!(
                "VALUE section used {} times, {} takes {}",
                self.sections.len(),
                self.kind,
                if self.kind == OperationKind::Update {
                    "one or two"
                } else {
                    "exactly one"
                }
            )));
        }
        if let Some(i) = self.sections.iter().position(ValueSet::is_empty) {
            return Err(Error::invalid_input(format!(
                "VALUE section {} of {} {} is empty",
                i + 1,
                self.kind,
                self.entity
            )));
        }
        Ok(())
    }

    /// Validate and build the operation
    pub fn into_operation(self) -> Result<Operation> {
        self.validate()?;
        let OperationRequest {
            kind,
            entity,
            key,
            sections,
        } = self;
        let mut operation = Operation::new(kind, entity);
        if let Some(key) = key {
            operation.set_key(&key);
        }
        let roles: &[ValueRole] = match (kind, sections.len()) {
            (OperationKind::Insert, _) => &[ValueRole::After],
            (OperationKind::Update, 1) => &[ValueRole::After],
            (OperationKind::Update, _) => &[ValueRole::Before, ValueRole::After],
            (OperationKind::Delete | OperationKind::Select, _) => &[ValueRole::Before],
        };
        for (section, role) in sections.iter().zip(roles) {
            operation.add_values(section, *role)?;
        }
        Ok(operation)
    }
}
