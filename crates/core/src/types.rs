//! Discriminant types for the undo log
//!
//! This module defines the small closed enums that every other layer keys on:
//! - TypeCode: the numeric column type code written as `TypeId` in documents
//! - ValueKind: the eight value kinds a TypedValue can actually hold
//! - HostField: the typed-field tokens of the ingestion protocol
//! - OperationKind / ValueRole: what happened to a row and which image a value belongs to
//! - CycleKey: the fixed two-field batch key used by billing-cycle jobs

use crate::error::{Error, Result};
use crate::value::TypedValue;
use crate::value_set::ValueSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column type code as written in the `TypeId` attribute of a field element.
///
/// ## TypeCode Values
///
/// These values are part of the document format and MUST NOT change. They
/// follow the DBI numbering, so codes 2, 3, 7, 10 and 11 are known but have no
/// value kind behind them; the factory rejects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[repr(u8)]
pub enum TypeCode {
    /// Fixed character string
    Char = 1,
    /// Arbitrary precision number
    Numeric = 2,
    /// Decimal number
    Decimal = 3,
    /// 32-bit integer
    Integer = 4,
    /// 16-bit integer
    Smallint = 5,
    /// Single precision float
    Float = 6,
    /// Real number
    Real = 7,
    /// Double precision float
    Double = 8,
    /// Date with a format mask
    Date = 9,
    /// Time of day
    Time = 10,
    /// Timestamp
    Timestamp = 11,
    /// Variable length character string
    Varchar = 12,
    /// 64-bit integer
    Long = 13,
}

impl TypeCode {
    /// Convert to the numeric code
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Try to create from the numeric code
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            1 => Some(TypeCode::Char),
            2 => Some(TypeCode::Numeric),
            3 => Some(TypeCode::Decimal),
            4 => Some(TypeCode::Integer),
            5 => Some(TypeCode::Smallint),
            6 => Some(TypeCode::Float),
            7 => Some(TypeCode::Real),
            8 => Some(TypeCode::Double),
            9 => Some(TypeCode::Date),
            10 => Some(TypeCode::Time),
            11 => Some(TypeCode::Timestamp),
            12 => Some(TypeCode::Varchar),
            13 => Some(TypeCode::Long),
            _ => None,
        }
    }

    /// Parse the textual form of a `TypeId` attribute.
    ///
    /// Fails with `InvalidInput` for anything that is not a code in 1..=13.
    pub fn parse(text: &str) -> Result<Self> {
        text.trim()
            .parse::<u8>()
            .ok()
            .and_then(TypeCode::from_u8)
            .ok_or_else(|| Error::invalid_input(format!("invalid TypeId value: {}", text)))
    }

    /// The value kind stored under this code, if any
    pub fn value_kind(&self) -> Option<ValueKind> {
        match self {
            TypeCode::Char => Some(ValueKind::Char),
            TypeCode::Integer => Some(ValueKind::Integer),
            TypeCode::Smallint => Some(ValueKind::Smallint),
            TypeCode::Float => Some(ValueKind::Float),
            TypeCode::Double => Some(ValueKind::Double),
            TypeCode::Date => Some(ValueKind::Date),
            TypeCode::Varchar => Some(ValueKind::Varchar),
            TypeCode::Long => Some(ValueKind::Long),
            TypeCode::Numeric
            | TypeCode::Decimal
            | TypeCode::Real
            | TypeCode::Time
            | TypeCode::Timestamp => None,
        }
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// The kind of a TypedValue. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// Character string, quoted and escaped
    Char,
    /// 32-bit integer
    Integer,
    /// 16-bit integer
    Smallint,
    /// Single precision float
    Float,
    /// Double precision float
    Double,
    /// Date string rendered through `TO_DATE`
    Date,
    /// Variable length string, quoted and escaped
    Varchar,
    /// 64-bit integer (`LONG` column)
    Long,
}

impl ValueKind {
    /// Every value kind, in type-code order
    pub const ALL: [ValueKind; 8] = [
        ValueKind::Char,
        ValueKind::Integer,
        ValueKind::Smallint,
        ValueKind::Float,
        ValueKind::Double,
        ValueKind::Date,
        ValueKind::Varchar,
        ValueKind::Long,
    ];

    /// Type code written to documents
    pub fn type_code(&self) -> TypeCode {
        match self {
            ValueKind::Char => TypeCode::Char,
            ValueKind::Integer => TypeCode::Integer,
            ValueKind::Smallint => TypeCode::Smallint,
            ValueKind::Float => TypeCode::Float,
            ValueKind::Double => TypeCode::Double,
            ValueKind::Date => TypeCode::Date,
            ValueKind::Varchar => TypeCode::Varchar,
            ValueKind::Long => TypeCode::Long,
        }
    }

    /// Whether text of this kind is quoted in SQL and escaped in documents
    pub fn is_textual(&self) -> bool {
        matches!(self, ValueKind::Char | ValueKind::Varchar)
    }

    /// Human readable name
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Char => "CHAR",
            ValueKind::Integer => "INTEGER",
            ValueKind::Smallint => "SMALLINT",
            ValueKind::Float => "FLOAT",
            ValueKind::Double => "DOUBLE",
            ValueKind::Date => "DATE",
            ValueKind::Varchar => "VARCHAR",
            ValueKind::Long => "LONG",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed-field token of the ingestion protocol.
///
/// The numeric codes continue the protocol's marker codes (`KEY` = 1,
/// `VALUE` = 2, `END` = 3, `NOP` = 4), so a field token is always >= 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HostField {
    /// Zero terminated character string
    Char = 5,
    /// `int`
    Integer = 6,
    /// `short`
    Smallint = 7,
    /// `float`
    Float = 8,
    /// `double`
    Double = 9,
    /// Date as a character string
    Date = 10,
    /// Length-prefixed character buffer
    Varchar = 11,
    /// `long`
    Long = 12,
}

impl HostField {
    /// Convert to the protocol code
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Decode a protocol code, failing with `InvalidInput` when it is not a field token
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            5 => Ok(HostField::Char),
            6 => Ok(HostField::Integer),
            7 => Ok(HostField::Smallint),
            8 => Ok(HostField::Float),
            9 => Ok(HostField::Double),
            10 => Ok(HostField::Date),
            11 => Ok(HostField::Varchar),
            12 => Ok(HostField::Long),
            other => Err(Error::invalid_input(format!(
                "invalid host variable use: {}",
                other
            ))),
        }
    }

    /// The value kind a field of this type produces
    pub fn value_kind(&self) -> ValueKind {
        match self {
            HostField::Char => ValueKind::Char,
            HostField::Integer => ValueKind::Integer,
            HostField::Smallint => ValueKind::Smallint,
            HostField::Float => ValueKind::Float,
            HostField::Double => ValueKind::Double,
            HostField::Date => ValueKind::Date,
            HostField::Varchar => ValueKind::Varchar,
            HostField::Long => ValueKind::Long,
        }
    }
}

impl fmt::Display for HostField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HostField::Char => "VAR_REF_CHAR",
            HostField::Integer => "VAR_REF_INTEGER",
            HostField::Smallint => "VAR_REF_SMALLINT",
            HostField::Float => "VAR_REF_FLOAT",
            HostField::Double => "VAR_REF_DOUBLE",
            HostField::Date => "VAR_REF_DATE",
            HostField::Varchar => "VAR_REF_VARCHAR",
            HostField::Long => "VAR_REF_LONG",
        };
        f.write_str(name)
    }
}

/// Row operation recorded in a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    /// Row inserted
    Insert,
    /// Row updated
    Update,
    /// Row deleted
    Delete,
    /// Row read (snapshot for correlation only)
    Select,
}

impl OperationKind {
    /// Element / keyword name
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Insert => "INSERT",
            OperationKind::Update => "UPDATE",
            OperationKind::Delete => "DELETE",
            OperationKind::Select => "SELECT",
        }
    }

    /// Whether an operation of this kind may hold a value in `role`.
    ///
    /// | kind   | before | after |
    /// |--------|--------|-------|
    /// | Insert | no     | yes   |
    /// | Update | yes    | yes   |
    /// | Delete | yes    | no    |
    /// | Select | yes    | no    |
    pub fn accepts(&self, role: ValueRole) -> bool {
        matches!(
            (self, role),
            (OperationKind::Insert, ValueRole::After)
                | (OperationKind::Update, _)
                | (OperationKind::Delete, ValueRole::Before)
                | (OperationKind::Select, ValueRole::Before)
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "INSERT" => Ok(OperationKind::Insert),
            "UPDATE" => Ok(OperationKind::Update),
            "DELETE" => Ok(OperationKind::Delete),
            "SELECT" => Ok(OperationKind::Select),
            other => Err(Error::invalid_input(format!(
                "wrong operation type '{}', only INSERT, DELETE, UPDATE, SELECT allowed",
                other
            ))),
        }
    }
}

/// Which image of the row a value describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueRole {
    /// State prior to the operation
    Before,
    /// State following the operation
    After,
}

impl fmt::Display for ValueRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRole::Before => f.write_str("BEFORE"),
            ValueRole::After => f.write_str("AFTER"),
        }
    }
}

/// Batch key of a billing-cycle job: one customer in one bill run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CycleKey {
    /// Customer identifier
    pub customer_id: i32,
    /// Bill sequence number
    pub bill_seq_no: i32,
}

impl CycleKey {
    /// Label of the bill sequence field
    pub const BILL_SEQ_NO: &'static str = "BILLSEQNO";
    /// Label of the customer field
    pub const CUSTOMER_ID: &'static str = "CUSTOMER_ID";

    /// Create a cycle key
    pub fn new(customer_id: i32, bill_seq_no: i32) -> Self {
        CycleKey {
            customer_id,
            bill_seq_no,
        }
    }

    /// The key as a value set: `BILLSEQNO` then `CUSTOMER_ID`
    pub fn to_value_set(&self) -> ValueSet {
        let mut key = ValueSet::new();
        key.push(TypedValue::integer(Self::BILL_SEQ_NO, self.bill_seq_no));
        key.push(TypedValue::integer(Self::CUSTOMER_ID, self.customer_id));
        key
    }
}

impl From<CycleKey> for ValueSet {
    fn from(key: CycleKey) -> Self {
        key.to_value_set()
    }
}
