//! Core types for the undo log
//!
//! This crate defines the foundational types used throughout the system:
//! - TypedValue: a labeled scalar of one of eight kinds
//! - ValueSet: an ordered set of typed values with digest and SQL helpers
//! - TypeCode / ValueKind / HostField: type discriminants
//! - OperationKind / ValueRole: row operations and the images they carry
//! - CycleKey: the billing-cycle batch key
//! - Error: Error type hierarchy
//! - markup: escaping rules shared by document writer and reader

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod markup;
pub mod types;
pub mod value;
pub mod value_set;

pub use error::{Error, Result};
pub use types::{CycleKey, HostField, OperationKind, TypeCode, ValueKind, ValueRole};
pub use value::{
    NativeValue, Scalar, TypedValue, DEFAULT_DATE_FORMAT_MASK, FORMAT_MASK_ATTRIBUTE,
    TYPE_ID_ATTRIBUTE,
};
pub use value_set::ValueSet;
