//! Typed column values
//!
//! This module defines:
//! - TypedValue: a labeled scalar with a kind fixed at construction
//! - Scalar: the closed set of eight value kinds and their canonical text
//! - NativeValue: a host variable as handed over by the ingestion protocol
//!
//! ## Rendering Rules
//!
//! Every value keeps its canonical text. The kind decides how it renders:
//!
//! | kind             | SQL literal                  | document text |
//! |------------------|------------------------------|---------------|
//! | Char, Varchar    | `'text'`                     | escaped       |
//! | numeric kinds    | `text`                       | as is         |
//! | Date             | `TO_DATE('text','mask')`     | as is         |
//!
//! A Date carries its format mask as the `FormatMask` attribute.

use crate::error::{Error, Result};
use crate::markup;
use crate::types::{HostField, TypeCode, ValueKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format mask applied to dates that do not name one
pub const DEFAULT_DATE_FORMAT_MASK: &str = "YYYYMMDDHH24MISS";

/// Attribute carrying the type code of a field element
pub const TYPE_ID_ATTRIBUTE: &str = "TypeId";

/// Attribute carrying the format mask of a date field
pub const FORMAT_MASK_ATTRIBUTE: &str = "FormatMask";

/// Canonical text of a value, tagged by kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scalar {
    /// Character string
    Char(String),
    /// 32-bit integer text
    Integer(String),
    /// 16-bit integer text
    Smallint(String),
    /// Single precision float text
    Float(String),
    /// Double precision float text
    Double(String),
    /// Date text and the mask it is written in
    Date {
        /// Date text
        value: String,
        /// Conversion mask, e.g. `YYYYMMDDHH24MISS`
        format_mask: String,
    },
    /// Variable length string
    Varchar(String),
    /// 64-bit integer text
    Long(String),
}

impl Scalar {
    /// Kind of this scalar
    pub fn kind(&self) -> ValueKind {
        match self {
            Scalar::Char(_) => ValueKind::Char,
            Scalar::Integer(_) => ValueKind::Integer,
            Scalar::Smallint(_) => ValueKind::Smallint,
            Scalar::Float(_) => ValueKind::Float,
            Scalar::Double(_) => ValueKind::Double,
            Scalar::Date { .. } => ValueKind::Date,
            Scalar::Varchar(_) => ValueKind::Varchar,
            Scalar::Long(_) => ValueKind::Long,
        }
    }

    /// Canonical unannotated text
    pub fn text(&self) -> &str {
        match self {
            Scalar::Char(s)
            | Scalar::Integer(s)
            | Scalar::Smallint(s)
            | Scalar::Float(s)
            | Scalar::Double(s)
            | Scalar::Varchar(s)
            | Scalar::Long(s) => s,
            Scalar::Date { value, .. } => value,
        }
    }
}

/// A labeled, typed column value.
///
/// The label names the column; the kind never changes after construction.
/// Cloning is a kind-preserving deep copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypedValue {
    label: String,
    scalar: Scalar,
}

impl TypedValue {
    /// Create a CHAR value
    pub fn char(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::from_scalar(label, Scalar::Char(value.into()))
    }

    /// Create an INTEGER value
    pub fn integer(label: impl Into<String>, value: i32) -> Self {
        Self::from_scalar(label, Scalar::Integer(value.to_string()))
    }

    /// Create a SMALLINT value
    pub fn smallint(label: impl Into<String>, value: i16) -> Self {
        Self::from_scalar(label, Scalar::Smallint(value.to_string()))
    }

    /// Create a FLOAT value
    pub fn float(label: impl Into<String>, value: f32) -> Self {
        Self::from_scalar(label, Scalar::Float(value.to_string()))
    }

    /// Create a DOUBLE value
    pub fn double(label: impl Into<String>, value: f64) -> Self {
        Self::from_scalar(label, Scalar::Double(value.to_string()))
    }

    /// Create a DATE value in the default format mask
    pub fn date(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::date_with_mask(label, value, DEFAULT_DATE_FORMAT_MASK)
    }

    /// Create a DATE value written in `format_mask`
    pub fn date_with_mask(
        label: impl Into<String>,
        value: impl Into<String>,
        format_mask: impl Into<String>,
    ) -> Self {
        Self::from_scalar(
            label,
            Scalar::Date {
                value: value.into(),
                format_mask: format_mask.into(),
            },
        )
    }

    /// Create a VARCHAR value
    pub fn varchar(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::from_scalar(label, Scalar::Varchar(value.into()))
    }

    /// Create a LONG value
    pub fn long(label: impl Into<String>, value: i64) -> Self {
        Self::from_scalar(label, Scalar::Long(value.to_string()))
    }

    /// Wrap an already built scalar
    pub fn from_scalar(label: impl Into<String>, scalar: Scalar) -> Self {
        TypedValue {
            label: label.into(),
            scalar,
        }
    }

    /// Construct from the string form of a value.
    ///
    /// Numeric kinds must parse as their host type; the text is kept as
    /// given so rendering reproduces it exactly.
    pub fn from_string(kind: ValueKind, label: impl Into<String>, text: &str) -> Result<Self> {
        let label = checked_label(label.into())?;
        let text = text.to_string();
        let scalar = match kind {
            ValueKind::Char => Scalar::Char(text),
            ValueKind::Varchar => Scalar::Varchar(text),
            ValueKind::Integer => Scalar::Integer(numeric::<i32>(kind, &label, text)?),
            ValueKind::Smallint => Scalar::Smallint(numeric::<i16>(kind, &label, text)?),
            ValueKind::Float => Scalar::Float(numeric::<f32>(kind, &label, text)?),
            ValueKind::Double => Scalar::Double(numeric::<f64>(kind, &label, text)?),
            ValueKind::Long => Scalar::Long(numeric::<i64>(kind, &label, text)?),
            ValueKind::Date => Scalar::Date {
                value: text,
                format_mask: DEFAULT_DATE_FORMAT_MASK.to_string(),
            },
        };
        Ok(TypedValue { label, scalar })
    }

    /// Factory keyed by type code. The code is never inferred from content.
    ///
    /// Fails with `InvalidInput` for codes without a value kind.
    pub fn from_type_code(code: TypeCode, label: impl Into<String>, text: &str) -> Result<Self> {
        let kind = code.value_kind().ok_or_else(|| {
            Error::invalid_input(format!("unsupported TypeId value: {}", code))
        })?;
        Self::from_string(kind, label, text)
    }

    /// Rebuild a value from a field element: `type_id` is the raw `TypeId`
    /// attribute, `text` the element text as written (escaped for textual
    /// kinds), `attributes` any further attributes.
    pub fn from_fragment<'a>(
        type_id: &str,
        label: impl Into<String>,
        text: &str,
        attributes: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self> {
        let code = TypeCode::parse(type_id)?;
        let kind = code.value_kind().ok_or_else(|| {
            Error::invalid_input(format!("unsupported TypeId value: {}", type_id))
        })?;
        let mut value = if kind.is_textual() {
            Self::from_string(kind, label, &markup::unescape(text)?)?
        } else {
            Self::from_string(kind, label, text)?
        };
        if let Scalar::Date { format_mask, .. } = &mut value.scalar {
            if let Some((_, mask)) = attributes
                .into_iter()
                .find(|(name, _)| *name == FORMAT_MASK_ATTRIBUTE)
            {
                *format_mask = mask.to_string();
            }
        }
        Ok(value)
    }

    /// Decode a host variable handed over for a typed-field token.
    ///
    /// Fails with `InvalidInput` when the handle does not match the token.
    pub fn from_native(
        field: HostField,
        label: impl Into<String>,
        native: NativeValue,
    ) -> Result<Self> {
        let label = checked_label(label.into())?;
        let scalar = match (field, native) {
            (HostField::Char, NativeValue::Char(s)) => Scalar::Char(s),
            (HostField::Integer, NativeValue::Integer(i)) => Scalar::Integer(i.to_string()),
            (HostField::Smallint, NativeValue::Smallint(i)) => Scalar::Smallint(i.to_string()),
            (HostField::Float, NativeValue::Float(f)) => Scalar::Float(f.to_string()),
            (HostField::Double, NativeValue::Double(f)) => Scalar::Double(f.to_string()),
            (HostField::Date, NativeValue::Date(s)) => Scalar::Date {
                value: s,
                format_mask: DEFAULT_DATE_FORMAT_MASK.to_string(),
            },
            (HostField::Varchar, NativeValue::Varchar { len, data }) => {
                let bytes = data.get(..len).ok_or_else(|| {
                    Error::invalid_input(format!(
                        "varchar length {} exceeds buffer of {} bytes for {}",
                        len,
                        data.len(),
                        label
                    ))
                })?;
                let text = std::str::from_utf8(bytes).map_err(|_| {
                    Error::invalid_input(format!("varchar value for {} is not valid UTF-8", label))
                })?;
                Scalar::Varchar(text.to_string())
            }
            (HostField::Long, NativeValue::Long(i)) => Scalar::Long(i.to_string()),
            (field, native) => {
                return Err(Error::invalid_input(format!(
                    "unable to decode value for {}: {} given for {}",
                    label,
                    native.type_name(),
                    field
                )))
            }
        };
        Ok(TypedValue { label, scalar })
    }

    /// Column label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Value kind
    pub fn kind(&self) -> ValueKind {
        self.scalar.kind()
    }

    /// Type code written to documents
    pub fn type_code(&self) -> TypeCode {
        self.kind().type_code()
    }

    /// Tagged scalar
    pub fn scalar(&self) -> &Scalar {
        &self.scalar
    }

    /// Unannotated string form
    pub fn raw(&self) -> &str {
        self.scalar.text()
    }

    /// Format mask of a date value
    pub fn format_mask(&self) -> Option<&str> {
        match &self.scalar {
            Scalar::Date { format_mask, .. } => Some(format_mask),
            _ => None,
        }
    }

    /// Extra attributes beyond `TypeId`, in name order
    pub fn attributes(&self) -> Vec<(&'static str, &str)> {
        match self.format_mask() {
            Some(mask) => vec![(FORMAT_MASK_ATTRIBUTE, mask)],
            None => Vec::new(),
        }
    }

    /// SQL-ready text: quoted for strings, bare for numbers, `TO_DATE(..)` for dates
    pub fn literal(&self) -> String {
        match &self.scalar {
            Scalar::Char(s) | Scalar::Varchar(s) => format!("'{}'", s),
            Scalar::Date { value, format_mask } if format_mask.is_empty() => {
                format!("TO_DATE('{}')", value)
            }
            Scalar::Date { value, format_mask } => {
                format!("TO_DATE('{}','{}')", value, format_mask)
            }
            other => other.text().to_string(),
        }
    }

    /// Append the field element for this value to `out`
    pub fn write_fragment(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.label);
        markup::push_attribute(out, TYPE_ID_ATTRIBUTE, &self.type_code().as_u8().to_string());
        for (name, value) in self.attributes() {
            markup::push_attribute(out, name, value);
        }
        out.push('>');
        if self.kind().is_textual() {
            out.push_str(&markup::escape(self.raw()));
        } else {
            out.push_str(self.raw());
        }
        markup::close_tag(out, &self.label);
    }

    /// Field element for this value
    pub fn document_fragment(&self) -> String {
        let mut out = String::new();
        self.write_fragment(&mut out);
        out
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.label, self.raw())
    }
}

fn checked_label(label: String) -> Result<String> {
    if label.is_empty() {
        return Err(Error::invalid_input("missing label or value"));
    }
    if !markup::is_valid_name(&label) {
        return Err(Error::invalid_input(format!("invalid column label '{}'", label)));
    }
    Ok(label)
}

fn numeric<T: std::str::FromStr>(kind: ValueKind, label: &str, text: String) -> Result<String> {
    if text.trim().parse::<T>().is_err() {
        return Err(Error::invalid_input(format!(
            "value '{}' of {} is not a valid {}",
            text, label, kind
        )));
    }
    Ok(text)
}

/// A host variable as handed over by a typed-field token
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    /// Character string
    Char(String),
    /// `int`
    Integer(i32),
    /// `short`
    Smallint(i16),
    /// `float`
    Float(f32),
    /// `double`
    Double(f64),
    /// Date as a character string
    Date(String),
    /// Length-prefixed buffer: only the first `len` bytes are used
    Varchar {
        /// Number of meaningful bytes
        len: usize,
        /// Buffer
        data: Vec<u8>,
    },
    /// `long`
    Long(i64),
}

impl NativeValue {
    /// Varchar handle covering the whole string
    pub fn varchar(text: &str) -> Self {
        NativeValue::Varchar {
            len: text.len(),
            data: text.as_bytes().to_vec(),
        }
    }

    /// Date handle
    pub fn date(text: impl Into<String>) -> Self {
        NativeValue::Date(text.into())
    }

    /// The field token this handle naturally belongs to
    pub fn host_field(&self) -> HostField {
        match self {
            NativeValue::Char(_) => HostField::Char,
            NativeValue::Integer(_) => HostField::Integer,
            NativeValue::Smallint(_) => HostField::Smallint,
            NativeValue::Float(_) => HostField::Float,
            NativeValue::Double(_) => HostField::Double,
            NativeValue::Date(_) => HostField::Date,
            NativeValue::Varchar { .. } => HostField::Varchar,
            NativeValue::Long(_) => HostField::Long,
        }
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            NativeValue::Char(_) => "char",
            NativeValue::Integer(_) => "int",
            NativeValue::Smallint(_) => "short",
            NativeValue::Float(_) => "float",
            NativeValue::Double(_) => "double",
            NativeValue::Date(_) => "date",
            NativeValue::Varchar { .. } => "varchar",
            NativeValue::Long(_) => "long",
        }
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<&str> for NativeValue {
    fn from(s: &str) -> Self {
        NativeValue::Char(s.to_string())
    }
}

impl From<String> for NativeValue {
    fn from(s: String) -> Self {
        NativeValue::Char(s)
    }
}

impl From<i32> for NativeValue {
    fn from(i: i32) -> Self {
        NativeValue::Integer(i)
    }
}

impl From<i16> for NativeValue {
    fn from(i: i16) -> Self {
        NativeValue::Smallint(i)
    }
}

impl From<f32> for NativeValue {
    fn from(f: f32) -> Self {
        NativeValue::Float(f)
    }
}

impl From<f64> for NativeValue {
    fn from(f: f64) -> Self {
        NativeValue::Double(f)
    }
}

impl From<i64> for NativeValue {
    fn from(i: i64) -> Self {
        NativeValue::Long(i)
    }
}
