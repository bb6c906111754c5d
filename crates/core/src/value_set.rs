//! Ordered sets of typed values
//!
//! A ValueSet is the unit every image of a row is made of: operation keys,
//! before/after images, batch keys. Insertion order is significant: it is the
//! column order of generated SQL and documents and it feeds the digest.
//!
//! Labels are not required to be unique; every lookup takes the first match.
//!
//! ## Digest
//!
//! `label/raw` per element, joined by `.`, in set order. Separator characters
//! inside a value are not escaped, so `{A="x.B/y"}` and `{A="x", B="y"}` share
//! a digest. Callers that need collision-free batch keys must keep `.` and `/`
//! out of key values.

use crate::error::{Error, Result};
use crate::value::TypedValue;
use serde::{Deserialize, Serialize};

/// Separator between a label and its value in a digest
pub const DIGEST_LABEL_SEPARATOR: char = '/';

/// Separator between elements in a digest
pub const DIGEST_FIELD_SEPARATOR: char = '.';

/// Ordered collection of typed values
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueSet {
    values: Vec<TypedValue>,
}

impl ValueSet {
    /// Create an empty set
    pub fn new() -> Self {
        ValueSet { values: Vec::new() }
    }

    /// Append a value
    pub fn push(&mut self, value: TypedValue) {
        self.values.push(value);
    }

    /// Builder-style append
    pub fn with(mut self, value: TypedValue) -> Self {
        self.values.push(value);
        self
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the set holds no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate in set order
    pub fn iter(&self) -> std::slice::Iter<'_, TypedValue> {
        self.values.iter()
    }

    /// Values as a slice
    pub fn as_slice(&self) -> &[TypedValue] {
        &self.values
    }

    /// Drop all values
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Replace all contents with clones of `other`
    pub fn assign(&mut self, other: &ValueSet) {
        self.values.clone_from(&other.values);
    }

    /// Append clones of `other`'s contents
    pub fn merge(&mut self, other: &ValueSet) {
        self.values.extend(other.values.iter().cloned());
    }

    /// First value carrying `label`
    pub fn get(&self, label: &str) -> Option<&TypedValue> {
        self.values.iter().find(|v| v.label() == label)
    }

    /// SQL literal of the first value carrying `label`
    pub fn find_literal(&self, label: &str) -> Option<String> {
        self.get(label).map(TypedValue::literal)
    }

    /// Labels in set order
    pub fn labels(&self) -> Vec<&str> {
        self.values.iter().map(TypedValue::label).collect()
    }

    /// Replace every value with a clone of the same-labeled value in `other`.
    ///
    /// Order and labels of `self` are kept. All-or-nothing: if any label is
    /// missing from `other`, `self` is left untouched.
    pub fn reassign(&mut self, other: &ValueSet) -> Result<()> {
        let replaced = self
            .values
            .iter()
            .map(|v| {
                other.get(v.label()).cloned().ok_or_else(|| {
                    Error::invalid_input(format!("unable to assign value to {}", v.label()))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.values = replaced;
        Ok(())
    }

    /// Deterministic, order-sensitive digest of the contents
    pub fn digest(&self) -> String {
        let mut digest = String::new();
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                digest.push(DIGEST_FIELD_SEPARATOR);
            }
            digest.push_str(value.label());
            digest.push(DIGEST_LABEL_SEPARATOR);
            digest.push_str(value.raw());
        }
        digest
    }

    /// Append every field element to `out`
    pub fn write_fragments(&self, out: &mut String) {
        for value in &self.values {
            value.write_fragment(out);
        }
    }

    /// Concatenated field elements
    pub fn document_fragment(&self) -> String {
        let mut out = String::new();
        self.write_fragments(&mut out);
        out
    }

    /// Column labels joined by `separator`
    pub fn column_clause(&self, separator: &str) -> String {
        self.labels().join(separator)
    }

    /// SQL literals joined by `separator`
    pub fn value_clause(&self, separator: &str) -> String {
        self.values
            .iter()
            .map(TypedValue::literal)
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// `label=literal` pairs joined by `separator`
    pub fn assignment_clause(&self, separator: &str) -> String {
        let mut out = String::new();
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                out.push_str(separator);
            }
            out.push_str(value.label());
            out.push('=');
            out.push_str(&value.literal());
        }
        out
    }
}

impl From<Vec<TypedValue>> for ValueSet {
    fn from(values: Vec<TypedValue>) -> Self {
        ValueSet { values }
    }
}

impl FromIterator<TypedValue> for ValueSet {
    fn from_iter<I: IntoIterator<Item = TypedValue>>(iter: I) -> Self {
        ValueSet {
            values: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ValueSet {
    type Item = &'a TypedValue;
    type IntoIter = std::slice::Iter<'a, TypedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl IntoIterator for ValueSet {
    type Item = TypedValue;
    type IntoIter = std::vec::IntoIter<TypedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
