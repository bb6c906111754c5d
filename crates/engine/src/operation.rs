//! Row operations and their undo/redo derivation
//!
//! An Operation is one recorded row access: an entity, a row key, and the
//! images its kind allows.
//!
//! | kind   | before-image       | after-image |
//! |--------|--------------------|-------------|
//! | Insert | no                 | yes         |
//! | Update | yes (may be empty) | yes         |
//! | Delete | yes                | no          |
//! | Select | yes (snapshot)     | no          |
//!
//! ## Forward and Inverse Forms
//!
//! | kind   | forward                       | inverse                   |
//! |--------|-------------------------------|---------------------------|
//! | Insert | `INSERT(key, after)`          | `DELETE(key, after)`      |
//! | Delete | `DELETE(key, before)`         | `INSERT(key, before)`     |
//! | Update | `UPDATE(key, before, after)`  | `UPDATE(key, restore)`    |
//! | Select | nothing                       | nothing                   |
//!
//! An Update's restore image is its before-image when one was recorded.
//! Otherwise it is derived from the first Select on the same entity in the
//! owning batch: the after-image's labels and order, with the values the
//! Select read. Operations do not point back at their batch; the batch is
//! passed in for the derivation.

use crate::batch::Batch;
use std::borrow::Cow;
use tracing::trace;
use undolog_core::{markup, Error, OperationKind, Result, TypedValue, ValueRole, ValueSet};

/// Element names of the operation document shape
pub mod tags {
    /// Entity name element
    pub const ENTITY: &str = "ENTITY";
    /// Row or batch key element
    pub const KEY: &str = "KEY";
    /// Value block element
    pub const VALUE: &str = "VALUE";
    /// Before-image block inside a forward update
    pub const BEFORE: &str = "BEFORE";
    /// After-image block inside a forward update
    pub const AFTER: &str = "AFTER";
}

/// Kind-specific value images
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Images {
    /// Inserted row
    Insert {
        /// Inserted values
        after: ValueSet,
    },
    /// Updated row; an empty `before` is derived on inversion
    Update {
        /// Values prior to the update
        before: ValueSet,
        /// Values set by the update
        after: ValueSet,
    },
    /// Deleted row
    Delete {
        /// Values of the deleted row
        before: ValueSet,
    },
    /// Row read
    Select {
        /// Values read
        snapshot: ValueSet,
    },
}

impl Images {
    fn empty(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Insert => Images::Insert {
                after: ValueSet::new(),
            },
            OperationKind::Update => Images::Update {
                before: ValueSet::new(),
                after: ValueSet::new(),
            },
            OperationKind::Delete => Images::Delete {
                before: ValueSet::new(),
            },
            OperationKind::Select => Images::Select {
                snapshot: ValueSet::new(),
            },
        }
    }
}

/// One recorded row operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    entity: String,
    key: ValueSet,
    images: Images,
}

impl Operation {
    /// Create an operation with an empty key and empty images
    pub fn new(kind: OperationKind, entity: impl Into<String>) -> Self {
        Operation {
            entity: entity.into(),
            key: ValueSet::new(),
            images: Images::empty(kind),
        }
    }

    /// Operation kind
    pub fn kind(&self) -> OperationKind {
        match self.images {
            Images::Insert { .. } => OperationKind::Insert,
            Images::Update { .. } => OperationKind::Update,
            Images::Delete { .. } => OperationKind::Delete,
            Images::Select { .. } => OperationKind::Select,
        }
    }

    /// Entity (table) name
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Row key
    pub fn key(&self) -> &ValueSet {
        &self.key
    }

    /// Value images
    pub fn images(&self) -> &Images {
        &self.images
    }

    /// Replace the row key with a copy of `key`
    pub fn set_key(&mut self, key: &ValueSet) {
        self.key.assign(key);
    }

    /// Append a value to the row key
    pub fn add_key_value(&mut self, value: TypedValue) {
        self.key.push(value);
    }

    /// Before-image, or the snapshot of a Select
    pub fn before(&self) -> Option<&ValueSet> {
        match &self.images {
            Images::Update { before, .. } | Images::Delete { before } => Some(before),
            Images::Select { snapshot } => Some(snapshot),
            Images::Insert { .. } => None,
        }
    }

    /// After-image
    pub fn after(&self) -> Option<&ValueSet> {
        match &self.images {
            Images::Insert { after } | Images::Update { after, .. } => Some(after),
            Images::Delete { .. } | Images::Select { .. } => None,
        }
    }

    fn slot_mut(&mut self, role: ValueRole) -> Result<&mut ValueSet> {
        let kind = self.kind();
        match (&mut self.images, role) {
            (Images::Insert { after }, ValueRole::After)
            | (Images::Update { after, .. }, ValueRole::After) => Ok(after),
            (Images::Update { before, .. }, ValueRole::Before)
            | (Images::Delete { before }, ValueRole::Before) => Ok(before),
            (Images::Select { snapshot }, ValueRole::Before) => Ok(snapshot),
            _ => Err(Error::invalid_input(format!(
                "incompatible value role {} for operation kind {}",
                role, kind
            ))),
        }
    }

    /// Add one value to the image named by `role`.
    ///
    /// Fails with `InvalidInput` for a role the kind does not carry.
    pub fn add_value(&mut self, value: TypedValue, role: ValueRole) -> Result<()> {
        self.slot_mut(role)?.push(value);
        Ok(())
    }

    /// Append copies of `values` to the image named by `role`
    pub fn add_values(&mut self, values: &ValueSet, role: ValueRole) -> Result<()> {
        self.slot_mut(role)?.merge(values);
        Ok(())
    }

    /// Whether this operation has kind `kind` on entity `entity`
    pub fn matches(&self, kind: OperationKind, entity: &str) -> bool {
        self.kind() == kind && self.entity == entity
    }

    /// The image a correlation lookup reads: the snapshot of a Select, the
    /// after-image of an Insert, the before-image otherwise
    pub fn correlation_values(&self) -> &ValueSet {
        match &self.images {
            Images::Insert { after } => after,
            Images::Update { before, .. } | Images::Delete { before } => before,
            Images::Select { snapshot } => snapshot,
        }
    }

    /// Whether an Update lacks a recorded before-image
    pub fn needs_correlation(&self) -> bool {
        matches!(&self.images, Images::Update { before, .. } if before.is_empty())
    }

    /// Values that restore the row an Update changed.
    ///
    /// Fails with `MissingCorrelation` when no before-image was recorded and
    /// `batch` holds no Select on this entity.
    pub fn restore_image<'a>(&'a self, batch: &'a Batch) -> Result<Cow<'a, ValueSet>> {
        let (before, after) = match &self.images {
            Images::Update { before, after } => (before, after),
            _ => {
                return Err(Error::invalid_input(format!(
                    "restore image requested for {} operation",
                    self.kind()
                )))
            }
        };
        if !before.is_empty() {
            return Ok(Cow::Borrowed(before));
        }
        let snapshot = batch
            .find_first_correlation(OperationKind::Select, &self.entity)
            .ok_or_else(|| Error::missing_correlation(&self.entity))?;
        trace!(target: "undolog::store", entity = %self.entity, digest = batch.digest(), "Derived before-image from select");
        let mut restore = after.clone();
        restore.reassign(snapshot)?;
        Ok(Cow::Owned(restore))
    }

    /// Append the forward (as happened) element to `out`
    pub fn write_forward(&self, out: &mut String) {
        match &self.images {
            Images::Insert { after } => self.write_element(OperationKind::Insert, after, out),
            Images::Delete { before } => self.write_element(OperationKind::Delete, before, out),
            Images::Update { before, after } => {
                self.open_element(OperationKind::Update, out);
                markup::open_tag(out, tags::VALUE);
                markup::open_tag(out, tags::BEFORE);
                before.write_fragments(out);
                markup::close_tag(out, tags::BEFORE);
                markup::open_tag(out, tags::AFTER);
                after.write_fragments(out);
                markup::close_tag(out, tags::AFTER);
                markup::close_tag(out, tags::VALUE);
                close_element(OperationKind::Update, out);
            }
            Images::Select { .. } => {}
        }
    }

    /// Append the inverse (undo) element to `out`.
    ///
    /// `batch` is the batch owning this operation, used to derive a missing
    /// Update before-image.
    pub fn write_inverse(&self, batch: &Batch, out: &mut String) -> Result<()> {
        match &self.images {
            Images::Insert { after } => self.write_element(OperationKind::Delete, after, out),
            Images::Delete { before } => self.write_element(OperationKind::Insert, before, out),
            Images::Update { .. } => {
                let restore = self.restore_image(batch)?;
                self.write_element(OperationKind::Update, &restore, out);
            }
            Images::Select { .. } => {}
        }
        Ok(())
    }

    /// Forward element as a string
    pub fn forward_document(&self) -> String {
        let mut out = String::new();
        self.write_forward(&mut out);
        out
    }

    /// Inverse element as a string
    pub fn inverse_document(&self, batch: &Batch) -> Result<String> {
        let mut out = String::new();
        self.write_inverse(batch, &mut out)?;
        Ok(out)
    }

    fn open_element(&self, kind: OperationKind, out: &mut String) {
        markup::open_tag(out, kind.as_str());
        markup::open_tag(out, tags::ENTITY);
        out.push_str(&markup::escape(&self.entity));
        markup::close_tag(out, tags::ENTITY);
        markup::open_tag(out, tags::KEY);
        self.key.write_fragments(out);
        markup::close_tag(out, tags::KEY);
    }

    fn write_element(&self, kind: OperationKind, values: &ValueSet, out: &mut String) {
        self.open_element(kind, out);
        markup::open_tag(out, tags::VALUE);
        values.write_fragments(out);
        markup::close_tag(out, tags::VALUE);
        close_element(kind, out);
    }

    /// SQL statement applying this operation as recorded.
    ///
    /// Loaded inverse documents render the undo statements this way.
    /// Inserts with an empty after-image list only the key columns.
    pub fn sql_statement(&self) -> String {
        let entity = &self.entity;
        match &self.images {
            Images::Insert { after } => {
                let columns = join_clauses(&[self.key.column_clause(","), after.column_clause(",")], ",");
                let values = join_clauses(&[self.key.value_clause(","), after.value_clause(",")], ",");
                format!("INSERT INTO {} ({}) VALUES ({})", entity, columns, values)
            }
            Images::Delete { before } => format!(
                "DELETE FROM {} WHERE {}",
                entity,
                join_clauses(
                    &[
                        self.key.assignment_clause(" AND "),
                        before.assignment_clause(" AND ")
                    ],
                    " AND "
                )
            ),
            Images::Update { after, .. } => format!(
                "UPDATE {} SET {} WHERE {}",
                entity,
                after.assignment_clause(","),
                self.key.assignment_clause(" AND ")
            ),
            Images::Select { snapshot } => format!(
                "SELECT {} FROM {} WHERE {}",
                snapshot.column_clause(","),
                entity,
                join_clauses(
                    &[
                        self.key.assignment_clause(" AND "),
                        snapshot.assignment_clause(" AND ")
                    ],
                    " AND "
                )
            ),
        }
    }
}

fn close_element(kind: OperationKind, out: &mut String) {
    markup::close_tag(out, kind.as_str());
}

fn join_clauses(clauses: &[String], separator: &str) -> String {
    clauses
        .iter()
        .filter(|c| !c.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(separator)
}
