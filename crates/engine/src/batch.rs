//! Batches of correlated operations
//!
//! A Batch groups the operations logged under one business key. Append
//! order is chronological. The forward document lists operations in that
//! order; the inverse document lists them newest first, so undoing several
//! operations on one row restores the oldest state last.

use crate::operation::Operation;
use undolog_core::{OperationKind, Result, ValueSet};

/// Operations sharing one correlation key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    key: ValueSet,
    digest: String,
    operations: Vec<Operation>,
}

impl Batch {
    /// Create an empty batch for `key`
    pub fn new(key: ValueSet) -> Self {
        let digest = key.digest();
        Batch {
            key,
            digest,
            operations: Vec::new(),
        }
    }

    /// Correlation key
    pub fn key(&self) -> &ValueSet {
        &self.key
    }

    /// Digest of the key
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Operations in append order
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Number of operations
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Check if the batch holds no operations
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Append an operation
    pub fn append(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    /// Append an operation and return it for population
    pub fn push(&mut self, operation: Operation) -> &mut Operation {
        self.operations.push(operation);
        let last = self.operations.len() - 1;
        &mut self.operations[last]
    }

    /// Move every operation of `other` to the end of this batch
    pub fn absorb(&mut self, other: Batch) {
        self.operations.extend(other.operations);
    }

    /// Value image of the first operation of `kind` on `entity`, in append order
    pub fn find_first_correlation(&self, kind: OperationKind, entity: &str) -> Option<&ValueSet> {
        self.operations
            .iter()
            .find(|op| op.matches(kind, entity))
            .map(Operation::correlation_values)
    }

    /// Append the forward element of every operation, oldest first
    pub fn write_forward(&self, out: &mut String) {
        for operation in &self.operations {
            operation.write_forward(out);
        }
    }

    /// Append the inverse element of every operation, newest first
    pub fn write_inverse(&self, out: &mut String) -> Result<()> {
        for operation in self.operations.iter().rev() {
            operation.write_inverse(self, out)?;
        }
        Ok(())
    }

    /// Forward operation elements
    pub fn forward_document(&self) -> String {
        let mut out = String::new();
        self.write_forward(&mut out);
        out
    }

    /// Inverse operation elements
    pub fn inverse_document(&self) -> Result<String> {
        let mut out = String::new();
        self.write_inverse(&mut out)?;
        Ok(out)
    }

    /// SQL statement of every operation in append order
    pub fn sql_statements(&self) -> Vec<String> {
        self.operations.iter().map(Operation::sql_statement).collect()
    }
}
