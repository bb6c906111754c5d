//! Flush records and recovery filters

use serde::{Deserialize, Serialize};

/// One batch as handed to a persistence backend at flush time.
///
/// `correlation` holds the selected batch-key fields as `(label, raw value)`
/// pairs in key order, so records can be looked up again without parsing the
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushRecord {
    /// Batch digest
    pub digest: String,
    /// Correlation key fields
    pub correlation: Vec<(String, String)>,
    /// Inverse document of the batch
    pub document: String,
}

impl FlushRecord {
    /// Create a record
    pub fn new(
        digest: impl Into<String>,
        correlation: Vec<(String, String)>,
        document: impl Into<String>,
    ) -> Self {
        FlushRecord {
            digest: digest.into(),
            correlation,
            document: document.into(),
        }
    }

    /// Raw value of a correlation field
    pub fn correlation_value(&self, label: &str) -> Option<&str> {
        self.correlation
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }
}

/// Selects stored records for recovery.
///
/// An empty filter matches everything. Every condition that is set must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    digest: Option<String>,
    fields: Vec<(String, String)>,
}

impl RecordFilter {
    /// Filter matching every record
    pub fn all() -> Self {
        Self::default()
    }

    /// Require an exact digest
    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = Some(digest.into());
        self
    }

    /// Require a correlation field to hold `value`
    pub fn with_field(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((label.into(), value.into()));
        self
    }

    /// Check a record against the filter
    pub fn matches(&self, record: &FlushRecord) -> bool {
        if let Some(digest) = &self.digest {
            if *digest != record.digest {
                return false;
            }
        }
        self.fields
            .iter()
            .all(|(label, value)| record.correlation_value(label) == Some(value.as_str()))
    }
}
