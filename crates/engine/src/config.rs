//! Undo log configuration via `undolog.toml`
//!
//! A job reads its configuration once at start-up. `write_default_if_missing`
//! drops a commented default file next to the job so settings can be edited
//! in place.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use undolog_core::{Error, Result, DEFAULT_DATE_FORMAT_MASK};
use undolog_durability::{FileBackend, MemoryBackend, PersistenceBackend};

/// Config file name looked up in the job's working directory.
pub const CONFIG_FILE_NAME: &str = "undolog.toml";

/// Highest accepted trace level (trace)
pub const MAX_TRACE_LEVEL: u8 = 4;

/// Persistence backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// No backend; a flush only clears the store
    #[default]
    None,
    /// Records kept in process memory
    Memory,
    /// Records appended to a JSON-lines file
    File,
}

/// `[persistence]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Which backend receives flush records
    #[serde(default)]
    pub backend: BackendKind,
    /// Record file for the `file` backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Undo log configuration loaded from `undolog.toml`.
///
/// # Example
///
/// ```toml
/// trace_level = 2
/// date_format_mask = "YYYYMMDDHH24MISS"
/// correlation_fields = ["CUSTOMER_ID"]
///
/// [persistence]
/// backend = "file"
/// path = "undo-records.jsonl"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoLogConfig {
    /// Trace verbosity: 0 off, 1 warn, 2 info, 3 debug, 4 trace.
    #[serde(default)]
    pub trace_level: u8,
    /// Format mask given to dates read from the ingestion protocol.
    #[serde(default = "default_date_format_mask")]
    pub date_format_mask: String,
    /// Batch-key labels copied into each flush record. All key fields when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_fields: Option<Vec<String>>,
    /// Persistence backend.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

fn default_date_format_mask() -> String {
    DEFAULT_DATE_FORMAT_MASK.to_string()
}

impl Default for UndoLogConfig {
    fn default() -> Self {
        Self {
            trace_level: 0,
            date_format_mask: default_date_format_mask(),
            correlation_fields: None,
            persistence: PersistenceConfig::default(),
        }
    }
}

impl UndoLogConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Undo log configuration
#
# Trace level: 0 = off (default), 1 = warn, 2 = info, 3 = debug, 4 = trace
trace_level = 0

# Format mask attached to dates read from host variables
date_format_mask = "YYYYMMDDHH24MISS"

# Batch-key labels copied into each flush record (default: every key field)
# correlation_fields = ["BILLSEQNO", "CUSTOMER_ID"]

[persistence]
# Backend receiving one record per batch at flush: "none", "memory" or "file"
backend = "none"
# path = "undo-records.jsonl"    # required for "file"
"#
    }

    /// Parse and validate config text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: UndoLogConfig = toml::from_str(content)
            .map_err(|e| Error::invalid_input(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("Failed to read config file '{}': {}", path.display(), e),
            )
        })?;
        Self::from_toml_str(&content).map_err(|e| {
            Error::invalid_input(format!("Config file '{}': {}", path.display(), e))
        })
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::invalid_input(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check value ranges and backend requirements.
    pub fn validate(&self) -> Result<()> {
        if self.trace_level > MAX_TRACE_LEVEL {
            return Err(Error::invalid_input(format!(
                "Invalid trace_level {}. Expected 0..={}.",
                self.trace_level, MAX_TRACE_LEVEL
            )));
        }
        if self.date_format_mask.trim().is_empty() {
            return Err(Error::invalid_input("date_format_mask must not be empty"));
        }
        if self.persistence.backend == BackendKind::File
            && self.persistence.path.as_deref().map_or(true, |p| p.trim().is_empty())
        {
            return Err(Error::invalid_input(
                "persistence backend \"file\" requires a path",
            ));
        }
        Ok(())
    }

    /// Build the configured backend; `None` for `backend = "none"`.
    pub fn open_backend(&self) -> Result<Option<Box<dyn PersistenceBackend>>> {
        self.validate()?;
        let backend: Box<dyn PersistenceBackend> = match self.persistence.backend {
            BackendKind::None => return Ok(None),
            BackendKind::Memory => Box::new(MemoryBackend::new()),
            BackendKind::File => {
                let path = self.persistence.path.as_deref().unwrap_or_default();
                Box::new(FileBackend::open(path)?)
            }
        };
        Ok(Some(backend))
    }
}
