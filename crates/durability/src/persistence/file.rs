//! JSON-lines file backend
//!
//! One `FlushRecord` per line. The file length at the last commit is kept
//! so `rollback` can truncate records appended after it; a crash between
//! append and commit can still leave such records behind, and `load` returns
//! them like any other after the file is reopened.

use super::error::PersistenceError;
use super::record::{FlushRecord, RecordFilter};
use super::PersistenceBackend;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Backend identifier
pub const FILE_BACKEND_ID: &str = "file";

/// Persistence backend writing JSON lines to a single file
pub struct FileBackend {
    path: PathBuf,
    writer: BufWriter<File>,
    committed_len: u64,
}

impl FileBackend {
    /// Open or create the record file
    ///
    /// Creates parent directories if they don't exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)?;
        let committed_len = file.metadata()?.len();

        info!(target: "undolog::persistence", path = %path.display(), committed_len, "Opened record file");

        Ok(FileBackend {
            path,
            writer: BufWriter::new(file),
            committed_len,
        })
    }

    /// Path of the record file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistenceBackend for FileBackend {
    fn append(&mut self, record: &FlushRecord) -> Result<(), PersistenceError> {
        let line = serde_json::to_string(record)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), PersistenceError> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.committed_len = self.writer.get_ref().metadata()?.len();
        debug!(target: "undolog::persistence", committed_len = self.committed_len, "Committed record file");
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), PersistenceError> {
        // Buffered appends are dropped unwritten
        let fresh = BufWriter::new(self.writer.get_ref().try_clone()?);
        let (file, _discarded) = std::mem::replace(&mut self.writer, fresh).into_parts();
        file.set_len(self.committed_len)?;
        warn!(target: "undolog::persistence", committed_len = self.committed_len, "Rolled back uncommitted records");
        Ok(())
    }

    fn load(&self, filter: &RecordFilter) -> Result<Vec<FlushRecord>, PersistenceError> {
        // Only committed bytes; pending appends stay invisible
        let reader = BufReader::new(File::open(&self.path)?.take(self.committed_len));
        let mut records = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: FlushRecord =
                serde_json::from_str(&line).map_err(|e| PersistenceError::Corrupt {
                    line: i + 1,
                    detail: e.to_string(),
                })?;
            if filter.matches(&record) {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn backend_id(&self) -> &str {
        FILE_BACKEND_ID
    }
}
