//! File-backed checkpoint store.
//!
//! The checkpoint is a small JSON document:
//!
//! ```text
//! {
//!   "schema_version": 1,
//!   "checkpoint_id": "90020240301100000000000000000000000000000001",
//!   "saved_at": "2024-03-01T10:05:00Z"
//! }
//! ```
//!
//! Writes go through write-to-temp, fsync, rename, fsync-directory, so a
//! reader sees either the old document or the new one.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::fsync::{fsync_dir, fsync_file};
use super::{CheckpointStore, Result, StorageError};
use crate::types::{Cursor, display_cursor};

/// Current checkpoint document version.
pub const SCHEMA_VERSION: u32 = 1;

/// The on-disk checkpoint document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointDocument {
    pub schema_version: u32,

    /// Cursor of the last record advanced past. `null` means start of history.
    pub checkpoint_id: Option<Cursor>,

    /// When this document was written.
    pub saved_at: DateTime<Utc>,
}

impl CheckpointDocument {
    pub fn new(checkpoint_id: Option<Cursor>) -> Self {
        CheckpointDocument {
            schema_version: SCHEMA_VERSION,
            checkpoint_id,
            saved_at: Utc::now(),
        }
    }
}

/// Stores the checkpoint as a JSON document at a fixed path.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileCheckpointStore { path: path.into() }
    }

    /// Returns the checkpoint document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Reads the full document, returning `None` if the file doesn't exist.
    pub fn load_document(&self) -> Result<Option<CheckpointDocument>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let document: CheckpointDocument = serde_json::from_slice(&bytes)?;
        if document.schema_version != SCHEMA_VERSION {
            return Err(StorageError::SchemaMismatch {
                expected: SCHEMA_VERSION,
                got: document.schema_version,
            });
        }

        Ok(Some(document))
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self) -> Result<Option<Cursor>> {
        Ok(self.load_document()?.and_then(|doc| doc.checkpoint_id))
    }

    fn save(&self, cursor: Option<&Cursor>) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        std::fs::create_dir_all(parent)?;
        if self.path.is_dir() {
            return Err(StorageError::Rejected(format!(
                "{} is a directory",
                self.path.display()
            )));
        }

        let document = CheckpointDocument::new(cursor.cloned());
        let bytes = serde_json::to_vec_pretty(&document)?;

        let tmp_path = self.tmp_path();
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)?;
            file.write_all(&bytes)?;
            fsync_file(&file)?;
        }

        std::fs::rename(&tmp_path, &self.path)?;
        fsync_dir(parent)?;

        debug!(
            path = %self.path.display(),
            cursor = display_cursor(cursor),
            "Checkpoint saved"
        );
        Ok(())
    }
}
