//! Durable storage for the run checkpoint.
//!
//! A deployment keeps exactly one checkpoint: the cursor of the last record a
//! run advanced past. It is read once when a run starts and written once when
//! it commits.
//!
//! # Atomicity
//!
//! Implementations must make `save` atomic: a concurrent or later `load`
//! observes either the previous cursor or the new one, never a torn write.
//! Concurrent saves are last-writer-wins; the orchestrator issues at most one
//! save per run.

use std::io;
use thiserror::Error;

use crate::types::Cursor;

pub mod file;
pub mod fsync;
pub mod memory;

pub use file::{CheckpointDocument, FileCheckpointStore, SCHEMA_VERSION};
pub use memory::MemoryCheckpointStore;

/// Errors raised by a checkpoint store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error reading or writing the backing store.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The stored document could not be parsed or serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The stored document was written by an incompatible version.
    #[error("schema version mismatch: expected {expected}, got {got}")]
    SchemaMismatch { expected: u32, got: u32 },

    /// The backing store refused the write, e.g. the file store's target
    /// path is a directory.
    #[error("checkpoint write rejected: {0}")]
    Rejected(String),
}

/// Result type for checkpoint operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage contract for the run checkpoint.
///
/// Implementations must be `Send + Sync` for use behind `Arc<dyn CheckpointStore>`.
pub trait CheckpointStore: Send + Sync {
    /// Reads the persisted cursor.
    ///
    /// Returns `Ok(None)` when nothing has been persisted yet, meaning the
    /// next fetch starts at the beginning of the source's history.
    fn load(&self) -> Result<Option<Cursor>>;

    /// Atomically replaces the persisted cursor.
    ///
    /// `None` records "start of history" explicitly.
    fn save(&self, cursor: Option<&Cursor>) -> Result<()>;
}

impl<T: CheckpointStore + ?Sized> CheckpointStore for std::sync::Arc<T> {
    fn load(&self) -> Result<Option<Cursor>> {
        (**self).load()
    }

    fn save(&self, cursor: Option<&Cursor>) -> Result<()> {
        (**self).save(cursor)
    }
}
