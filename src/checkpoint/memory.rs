//! In-process checkpoint store.
//!
//! Holds the cursor behind a mutex. Nothing survives a restart, so this is
//! only suitable for tests and one-shot runs.

use std::sync::{Mutex, PoisonError};

use super::{CheckpointStore, Result};
use crate::types::Cursor;

#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    cursor: Mutex<Option<Cursor>>,
    saves: Mutex<u64>,
}

impl MemoryCheckpointStore {
    /// Creates an empty store (start of history).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `cursor`.
    pub fn with_cursor(cursor: impl Into<Cursor>) -> Self {
        MemoryCheckpointStore {
            cursor: Mutex::new(Some(cursor.into())),
            saves: Mutex::new(0),
        }
    }

    /// Number of successful `save` calls so far.
    pub fn save_count(&self) -> u64 {
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self) -> Result<Option<Cursor>> {
        Ok(self
            .cursor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, cursor: Option<&Cursor>) -> Result<()> {
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner) = cursor.cloned();
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}
