//! fsync helpers for the file-backed checkpoint store.
//!
//! Renaming the temp file over the checkpoint only survives power loss if
//! both the file contents and the containing directory entry reach disk.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Syncs a file's contents and metadata to disk.
pub fn fsync_file(file: &File) -> io::Result<()> {
    file.sync_all()
}

/// Syncs a directory so that a rename inside it is durable.
///
/// # Errors
///
/// Returns an error if the path doesn't exist or if the fsync system call fails.
pub fn fsync_dir(dir_path: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(dir_path)?;
    dir.sync_all()
}
