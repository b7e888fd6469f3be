//! Batch file transfer between the two storage locations.
//!
//! The protocol copies every recognized file from the source root to the
//! destination root and deletes the sources only once every copy has
//! succeeded. A failure mid-copy therefore leaves the source set intact;
//! a failure mid-delete can leave duplicates in both locations, but
//! never loses a file. Failures surface uniformly as [`TransferError`].

use crate::error::TransferError;
use crate::layout::{self, StorageLayout};
use crate::model::StorageMode;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info};

/// Move all recognized database files (`.s3db`, `.csm`) from `source`
/// to `destination`.
///
/// This does not touch persisted storage-mode state; the caller owns
/// that bookkeeping.
pub fn transfer(
    layout: &StorageLayout,
    source: StorageMode,
    destination: StorageMode,
) -> Result<(), TransferError> {
    run(layout, source, destination).map_err(TransferError::from)
}

fn run(layout: &StorageLayout, source: StorageMode, destination: StorageMode) -> io::Result<()> {
    debug!(%source, %destination, "listing database files to transfer");
    let files = list_database_files(layout, source)?;

    debug!(count = files.len(), "copying files to new storage directory");
    let dest_root = layout.root(destination);
    fs::create_dir_all(dest_root)?;
    for file in &files {
        let file_name = file
            .file_name()
            .ok_or_else(|| io::Error::other(format!("unnamed source file: {}", file.display())))?;
        fs::copy(file, dest_root.join(file_name))?;
    }

    debug!("deleting old database files");
    for file in &files {
        fs::remove_file(file)?;
    }

    info!(count = files.len(), %source, %destination, "transfer complete");
    Ok(())
}

fn list_database_files(layout: &StorageLayout, mode: StorageMode) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(layout.root(mode))? {
        let entry = entry?;
        let name = entry.file_name();
        let recognized = name
            .to_str()
            .is_some_and(layout::is_database_file);
        if recognized && entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    Ok(files)
}
