//! Path resolution for the two storage locations.
//!
//! `StorageLayout` is the single place that knows how a logical database
//! name maps to files on disk. It is constructed explicitly and passed
//! around; there is no process-wide singleton to initialize.

use crate::error::Result;
use crate::model::{StorageMode, StorageState};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Extension of primary database files.
pub const DB_EXT: &str = ".s3db";
/// Extension of sidecar checksum files.
pub const CHECKSUM_EXT: &str = ".csm";

/// True for file names the transfer protocol recognizes as ours.
pub fn is_database_file(file_name: &str) -> bool {
    file_name.ends_with(DB_EXT) || file_name.ends_with(CHECKSUM_EXT)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    device_root: PathBuf,
    external_root: PathBuf,
    settings_dir: PathBuf,
}

impl StorageLayout {
    /// Build a layout from explicit roots. Settings live in the device
    /// root unless overridden with [`with_settings_dir`](Self::with_settings_dir).
    pub fn new(device_root: PathBuf, external_root: PathBuf) -> Self {
        let settings_dir = device_root.clone();
        Self {
            device_root,
            external_root,
            settings_dir,
        }
    }

    pub fn with_settings_dir(mut self, dir: PathBuf) -> Self {
        self.settings_dir = dir;
        self
    }

    /// Resolve default roots from the platform's application directories:
    /// `<data dir>/databases` for device storage and `<data dir>/external`
    /// standing in for the removable medium.
    pub fn discover() -> Option<Self> {
        let proj_dirs = ProjectDirs::from("com", "stowdb", "stowdb")?;
        let data_dir = proj_dirs.data_dir();
        Some(Self::new(
            data_dir.join("databases"),
            data_dir.join("external"),
        ))
    }

    pub fn root(&self, mode: StorageMode) -> &Path {
        match mode {
            StorageMode::Device => &self.device_root,
            StorageMode::External => &self.external_root,
        }
    }

    pub fn settings_dir(&self) -> &Path {
        &self.settings_dir
    }

    /// Path of the primary data file for `name` under `mode`.
    pub fn database_path(&self, mode: StorageMode, name: &str) -> PathBuf {
        self.root(mode).join(format!("{}{}", name, DB_EXT))
    }

    /// Path of the sidecar checksum file for `name` under `mode`.
    pub fn checksum_path(&self, mode: StorageMode, name: &str) -> PathBuf {
        self.root(mode).join(format!("{}{}", name, CHECKSUM_EXT))
    }

    /// Create the root directory for `mode` if it does not exist yet.
    pub fn ensure_root(&self, mode: StorageMode) -> Result<()> {
        let root = self.root(mode);
        if !root.exists() {
            fs::create_dir_all(root)?;
        }
        Ok(())
    }

    /// Probe the external medium. Not cached; every call inspects the
    /// filesystem afresh.
    pub fn probe_external(&self) -> StorageState {
        match fs::metadata(&self.external_root) {
            Ok(meta) if meta.is_dir() => {
                if meta.permissions().readonly() {
                    StorageState::ReadOnly
                } else {
                    StorageState::ReadWrite
                }
            }
            _ => StorageState::Unavailable,
        }
    }
}
