//! Persisted controller state: current mode, previous mode and the
//! last-transfer outcome, stored as stowdb_settings.json.
//!
//! Multiple controller instances in one process may point at the same
//! settings file. Every read-modify-write cycle goes through a
//! process-wide per-directory mutex so concurrent instances cannot
//! interleave a load and a save.

use crate::error::Result;
use crate::model::{StorageMode, TransferRecord};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const SETTINGS_FILENAME: &str = "stowdb_settings.json";

static LOCKS: Lazy<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn lock_for(dir: &Path) -> Arc<Mutex<()>> {
    let mut locks = LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    locks
        .entry(dir.to_path_buf())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}

/// The persisted record. Storage modes serialize as integers (see
/// [`StorageMode`]); `updated_at` records the last successful save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub storage_mode_current: StorageMode,

    #[serde(default)]
    pub storage_mode_previous: StorageMode,

    #[serde(default = "default_transfer_success")]
    pub transfer_success: bool,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_transfer_success() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_mode_current: StorageMode::Device,
            storage_mode_previous: StorageMode::Device,
            transfer_success: true,
            updated_at: Utc::now(),
        }
    }
}

impl Settings {
    pub fn transfer_record(&self) -> TransferRecord {
        TransferRecord {
            previous_mode: self.storage_mode_previous,
            last_transfer_succeeded: self.transfer_success,
        }
    }
}

/// Handle on the settings file in one directory. Cheap to clone; clones
/// share the same process-wide lock.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    dir: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl SettingsStore {
    pub fn new(dir: PathBuf) -> Self {
        let lock = lock_for(&dir);
        Self { dir, lock }
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // A poisoned lock only means another thread panicked mid-write;
        // the JSON on disk is still either the old or the new record.
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILENAME)
    }

    /// Load settings, or return defaults if no file exists yet.
    pub fn load(&self) -> Result<Settings> {
        let _guard = self.guard();
        self.read_unlocked()
    }

    /// Overwrite the settings file with `settings`.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        let _guard = self.guard();
        self.write_unlocked(settings)
    }

    /// Atomic read-modify-write under the process-wide lock. Returns the
    /// record as written.
    pub fn update<F>(&self, apply: F) -> Result<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let _guard = self.guard();
        let mut settings = self.read_unlocked()?;
        apply(&mut settings);
        settings.updated_at = Utc::now();
        self.write_unlocked(&settings)?;
        Ok(settings)
    }

    fn read_unlocked(&self) -> Result<Settings> {
        let path = self.settings_path();
        if !path.exists() {
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(&path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    fn write_unlocked(&self, settings: &Settings) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(self.settings_path(), content)?;
        Ok(())
    }
}
