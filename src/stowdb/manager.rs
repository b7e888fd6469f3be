//! The storage mode controller and API facade.
//!
//! `DatabaseManager` owns the active storage mode and its persistence,
//! and fronts the transfer, checksum and update modules with
//! name-based operations. It is generic over [`DatabaseEngine`] the way
//! the rest of the crate is UI-agnostic: production code plugs in a
//! real engine seam, tests plug in stubs.

use crate::checksum::{self, IntegrityCheck};
use crate::error::{Result, StowError};
use crate::events::{ChangeNotifier, SubscriberId};
use crate::layout::{StorageLayout, DB_EXT};
use crate::model::{StorageMode, StorageState, TransferRecord, UpdateOutcome};
use crate::settings::SettingsStore;
use crate::transfer;
use crate::update::{self, DatabaseEngine, UpdateManager};
use std::fs::{self, File};
use std::io;
use std::path::PathBuf;
use std::thread;
use tracing::warn;

pub struct DatabaseManager<E: DatabaseEngine> {
    layout: StorageLayout,
    settings: SettingsStore,
    engine: E,
    storage_mode: StorageMode,
    external_state: StorageState,
    notifier: ChangeNotifier,
}

impl<E: DatabaseEngine> DatabaseManager<E> {
    /// Build a manager over `layout`. Reads the persisted storage mode
    /// (defaulting to device on first run) and probes the external
    /// medium once.
    pub fn new(layout: StorageLayout, engine: E) -> Result<Self> {
        let settings = SettingsStore::new(layout.settings_dir().to_path_buf());
        let external_state = layout.probe_external();
        let storage_mode = settings.load()?.storage_mode_current;
        Ok(Self {
            layout,
            settings,
            engine,
            storage_mode,
            external_state,
            notifier: ChangeNotifier::new(),
        })
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    // ---- storage mode ----

    /// The in-memory active storage mode.
    pub fn storage_mode(&self) -> StorageMode {
        self.storage_mode
    }

    /// Re-read the persisted mode. Needed when several manager
    /// instances share one settings file, so a mode switch made by one
    /// is seen by the others.
    pub fn reload_storage_mode(&mut self) -> Result<StorageMode> {
        self.storage_mode = self.settings.load()?.storage_mode_current;
        Ok(self.storage_mode)
    }

    /// Re-probe the external medium and cache the result.
    pub fn refresh_external_state(&mut self) -> StorageState {
        self.external_state = self.layout.probe_external();
        self.external_state
    }

    /// Access state of the active location. Device storage is always
    /// read-write; external storage reports the last probed state.
    pub fn storage_state(&self) -> StorageState {
        match self.storage_mode {
            StorageMode::Device => StorageState::ReadWrite,
            StorageMode::External => self.external_state,
        }
    }

    /// Switch the active storage mode, transferring all database files
    /// to the new location.
    ///
    /// The new mode is persisted whether or not the transfer succeeds,
    /// together with the previous mode and the transfer outcome, and a
    /// transfer failure is then re-raised. After a failure the files
    /// still live under the previous mode; call
    /// [`retry_pending_transfer`](Self::retry_pending_transfer) before
    /// trusting the new location.
    pub fn set_storage_mode(&mut self, new_mode: StorageMode) -> Result<()> {
        if new_mode == self.storage_mode {
            return Ok(());
        }

        let old_mode = self.storage_mode;
        let outcome = transfer::transfer(&self.layout, old_mode, new_mode);
        if let Err(err) = &outcome {
            warn!(%old_mode, %new_mode, error = %err, "transfer failed, mode change persists anyway");
        }

        let persisted = self.settings.update(|s| {
            s.storage_mode_current = new_mode;
            s.storage_mode_previous = old_mode;
            s.transfer_success = outcome.is_ok();
        });
        self.storage_mode = new_mode;

        outcome.map_err(StowError::from)?;
        persisted.map(|_| ())
    }

    /// Re-attempt a transfer that previously failed, moving files from
    /// the previous mode's location to the current one. A no-op when
    /// the last transfer succeeded or when there is nothing to move.
    /// The outcome is persisted on all paths and failure re-raised.
    pub fn retry_pending_transfer(&mut self) -> Result<()> {
        let record = self.settings.load()?;
        if record.transfer_success {
            return Ok(());
        }
        let previous = record.storage_mode_previous;
        if previous == self.storage_mode {
            return Ok(());
        }

        let outcome = transfer::transfer(&self.layout, previous, self.storage_mode);
        let persisted = self.settings.update(|s| {
            s.transfer_success = outcome.is_ok();
        });

        outcome.map_err(StowError::from)?;
        persisted.map(|_| ())
    }

    /// False if the last transfer between storage locations failed.
    pub fn last_transfer_success(&self) -> Result<bool> {
        Ok(self.settings.load()?.transfer_success)
    }

    /// The persisted previous mode and last-transfer outcome.
    pub fn transfer_record(&self) -> Result<TransferRecord> {
        Ok(self.settings.load()?.transfer_record())
    }

    // ---- database files ----

    /// True if the primary file for `name` exists in the active
    /// location.
    pub fn database_exists(&self, name: &str) -> bool {
        self.layout
            .database_path(self.storage_mode, name)
            .exists()
    }

    /// Resolve the primary file path for `name` in the active location,
    /// creating it empty when `create` is set and it does not exist.
    pub fn database_file(&self, name: &str, create: bool) -> Result<PathBuf> {
        let path = self.layout.database_path(self.storage_mode, name);
        if create && !path.exists() {
            self.layout.ensure_root(self.storage_mode)?;
            File::create(&path)?;
        }
        Ok(path)
    }

    /// Logical names of all databases in the active location.
    pub fn list_databases(&self) -> Result<Vec<String>> {
        let root = self.layout.root(self.storage_mode);
        if !root.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(root)? {
            let entry = entry?;
            if let Some(file_name) = entry.file_name().to_str() {
                if let Some(name) = file_name.strip_suffix(DB_EXT) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// The stored version of the database, or `None` if its primary
    /// file does not exist.
    pub fn database_version(&self, name: &str) -> Result<Option<i32>> {
        let path = self.layout.database_path(self.storage_mode, name);
        if !path.exists() {
            return Ok(None);
        }
        self.engine.read_version(&path).map(Some)
    }

    /// Delete the database and its sidecar from the active location.
    /// Returns whether the primary file was removed.
    pub fn delete_database(&self, name: &str) -> Result<bool> {
        remove_if_exists(&self.layout.checksum_path(self.storage_mode, name))?;
        remove_if_exists(&self.layout.database_path(self.storage_mode, name))
    }

    // ---- checksums ----

    /// Checksum of the database's primary file, or `None` if it does
    /// not exist.
    pub fn compute_checksum(&self, name: &str) -> Result<Option<String>> {
        checksum::compute_checksum(&self.layout.database_path(self.storage_mode, name))
    }

    /// Compute and persist the checksum to the database's sidecar file.
    pub fn store_checksum(&self, name: &str) -> Result<Option<String>> {
        checksum::store_checksum(
            &self.layout.database_path(self.storage_mode, name),
            &self.layout.checksum_path(self.storage_mode, name),
        )
    }

    /// The stored sidecar checksum, or `None` if there is no sidecar.
    pub fn load_checksum(&self, name: &str) -> Result<Option<String>> {
        checksum::load_checksum(&self.layout.checksum_path(self.storage_mode, name))
    }

    /// Compare the stored checksum against a fresh one.
    pub fn verify_integrity(&self, name: &str) -> Result<IntegrityCheck> {
        checksum::verify_integrity(
            &self.layout.database_path(self.storage_mode, name),
            &self.layout.checksum_path(self.storage_mode, name),
        )
    }

    /// Compare a fresh checksum against a caller-supplied value.
    pub fn verify_integrity_against(&self, name: &str, expected: &str) -> Result<IntegrityCheck> {
        checksum::verify_integrity_against(
            &self.layout.database_path(self.storage_mode, name),
            expected,
        )
    }

    // ---- updates ----

    /// Run required create/upgrade callbacks for the database. See
    /// [`update::run_updates`].
    pub fn run_updates<M: UpdateManager>(&self, name: &str, manager: &M) -> Result<UpdateOutcome> {
        update::run_updates(&self.layout, self.storage_mode, name, manager, &self.engine)
    }

    /// Run updates on a background thread; `on_complete` fires exactly
    /// once with the result.
    pub fn run_updates_async<M, F>(
        &self,
        name: &str,
        manager: M,
        on_complete: F,
    ) -> thread::JoinHandle<()>
    where
        E: Clone + Send + 'static,
        M: UpdateManager + Send + 'static,
        F: FnOnce(Result<UpdateOutcome>) + Send + 'static,
    {
        update::run_updates_async(
            self.layout.clone(),
            self.storage_mode,
            name.to_string(),
            manager,
            self.engine.clone(),
            on_complete,
        )
    }

    // ---- change notification ----

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriberId
    where
        F: Fn(&str) + Send + 'static,
    {
        self.notifier.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Fan a change event for `name` out to all subscribers. Derived
    /// components are responsible for calling this after their writes.
    pub fn notify_changed(&self, name: &str) {
        self.notifier.notify_changed(name);
    }
}

fn remove_if_exists(path: &std::path::Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err.into()),
    }
}
