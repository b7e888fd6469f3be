//! Update orchestration: decides whether a database needs its create or
//! upgrade callback run before first use.
//!
//! The orchestrator never touches schema itself. The caller supplies an
//! [`UpdateManager`] with the create/upgrade logic, and the upgrade
//! callback is responsible for persisting the new version number into
//! the engine. The engine side of the seam is [`DatabaseEngine`], which
//! only has to answer what version a database file currently stores.

use crate::error::{CreationError, InitializationError, Result, UpgradeError};
use crate::layout::StorageLayout;
use crate::model::{StorageMode, UpdateOutcome};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::thread;
use tracing::{debug, info};

/// External collaborator supplying create/upgrade callbacks and version
/// metadata for a named database.
pub trait UpdateManager {
    /// Runs before any file inspection. A failure here aborts the whole
    /// update.
    fn initialize(&self) -> std::result::Result<(), InitializationError>;

    /// The version this manager can bring a database up to.
    fn target_version(&self) -> i32;

    /// Final say on whether a version gap warrants running the upgrade
    /// callback.
    fn needs_update(&self, old_version: i32, new_version: i32) -> bool;

    /// Build the initial database in the freshly created empty file,
    /// including its version header.
    fn on_create(&self, db_file: &Path) -> std::result::Result<(), CreationError>;

    /// Upgrade the database in place and persist the new version.
    fn on_upgrade(
        &self,
        db_file: &Path,
        old_version: i32,
        new_version: i32,
    ) -> std::result::Result<(), UpgradeError>;
}

/// Read-side seam to the opaque database engine.
pub trait DatabaseEngine {
    /// The version currently stored in `db_file`.
    fn read_version(&self, db_file: &Path) -> Result<i32>;
}

/// Byte offset of the user-version field in an SQLite file header.
const USER_VERSION_OFFSET: u64 = 60;

/// Default engine: reads the 4-byte big-endian user-version straight
/// out of the SQLite file header, without opening the database.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteHeaderEngine;

impl DatabaseEngine for SqliteHeaderEngine {
    fn read_version(&self, db_file: &Path) -> Result<i32> {
        let mut file = File::open(db_file)?;
        let len = file.metadata()?.len();
        // A freshly created file has no header yet.
        if len < USER_VERSION_OFFSET + 4 {
            return Ok(0);
        }
        file.seek(SeekFrom::Start(USER_VERSION_OFFSET))?;
        let mut buf = [0u8; 4];
        file.read_exact(&mut buf)?;
        Ok(i32::from_be_bytes(buf))
    }
}

/// Run required updates for the database `name` under `mode`.
///
/// If the primary file is absent it is created empty and the create
/// callback runs. Otherwise the stored version is compared with the
/// manager's target; the upgrade callback runs only when the stored
/// version is strictly behind *and* `needs_update` agrees.
pub fn run_updates<M, E>(
    layout: &StorageLayout,
    mode: StorageMode,
    name: &str,
    manager: &M,
    engine: &E,
) -> Result<UpdateOutcome>
where
    M: UpdateManager + ?Sized,
    E: DatabaseEngine + ?Sized,
{
    manager.initialize()?;

    let db_file = layout.database_path(mode, name);
    if !db_file.exists() {
        debug!(name, "database absent, running create callback");
        layout.ensure_root(mode)?;
        File::create(&db_file)?;
        manager.on_create(&db_file)?;
        return Ok(UpdateOutcome::Created);
    }

    let old_version = engine.read_version(&db_file)?;
    let new_version = manager.target_version();
    if old_version < new_version && manager.needs_update(old_version, new_version) {
        info!(name, old_version, new_version, "running upgrade callback");
        manager.on_upgrade(&db_file, old_version, new_version)?;
        return Ok(UpdateOutcome::Upgraded {
            from: old_version,
            to: new_version,
        });
    }

    Ok(UpdateOutcome::UpToDate)
}

/// Run [`run_updates`] on a background thread without blocking the
/// caller. `on_complete` fires exactly once with the outcome, success
/// or error.
pub fn run_updates_async<M, E, F>(
    layout: StorageLayout,
    mode: StorageMode,
    name: String,
    manager: M,
    engine: E,
    on_complete: F,
) -> thread::JoinHandle<()>
where
    M: UpdateManager + Send + 'static,
    E: DatabaseEngine + Send + 'static,
    F: FnOnce(Result<UpdateOutcome>) + Send + 'static,
{
    thread::spawn(move || {
        let result = run_updates(&layout, mode, &name, &manager, &engine);
        on_complete(result);
    })
}
