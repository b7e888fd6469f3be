use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the two physical locations is currently authoritative for
/// database files. Persisted as an integer so settings written by older
/// deployments keep their meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum StorageMode {
    Device,
    External,
}

impl Default for StorageMode {
    fn default() -> Self {
        StorageMode::Device
    }
}

impl From<StorageMode> for u8 {
    fn from(mode: StorageMode) -> u8 {
        match mode {
            StorageMode::Device => 0,
            StorageMode::External => 1,
        }
    }
}

impl TryFrom<u8> for StorageMode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(StorageMode::Device),
            1 => Ok(StorageMode::External),
            other => Err(format!("invalid storage mode: {}", other)),
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageMode::Device => write!(f, "device"),
            StorageMode::External => write!(f, "external"),
        }
    }
}

/// Live access state of the active storage location. Derived from the
/// storage mode plus inspection of the external medium; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageState {
    ReadWrite,
    ReadOnly,
    Unavailable,
}

impl fmt::Display for StorageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageState::ReadWrite => write!(f, "read-write"),
            StorageState::ReadOnly => write!(f, "read-only"),
            StorageState::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Outcome bookkeeping for the most recent file transfer.
///
/// When `last_transfer_succeeded` is false the files under
/// `previous_mode` are still the source of truth, and
/// `retry_pending_transfer` must succeed before current-mode files can
/// be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRecord {
    pub previous_mode: StorageMode,
    pub last_transfer_succeeded: bool,
}

/// Severity tag carried by database-lifecycle errors so callers can
/// decide whether to abort or continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Fatal,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fatal => write!(f, "E_FATAL"),
            Severity::Warning => write!(f, "E_WARNING"),
        }
    }
}

/// What the update orchestrator did for a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The primary file was absent; it was created and the create
    /// callback ran.
    Created,
    /// The stored version was behind and the upgrade callback ran.
    Upgraded { from: i32, to: i32 },
    /// No callback was needed.
    UpToDate,
}
