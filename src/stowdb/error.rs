use crate::model::Severity;
use std::io;
use thiserror::Error;

/// Batch file transfer failed. Wraps the underlying cause uniformly;
/// callers cannot tell which subset of files moved before the failure.
#[derive(Error, Debug)]
#[error("error transferring database files: {source}")]
pub struct TransferError {
    #[from]
    pub source: io::Error,
}

/// The update manager's initialize hook failed.
#[derive(Error, Debug)]
#[error("[{severity}] error initializing update manager: {message}")]
pub struct InitializationError {
    pub message: String,
    pub severity: Severity,
}

impl InitializationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Fatal,
        }
    }

    pub fn with_severity(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

/// The create callback failed while building the initial database.
#[derive(Error, Debug)]
#[error("[{severity}] error creating initial database: {message}")]
pub struct CreationError {
    pub message: String,
    pub severity: Severity,
}

impl CreationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Fatal,
        }
    }

    pub fn with_severity(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

/// The upgrade callback failed. Carries the version pair it was moving
/// between.
#[derive(Error, Debug)]
#[error("[{severity}] error upgrading database from version {old_version} to version {new_version}: {message}")]
pub struct UpgradeError {
    pub old_version: i32,
    pub new_version: i32,
    pub message: String,
    pub severity: Severity,
}

impl UpgradeError {
    pub fn new(old_version: i32, new_version: i32, message: impl Into<String>) -> Self {
        Self {
            old_version,
            new_version,
            message: message.into(),
            severity: Severity::Fatal,
        }
    }

    pub fn with_severity(
        old_version: i32,
        new_version: i32,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            old_version,
            new_version,
            message: message.into(),
            severity,
        }
    }
}

#[derive(Error, Debug)]
pub enum StowError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] serde_json::Error),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Initialization(#[from] InitializationError),

    #[error(transparent)]
    Creation(#[from] CreationError),

    #[error(transparent)]
    Upgrade(#[from] UpgradeError),

    #[error("Engine error: {0}")]
    Engine(String),
}

impl StowError {
    /// Severity of the error, when it carries one. Transfer and IO
    /// failures are always fatal.
    pub fn severity(&self) -> Severity {
        match self {
            StowError::Initialization(e) => e.severity,
            StowError::Creation(e) => e.severity,
            StowError::Upgrade(e) => e.severity,
            _ => Severity::Fatal,
        }
    }
}

pub type Result<T> = std::result::Result<T, StowError>;
