use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use stowdb::model::StorageMode;

#[derive(Parser, Debug)]
#[command(name = "stowdb")]
#[command(about = "Storage-location manager for SQLite-style database files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Device storage directory (defaults to the platform data dir)
    #[arg(long, global = true)]
    pub device_root: Option<PathBuf>,

    /// External storage directory (defaults to the platform data dir)
    #[arg(long, global = true)]
    pub external_root: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum ModeArg {
    Device,
    External,
}

impl From<ModeArg> for StorageMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Device => StorageMode::Device,
            ModeArg::External => StorageMode::External,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the active storage mode, its state and the last transfer
    #[command(alias = "st")]
    Status,

    /// Switch the active storage mode, moving all database files
    Mode {
        /// Target storage location
        mode: ModeArg,
    },

    /// Re-attempt a file transfer that previously failed
    Retry,

    /// List databases in the active location
    #[command(alias = "ls")]
    List,

    /// Compute and store the checksum sidecar for a database
    Checksum {
        /// Logical database name (without extension)
        name: String,
    },

    /// Verify a database against its sidecar or an expected checksum
    Verify {
        /// Logical database name (without extension)
        name: String,

        /// Expected checksum (32 hex chars); checks the sidecar if omitted
        #[arg(long)]
        expected: Option<String>,
    },

    /// Print the stored version of a database
    Version {
        /// Logical database name (without extension)
        name: String,
    },

    /// Delete a database and its checksum sidecar
    #[command(alias = "rm")]
    Delete {
        /// Logical database name (without extension)
        name: String,
    },
}
