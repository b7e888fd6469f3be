//! # stowdb Architecture
//!
//! stowdb is a **UI-agnostic storage-location manager** for named
//! SQLite-style database files. It is a library first; the `stowdb`
//! binary is just a thin client.
//!
//! An application owns a set of databases (`<name>.s3db`) that can live
//! in one of two places: device-local storage or an external/removable
//! medium. stowdb tracks which location is active, moves the whole file
//! set when the active location changes, and keeps enough persisted
//! state to retry a move that failed partway.
//!
//! ## The Layers
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  CLI (args.rs + main.rs, binary only)                        │
//! │  - Parses arguments, formats output, owns exit codes         │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Facade (manager.rs)                                         │
//! │  - DatabaseManager<E>: storage mode state + persistence      │
//! │  - Name-based operations over the modules below              │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Core modules                                                │
//! │  - transfer.rs: batch move between locations                 │
//! │  - checksum.rs: MD5 sidecar integrity checks                 │
//! │  - update.rs: create/upgrade orchestration                   │
//! │  - events.rs: change-notification fan-out                    │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Foundation                                                  │
//! │  - layout.rs: name + mode → concrete path (no globals)       │
//! │  - settings.rs: persisted mode/transfer record               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Model
//!
//! Mode switches persist their outcome on every path: after
//! `set_storage_mode` the new mode is durable even when the file
//! transfer failed, and the failure is re-raised so the caller knows
//! the files did not move. Nothing is retried automatically;
//! `retry_pending_transfer` is an explicit operation. Transfers delete
//! source files only after every copy succeeded, so a failure never
//! loses data (though it can leave duplicates in both locations).
//!
//! Checksum *absence* is a value, not an error: integrity checks return
//! a three-valued [`checksum::IntegrityCheck`] so "cannot verify" is
//! distinguishable from "verification failed".
//!
//! ## The Engine Seam
//!
//! stowdb does not implement a database engine. The
//! [`update::DatabaseEngine`] trait is the read-side seam (what version
//! does this file store?), and [`update::UpdateManager`] is the
//! caller's create/upgrade logic. [`update::SqliteHeaderEngine`] is a
//! minimal engine that reads the version from the SQLite file header.
//!
//! ## Module Overview
//!
//! - [`manager`]: `DatabaseManager<E>` facade and mode controller
//! - [`layout`]: path resolution for both storage locations
//! - [`settings`]: persisted controller state
//! - [`transfer`]: the batch file-transfer protocol
//! - [`checksum`]: checksum compute/store/verify
//! - [`update`]: update orchestration and the engine seam
//! - [`events`]: subscriber registry for change notifications
//! - [`model`]: core types (`StorageMode`, `StorageState`, ...)
//! - [`error`]: error taxonomy

pub mod checksum;
pub mod error;
pub mod events;
pub mod layout;
pub mod manager;
pub mod model;
pub mod settings;
pub mod transfer;
pub mod update;
