#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `core` is the orchestration facade of the blobsync workspace: it owns
//! the [`Session`] collaborator bundle, the `blobsync.json` project
//! configuration, and [`run_sync`], the driver that turns one invocation
//! into a scan, a record listing, a diff, and the upload and purge
//! batches from the `engine` crate.
//!
//! # Design
//!
//! - A [`Session`] is built once at startup and passed by reference;
//!   collaborators are trait objects behind `Arc`, so the CLI's HTTP
//!   services and the test suite's in-memory doubles drive identical
//!   code.
//! - [`run_sync`] aborts only when it cannot produce a diff (unusable
//!   scan root, failed record listing). Everything after that point is
//!   batch work whose failures are carried in the [`SyncSummary`]
//!   reports, never as errors.
//! - [`ClientError`] pairs every abort with an [`ExitCode`], and
//!   [`SyncSummary::exit_code`] maps completed-but-imperfect runs to the
//!   partial-publication code.
//!
//! # Errors
//!
//! [`ClientError`] covers configuration, scanning, and listing failures.
//! Per-file and per-endpoint failures are data, not errors; see the
//! report types in `engine`.

/// The sync driver and its options and summary types.
pub mod client;
/// The `blobsync.json` project file.
pub mod config;
/// Run-aborting failures.
pub mod error;
/// Process exit codes.
pub mod exit_code;
/// The per-run collaborator bundle.
pub mod session;

pub use crate::client::{SyncOptions, SyncSummary, list_remote, run_sync};
pub use crate::config::{PROJECT_FILE, ProjectConfig};
pub use crate::error::ClientError;
pub use crate::exit_code::ExitCode;
pub use crate::session::Session;
