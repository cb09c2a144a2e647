#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
//! Synchronization engine: diff, redundant upload, and purge.
//!
//! # Overview
//!
//! Three batch operations drive a sync run, all working over
//! [`FileList`](flist::FileList)s and the collaborators in a
//! [`SyncContext`]:
//!
//! - [`diff`] partitions the local list against the published manifest by
//!   content hash alone.
//! - [`run_upload`] pushes each changed file to every endpoint with
//!   bounded file-level concurrency and at-least-one-of-N success
//!   semantics, then publishes a pointer record per successful file.
//! - [`run_purge`] best-effort deletes stale blobs from every endpoint
//!   and retracts each stale record exactly once.
//!
//! # Design
//!
//! A `tokio::sync::Semaphore` gates the upload spawning loop so at most
//! `concurrency` files are in flight, regardless of batch size. Inside a
//! file's task, one child task per endpoint is spawned and joined; every
//! per-endpoint verdict flows back as a task result and is folded into
//! counters owned by the file task. No counters or status maps are shared
//! across tasks.
//!
//! # Invariants
//!
//! - Endpoint failures never abort sibling endpoints or sibling files; a
//!   batch call always returns a complete report.
//! - Exactly one upload proof is requested per (file, endpoint) attempt,
//!   immediately before the attempt; exactly one delete proof per purged
//!   file.
//! - A publish failure is reported next to the upload outcome and never
//!   retroactively fails a stored upload.

mod context;
mod diff;
mod outcome;
mod purge;
mod upload;

pub use crate::context::SyncContext;
pub use crate::diff::{DiffResult, diff};
pub use crate::outcome::{FileFailure, FileOutcome, PurgeReport, ServerStatus, UploadReport};
pub use crate::purge::{PurgeOptions, run_purge};
pub use crate::upload::{DEFAULT_CONCURRENCY, UploadOptions, run_upload};
