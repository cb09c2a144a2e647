#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
//! Remote collaborator seam: endpoints, pointer records, and transports.
//!
//! # Overview
//!
//! The sync engine never talks to the network directly. It goes through
//! three traits defined here:
//!
//! - [`BlobStore`] stores and deletes content-addressed blobs on one
//!   [`Endpoint`] at a time.
//! - [`Publisher`] fronts the pointer directory: it lists, publishes, and
//!   retracts the [`PointerRecord`]s that map remote paths to content
//!   hashes for one [`Identity`].
//! - [`Signer`] mints the [`Proof`] authorizing a single upload attempt or
//!   a single file's deletions.
//!
//! # Design
//!
//! All three traits are object safe and `Send + Sync` so the engine can
//! hold them as `Arc<dyn ...>` and share them across file tasks. Two
//! implementations ship for each transport-facing trait: an HTTP one
//! ([`HttpBlobStore`], [`HttpPublisher`]) speaking a minimal reference
//! protocol, and an in-memory one ([`MemoryBlobStore`],
//! [`MemoryPublisher`]) for tests and offline runs. [`HmacSigner`] is the
//! reference [`Signer`], producing HMAC-SHA-256 proofs over a canonical
//! authorization line.
//!
//! # Errors
//!
//! The error taxonomy mirrors how failures are handled upstream:
//! [`EndpointError`] covers one endpoint attempt and is always recoverable
//! (counted per file), [`AuthError`] is a signing failure folded into the
//! attempt it authorized, [`PublishError`] covers publish/retract and never
//! reverses a stored blob, and [`NetworkError`] covers manifest listing,
//! the one remote failure that is fatal to a run.

mod blob;
mod endpoint;
mod error;
mod http;
mod identity;
mod memory;
pub mod mime;
mod record;
mod signer;
mod traits;

pub use crate::blob::{BlobDescriptor, Proof, StoredRef};
pub use crate::endpoint::{Endpoint, EndpointParseError};
pub use crate::error::{AuthError, EndpointError, NetworkError, PublishError};
pub use crate::http::{HttpBlobStore, HttpPublisher};
pub use crate::identity::Identity;
pub use crate::memory::{MemoryBlobStore, MemoryPublisher};
pub use crate::record::PointerRecord;
pub use crate::signer::HmacSigner;
pub use crate::traits::{BlobStore, Publisher, Signer};
