use std::sync::Arc;

use remote::{BlobStore, Endpoint, Identity, Publisher, Signer};

/// Collaborators and targets shared by every batch operation of one run.
///
/// Constructed once at startup and passed by reference; read-only while a
/// run is in flight. The trait objects are shared into spawned file tasks
/// via their `Arc`s.
#[derive(Clone)]
pub struct SyncContext {
    /// Identity records are published under.
    pub identity: Identity,
    /// Blob storage destinations, each independent of the others.
    pub endpoints: Vec<Endpoint>,
    /// Blob transport.
    pub store: Arc<dyn BlobStore>,
    /// Pointer directory frontend.
    pub publisher: Arc<dyn Publisher>,
    /// Proof minter for uploads and deletions.
    pub signer: Arc<dyn Signer>,
}
