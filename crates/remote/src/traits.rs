use async_trait::async_trait;
use bytes::Bytes;

use flist::{ContentHash, RecordId, RemotePath};

use crate::blob::{BlobDescriptor, Proof, StoredRef};
use crate::endpoint::Endpoint;
use crate::error::{AuthError, EndpointError, NetworkError, PublishError};
use crate::identity::Identity;
use crate::record::PointerRecord;

/// Stores and deletes content-addressed blobs, one endpoint at a time.
///
/// Implementations address blobs solely by their [`ContentHash`]; storing
/// the same bytes twice is idempotent on any reasonable backend.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` on `endpoint` under the descriptor's hash.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError`] when this endpoint refuses the blob or
    /// cannot be reached. The failure concerns this endpoint only.
    async fn put(
        &self,
        endpoint: &Endpoint,
        blob: &BlobDescriptor,
        bytes: Bytes,
        proof: &Proof,
    ) -> Result<StoredRef, EndpointError>;

    /// Deletes the blob stored under `hash` on `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError`] when this endpoint refuses the deletion
    /// or cannot be reached.
    async fn delete(
        &self,
        endpoint: &Endpoint,
        hash: ContentHash,
        proof: &Proof,
    ) -> Result<(), EndpointError>;
}

/// Fronts the pointer directory owning path-to-hash records.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Lists every live record published under `identity`.
    ///
    /// An identity that never published anything yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError`] when the directory cannot be queried;
    /// callers treat this as fatal to the run.
    async fn list(&self, identity: &Identity) -> Result<Vec<PointerRecord>, NetworkError>;

    /// Publishes a `path -> hash` pointer under `identity`.
    ///
    /// Publishing a path again replaces what the path points at; the last
    /// writer wins.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] when the record cannot be written. The
    /// blobs stored for it remain stored.
    async fn publish(
        &self,
        identity: &Identity,
        path: &RemotePath,
        hash: ContentHash,
        size: u64,
    ) -> Result<RecordId, PublishError>;

    /// Retracts the record with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] when the directory refuses or the record
    /// does not exist.
    async fn retract(&self, id: &RecordId) -> Result<(), PublishError>;
}

/// Mints the proofs that authorize blob operations.
///
/// The engine requests one upload proof per (file, endpoint) attempt,
/// immediately before that attempt, and one delete proof per purged file,
/// reused across that file's endpoints.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Authorizes one upload of `blob` to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when no proof can be minted; the endpoint
    /// attempt it would have covered fails.
    async fn authorize_upload(
        &self,
        endpoint: &Endpoint,
        blob: &BlobDescriptor,
    ) -> Result<Proof, AuthError>;

    /// Authorizes the deletion of the blob stored under `hash`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when no proof can be minted.
    async fn authorize_delete(&self, hash: ContentHash) -> Result<Proof, AuthError>;
}
