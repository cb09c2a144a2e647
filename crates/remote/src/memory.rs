//! In-memory collaborator implementations.
//!
//! Primarily for tests and offline runs. Proofs are accepted unchecked;
//! the stores only enforce what any content-addressed backend would.

use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use rustc_hash::FxHashMap;

use flist::{ContentHash, RecordId, RemotePath, hash_bytes};

use crate::blob::{BlobDescriptor, Proof, StoredRef};
use crate::endpoint::Endpoint;
use crate::error::{EndpointError, NetworkError, PublishError};
use crate::identity::Identity;
use crate::record::PointerRecord;
use crate::traits::{BlobStore, Publisher};

/// An in-memory [`BlobStore`] keeping one blob map per endpoint.
///
/// Uploads are verified against their descriptor: bytes that do not hash
/// to the announced [`ContentHash`] are rejected, as any content-addressed
/// backend would.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<FxHashMap<Endpoint, FxHashMap<ContentHash, Bytes>>>,
}

impl MemoryBlobStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `endpoint` currently holds a blob under `hash`.
    #[must_use]
    pub fn contains(&self, endpoint: &Endpoint, hash: ContentHash) -> bool {
        let blobs = self.blobs.read().unwrap_or_else(PoisonError::into_inner);
        blobs
            .get(endpoint)
            .is_some_and(|held| held.contains_key(&hash))
    }

    /// Number of blobs currently held by `endpoint`.
    #[must_use]
    pub fn blob_count(&self, endpoint: &Endpoint) -> usize {
        let blobs = self.blobs.read().unwrap_or_else(PoisonError::into_inner);
        blobs.get(endpoint).map_or(0, FxHashMap::len)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        endpoint: &Endpoint,
        blob: &BlobDescriptor,
        bytes: Bytes,
        _proof: &Proof,
    ) -> Result<StoredRef, EndpointError> {
        if hash_bytes(&bytes) != blob.hash {
            return Err(EndpointError::Rejected {
                endpoint: endpoint.clone(),
                reason: "content does not match its announced hash".to_owned(),
            });
        }
        let mut blobs = self.blobs.write().unwrap_or_else(PoisonError::into_inner);
        blobs
            .entry(endpoint.clone())
            .or_default()
            .insert(blob.hash, bytes);
        Ok(StoredRef {
            hash: blob.hash,
            size: blob.size,
        })
    }

    async fn delete(
        &self,
        endpoint: &Endpoint,
        hash: ContentHash,
        _proof: &Proof,
    ) -> Result<(), EndpointError> {
        let mut blobs = self.blobs.write().unwrap_or_else(PoisonError::into_inner);
        let removed = blobs
            .get_mut(endpoint)
            .and_then(|held| held.remove(&hash))
            .is_some();
        if removed {
            Ok(())
        } else {
            Err(EndpointError::Rejected {
                endpoint: endpoint.clone(),
                reason: "no such blob".to_owned(),
            })
        }
    }
}

/// An in-memory [`Publisher`].
///
/// Publishing a path that already has a live record under the same
/// identity replaces that record; the last writer wins.
#[derive(Default)]
pub struct MemoryPublisher {
    records: RwLock<Vec<(Identity, PointerRecord)>>,
    next_id: AtomicU64,
}

impl MemoryPublisher {
    /// Creates an empty publisher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of live records across all identities.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(0))
}

#[async_trait]
impl Publisher for MemoryPublisher {
    async fn list(&self, identity: &Identity) -> Result<Vec<PointerRecord>, NetworkError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records
            .iter()
            .filter(|(owner, _)| owner == identity)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn publish(
        &self,
        identity: &Identity,
        path: &RemotePath,
        hash: ContentHash,
        size: u64,
    ) -> Result<RecordId, PublishError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.retain(|(owner, record)| owner != identity || record.path != *path);

        let id = RecordId::new(format!("r{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1));
        records.push((
            identity.clone(),
            PointerRecord {
                id: id.clone(),
                path: path.clone(),
                hash,
                size,
                published_at: unix_now(),
            },
        ));
        Ok(id)
    }

    async fn retract(&self, id: &RecordId) -> Result<(), PublishError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let before = records.len();
        records.retain(|(_, record)| record.id != *id);
        if records.len() == before {
            return Err(PublishError::NotFound { id: id.clone() });
        }
        Ok(())
    }
}
