//! HTTP implementations of the collaborator traits.
//!
//! The wire protocol is a deliberately minimal reference protocol; the
//! traits are the contract, and other transports can be slotted in
//! without touching the engine.
//!
//! Blob stores: `PUT {endpoint}/{hash}` with the blob bytes as body,
//! `Content-Type` from the descriptor, and the proof as a bearer token;
//! `DELETE {endpoint}/{hash}` likewise. Pointer directories:
//! `GET {base}/records/{identity}` returning a JSON record array,
//! `PUT {base}/records` with a JSON record body returning `{ "id": .. }`,
//! and `DELETE {base}/records/{id}`.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use flist::{ContentHash, RecordId, RemotePath};

use crate::blob::{BlobDescriptor, Proof, StoredRef};
use crate::endpoint::Endpoint;
use crate::error::{EndpointError, NetworkError, PublishError};
use crate::identity::Identity;
use crate::record::PointerRecord;
use crate::traits::{BlobStore, Publisher};

/// [`BlobStore`] speaking the reference HTTP protocol.
///
/// One instance serves every endpoint; the endpoint to address is passed
/// per call. The endpoint's acknowledgment body is ignored, the
/// descriptor is authoritative for the returned [`StoredRef`].
pub struct HttpBlobStore {
    client: Client,
}

impl HttpBlobStore {
    /// Creates a store with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Creates a store reusing an existing client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

fn blob_url(endpoint: &Endpoint, hash: ContentHash) -> String {
    format!("{}/{hash}", endpoint.as_str().trim_end_matches('/'))
}

fn transport(endpoint: &Endpoint, err: &reqwest::Error) -> EndpointError {
    EndpointError::Transport {
        endpoint: endpoint.clone(),
        message: err.to_string(),
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(
        &self,
        endpoint: &Endpoint,
        blob: &BlobDescriptor,
        bytes: Bytes,
        proof: &Proof,
    ) -> Result<StoredRef, EndpointError> {
        let url = blob_url(endpoint, blob.hash);
        debug!(target: "blobsync::upload", %url, size = blob.size, "storing blob");
        let response = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, &blob.mime)
            .header(AUTHORIZATION, format!("Bearer {}", proof.as_str()))
            .body(bytes)
            .send()
            .await
            .map_err(|err| transport(endpoint, &err))?;

        let status = response.status();
        if status.is_success() {
            Ok(StoredRef {
                hash: blob.hash,
                size: blob.size,
            })
        } else {
            Err(EndpointError::Rejected {
                endpoint: endpoint.clone(),
                reason: format!("HTTP {status}"),
            })
        }
    }

    async fn delete(
        &self,
        endpoint: &Endpoint,
        hash: ContentHash,
        proof: &Proof,
    ) -> Result<(), EndpointError> {
        let url = blob_url(endpoint, hash);
        debug!(target: "blobsync::purge", %url, "deleting blob");
        let response = self
            .client
            .delete(&url)
            .header(AUTHORIZATION, format!("Bearer {}", proof.as_str()))
            .send()
            .await
            .map_err(|err| transport(endpoint, &err))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(EndpointError::Rejected {
                endpoint: endpoint.clone(),
                reason: format!("HTTP {status}"),
            })
        }
    }
}

/// [`Publisher`] speaking the reference HTTP protocol against one pointer
/// directory.
pub struct HttpPublisher {
    client: Client,
    base: Url,
}

#[derive(Serialize)]
struct PublishRequest<'a> {
    identity: &'a Identity,
    path: &'a RemotePath,
    hash: ContentHash,
    size: u64,
}

#[derive(Deserialize)]
struct PublishResponse {
    id: RecordId,
}

impl HttpPublisher {
    /// Creates a publisher for the directory at `base`.
    #[must_use]
    pub fn new(base: Url) -> Self {
        Self {
            client: Client::new(),
            base,
        }
    }

    /// Creates a publisher reusing an existing client.
    #[must_use]
    pub const fn with_client(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    fn records_url(&self) -> String {
        format!("{}/records", self.base.as_str().trim_end_matches('/'))
    }

    fn listing_url(&self, identity: &Identity) -> String {
        format!("{}/{identity}", self.records_url())
    }

    fn record_url(&self, id: &RecordId) -> String {
        format!("{}/{id}", self.records_url())
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    async fn list(&self, identity: &Identity) -> Result<Vec<PointerRecord>, NetworkError> {
        let url = self.listing_url(identity);
        debug!(target: "blobsync::sync", %url, "listing records");
        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|err| NetworkError::Transport {
                    message: err.to_string(),
                })?;

        match response.status() {
            StatusCode::OK => response
                .json::<Vec<PointerRecord>>()
                .await
                .map_err(|err| NetworkError::Decode {
                    message: err.to_string(),
                }),
            // An identity that never published anything has no listing.
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            status => Err(NetworkError::Status {
                reason: format!("HTTP {status}"),
            }),
        }
    }

    async fn publish(
        &self,
        identity: &Identity,
        path: &RemotePath,
        hash: ContentHash,
        size: u64,
    ) -> Result<RecordId, PublishError> {
        let request = PublishRequest {
            identity,
            path,
            hash,
            size,
        };
        let response = self
            .client
            .put(self.records_url())
            .json(&request)
            .send()
            .await
            .map_err(|err| PublishError::Transport {
                message: err.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            let body: PublishResponse =
                response
                    .json()
                    .await
                    .map_err(|err| PublishError::Transport {
                        message: format!("malformed publish response: {err}"),
                    })?;
            Ok(body.id)
        } else {
            Err(PublishError::Rejected {
                reason: format!("HTTP {status}"),
            })
        }
    }

    async fn retract(&self, id: &RecordId) -> Result<(), PublishError> {
        let response = self
            .client
            .delete(self.record_url(id))
            .send()
            .await
            .map_err(|err| PublishError::Transport {
                message: err.to_string(),
            })?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(PublishError::NotFound { id: id.clone() }),
            status => Err(PublishError::Rejected {
                reason: format!("HTTP {status}"),
            }),
        }
    }
}
