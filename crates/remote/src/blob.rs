use serde::{Deserialize, Serialize};

use flist::ContentHash;

/// What a [`Signer`](crate::Signer) sees when authorizing an upload.
///
/// One descriptor is built per file and shared by every endpoint attempt
/// for that file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobDescriptor {
    /// Content hash of the blob.
    pub hash: ContentHash,
    /// Size in bytes.
    pub size: u64,
    /// MIME type sent alongside the payload.
    pub mime: String,
}

/// An endpoint's acknowledgment of a stored blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRef {
    /// Content hash the endpoint stored the blob under.
    pub hash: ContentHash,
    /// Size the endpoint recorded.
    pub size: u64,
}

/// Opaque authorization token minted by a [`Signer`](crate::Signer).
///
/// A proof authorizes exactly one upload attempt, or the endpoint
/// deletions of one purged file. It is carried verbatim to the endpoint;
/// nothing here inspects it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proof(String);

impl Proof {
    /// Wraps a token produced by a signer.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
