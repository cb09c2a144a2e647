use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use flist::ContentHash;

use crate::blob::{BlobDescriptor, Proof};
use crate::endpoint::Endpoint;
use crate::error::AuthError;
use crate::traits::Signer;

type HmacSha256 = Hmac<Sha256>;

/// Reference [`Signer`] producing HMAC-SHA-256 proofs.
///
/// Each proof is the hex MAC of a canonical authorization line, keyed by
/// a caller-supplied secret: `upload {hash} {size} {mime} {endpoint}` for
/// uploads, `delete {hash}` for deletions. An endpoint sharing the secret
/// can re-derive the line and verify the proof.
pub struct HmacSigner {
    secret: Vec<u8>,
}

impl HmacSigner {
    /// Creates a signer keyed by `secret`.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn sign(&self, line: &str) -> Result<Proof, AuthError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| AuthError::new("signing secret rejected"))?;
        mac.update(line.as_bytes());
        Ok(Proof::new(hex::encode(mac.finalize().into_bytes())))
    }
}

#[async_trait]
impl Signer for HmacSigner {
    async fn authorize_upload(
        &self,
        endpoint: &Endpoint,
        blob: &BlobDescriptor,
    ) -> Result<Proof, AuthError> {
        self.sign(&format!(
            "upload {} {} {} {}",
            blob.hash, blob.size, blob.mime, endpoint
        ))
    }

    async fn authorize_delete(&self, hash: ContentHash) -> Result<Proof, AuthError> {
        self.sign(&format!("delete {hash}"))
    }
}
