use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Read buffer size for streaming file hashing.
const HASH_BUF_SIZE: usize = 64 * 1024;

/// Content-addressed identifier of a blob: the SHA-256 digest of its bytes.
///
/// The digest is the canonical name of the content in blob storage and the
/// only value the differ compares. Renders as 64 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Digest length in bytes.
    pub const LEN: usize = 32;

    /// Wraps a raw 32-byte digest.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Renders the digest as lowercase hex.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.to_hex()
    }
}

impl TryFrom<String> for ContentHash {
    type Error = ParseHashError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for ContentHash {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = hex::decode(s).map_err(|_| ParseHashError::new(s))?;
        let bytes: [u8; Self::LEN] = raw.try_into().map_err(|_| ParseHashError::new(s))?;
        Ok(Self::from_bytes(bytes))
    }
}

/// Error returned when a string is not a valid SHA-256 hex digest.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid content hash {input:?}: expected 64 lowercase hex characters")]
pub struct ParseHashError {
    input: String,
}

impl ParseHashError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_owned(),
        }
    }
}

/// Hashes an in-memory byte slice.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    ContentHash(hasher.finalize().into())
}

/// Hashes everything readable from `reader`, streaming through a fixed
/// buffer so arbitrarily large inputs never load fully into memory.
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<ContentHash> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_BUF_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(ContentHash(hasher.finalize().into()))
}

/// Hashes the contents of the file at `path`.
pub fn hash_file(path: &Path) -> io::Result<ContentHash> {
    hash_reader(File::open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    // SHA-256 of the empty input.
    const EMPTY_HEX: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn empty_input_matches_known_digest() {
        assert_eq!(hash_bytes(b"").to_hex(), EMPTY_HEX);
    }

    #[test]
    fn display_round_trips_through_from_str() {
        let hash = hash_bytes(b"blobsync");
        let parsed: ContentHash = hash.to_string().parse().unwrap();
        assert_eq!(parsed, hash);
    }

    #[test]
    fn reader_and_bytes_agree() {
        let data = b"some file content".repeat(5000);
        let from_bytes = hash_bytes(&data);
        let from_reader = hash_reader(&data[..]).unwrap();
        assert_eq!(from_bytes, from_reader);
    }

    #[test]
    fn hash_file_streams_contents() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("payload.bin");
        std::fs::write(&path, b"payload").unwrap();
        assert_eq!(hash_file(&path).unwrap(), hash_bytes(b"payload"));
    }

    #[test]
    fn hash_file_missing_is_io_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = hash_file(&temp.path().join("absent")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn rejects_short_and_non_hex_input() {
        assert!("abcd".parse::<ContentHash>().is_err());
        assert!("zz".repeat(32).parse::<ContentHash>().is_err());
    }

    #[test]
    fn serde_uses_hex_string() {
        let hash = hash_bytes(b"x");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{hash}\""));
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }

    #[test]
    fn debug_includes_full_hex() {
        let hash = hash_bytes(b"");
        assert_eq!(format!("{hash:?}"), format!("ContentHash({EMPTY_HEX})"));
    }

    #[test]
    fn raw_bytes_match_the_hex_rendering() {
        let hash = hash_bytes(b"");
        assert_eq!(hex::encode(hash.as_bytes()), EMPTY_HEX);
    }
}
