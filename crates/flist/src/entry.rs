use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::hash::ContentHash;
use crate::remote_path::RemotePath;

/// Opaque identifier of a published pointer record.
///
/// Assigned by the pointer directory when a record is published; carried on
/// remote file entries so purges can retract the right record. Never
/// interpreted locally.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Wraps a record identifier as issued by the pointer directory.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({:?})", self.0)
    }
}

/// One file known either locally (scanned from disk) or remotely (listed
/// from the pointer directory).
///
/// `size` and `changed_at` are informational; the differ compares entries
/// by [`ContentHash`] alone. Entries are built fresh on every run and never
/// cached across invocations.
#[derive(Clone, Debug)]
pub struct FileEntry {
    local_path: Option<PathBuf>,
    remote_path: RemotePath,
    hash: ContentHash,
    size: u64,
    changed_at: i64,
    record: Option<RecordId>,
}

impl FileEntry {
    /// Creates an entry for a file found on disk.
    #[must_use]
    pub fn local(
        local_path: PathBuf,
        remote_path: RemotePath,
        hash: ContentHash,
        size: u64,
        changed_at: i64,
    ) -> Self {
        Self {
            local_path: Some(local_path),
            remote_path,
            hash,
            size,
            changed_at,
            record: None,
        }
    }

    /// Creates an entry for a published pointer record.
    #[must_use]
    pub fn remote(
        remote_path: RemotePath,
        hash: ContentHash,
        size: u64,
        changed_at: i64,
        record: Option<RecordId>,
    ) -> Self {
        Self {
            local_path: None,
            remote_path,
            hash,
            size,
            changed_at,
            record,
        }
    }

    /// Returns the entry with its backing pointer record attached.
    ///
    /// Used when a local entry is correlated with the remote record
    /// already published for its path.
    #[must_use]
    pub fn with_record(mut self, record: RecordId) -> Self {
        self.record = Some(record);
        self
    }

    /// Filesystem path the entry was scanned from; `None` for remote entries.
    #[must_use]
    pub fn local_path(&self) -> Option<&Path> {
        self.local_path.as_deref()
    }

    /// Logical publication path, the entry's key within its list.
    #[must_use]
    pub fn remote_path(&self) -> &RemotePath {
        &self.remote_path
    }

    /// Content hash of the file's bytes.
    #[must_use]
    pub fn hash(&self) -> ContentHash {
        self.hash
    }

    /// File size in bytes, informational only.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Unix timestamp of the last observed modification, informational only.
    #[must_use]
    pub fn changed_at(&self) -> i64 {
        self.changed_at
    }

    /// Pointer record backing a remote entry; `None` for local entries and
    /// for remote entries whose record is unknown.
    #[must_use]
    pub fn record(&self) -> Option<&RecordId> {
        self.record.as_ref()
    }
}
