use serde::{Deserialize, Serialize};

use flist::{ContentHash, RecordId, RemotePath};

/// One live pointer as listed by a [`Publisher`](crate::Publisher).
///
/// A record maps a remote path to the content hash published for it,
/// together with the directory-assigned id used to retract it later.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerRecord {
    /// Directory-assigned record identifier.
    pub id: RecordId,
    /// Published remote path.
    pub path: RemotePath,
    /// Content hash the path points at.
    pub hash: ContentHash,
    /// Size of the published blob in bytes.
    pub size: u64,
    /// Publication time as seconds since the Unix epoch.
    pub published_at: i64,
}
