//! Outcome and report types for the upload and purge pipelines.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use flist::{ContentHash, RecordId, RemotePath};
use remote::{Endpoint, EndpointError, PublishError};

/// Per-endpoint state of one file's upload.
///
/// Created `Pending` for every endpoint when the file's task starts and
/// resolved as the endpoint attempts come back. The map lives and dies
/// with the file task; it is never shared across files.
#[derive(Debug)]
pub enum ServerStatus {
    /// The attempt has not resolved.
    Pending,
    /// The endpoint acknowledged the blob.
    Stored,
    /// The attempt failed.
    Failed(EndpointError),
}

impl ServerStatus {
    /// Whether this endpoint ended up holding the blob.
    #[must_use]
    pub const fn is_stored(&self) -> bool {
        matches!(self, Self::Stored)
    }
}

/// Why a file failed without a successful upload.
#[derive(Debug, Error)]
pub enum FileFailure {
    /// The local payload could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// The unreadable local path.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The entry has no local payload to upload.
    #[error("no local payload to upload")]
    NoLocalPath,

    /// The batch was cancelled before this file was admitted.
    #[error("cancelled before upload started")]
    Cancelled,

    /// Too few endpoints accepted the blob.
    #[error("only {stored} of {attempted} endpoints stored the blob, {required} required")]
    TooFewStored {
        /// Endpoints that acknowledged the blob.
        stored: usize,
        /// Endpoints attempted.
        attempted: usize,
        /// Minimum acknowledgments for success.
        required: usize,
    },

    /// The file's task was aborted or panicked.
    #[error("upload task did not complete: {message}")]
    TaskFailed {
        /// Description of the join failure.
        message: String,
    },
}

/// Final result of one file's upload.
#[derive(Debug)]
pub struct FileOutcome {
    /// The file's publication path.
    pub path: RemotePath,
    /// Content hash that was uploaded.
    pub hash: ContentHash,
    /// Endpoints that acknowledged the blob.
    pub stored: usize,
    /// Endpoints the file was attempted against.
    pub attempted: usize,
    /// Final per-endpoint statuses, in endpoint-list order. Entries stay
    /// [`ServerStatus::Pending`] when the file failed before any attempt.
    pub statuses: Vec<(Endpoint, ServerStatus)>,
    /// Whether enough endpoints stored the blob.
    pub success: bool,
    /// Cause of failure when `success` is false.
    pub failure: Option<FileFailure>,
    /// Result of publishing the pointer record. `None` when the upload
    /// failed and no publish was attempted; a publish error here does not
    /// retract the stored blobs.
    pub publish: Option<Result<RecordId, PublishError>>,
}

impl FileOutcome {
    /// Builds the outcome of a file that failed before any endpoint
    /// attempt resolved.
    #[must_use]
    pub(crate) fn failed_early(
        path: RemotePath,
        hash: ContentHash,
        endpoints: &[Endpoint],
        failure: FileFailure,
    ) -> Self {
        Self {
            path,
            hash,
            stored: 0,
            attempted: endpoints.len(),
            statuses: endpoints
                .iter()
                .map(|endpoint| (endpoint.clone(), ServerStatus::Pending))
                .collect(),
            success: false,
            failure: Some(failure),
            publish: None,
        }
    }
}

/// Complete tally of one upload batch.
///
/// Always returned in full: failed files are reported here, never raised
/// as errors that would hide their siblings' results.
#[derive(Debug, Default)]
pub struct UploadReport {
    /// Files that reached the required endpoint count.
    pub successful: usize,
    /// Files that did not.
    pub failed: usize,
    /// Per-file outcomes in submission order.
    pub outcomes: Vec<FileOutcome>,
}

impl UploadReport {
    /// Whether every file in the batch succeeded.
    #[must_use]
    pub const fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Tally of one purge batch.
///
/// Purging is best-effort throughout; the report observes, it never
/// drives retries. Endpoint deletions skipped because the file's delete
/// proof could not be minted are counted as `delete_failures`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PurgeReport {
    /// Records retracted from the pointer directory.
    pub retracted: usize,
    /// Endpoint deletions that failed or were never attempted.
    pub delete_failures: usize,
    /// Retracts the pointer directory refused.
    pub retract_failures: usize,
    /// Entries skipped because they carry no record id.
    pub skipped: usize,
}
