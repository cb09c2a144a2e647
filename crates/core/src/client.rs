//! The sync driver: scan, list, diff, then the batch pipelines.

use std::path::Path;
use std::time::Duration;

use rustc_hash::FxHashMap;
use tracing::{error, info};

use engine::{
    DEFAULT_CONCURRENCY, DiffResult, PurgeOptions, PurgeReport, UploadOptions, UploadReport, diff,
    run_purge, run_upload,
};
use flist::{FileEntry, FileList, RemotePath, scan_local};
use remote::{Identity, NetworkError, PointerRecord, Publisher};

use crate::error::ClientError;
use crate::exit_code::ExitCode;
use crate::session::Session;

/// Tuning for one [`run_sync`] invocation.
#[derive(Clone, Debug)]
pub struct SyncOptions {
    /// Files in flight at once during upload.
    pub concurrency: usize,
    /// Endpoints that must store a file for it to count as uploaded.
    pub required_endpoints: usize,
    /// Deadline for each endpoint attempt.
    pub endpoint_timeout: Option<Duration>,
    /// Purge published paths with no local counterpart.
    pub delete: bool,
    /// Classify only; perform no uploads, publishes, or deletions.
    pub dry_run: bool,
    /// Fan each purged file's endpoint deletions out concurrently.
    pub parallel_purge: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            required_endpoints: 1,
            endpoint_timeout: None,
            delete: false,
            dry_run: false,
            parallel_purge: false,
        }
    }
}

/// What one sync run found and did.
#[derive(Debug)]
pub struct SyncSummary {
    /// Files found under the scan root.
    pub scanned: usize,
    /// Files classified as needing upload.
    pub to_transfer: usize,
    /// Files already published with identical content.
    pub unchanged: usize,
    /// Published paths with no local counterpart.
    pub to_delete: usize,
    /// Upload batch report; `None` on dry runs.
    pub upload: Option<UploadReport>,
    /// Purge batch report; `None` unless deletion was requested and ran.
    pub purge: Option<PurgeReport>,
}

impl SyncSummary {
    /// The exit code this run should end with.
    ///
    /// Partial when any upload failed or any stale record could not be
    /// retracted. Endpoint delete failures alone stay [`ExitCode::Ok`]:
    /// the record is what makes a path live, and an unreferenced blob
    /// left behind is deliberately tolerated.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        let upload_failed = self
            .upload
            .as_ref()
            .is_some_and(|report| !report.all_succeeded());
        let retract_failed = self
            .purge
            .as_ref()
            .is_some_and(|report| report.retract_failures > 0);
        if upload_failed || retract_failed {
            ExitCode::Partial
        } else {
            ExitCode::Ok
        }
    }
}

/// Builds the remote [`FileList`] from the owner's published records.
///
/// When several live records share a path the newest `published_at`
/// wins; the result is ordered by path for stable display.
pub async fn list_remote(
    publisher: &dyn Publisher,
    identity: &Identity,
) -> Result<FileList, NetworkError> {
    let records = publisher.list(identity).await?;
    let mut newest: FxHashMap<RemotePath, PointerRecord> = FxHashMap::default();
    for record in records {
        match newest.get(&record.path) {
            Some(current) if current.published_at >= record.published_at => {}
            _ => {
                newest.insert(record.path.clone(), record);
            }
        }
    }

    let mut records: Vec<PointerRecord> = newest.into_values().collect();
    records.sort_by(|a, b| a.path.cmp(&b.path));

    let mut list = FileList::with_capacity(records.len());
    for record in records {
        let entry = FileEntry::remote(
            record.path,
            record.hash,
            record.size,
            record.published_at,
            Some(record.id),
        );
        // Paths are unique after the newest-record fold, so insertion
        // cannot fail; log rather than unwind if it ever does.
        if let Err(err) = list.push(entry) {
            error!(target: "blobsync::sync", %err, "dropped conflicting record");
        }
    }
    Ok(list)
}

/// Runs one full sync against the session's collaborators.
///
/// Scans `root` on the blocking pool, lists the published records,
/// diffs, then runs the upload batch and, when `options.delete` is set,
/// the purge batch. Only scanning and listing can abort the run; once
/// the batches start a summary is always produced. A dry run stops
/// after the diff.
pub async fn run_sync(
    session: &Session,
    root: &Path,
    options: &SyncOptions,
) -> Result<SyncSummary, ClientError> {
    let scan_root = root.to_owned();
    let local = tokio::task::spawn_blocking(move || scan_local(&scan_root))
        .await
        .map_err(|err| ClientError::ScanTask {
            message: err.to_string(),
        })??;
    info!(
        target: "blobsync::sync",
        root = %root.display(),
        files = local.len(),
        endpoints = session.endpoints().len(),
        "scanned local tree"
    );

    let remote = list_remote(session.publisher(), session.identity()).await?;
    info!(
        target: "blobsync::sync",
        records = remote.len(),
        "listed published records"
    );

    let DiffResult {
        to_transfer,
        unchanged,
        to_delete,
    } = diff(&local, &remote);
    let mut summary = SyncSummary {
        scanned: local.len(),
        to_transfer: to_transfer.len(),
        unchanged: unchanged.len(),
        to_delete: to_delete.len(),
        upload: None,
        purge: None,
    };
    info!(
        target: "blobsync::sync",
        to_transfer = summary.to_transfer,
        unchanged = summary.unchanged,
        to_delete = summary.to_delete,
        dry_run = options.dry_run,
        "classified tree"
    );
    if options.dry_run {
        return Ok(summary);
    }

    let mut upload_options = UploadOptions::new()
        .concurrency(options.concurrency)
        .required_endpoints(options.required_endpoints);
    if let Some(limit) = options.endpoint_timeout {
        upload_options = upload_options.endpoint_timeout(limit);
    }
    summary.upload = Some(run_upload(to_transfer, session.context(), upload_options).await);

    if options.delete {
        let purge_options = PurgeOptions::new().parallel_endpoints(options.parallel_purge);
        summary.purge = Some(run_purge(&to_delete, session.context(), purge_options).await);
    }

    Ok(summary)
}
