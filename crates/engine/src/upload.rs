//! Redundant multi-endpoint upload pipeline.
//!
//! A semaphore-gated spawning loop admits files in submission order and
//! keeps at most `concurrency` file tasks in flight, regardless of batch
//! size. Each admitted file reads its payload once, fans out one child
//! task per endpoint, and joins them all before settling its outcome; the
//! joined verdicts are the only channel between tasks.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use flist::{ContentHash, FileEntry, FileList, RemotePath};
use remote::{
    BlobDescriptor, BlobStore, Endpoint, EndpointError, Identity, Publisher, Signer, mime,
};

use crate::context::SyncContext;
use crate::outcome::{FileFailure, FileOutcome, ServerStatus, UploadReport};

/// Default number of files in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Tuning knobs for one upload batch.
#[derive(Clone, Debug)]
pub struct UploadOptions {
    concurrency: usize,
    required_endpoints: usize,
    endpoint_timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadOptions {
    /// Creates the default options: [`DEFAULT_CONCURRENCY`] files in
    /// flight, one required endpoint, no attempt deadline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            required_endpoints: 1,
            endpoint_timeout: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Sets how many files may be in flight at once. Clamped to at
    /// least 1.
    #[must_use]
    pub fn concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    /// Sets how many endpoints must store a file for it to count as
    /// uploaded. Clamped to at least 1; the default of 1 keeps the
    /// at-least-one-of-N rule.
    #[must_use]
    pub fn required_endpoints(mut self, required: usize) -> Self {
        self.required_endpoints = required.max(1);
        self
    }

    /// Sets a deadline for each endpoint attempt (signing plus store).
    #[must_use]
    pub const fn endpoint_timeout(mut self, limit: Duration) -> Self {
        self.endpoint_timeout = Some(limit);
        self
    }

    /// Token observed by the admission loop for cooperative
    /// cancellation. Files not yet admitted when it fires are reported
    /// as failed; files in flight drain normally.
    #[must_use]
    pub fn cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Uploads every file in `files` to the endpoints in `ctx`.
///
/// Files are admitted in submission order and complete in any order; the
/// report lists outcomes in submission order. A file succeeds when at
/// least `required_endpoints` endpoints store its blob, after which its
/// pointer record is published; a publish failure is carried in the
/// outcome without failing the upload. Per-file failures never affect
/// sibling files, and the report is always complete.
pub async fn run_upload(files: FileList, ctx: &SyncContext, options: UploadOptions) -> UploadReport {
    let endpoints: Arc<[Endpoint]> = ctx.endpoints.clone().into();
    let semaphore = Arc::new(Semaphore::new(options.concurrency));
    debug!(
        target: "blobsync::upload",
        files = files.len(),
        endpoints = endpoints.len(),
        concurrency = options.concurrency,
        "starting upload batch"
    );

    let mut running: Vec<RunningFile> = Vec::with_capacity(files.len());
    let mut unadmitted: Vec<FileEntry> = Vec::new();
    let mut queue = files.into_iter();
    loop {
        let Some(entry) = queue.next() else { break };
        let admitted = tokio::select! {
            biased;
            () = options.cancel.cancelled() => None,
            permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
        };
        let Some(permit) = admitted else {
            unadmitted.push(entry);
            unadmitted.extend(queue);
            break;
        };

        let task = FileTask {
            entry,
            endpoints: Arc::clone(&endpoints),
            store: Arc::clone(&ctx.store),
            publisher: Arc::clone(&ctx.publisher),
            signer: Arc::clone(&ctx.signer),
            identity: ctx.identity.clone(),
            required: options.required_endpoints,
            attempt_timeout: options.endpoint_timeout,
        };
        running.push(RunningFile {
            path: task.entry.remote_path().clone(),
            hash: task.entry.hash(),
            handle: tokio::spawn(task.run(permit)),
        });
    }

    let mut report = UploadReport::default();
    for file in running {
        let outcome = match file.handle.await {
            Ok(outcome) => outcome,
            Err(err) => FileOutcome::failed_early(
                file.path,
                file.hash,
                &endpoints,
                FileFailure::TaskFailed {
                    message: err.to_string(),
                },
            ),
        };
        tally(&mut report, outcome);
    }
    for entry in unadmitted {
        warn!(
            target: "blobsync::upload",
            path = %entry.remote_path(),
            "cancelled before upload started"
        );
        tally(
            &mut report,
            FileOutcome::failed_early(
                entry.remote_path().clone(),
                entry.hash(),
                &endpoints,
                FileFailure::Cancelled,
            ),
        );
    }

    info!(
        target: "blobsync::upload",
        successful = report.successful,
        failed = report.failed,
        "upload batch finished"
    );
    report
}

fn tally(report: &mut UploadReport, outcome: FileOutcome) {
    if outcome.success {
        report.successful += 1;
    } else {
        report.failed += 1;
    }
    report.outcomes.push(outcome);
}

struct RunningFile {
    path: RemotePath,
    hash: ContentHash,
    handle: JoinHandle<FileOutcome>,
}

struct FileTask {
    entry: FileEntry,
    endpoints: Arc<[Endpoint]>,
    store: Arc<dyn BlobStore>,
    publisher: Arc<dyn Publisher>,
    signer: Arc<dyn Signer>,
    identity: Identity,
    required: usize,
    attempt_timeout: Option<Duration>,
}

impl FileTask {
    async fn run(self, _permit: OwnedSemaphorePermit) -> FileOutcome {
        let path = self.entry.remote_path().clone();
        let hash = self.entry.hash();

        let Some(local) = self.entry.local_path() else {
            return FileOutcome::failed_early(path, hash, &self.endpoints, FileFailure::NoLocalPath);
        };
        let bytes = match tokio::fs::read(local).await {
            Ok(raw) => Bytes::from(raw),
            Err(source) => {
                warn!(
                    target: "blobsync::upload",
                    path = %path,
                    error = %source,
                    "local read failed"
                );
                return FileOutcome::failed_early(
                    path,
                    hash,
                    &self.endpoints,
                    FileFailure::Read {
                        path: local.to_path_buf(),
                        source,
                    },
                );
            }
        };
        let blob = BlobDescriptor {
            hash,
            size: bytes.len() as u64,
            mime: mime::guess_mime(local).to_owned(),
        };

        let mut statuses: Vec<(Endpoint, ServerStatus)> = self
            .endpoints
            .iter()
            .map(|endpoint| (endpoint.clone(), ServerStatus::Pending))
            .collect();

        let mut attempts = Vec::with_capacity(self.endpoints.len());
        for endpoint in self.endpoints.iter() {
            let store = Arc::clone(&self.store);
            let signer = Arc::clone(&self.signer);
            let endpoint = endpoint.clone();
            let blob = blob.clone();
            let payload = bytes.clone();
            let limit = self.attempt_timeout;
            attempts.push(tokio::spawn(async move {
                attempt_upload(store.as_ref(), signer.as_ref(), &endpoint, &blob, payload, limit)
                    .await
            }));
        }

        let mut stored = 0usize;
        for (index, attempt) in attempts.into_iter().enumerate() {
            let verdict = match attempt.await {
                Ok(verdict) => verdict,
                Err(err) => Err(EndpointError::Transport {
                    endpoint: statuses[index].0.clone(),
                    message: format!("endpoint task did not complete: {err}"),
                }),
            };
            match verdict {
                Ok(()) => {
                    stored += 1;
                    statuses[index].1 = ServerStatus::Stored;
                }
                Err(err) => {
                    warn!(
                        target: "blobsync::upload",
                        path = %path,
                        endpoint = %statuses[index].0,
                        error = %err,
                        "endpoint attempt failed"
                    );
                    statuses[index].1 = ServerStatus::Failed(err);
                }
            }
        }

        let attempted = statuses.len();
        let success = stored >= self.required;
        let mut outcome = FileOutcome {
            path,
            hash,
            stored,
            attempted,
            statuses,
            success,
            failure: None,
            publish: None,
        };
        if success {
            match self
                .publisher
                .publish(&self.identity, &outcome.path, hash, blob.size)
                .await
            {
                Ok(id) => {
                    debug!(
                        target: "blobsync::upload",
                        path = %outcome.path,
                        record = %id,
                        stored,
                        "published"
                    );
                    outcome.publish = Some(Ok(id));
                }
                Err(err) => {
                    warn!(
                        target: "blobsync::upload",
                        path = %outcome.path,
                        error = %err,
                        "record publish failed, blobs remain stored"
                    );
                    outcome.publish = Some(Err(err));
                }
            }
        } else {
            outcome.failure = Some(FileFailure::TooFewStored {
                stored,
                attempted,
                required: self.required,
            });
        }
        outcome
    }
}

/// One endpoint attempt: mint the proof, then store.
///
/// The proof is requested here, immediately before the attempt it
/// authorizes, never ahead of time; a signing failure fails this attempt
/// only. The optional deadline covers signing and storing together.
async fn attempt_upload(
    store: &dyn BlobStore,
    signer: &dyn Signer,
    endpoint: &Endpoint,
    blob: &BlobDescriptor,
    payload: Bytes,
    limit: Option<Duration>,
) -> Result<(), EndpointError> {
    match limit {
        Some(limit) => {
            match tokio::time::timeout(limit, sign_and_put(store, signer, endpoint, blob, payload))
                .await
            {
                Ok(verdict) => verdict,
                Err(_elapsed) => Err(EndpointError::TimedOut {
                    endpoint: endpoint.clone(),
                }),
            }
        }
        None => sign_and_put(store, signer, endpoint, blob, payload).await,
    }
}

async fn sign_and_put(
    store: &dyn BlobStore,
    signer: &dyn Signer,
    endpoint: &Endpoint,
    blob: &BlobDescriptor,
    payload: Bytes,
) -> Result<(), EndpointError> {
    let proof = signer.authorize_upload(endpoint, blob).await?;
    store.put(endpoint, blob, payload, &proof).await?;
    Ok(())
}
