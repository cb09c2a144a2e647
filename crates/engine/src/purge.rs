//! Best-effort purge of stale blobs and their pointer records.
//!
//! Purging never escalates: endpoint deletions that fail are logged and
//! counted, and every record is retracted exactly once regardless of how
//! its deletions went. The record, not the blob, is what makes a path
//! live, so the retract is the part that matters.

use std::sync::Arc;

use tracing::{debug, info, warn};

use flist::{ContentHash, FileEntry, FileList};
use remote::Proof;

use crate::context::SyncContext;
use crate::outcome::PurgeReport;

/// Tuning knobs for one purge batch.
#[derive(Clone, Copy, Debug, Default)]
pub struct PurgeOptions {
    parallel_endpoints: bool,
}

impl PurgeOptions {
    /// Creates the default options: endpoint deletions run sequentially.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            parallel_endpoints: false,
        }
    }

    /// Fans a file's endpoint deletions out concurrently instead of
    /// walking the endpoints one by one.
    #[must_use]
    pub const fn parallel_endpoints(mut self, parallel: bool) -> Self {
        self.parallel_endpoints = parallel;
        self
    }
}

/// Deletes the blobs behind `files` from every endpoint and retracts
/// their records.
///
/// Entries without a record id are skipped and counted. Per file, one
/// delete proof is minted and reused across endpoints; if it cannot be
/// minted the endpoint deletions are skipped but the retract still goes
/// ahead. Failures never abort remaining endpoints or files, and no file
/// is re-queued.
pub async fn run_purge(files: &FileList, ctx: &SyncContext, options: PurgeOptions) -> PurgeReport {
    debug!(
        target: "blobsync::purge",
        files = files.len(),
        endpoints = ctx.endpoints.len(),
        "starting purge batch"
    );
    let mut report = PurgeReport::default();
    for entry in files {
        purge_file(entry, ctx, options, &mut report).await;
    }
    info!(
        target: "blobsync::purge",
        retracted = report.retracted,
        delete_failures = report.delete_failures,
        retract_failures = report.retract_failures,
        skipped = report.skipped,
        "purge batch finished"
    );
    report
}

async fn purge_file(
    entry: &FileEntry,
    ctx: &SyncContext,
    options: PurgeOptions,
    report: &mut PurgeReport,
) {
    let Some(record) = entry.record() else {
        debug!(
            target: "blobsync::purge",
            path = %entry.remote_path(),
            "no record id, skipping"
        );
        report.skipped += 1;
        return;
    };

    // One proof per file, shared by its endpoint deletions.
    match ctx.signer.authorize_delete(entry.hash()).await {
        Ok(proof) => {
            let failures = if options.parallel_endpoints {
                delete_parallel(ctx, entry.hash(), &proof).await
            } else {
                delete_sequential(ctx, entry.hash(), &proof).await
            };
            report.delete_failures += failures;
        }
        Err(err) => {
            warn!(
                target: "blobsync::purge",
                path = %entry.remote_path(),
                error = %err,
                "delete proof unavailable, skipping endpoint deletions"
            );
            report.delete_failures += ctx.endpoints.len();
        }
    }

    match ctx.publisher.retract(record).await {
        Ok(()) => report.retracted += 1,
        Err(err) => {
            warn!(
                target: "blobsync::purge",
                path = %entry.remote_path(),
                record = %record,
                error = %err,
                "retract failed"
            );
            report.retract_failures += 1;
        }
    }
}

async fn delete_sequential(ctx: &SyncContext, hash: ContentHash, proof: &Proof) -> usize {
    let mut failures = 0;
    for endpoint in &ctx.endpoints {
        if let Err(err) = ctx.store.delete(endpoint, hash, proof).await {
            warn!(
                target: "blobsync::purge",
                endpoint = %endpoint,
                error = %err,
                "endpoint delete failed"
            );
            failures += 1;
        }
    }
    failures
}

async fn delete_parallel(ctx: &SyncContext, hash: ContentHash, proof: &Proof) -> usize {
    let mut deletions = Vec::with_capacity(ctx.endpoints.len());
    for endpoint in &ctx.endpoints {
        let store = Arc::clone(&ctx.store);
        let endpoint = endpoint.clone();
        let proof = proof.clone();
        deletions.push(tokio::spawn(async move {
            store
                .delete(&endpoint, hash, &proof)
                .await
                .map_err(|err| (endpoint, err))
        }));
    }

    let mut failures = 0;
    for deletion in deletions {
        match deletion.await {
            Ok(Ok(())) => {}
            Ok(Err((endpoint, err))) => {
                warn!(
                    target: "blobsync::purge",
                    endpoint = %endpoint,
                    error = %err,
                    "endpoint delete failed"
                );
                failures += 1;
            }
            Err(err) => {
                warn!(
                    target: "blobsync::purge",
                    error = %err,
                    "delete task did not complete"
                );
                failures += 1;
            }
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use bytes::Bytes;

    use flist::{ContentHash, FileEntry, FileList, RecordId, RemotePath, hash_bytes};
    use remote::{
        AuthError, BlobDescriptor, BlobStore, Endpoint, EndpointError, Identity, NetworkError,
        PointerRecord, Proof, PublishError, Publisher, Signer, StoredRef,
    };

    use super::{PurgeOptions, run_purge};
    use crate::context::SyncContext;

    fn endpoint(n: usize) -> Endpoint {
        Endpoint::parse(&format!("https://blob{n}.example")).unwrap()
    }

    fn doomed(path: &str, content: &str, record: Option<&str>) -> FileEntry {
        FileEntry::remote(
            RemotePath::new(path).unwrap(),
            hash_bytes(content.as_bytes()),
            content.len() as u64,
            0,
            record.map(RecordId::new),
        )
    }

    fn list(entries: Vec<FileEntry>) -> FileList {
        let mut list = FileList::new();
        for entry in entries {
            list.push(entry).unwrap();
        }
        list
    }

    /// Store double failing deletes on the configured endpoints.
    struct DeleteStore {
        deletes: AtomicUsize,
        failing: Vec<Endpoint>,
    }

    impl DeleteStore {
        fn reliable() -> Self {
            Self::failing_on(Vec::new())
        }

        fn failing_on(failing: Vec<Endpoint>) -> Self {
            Self {
                deletes: AtomicUsize::new(0),
                failing,
            }
        }
    }

    #[async_trait]
    impl BlobStore for DeleteStore {
        async fn put(
            &self,
            endpoint: &Endpoint,
            _blob: &BlobDescriptor,
            _bytes: Bytes,
            _proof: &Proof,
        ) -> Result<StoredRef, EndpointError> {
            Err(EndpointError::Rejected {
                endpoint: endpoint.clone(),
                reason: "puts unsupported here".to_owned(),
            })
        }

        async fn delete(
            &self,
            endpoint: &Endpoint,
            _hash: ContentHash,
            _proof: &Proof,
        ) -> Result<(), EndpointError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(endpoint) {
                return Err(EndpointError::Transport {
                    endpoint: endpoint.clone(),
                    message: "scripted outage".to_owned(),
                });
            }
            Ok(())
        }
    }

    /// Publisher double counting retracts, optionally refusing them.
    struct RetractPublisher {
        retracts: AtomicUsize,
        refuse: bool,
    }

    impl RetractPublisher {
        fn counting() -> Self {
            Self {
                retracts: AtomicUsize::new(0),
                refuse: false,
            }
        }

        fn refusing() -> Self {
            Self {
                retracts: AtomicUsize::new(0),
                refuse: true,
            }
        }
    }

    #[async_trait]
    impl Publisher for RetractPublisher {
        async fn list(&self, _identity: &Identity) -> Result<Vec<PointerRecord>, NetworkError> {
            Ok(Vec::new())
        }

        async fn publish(
            &self,
            _identity: &Identity,
            _path: &RemotePath,
            _hash: ContentHash,
            _size: u64,
        ) -> Result<RecordId, PublishError> {
            Err(PublishError::Rejected {
                reason: "publishes unsupported here".to_owned(),
            })
        }

        async fn retract(&self, id: &RecordId) -> Result<(), PublishError> {
            self.retracts.fetch_add(1, Ordering::SeqCst);
            if self.refuse {
                return Err(PublishError::NotFound { id: id.clone() });
            }
            Ok(())
        }
    }

    /// Signer double that can refuse delete proofs.
    struct DeleteSigner {
        delete_proofs: AtomicUsize,
        refuse: bool,
    }

    impl DeleteSigner {
        fn granting() -> Self {
            Self {
                delete_proofs: AtomicUsize::new(0),
                refuse: false,
            }
        }

        fn refusing() -> Self {
            Self {
                delete_proofs: AtomicUsize::new(0),
                refuse: true,
            }
        }
    }

    #[async_trait]
    impl Signer for DeleteSigner {
        async fn authorize_upload(
            &self,
            _endpoint: &Endpoint,
            blob: &BlobDescriptor,
        ) -> Result<Proof, AuthError> {
            Ok(Proof::new(format!("up:{}", blob.hash)))
        }

        async fn authorize_delete(&self, hash: ContentHash) -> Result<Proof, AuthError> {
            self.delete_proofs.fetch_add(1, Ordering::SeqCst);
            if self.refuse {
                return Err(AuthError::new("scripted refusal"));
            }
            Ok(Proof::new(format!("del:{hash}")))
        }
    }

    struct Doubles {
        store: Arc<DeleteStore>,
        publisher: Arc<RetractPublisher>,
        signer: Arc<DeleteSigner>,
        ctx: SyncContext,
    }

    fn doubles(
        endpoints: Vec<Endpoint>,
        store: DeleteStore,
        publisher: RetractPublisher,
        signer: DeleteSigner,
    ) -> Doubles {
        let store = Arc::new(store);
        let publisher = Arc::new(publisher);
        let signer = Arc::new(signer);
        let ctx = SyncContext {
            identity: Identity::new("test-owner"),
            endpoints,
            store: store.clone(),
            publisher: publisher.clone(),
            signer: signer.clone(),
        };
        Doubles {
            store,
            publisher,
            signer,
            ctx,
        }
    }

    #[tokio::test]
    async fn entries_without_records_are_skipped() {
        let d = doubles(
            vec![endpoint(1)],
            DeleteStore::reliable(),
            RetractPublisher::counting(),
            DeleteSigner::granting(),
        );
        let files = list(vec![doomed("/no-record.html", "x", None)]);

        let report = run_purge(&files, &d.ctx, PurgeOptions::new()).await;
        assert_eq!(report.skipped, 1);
        assert_eq!(report.retracted, 0);
        assert_eq!(d.store.deletes.load(Ordering::SeqCst), 0);
        assert_eq!(d.publisher.retracts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_deletes_do_not_stop_the_retract() {
        let bad = endpoint(1);
        let d = doubles(
            vec![bad.clone(), endpoint(2)],
            DeleteStore::failing_on(vec![bad]),
            RetractPublisher::counting(),
            DeleteSigner::granting(),
        );
        let files = list(vec![doomed("/stale.html", "stale", Some("r1"))]);

        let report = run_purge(&files, &d.ctx, PurgeOptions::new()).await;
        assert_eq!(report.retracted, 1);
        assert_eq!(report.delete_failures, 1);
        assert_eq!(report.retract_failures, 0);
        // Both endpoints were still attempted.
        assert_eq!(d.store.deletes.load(Ordering::SeqCst), 2);
        assert_eq!(d.publisher.retracts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retract_is_issued_once_even_when_every_delete_fails() {
        let bad = vec![endpoint(1), endpoint(2), endpoint(3)];
        let d = doubles(
            bad.clone(),
            DeleteStore::failing_on(bad),
            RetractPublisher::counting(),
            DeleteSigner::granting(),
        );
        let files = list(vec![doomed("/stale.html", "stale", Some("r1"))]);

        let report = run_purge(&files, &d.ctx, PurgeOptions::new()).await;
        assert_eq!(report.delete_failures, 3);
        assert_eq!(report.retracted, 1);
        assert_eq!(d.publisher.retracts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sign_failure_skips_deletions_but_still_retracts() {
        let d = doubles(
            vec![endpoint(1), endpoint(2)],
            DeleteStore::reliable(),
            RetractPublisher::counting(),
            DeleteSigner::refusing(),
        );
        let files = list(vec![doomed("/stale.html", "stale", Some("r1"))]);

        let report = run_purge(&files, &d.ctx, PurgeOptions::new()).await;
        assert_eq!(d.store.deletes.load(Ordering::SeqCst), 0);
        assert_eq!(report.delete_failures, 2);
        assert_eq!(report.retracted, 1);
        assert_eq!(d.publisher.retracts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn one_delete_proof_per_file() {
        let d = doubles(
            vec![endpoint(1), endpoint(2), endpoint(3)],
            DeleteStore::reliable(),
            RetractPublisher::counting(),
            DeleteSigner::granting(),
        );
        let files = list(vec![
            doomed("/one.html", "one", Some("r1")),
            doomed("/two.html", "two", Some("r2")),
        ]);

        let report = run_purge(&files, &d.ctx, PurgeOptions::new()).await;
        assert_eq!(report.retracted, 2);
        assert_eq!(d.signer.delete_proofs.load(Ordering::SeqCst), 2);
        assert_eq!(d.store.deletes.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn retract_failures_are_counted_not_retried() {
        let d = doubles(
            vec![endpoint(1)],
            DeleteStore::reliable(),
            RetractPublisher::refusing(),
            DeleteSigner::granting(),
        );
        let files = list(vec![
            doomed("/a.html", "a", Some("r1")),
            doomed("/b.html", "b", Some("r2")),
        ]);

        let report = run_purge(&files, &d.ctx, PurgeOptions::new()).await;
        assert_eq!(report.retracted, 0);
        assert_eq!(report.retract_failures, 2);
        assert_eq!(d.publisher.retracts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn parallel_endpoint_fanout_matches_the_sequential_tally() {
        let bad = endpoint(2);
        let d = doubles(
            vec![endpoint(1), bad.clone(), endpoint(3)],
            DeleteStore::failing_on(vec![bad]),
            RetractPublisher::counting(),
            DeleteSigner::granting(),
        );
        let files = list(vec![doomed("/stale.html", "stale", Some("r1"))]);

        let report = run_purge(
            &files,
            &d.ctx,
            PurgeOptions::new().parallel_endpoints(true),
        )
        .await;
        assert_eq!(report.retracted, 1);
        assert_eq!(report.delete_failures, 1);
        assert_eq!(d.store.deletes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn mixed_batch_tallies_every_class() {
        let d = doubles(
            vec![endpoint(1)],
            DeleteStore::reliable(),
            RetractPublisher::counting(),
            DeleteSigner::granting(),
        );
        let files = list(vec![
            doomed("/recorded.html", "recorded", Some("r1")),
            doomed("/unrecorded.html", "unrecorded", None),
        ]);

        let report = run_purge(&files, &d.ctx, PurgeOptions::new()).await;
        assert_eq!(report.retracted, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.delete_failures, 0);
        assert_eq!(report.retract_failures, 0);
    }
}
