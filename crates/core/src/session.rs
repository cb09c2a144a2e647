//! The per-run collaborator bundle.

use std::sync::Arc;

use engine::SyncContext;
use remote::{BlobStore, Endpoint, Identity, Publisher, Signer};

/// Everything a sync run needs to talk to the outside world.
///
/// Constructed once at startup from configuration and passed by
/// reference; read-only for the duration of a run. Collaborators are
/// trait objects so runs against HTTP services and runs against
/// in-memory doubles go through identical code.
#[derive(Clone)]
pub struct Session {
    context: SyncContext,
}

impl Session {
    /// Bundles an identity, the endpoint set, and the collaborators.
    #[must_use]
    pub fn new(
        identity: Identity,
        endpoints: Vec<Endpoint>,
        store: Arc<dyn BlobStore>,
        publisher: Arc<dyn Publisher>,
        signer: Arc<dyn Signer>,
    ) -> Self {
        Self {
            context: SyncContext {
                identity,
                endpoints,
                store,
                publisher,
                signer,
            },
        }
    }

    /// Identity records are published under.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.context.identity
    }

    /// Blob-store endpoints uploads and deletions fan out to.
    #[must_use]
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.context.endpoints
    }

    /// Pointer-directory collaborator.
    #[must_use]
    pub fn publisher(&self) -> &dyn Publisher {
        self.context.publisher.as_ref()
    }

    /// The batch-pipeline view of this session.
    #[must_use]
    pub const fn context(&self) -> &SyncContext {
        &self.context
    }
}
