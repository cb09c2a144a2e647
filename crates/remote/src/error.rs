//! Error taxonomy for remote collaborators.
//!
//! Each type corresponds to one handling strategy upstream: endpoint
//! errors are counted per attempt, auth errors fold into the attempt they
//! authorized, publish errors are surfaced next to an otherwise finished
//! upload, and network errors abort the run.

use thiserror::Error;

use flist::RecordId;

use crate::endpoint::Endpoint;

/// Failure of a single endpoint attempt (one put or one delete).
///
/// Always recoverable: the attempt is recorded against its endpoint and
/// sibling endpoints proceed.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The endpoint answered and refused the operation.
    #[error("{endpoint} rejected the request: {reason}")]
    Rejected {
        /// The refusing endpoint.
        endpoint: Endpoint,
        /// Endpoint-supplied reason, e.g. an HTTP status line.
        reason: String,
    },

    /// The endpoint could not be reached or the exchange broke off.
    #[error("cannot reach {endpoint}: {message}")]
    Transport {
        /// The unreachable endpoint.
        endpoint: Endpoint,
        /// Description of the transport failure.
        message: String,
    },

    /// The attempt exceeded its configured deadline.
    #[error("{endpoint} did not answer in time")]
    TimedOut {
        /// The endpoint that timed out.
        endpoint: Endpoint,
    },

    /// The proof for this attempt could not be minted.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// A signing failure.
///
/// For uploads this fails the one endpoint attempt it would have
/// authorized; for purges it skips the file's endpoint deletions while
/// the retract still goes ahead.
#[derive(Debug, Error)]
#[error("authorization failed: {message}")]
pub struct AuthError {
    message: String,
}

impl AuthError {
    /// Builds an auth error from its description.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure to publish or retract a pointer record.
///
/// Never reverses a stored blob; the caller reports it next to the upload
/// outcome (or the purge tally) it belongs to.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The pointer directory refused the operation.
    #[error("pointer directory rejected the request: {reason}")]
    Rejected {
        /// Directory-supplied reason, e.g. an HTTP status line.
        reason: String,
    },

    /// The pointer directory could not be reached or answered
    /// unintelligibly.
    #[error("cannot reach pointer directory: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The record to retract does not exist.
    #[error("record {id} not found")]
    NotFound {
        /// The missing record id.
        id: RecordId,
    },
}

/// Failure to list the published records for an identity.
///
/// Fatal to a sync run: without the manifest there is nothing to diff
/// against.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The pointer directory could not be reached.
    #[error("cannot reach pointer directory: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The directory answered with a non-success status.
    #[error("listing failed: {reason}")]
    Status {
        /// Directory-supplied reason, e.g. an HTTP status line.
        reason: String,
    },

    /// The listing payload did not decode.
    #[error("malformed listing response: {message}")]
    Decode {
        /// Description of the decode failure.
        message: String,
    },
}
