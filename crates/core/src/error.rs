//! Failures that abort a sync run before its batches complete.

use std::path::PathBuf;

use thiserror::Error;

use flist::ScanError;
use remote::NetworkError;

use crate::exit_code::ExitCode;

/// Error aborting a sync run.
///
/// Batch-level failures (individual uploads, deletions, retractions)
/// never surface here; they are carried in the run's reports. A
/// `ClientError` means the run could not produce reports at all.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The project configuration file could not be read.
    #[error("cannot read project config {}: {source}", path.display())]
    ConfigRead {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying read failure.
        #[source]
        source: std::io::Error,
    },

    /// The project configuration file is not valid.
    #[error("invalid project config {}: {reason}", path.display())]
    ConfigInvalid {
        /// Path of the configuration file.
        path: PathBuf,
        /// What made the file unusable.
        reason: String,
    },

    /// The local scan root could not be enumerated.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The scan task ended without producing a file list.
    #[error("scan did not complete: {message}")]
    ScanTask {
        /// Join failure detail.
        message: String,
    },

    /// The pointer-directory listing failed, leaving nothing to diff
    /// against.
    #[error("cannot list published records: {0}")]
    List(#[from] NetworkError),
}

impl ClientError {
    /// The exit code a run aborted by this error should end with.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::ConfigRead { .. } | Self::ConfigInvalid { .. } => ExitCode::Usage,
            Self::Scan(_) | Self::ScanTask { .. } => ExitCode::SourceSelect,
            Self::List(_) => ExitCode::Network,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_failures_map_to_usage() {
        let err = ClientError::ConfigInvalid {
            path: PathBuf::from("blobsync.json"),
            reason: "endpoints must name at least one blob store".to_owned(),
        };
        assert_eq!(err.exit_code(), ExitCode::Usage);
    }

    #[test]
    fn listing_failures_map_to_network() {
        let err = ClientError::List(NetworkError::Transport {
            message: "connection refused".to_owned(),
        });
        assert_eq!(err.exit_code(), ExitCode::Network);
    }

    #[test]
    fn scan_failures_map_to_source_select() {
        let err = ClientError::ScanTask {
            message: "task cancelled".to_owned(),
        };
        assert_eq!(err.exit_code(), ExitCode::SourceSelect);
    }
}
