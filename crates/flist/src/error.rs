use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::list::DuplicatePathError;
use crate::remote_path::RemotePathError;

/// Errors raised while scanning a local directory tree.
///
/// A scan fails as a whole only when the root itself is unusable or a
/// discovered file cannot be read for a reason other than vanishing;
/// vanished files are skipped with a warning instead.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The scan root could not be inspected.
    #[error("cannot scan {}: {source}", path.display())]
    Root {
        /// The configured root path.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The scan root exists but is not a directory.
    #[error("scan root {} is not a directory", path.display())]
    NotADirectory {
        /// The configured root path.
        path: PathBuf,
    },

    /// A directory's entries could not be listed.
    #[error("cannot list {}: {source}", path.display())]
    ReadDir {
        /// The directory that failed to list.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A directory entry's metadata could not be queried.
    #[error("cannot stat {}: {source}", path.display())]
    Metadata {
        /// The entry that failed to stat.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A discovered file could not be read for hashing.
    #[error("cannot read {}: {source}", path.display())]
    ReadFile {
        /// The file that failed to read.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A relative path could not be rendered as a remote path.
    #[error(transparent)]
    RemotePath(#[from] RemotePathError),

    /// Two scanned files rendered to the same remote path.
    #[error(transparent)]
    Duplicate(#[from] DuplicatePathError),
}
