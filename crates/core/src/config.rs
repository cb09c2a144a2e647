//! Project configuration file.
//!
//! A tree that is published repeatedly keeps its destination in a
//! `blobsync.json` next to (or above) the content, so invocations only
//! name the root. Command-line flags override individual fields.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;
use url::Url;

use remote::{Endpoint, Identity};

use crate::error::ClientError;

/// File name probed under the scan root when no explicit config path is
/// given.
pub const PROJECT_FILE: &str = "blobsync.json";

/// Contents of a project configuration file.
///
/// Unknown fields are rejected so typos fail loudly instead of silently
/// publishing to the wrong place.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Owner identity records are published under.
    pub identity: Identity,
    /// Pointer-directory base URL.
    pub publisher: Url,
    /// Blob-store endpoints; at least one.
    pub endpoints: Vec<Endpoint>,
    /// Upload concurrency override.
    #[serde(default)]
    pub concurrency: Option<usize>,
    /// Per-endpoint attempt deadline in seconds.
    #[serde(default)]
    pub endpoint_timeout_secs: Option<u64>,
}

impl ProjectConfig {
    /// Reads and validates the configuration at `path`.
    pub fn load(path: &Path) -> Result<Self, ClientError> {
        let text = std::fs::read_to_string(path).map_err(|source| ClientError::ConfigRead {
            path: path.to_owned(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&text).map_err(|err| ClientError::ConfigInvalid {
                path: path.to_owned(),
                reason: err.to_string(),
            })?;
        if config.endpoints.is_empty() {
            return Err(ClientError::ConfigInvalid {
                path: path.to_owned(),
                reason: "endpoints must name at least one blob store".to_owned(),
            });
        }
        debug!(
            target: "blobsync::sync",
            path = %path.display(),
            endpoints = config.endpoints.len(),
            "loaded project config"
        );
        Ok(config)
    }

    /// Loads `{root}/blobsync.json` when it exists.
    ///
    /// A missing file is not an error; a present but unusable file is.
    pub fn discover(root: &Path) -> Result<Option<Self>, ClientError> {
        let candidate = root.join(PROJECT_FILE);
        if candidate.is_file() {
            Self::load(&candidate).map(Some)
        } else {
            Ok(None)
        }
    }
}
