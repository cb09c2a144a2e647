use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// One blob-storage destination.
///
/// Endpoints are independent of each other: storing on one says nothing
/// about any other. The wrapped URL is the base under which blobs are
/// addressed by their content hash.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Endpoint(Url);

impl Endpoint {
    /// Wraps an already parsed base URL.
    #[must_use]
    pub const fn new(url: Url) -> Self {
        Self(url)
    }

    /// Parses an endpoint from its textual URL.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointParseError`] when the input is not an absolute
    /// URL.
    pub fn parse(input: &str) -> Result<Self, EndpointParseError> {
        let url = Url::parse(input).map_err(|source| EndpointParseError {
            input: input.to_owned(),
            source,
        })?;
        Ok(Self(url))
    }

    /// The endpoint's base URL.
    #[must_use]
    pub const fn as_url(&self) -> &Url {
        &self.0
    }

    /// The endpoint rendered as a string, as the URL was parsed.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Endpoint({})", self.0)
    }
}

/// Raised when an endpoint URL does not parse.
#[derive(Debug, Error)]
#[error("invalid endpoint URL {input:?}: {source}")]
pub struct EndpointParseError {
    /// The rejected input.
    input: String,
    /// The underlying URL parse failure.
    #[source]
    source: url::ParseError,
}
