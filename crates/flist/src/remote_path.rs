use std::fmt;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

/// Logical publication path of a file, the unique key within a
/// [`FileList`](crate::FileList).
///
/// A remote path always starts with `/` and uses `/` separators regardless
/// of the platform the tree was scanned on, so the same tree publishes to
/// the same keys everywhere. Lexicographic ordering is used for display
/// only; it carries no publication semantics.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemotePath(String);

impl RemotePath {
    /// Validates and wraps an already-rendered remote path.
    ///
    /// The path must start with `/`, must not end with `/`, and must not
    /// contain empty, `.`, or `..` segments.
    pub fn new(path: impl Into<String>) -> Result<Self, RemotePathError> {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(RemotePathError::new(path, "must start with '/'"));
        }
        if path.len() == 1 || path.ends_with('/') {
            return Err(RemotePathError::new(path, "must name a file, not a directory"));
        }
        if path.split('/').skip(1).any(|seg| seg.is_empty() || seg == "." || seg == "..") {
            return Err(RemotePathError::new(path, "contains an empty or relative segment"));
        }
        Ok(Self(path))
    }

    /// Builds the remote path for a file at `relative`, the path of the
    /// file relative to the scan root.
    ///
    /// Components are joined with `/` and prefixed with `/`; non-Unicode
    /// components are rejected so the rendered key is stable across
    /// platforms and encodings.
    pub fn from_relative(relative: &Path) -> Result<Self, RemotePathError> {
        let mut rendered = String::new();
        for component in relative.components() {
            let Component::Normal(part) = component else {
                return Err(RemotePathError::new(
                    relative.display().to_string(),
                    "contains a non-normal component",
                ));
            };
            let Some(part) = part.to_str() else {
                return Err(RemotePathError::new(
                    relative.display().to_string(),
                    "contains a non-Unicode component",
                ));
            };
            rendered.push('/');
            rendered.push_str(part);
        }
        Self::new(rendered)
    }

    /// Returns the rendered path, including the leading `/`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RemotePath({:?})", self.0)
    }
}

impl From<RemotePath> for String {
    fn from(path: RemotePath) -> Self {
        path.0
    }
}

impl TryFrom<String> for RemotePath {
    type Error = RemotePathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Error returned when a string or relative path cannot become a
/// [`RemotePath`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid remote path {input:?}: {reason}")]
pub struct RemotePathError {
    input: String,
    reason: &'static str,
}

impl RemotePathError {
    fn new(input: impl Into<String>, reason: &'static str) -> Self {
        Self {
            input: input.into(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn from_relative_joins_with_forward_slashes() {
        let relative: PathBuf = ["img", "logo.png"].iter().collect();
        let path = RemotePath::from_relative(&relative).unwrap();
        assert_eq!(path.as_str(), "/img/logo.png");
    }

    #[test]
    fn single_component_gets_leading_slash() {
        let path = RemotePath::from_relative(Path::new("index.html")).unwrap();
        assert_eq!(path.as_str(), "/index.html");
    }

    #[test]
    fn rejects_missing_leading_slash() {
        assert!(RemotePath::new("index.html").is_err());
    }

    #[test]
    fn rejects_directory_like_paths() {
        assert!(RemotePath::new("/").is_err());
        assert!(RemotePath::new("/dir/").is_err());
    }

    #[test]
    fn rejects_empty_and_relative_segments() {
        assert!(RemotePath::new("/a//b").is_err());
        assert!(RemotePath::new("/a/./b").is_err());
        assert!(RemotePath::new("/a/../b").is_err());
    }

    #[test]
    fn from_relative_rejects_parent_components() {
        let relative: PathBuf = ["..", "escape"].iter().collect();
        assert!(RemotePath::from_relative(&relative).is_err());
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = RemotePath::new("/a.txt").unwrap();
        let b = RemotePath::new("/b.txt").unwrap();
        assert!(a < b);
    }

    #[test]
    fn serde_round_trip() {
        let path = RemotePath::new("/site/index.html").unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"/site/index.html\"");
        let back: RemotePath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }

    #[test]
    fn serde_rejects_invalid_input() {
        assert!(serde_json::from_str::<RemotePath>("\"no-slash\"").is_err());
    }
}
