use std::slice;

use rustc_hash::FxHashSet;

use crate::entry::FileEntry;
use crate::remote_path::RemotePath;

/// Ordered collection of [`FileEntry`] values with unique remote paths.
///
/// Order follows insertion and matters only for display; classification
/// downstream is keyed purely by [`RemotePath`]. `push` rejects duplicate
/// keys so a list can always be treated as a map.
#[derive(Clone, Debug, Default)]
pub struct FileList {
    entries: Vec<FileEntry>,
    paths: FxHashSet<RemotePath>,
}

impl FileList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty list with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            paths: FxHashSet::default(),
        }
    }

    /// Appends an entry, rejecting a remote path already present.
    pub fn push(&mut self, entry: FileEntry) -> Result<(), DuplicatePathError> {
        if !self.paths.insert(entry.remote_path().clone()) {
            return Err(DuplicatePathError {
                path: entry.remote_path().clone(),
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Number of entries in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the list holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reports whether an entry with `path` is present.
    #[must_use]
    pub fn contains_path(&self, path: &RemotePath) -> bool {
        self.paths.contains(path)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> slice::Iter<'_, FileEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a FileList {
    type Item = &'a FileEntry;
    type IntoIter = slice::Iter<'a, FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for FileList {
    type Item = FileEntry;
    type IntoIter = std::vec::IntoIter<FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Error returned by [`FileList::push`] when the remote path is taken.
#[derive(Clone, Debug, thiserror::Error)]
#[error("duplicate remote path {path} in file list")]
pub struct DuplicatePathError {
    path: RemotePath,
}

impl DuplicatePathError {
    /// The remote path that was already present.
    #[must_use]
    pub fn path(&self) -> &RemotePath {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_bytes;

    fn entry(path: &str, content: &[u8]) -> FileEntry {
        FileEntry::remote(
            RemotePath::new(path).unwrap(),
            hash_bytes(content),
            content.len() as u64,
            0,
            None,
        )
    }

    #[test]
    fn push_preserves_insertion_order() {
        let mut list = FileList::new();
        list.push(entry("/b.txt", b"b")).unwrap();
        list.push(entry("/a.txt", b"a")).unwrap();

        let paths: Vec<_> = list.iter().map(|e| e.remote_path().as_str()).collect();
        assert_eq!(paths, ["/b.txt", "/a.txt"]);
    }

    #[test]
    fn push_rejects_duplicate_path() {
        let mut list = FileList::new();
        list.push(entry("/a.txt", b"one")).unwrap();

        let err = list.push(entry("/a.txt", b"two")).unwrap_err();
        assert_eq!(err.path().as_str(), "/a.txt");
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn contains_path_tracks_pushes() {
        let mut list = FileList::new();
        let path = RemotePath::new("/x").unwrap();
        assert!(!list.contains_path(&path));
        list.push(entry("/x", b"x")).unwrap();
        assert!(list.contains_path(&path));
    }

    #[test]
    fn empty_list_reports_empty() {
        let list = FileList::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
    }
}
