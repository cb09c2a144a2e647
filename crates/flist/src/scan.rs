//! Local directory scanner.

use std::io;
use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::entry::FileEntry;
use crate::error::ScanError;
use crate::hash::hash_file;
use crate::list::FileList;
use crate::remote_path::RemotePath;
use crate::walk;

/// Scans `root` and produces the [`FileList`] describing its current state.
///
/// The walk is deterministic: directory entries are visited in name order,
/// depth first, so repeated scans of an unchanged tree yield identical
/// lists. File contents are hashed in parallel across files while the
/// returned list preserves walk order.
///
/// A file that vanishes between discovery and hashing is skipped with a
/// warning; any other read failure aborts the scan.
///
/// # Errors
///
/// Returns [`ScanError`] when the root is missing or not a directory, when
/// a directory cannot be listed, when a file cannot be read, or when a
/// file's path cannot be rendered as a remote path.
pub fn scan_local(root: &Path) -> Result<FileList, ScanError> {
    let found = walk::collect_files(root)?;
    debug!(root = %root.display(), files = found.len(), "scanning local tree");

    let entries = found
        .into_par_iter()
        .map(hash_found)
        .collect::<Result<Vec<_>, ScanError>>()?;

    let mut list = FileList::with_capacity(entries.len());
    for entry in entries.into_iter().flatten() {
        list.push(entry)?;
    }
    Ok(list)
}

fn hash_found(file: walk::ScannedFile) -> Result<Option<FileEntry>, ScanError> {
    let remote_path = RemotePath::from_relative(&file.relative_path)?;
    match hash_file(&file.full_path) {
        Ok(hash) => Ok(Some(FileEntry::local(
            file.full_path,
            remote_path,
            hash,
            file.size,
            file.changed_at,
        ))),
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            warn!(path = %file.full_path.display(), "file vanished during scan, skipping");
            Ok(None)
        }
        Err(source) => Err(ScanError::ReadFile {
            path: file.full_path,
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::scan_local;
    use crate::hash::hash_bytes;

    #[test]
    fn empty_root_yields_empty_list() {
        let dir = tempdir().unwrap();
        let list = scan_local(dir.path()).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn scan_hashes_contents_and_renders_remote_paths() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("img")).unwrap();
        fs::write(dir.path().join("img/logo.png"), b"png bytes").unwrap();
        fs::write(dir.path().join("index.html"), b"<html></html>").unwrap();

        let list = scan_local(dir.path()).unwrap();
        let paths: Vec<_> = list.iter().map(|e| e.remote_path().as_str()).collect();
        assert_eq!(paths, vec!["/img/logo.png", "/index.html"]);

        let index = list
            .iter()
            .find(|e| e.remote_path().as_str() == "/index.html")
            .unwrap();
        assert_eq!(index.hash(), hash_bytes(b"<html></html>"));
        assert_eq!(index.size(), 13);
        assert!(index.local_path().is_some());
        assert!(index.record().is_none());
    }

    #[test]
    fn repeated_scans_are_identical() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/b/deep.txt"), b"deep").unwrap();
        fs::write(dir.path().join("top.txt"), b"top").unwrap();

        let first = scan_local(dir.path()).unwrap();
        let second = scan_local(dir.path()).unwrap();
        let flatten = |list: &crate::FileList| {
            list.iter()
                .map(|e| (e.remote_path().clone(), e.hash(), e.size()))
                .collect::<Vec<_>>()
        };
        assert_eq!(flatten(&first), flatten(&second));
    }

    #[test]
    fn scan_of_missing_root_fails() {
        let dir = tempdir().unwrap();
        assert!(scan_local(&dir.path().join("absent")).is_err());
    }
}
