//! Deterministic depth-first directory walker.
//!
//! Entries at each level are visited in byte-wise name order so two scans
//! of an unchanged tree always produce the same file sequence. Only
//! regular files are collected; symlinks are not followed.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ScanError;

/// A regular file discovered under the scan root, before hashing.
#[derive(Debug)]
pub(crate) struct ScannedFile {
    /// Absolute (or root-joined) path on disk.
    pub full_path: PathBuf,
    /// Path relative to the scan root.
    pub relative_path: PathBuf,
    /// Size in bytes at stat time.
    pub size: u64,
    /// Modification time as seconds since the Unix epoch, 0 if unavailable.
    pub changed_at: i64,
}

/// Collects every regular file under `root` in deterministic order.
pub(crate) fn collect_files(root: &Path) -> Result<Vec<ScannedFile>, ScanError> {
    let meta = fs::metadata(root).map_err(|source| ScanError::Root {
        path: root.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(ScanError::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    let mut files = Vec::new();
    walk_dir(root, Path::new(""), &mut files)?;
    Ok(files)
}

fn walk_dir(dir: &Path, relative: &Path, files: &mut Vec<ScannedFile>) -> Result<(), ScanError> {
    let mut entries = Vec::new();
    let iter = fs::read_dir(dir).map_err(|source| ScanError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in iter {
        let entry = entry.map_err(|source| ScanError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        entries.push(entry);
    }
    entries.sort_by_key(std::fs::DirEntry::file_name);

    for entry in entries {
        let full_path = entry.path();
        let child_relative = relative.join(entry.file_name());
        let meta = fs::symlink_metadata(&full_path).map_err(|source| ScanError::Metadata {
            path: full_path.clone(),
            source,
        })?;
        let kind = meta.file_type();
        if kind.is_dir() {
            walk_dir(&full_path, &child_relative, files)?;
        } else if kind.is_file() {
            files.push(ScannedFile {
                full_path,
                relative_path: child_relative,
                size: meta.len(),
                changed_at: modified_secs(&meta),
            });
        } else {
            debug!(path = %full_path.display(), "skipping non-regular file");
        }
    }
    Ok(())
}

fn modified_secs(meta: &fs::Metadata) -> i64 {
    meta.modified()
        .ok()
        .and_then(|time| time.duration_since(std::time::UNIX_EPOCH).ok())
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(0))
}
