//! Pure diff of a local file list against the published manifest.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::error;

use flist::{FileEntry, FileList, RemotePath};

/// Partition of local versus published state.
///
/// The three lists are pairwise disjoint by path: `to_transfer` and
/// `unchanged` together cover exactly the local paths, `to_delete` holds
/// the published paths with no local counterpart.
#[derive(Clone, Debug, Default)]
pub struct DiffResult {
    /// Local entries that are new or whose content changed.
    pub to_transfer: FileList,
    /// Local entries already published with identical content. Each
    /// carries the record id of the pointer backing it.
    pub unchanged: FileList,
    /// Published entries with no local counterpart.
    pub to_delete: FileList,
}

/// Classifies `local` against `remote` by content hash alone.
///
/// A local entry transfers when its path is unpublished or published with
/// a different hash; equal hashes make it unchanged regardless of size or
/// timestamp. Published paths absent locally are marked for deletion.
/// Pure and deterministic: no I/O, inputs are neither mutated nor
/// retained.
#[must_use]
pub fn diff(local: &FileList, remote: &FileList) -> DiffResult {
    let remote_by_path: FxHashMap<&RemotePath, &FileEntry> = remote
        .iter()
        .map(|entry| (entry.remote_path(), entry))
        .collect();

    let mut result = DiffResult::default();
    for entry in local {
        match remote_by_path.get(entry.remote_path()) {
            Some(published) if published.hash() == entry.hash() => {
                let mut kept = entry.clone();
                if let Some(record) = published.record() {
                    kept = kept.with_record(record.clone());
                }
                push_partition(&mut result.unchanged, kept);
            }
            _ => push_partition(&mut result.to_transfer, entry.clone()),
        }
    }

    let local_paths: FxHashSet<&RemotePath> = local.iter().map(FileEntry::remote_path).collect();
    for entry in remote {
        if !local_paths.contains(entry.remote_path()) {
            push_partition(&mut result.to_delete, entry.clone());
        }
    }

    result
}

// Entries drawn from a single FileList keep unique paths in any subset,
// so insertion cannot fail; log rather than unwind if it ever does.
fn push_partition(list: &mut FileList, entry: FileEntry) {
    if let Err(err) = list.push(entry) {
        error!(target: "blobsync::diff", %err, "dropped conflicting diff entry");
    }
}
