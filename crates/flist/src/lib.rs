#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `flist` provides the file list model shared across the blobsync
//! workspace together with the local directory scanner that produces it.
//! A [`FileList`] is an ordered collection of [`FileEntry`] values keyed by
//! their logical [`RemotePath`]; each entry names its content by a SHA-256
//! [`ContentHash`]. Local lists come from [`scan_local`], remote lists are
//! assembled by higher layers from pointer records.
//!
//! # Design
//!
//! - [`ContentHash`] is a fixed 32-byte digest with lowercase-hex display
//!   and parsing. Hash equality is the only sameness test the rest of the
//!   workspace performs; sizes and timestamps are informational.
//! - [`RemotePath`] is the publication key: the path relative to the scan
//!   root rendered with `/` separators and a leading `/`, identical on
//!   every platform.
//! - [`FileList::push`] enforces remote-path uniqueness so downstream
//!   classification never has to disambiguate duplicate keys.
//! - [`scan_local`] walks the tree depth-first with directory entries
//!   sorted by name, then hashes the discovered files on the rayon thread
//!   pool while preserving the deterministic traversal order.
//!
//! # Invariants
//!
//! - `remote_path` values are unique within a single [`FileList`].
//! - Entries are created fresh on every scan; nothing is cached across
//!   invocations and a scan never mutates the tree it reads.
//! - Traversal never escapes the configured root and never follows
//!   symbolic links.
//!
//! # Errors
//!
//! Scanning reports [`ScanError`] when the root is unusable or a file
//! cannot be read. A file that vanishes between enumeration and hashing is
//! skipped with a warning rather than failing the scan.
//!
//! # Examples
//!
//! ```
//! use flist::scan_local;
//!
//! # fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let temp = tempfile::tempdir()?;
//! std::fs::write(temp.path().join("index.html"), b"<html></html>")?;
//! std::fs::create_dir(temp.path().join("img"))?;
//! std::fs::write(temp.path().join("img/logo.png"), b"\x89PNG")?;
//!
//! let list = scan_local(temp.path())?;
//! let paths: Vec<_> = list.iter().map(|e| e.remote_path().as_str()).collect();
//! assert_eq!(paths, ["/img/logo.png", "/index.html"]);
//! # Ok(())
//! # }
//! # demo().unwrap();
//! ```

mod entry;
mod error;
mod hash;
mod list;
mod remote_path;
mod scan;
mod walk;

pub use crate::entry::{FileEntry, RecordId};
pub use crate::error::ScanError;
pub use crate::hash::{ContentHash, ParseHashError, hash_bytes, hash_file, hash_reader};
pub use crate::list::{DuplicatePathError, FileList};
pub use crate::remote_path::{RemotePath, RemotePathError};
pub use crate::scan::scan_local;
