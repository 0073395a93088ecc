//! Filesystem access used by the walker and the materializer.
//!
//! The core never touches `std::fs` directly: it goes through the
//! [`FileSystem`] trait, so the same traversal and extraction logic runs
//! against the real disk ([`LocalFileSystem`]) or an in-memory tree
//! ([`MemoryFileSystem`]).

mod local;
mod memory;

pub use local::LocalFileSystem;
pub use memory::MemoryFileSystem;

use std::path::Path;

use crate::error::Result;

/// What a directory listing entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Symlinks, sockets, FIFOs, devices.
    Other,
}

/// One item of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// The filesystem operations packing and unpacking rely on.
pub trait FileSystem {
    /// List the immediate children of `path`, in the order the backend returns them.
    fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>>;

    /// Read a whole file into memory.
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;

    /// Create or truncate `path` and write `data` to it.
    fn write_file(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Create `path` and all missing parents. Existing directories are not an error.
    fn create_dir_all(&self, path: &Path) -> Result<()>;
}
