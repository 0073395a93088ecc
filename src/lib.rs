//! # zipdir
//!
//! Pack a directory tree into a single ZIP archive, and unpack it again.
//!
//! Packing and unpacking are two symmetric pipelines over one record type,
//! [`Entry`] (a `/`-separated relative name plus the file's bytes):
//!
//! - **pack**: [`walk`] a directory into entries, then [`write_archive`] them
//!   into an in-memory ZIP buffer
//! - **unpack**: [`read_archive`] a ZIP buffer into entries, then
//!   [`materialize`] them under a destination directory
//!
//! All filesystem access goes through the [`FileSystem`] trait, so the same
//! pipelines run against the real disk or an in-memory tree.
//!
//! ## Features
//!
//! - STORED and DEFLATE members, readable by any standard ZIP tool
//! - Reads archives from other tools, including ZIP64 and archive comments
//! - Rejects unsafe member names (absolute paths, `..`) on both sides
//! - CRC-32 verification of every extracted member
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use zipdir::{LocalFileSystem, PackOptions, pack_directory_to_file, unpack_file_to_directory};
//!
//! fn main() -> zipdir::Result<()> {
//!     let fs = LocalFileSystem::new();
//!     pack_directory_to_file(&fs, Path::new("proj"), Path::new("out.zip"), &PackOptions::default())?;
//!     unpack_file_to_directory(&fs, Path::new("out.zip"), Path::new("restored"))?;
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod entry;
pub mod error;
pub mod io;
pub mod materialize;
pub mod walk;
pub mod zip;

pub use self::archive::{
    MemberSummary, PackOptions, list_archive, manifest, pack_directory_to_file, pack_to_bytes,
    unpack_bytes, unpack_file_to_directory,
};
pub use self::cli::Cli;
pub use self::entry::{Entry, validate_name};
pub use self::error::{Error, Result};
pub use self::io::{DirEntry, EntryKind, FileSystem, LocalFileSystem, MemoryFileSystem};
pub use self::materialize::materialize;
pub use self::walk::{SpecialFilePolicy, WalkOptions, walk, walk_with};
pub use self::zip::{WriteOptions, read_archive, write_archive};
