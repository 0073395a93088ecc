//! Error types shared by every stage of packing and unpacking.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors produced by the walker, the archive codec and the materializer.
///
/// Every variant carries the path or member name it failed on so the
/// command-line layer can report it without further context.
#[derive(Error, Debug)]
pub enum Error {
    /// A path could not be listed, read, created or written.
    #[error("failed to {op} '{}': {source}", .path.display())]
    Filesystem {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A member could not be added to the archive, or the archive could not be finalized.
    #[error("failed to add '{name}' to archive: {reason}")]
    ArchiveWrite { name: String, reason: String },

    /// The buffer is not a well-formed archive, or one of its members is corrupt.
    #[error("{}", parse_message(.member, .reason))]
    ArchiveParse {
        member: Option<String>,
        reason: String,
    },
}

fn parse_message(member: &Option<String>, reason: &str) -> String {
    match member {
        Some(name) => format!("invalid archive member '{name}': {reason}"),
        None => format!("invalid archive: {reason}"),
    }
}

impl Error {
    pub(crate) fn filesystem(op: &'static str, path: &Path, source: io::Error) -> Self {
        Error::Filesystem {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn write(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ArchiveWrite {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn parse(reason: impl Into<String>) -> Self {
        Error::ArchiveParse {
            member: None,
            reason: reason.into(),
        }
    }

    pub(crate) fn parse_member(member: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ArchiveParse {
            member: Some(member.into()),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;
