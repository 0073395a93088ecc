//! Recursive directory walker.
//!
//! Produces the flat list of [`Entry`] records for a directory tree. The
//! walker knows nothing about archives: the writer consumes its output as an
//! independent stage, and [`crate::archive::manifest`] reuses it directly.

use std::io;
use std::path::Path;

use tracing::{debug, warn};

use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::io::{EntryKind, FileSystem};

/// What to do with listing entries that are neither files nor directories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpecialFilePolicy {
    /// Leave them out of the result and log a warning.
    #[default]
    Skip,
    /// Abort the walk with a filesystem error naming the path.
    Fail,
}

/// Options controlling [`walk_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkOptions {
    pub special_files: SpecialFilePolicy,
}

/// Walk `root` with default options.
pub fn walk<F: FileSystem + ?Sized>(fs: &F, root: &Path) -> Result<Vec<Entry>> {
    walk_with(fs, root, &WalkOptions::default())
}

/// Walk `root` depth-first and return one [`Entry`] per regular file.
///
/// Entry names are relative to `root` and always joined with `/`. The order
/// follows the backend's listing order, with each subdirectory's entries
/// spliced in where the subdirectory was listed.
pub fn walk_with<F: FileSystem + ?Sized>(
    fs: &F,
    root: &Path,
    options: &WalkOptions,
) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    walk_dir(fs, root, "", options, &mut entries)?;
    debug!(root = %root.display(), files = entries.len(), "walked directory");
    Ok(entries)
}

fn walk_dir<F: FileSystem + ?Sized>(
    fs: &F,
    dir: &Path,
    prefix: &str,
    options: &WalkOptions,
    out: &mut Vec<Entry>,
) -> Result<()> {
    for item in fs.list_dir(dir)? {
        let path = dir.join(&item.name);
        let name = if prefix.is_empty() {
            item.name
        } else {
            format!("{prefix}/{}", item.name)
        };

        match item.kind {
            EntryKind::Directory => walk_dir(fs, &path, &name, options, out)?,
            EntryKind::File => {
                let data = fs.read_file(&path)?;
                debug!(name = %name, size = data.len(), "read file");
                out.push(Entry { name, data });
            }
            EntryKind::Other => match options.special_files {
                SpecialFilePolicy::Skip => {
                    warn!(path = %path.display(), "skipping entry that is not a regular file or directory");
                }
                SpecialFilePolicy::Fail => {
                    return Err(Error::filesystem(
                        "walk",
                        &path,
                        io::Error::new(
                            io::ErrorKind::Unsupported,
                            "not a regular file or directory",
                        ),
                    ));
                }
            },
        }
    }
    Ok(())
}
