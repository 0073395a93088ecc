//! Writes entries out to a directory tree.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::entry::{Entry, validate_host_name};
use crate::error::{Error, Result};
use crate::io::FileSystem;

/// Resolve `name` under `dest_root`, one path component per `/` segment.
fn destination(dest_root: &Path, name: &str) -> PathBuf {
    let mut path = dest_root.to_path_buf();
    path.extend(name.split('/'));
    path
}

/// Write every entry to `dest_root`, creating directories as needed.
///
/// Entries are written in order; a failure aborts the operation and leaves
/// the entries already written in place.
pub fn materialize<F: FileSystem + ?Sized>(fs: &F, entries: &[Entry], dest_root: &Path) -> Result<()> {
    fs.create_dir_all(dest_root)?;

    for entry in entries {
        validate_host_name(&entry.name).map_err(|reason| {
            Error::filesystem(
                "write",
                &dest_root.join(&entry.name),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, reason),
            )
        })?;

        let path = destination(dest_root, &entry.name);
        if entry.segments().count() > 1
            && let Some(parent) = path.parent()
        {
            fs.create_dir_all(parent)?;
        }

        fs.write_file(&path, &entry.data)?;
        debug!(path = %path.display(), size = entry.data.len(), "wrote file");
    }

    Ok(())
}
