use std::fs;
use std::path::Path;

use super::{DirEntry, EntryKind, FileSystem};
use crate::error::{Error, Result};

/// [`FileSystem`] backed by the host filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFileSystem {
    fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let read_dir = fs::read_dir(path).map_err(|e| Error::filesystem("list", path, e))?;

        let mut entries = Vec::new();
        for item in read_dir {
            let item = item.map_err(|e| Error::filesystem("list", path, e))?;
            // file_type() does not follow symlinks
            let file_type = item
                .file_type()
                .map_err(|e| Error::filesystem("stat", &item.path(), e))?;
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            };

            let name = item.file_name().into_string().map_err(|raw| {
                Error::filesystem(
                    "list",
                    &path.join(raw),
                    std::io::Error::new(std::io::ErrorKind::InvalidData, "file name is not valid UTF-8"),
                )
            })?;

            entries.push(DirEntry { name, kind });
        }

        Ok(entries)
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| Error::filesystem("read", path, e))
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> Result<()> {
        fs::write(path, data).map_err(|e| Error::filesystem("write", path, e))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| Error::filesystem("create directory", path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_list_dir_kinds() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        fs::write(temp_dir.path().join("file.txt"), "hello")?;
        fs::create_dir(temp_dir.path().join("sub"))?;

        let mut entries = LocalFileSystem::new().list_dir(temp_dir.path())?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(
            entries,
            vec![
                DirEntry { name: "file.txt".into(), kind: EntryKind::File },
                DirEntry { name: "sub".into(), kind: EntryKind::Directory },
            ]
        );
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_is_other() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        fs::write(temp_dir.path().join("target.txt"), "x")?;
        std::os::unix::fs::symlink(
            temp_dir.path().join("target.txt"),
            temp_dir.path().join("link.txt"),
        )?;

        let entries = LocalFileSystem::new().list_dir(temp_dir.path())?;
        let link = entries.iter().find(|e| e.name == "link.txt").unwrap();
        assert_eq!(link.kind, EntryKind::Other);
        Ok(())
    }

    #[test]
    fn test_missing_dir_is_filesystem_error() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("missing");
        let err = LocalFileSystem::new().list_dir(&missing).unwrap_err();
        assert!(matches!(err, Error::Filesystem { op: "list", .. }));
    }

    #[test]
    fn test_write_truncates() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let path = temp_dir.path().join("out.bin");
        let local = LocalFileSystem::new();
        local.write_file(&path, b"a much longer payload")?;
        local.write_file(&path, b"short")?;
        assert_eq!(local.read_file(&path)?, b"short");

        local.create_dir_all(&temp_dir.path().join("x/y"))?;
        local.create_dir_all(&temp_dir.path().join("x/y"))?;
        Ok(())
    }
}
