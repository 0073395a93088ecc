use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use super::{DirEntry, EntryKind, FileSystem};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Directory,
    Other,
}

/// In-memory [`FileSystem`].
///
/// Paths are normalized by dropping `.` components; the empty path (and `/`)
/// is the root directory, which always exists. Like a real disk, writing a
/// file requires its parent directory to exist. Listings are sorted by name.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    nodes: RefCell<BTreeMap<PathBuf, Node>>,
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_) | Component::ParentDir))
        .collect()
}

fn not_found(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{what} not found"))
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a file (and its parent directories) with the given contents.
    pub fn insert_file(&self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>) {
        let path = normalize(path.as_ref());
        self.insert_parents(&path);
        self.nodes.borrow_mut().insert(path, Node::File(data.into()));
    }

    /// Create a directory and its parents.
    pub fn insert_dir(&self, path: impl AsRef<Path>) {
        let path = normalize(path.as_ref());
        self.insert_parents(&path);
        self.nodes.borrow_mut().insert(path, Node::Directory);
    }

    /// Create a node that is neither a file nor a directory, like a symlink or socket.
    pub fn insert_special(&self, path: impl AsRef<Path>) {
        let path = normalize(path.as_ref());
        self.insert_parents(&path);
        self.nodes.borrow_mut().insert(path, Node::Other);
    }

    /// Contents of a file, if `path` names one.
    pub fn file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.nodes.borrow().get(&normalize(path.as_ref())) {
            Some(Node::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        let path = normalize(path.as_ref());
        path.as_os_str().is_empty() || matches!(self.nodes.borrow().get(&path), Some(Node::Directory))
    }

    fn insert_parents(&self, path: &Path) {
        let mut nodes = self.nodes.borrow_mut();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            nodes.entry(ancestor.to_path_buf()).or_insert(Node::Directory);
        }
    }
}

impl FileSystem for MemoryFileSystem {
    fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        if !self.is_dir(path) {
            return Err(Error::filesystem("list", path, not_found("directory")));
        }

        let dir = normalize(path);
        let nodes = self.nodes.borrow();
        let entries = nodes
            .iter()
            .filter(|(p, _)| p.parent() == Some(dir.as_path()))
            .filter_map(|(p, node)| {
                let name = p.file_name()?.to_str()?.to_string();
                let kind = match node {
                    Node::File(_) => EntryKind::File,
                    Node::Directory => EntryKind::Directory,
                    Node::Other => EntryKind::Other,
                };
                Some(DirEntry { name, kind })
            })
            .collect();

        Ok(entries)
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        self.file(path)
            .ok_or_else(|| Error::filesystem("read", path, not_found("file")))
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> Result<()> {
        let key = normalize(path);
        let parent = key.parent().map(Path::to_path_buf).unwrap_or_default();
        if !self.is_dir(&parent) {
            return Err(Error::filesystem("write", path, not_found("parent directory")));
        }

        let mut nodes = self.nodes.borrow_mut();
        if matches!(nodes.get(&key), Some(Node::Directory | Node::Other)) {
            return Err(Error::filesystem(
                "write",
                path,
                io::Error::new(io::ErrorKind::AlreadyExists, "not a regular file"),
            ));
        }
        nodes.insert(key, Node::File(data.to_vec()));
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let key = normalize(path);
        let mut nodes = self.nodes.borrow_mut();
        for ancestor in key.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            if matches!(nodes.get(ancestor), Some(Node::File(_) | Node::Other)) {
                return Err(Error::filesystem(
                    "create directory",
                    path,
                    io::Error::new(io::ErrorKind::AlreadyExists, "not a directory"),
                ));
            }
        }
        for ancestor in key.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            nodes.entry(ancestor.to_path_buf()).or_insert(Node::Directory);
        }
        Ok(())
    }
}
