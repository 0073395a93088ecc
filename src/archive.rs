//! Pack and unpack operations composed from the walker, the ZIP codec and
//! the materializer.

use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::io::FileSystem;
use crate::materialize::materialize;
use crate::walk::{WalkOptions, walk_with};
use crate::zip::{CompressionMethod, WriteOptions, ZipReader, read_archive, write_archive};

/// Options for the packing pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackOptions {
    pub walk: WalkOptions,
    pub write: WriteOptions,
}

/// Walk `source_dir` and return the complete archive buffer.
pub fn pack_to_bytes<F: FileSystem + ?Sized>(
    fs: &F,
    source_dir: &Path,
    options: &PackOptions,
) -> Result<Vec<u8>> {
    let entries = walk_with(fs, source_dir, &options.walk)?;
    write_archive(&entries, &options.write)
}

/// Pack `source_dir` into the archive file `dest_file`.
///
/// The archive is built completely before `dest_file` is created or
/// truncated, so only a failing final write can leave a partial file behind.
pub fn pack_directory_to_file<F: FileSystem + ?Sized>(
    fs: &F,
    source_dir: &Path,
    dest_file: &Path,
    options: &PackOptions,
) -> Result<()> {
    let archive = pack_to_bytes(fs, source_dir, options)?;
    fs.write_file(dest_file, &archive)?;
    info!(
        source = %source_dir.display(),
        archive = %dest_file.display(),
        bytes = archive.len(),
        "packed directory"
    );
    Ok(())
}

/// Extract every file of `archive` under `dest_root`.
pub fn unpack_bytes<F: FileSystem + ?Sized>(fs: &F, archive: &[u8], dest_root: &Path) -> Result<()> {
    let entries = read_archive(archive)?;
    materialize(fs, &entries, dest_root)?;
    info!(destination = %dest_root.display(), files = entries.len(), "unpacked archive");
    Ok(())
}

/// Read the archive file `archive_file` and extract it under `dest_root`.
pub fn unpack_file_to_directory<F: FileSystem + ?Sized>(
    fs: &F,
    archive_file: &Path,
    dest_root: &Path,
) -> Result<()> {
    let archive = fs.read_file(archive_file)?;
    unpack_bytes(fs, &archive, dest_root)
}

/// Listing information for one archive member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSummary {
    pub name: String,
    pub method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub is_directory: bool,
}

/// Describe the members of `archive` from its central directory, without
/// decompressing anything.
pub fn list_archive(archive: &[u8]) -> Result<Vec<MemberSummary>> {
    Ok(ZipReader::new(archive)
        .list_members()?
        .into_iter()
        .map(|m| MemberSummary {
            name: m.file_name,
            method: m.compression_method,
            compressed_size: m.compressed_size,
            uncompressed_size: m.uncompressed_size,
            crc32: m.crc32,
            is_directory: m.is_directory,
        })
        .collect())
}

/// Relative name and size of every file under `dir`, without archiving.
pub fn manifest<F: FileSystem + ?Sized>(fs: &F, dir: &Path) -> Result<Vec<(String, u64)>> {
    Ok(walk_with(fs, dir, &WalkOptions::default())?
        .into_iter()
        .map(|entry| {
            let size = entry.data.len() as u64;
            (entry.name, size)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::io::{LocalFileSystem, MemoryFileSystem};
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::tempdir;

    fn tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
        walk_with(&LocalFileSystem::new(), root, &WalkOptions::default())
            .unwrap()
            .into_iter()
            .map(|e| (e.name, e.data))
            .collect()
    }

    #[test]
    fn test_pack_then_unpack_scenario() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let proj = temp_dir.path().join("proj");
        fs::create_dir_all(proj.join("src"))?;
        fs::write(proj.join("readme.txt"), "hello")?;
        fs::write(proj.join("src/main.ext"), "body")?;

        let local = LocalFileSystem::new();
        let out = temp_dir.path().join("out.zip");
        let restored = temp_dir.path().join("restored");

        pack_directory_to_file(&local, &proj, &out, &PackOptions::default())?;
        unpack_file_to_directory(&local, &out, &restored)?;

        assert_eq!(fs::read_to_string(restored.join("readme.txt"))?, "hello");
        assert_eq!(fs::read_to_string(restored.join("src/main.ext"))?, "body");
        Ok(())
    }

    #[test]
    fn test_round_trip_reproduces_tree() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let source = temp_dir.path().join("source");
        fs::create_dir_all(source.join("a/b/c"))?;
        fs::create_dir_all(source.join("empty"))?;
        fs::write(source.join("a/b/c/deep.bin"), (0..=255u8).collect::<Vec<_>>())?;
        fs::write(source.join("a/text.txt"), "lorem ipsum ".repeat(500))?;
        fs::write(source.join("zero.txt"), "")?;

        let local = LocalFileSystem::new();
        let archive = pack_to_bytes(&local, &source, &PackOptions::default())?;
        let dest = temp_dir.path().join("dest");
        unpack_bytes(&local, &archive, &dest)?;

        assert_eq!(tree(&source), tree(&dest));
        Ok(())
    }

    #[test]
    fn test_round_trip_in_memory() {
        let fs = MemoryFileSystem::new();
        fs.insert_file("proj/readme.txt", "hello");
        fs.insert_file("proj/src/main.ext", "body");

        let archive = pack_to_bytes(&fs, Path::new("proj"), &PackOptions::default()).unwrap();
        unpack_bytes(&fs, &archive, Path::new("restored")).unwrap();

        assert_eq!(fs.file("restored/readme.txt"), Some(b"hello".to_vec()));
        assert_eq!(fs.file("restored/src/main.ext"), Some(b"body".to_vec()));
    }

    #[cfg(unix)]
    #[test]
    fn test_pack_accepts_unusual_but_legal_names() {
        let fs = MemoryFileSystem::new();
        fs.insert_file("proj/c:notes.txt", "colon");
        fs.insert_file("proj/sub/back\\slash.txt", "backslash");

        let archive = pack_to_bytes(&fs, Path::new("proj"), &PackOptions::default()).unwrap();
        let mut names: Vec<String> = read_archive(&archive)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["c:notes.txt", "sub/back\\slash.txt"]);
    }

    #[test]
    fn test_failed_pack_leaves_destination_untouched() {
        let fs = MemoryFileSystem::new();
        fs.insert_file("out.zip", "previous");

        let err = pack_directory_to_file(
            &fs,
            Path::new("missing"),
            Path::new("out.zip"),
            &PackOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Filesystem { .. }));
        assert_eq!(fs.file("out.zip"), Some(b"previous".to_vec()));
    }

    #[test]
    fn test_unpack_garbage_fails_without_writing() {
        let fs = MemoryFileSystem::new();
        let err = unpack_bytes(&fs, b"definitely not a zip", Path::new("dest")).unwrap_err();
        assert!(matches!(err, Error::ArchiveParse { .. }));
        assert!(!fs.is_dir("dest"));
    }

    #[test]
    fn test_list_and_manifest() {
        let fs = MemoryFileSystem::new();
        fs.insert_file("d/a.txt", "aaaa".repeat(100));
        fs.insert_file("d/sub/b.txt", "b");

        let mut listed = manifest(&fs, Path::new("d")).unwrap();
        listed.sort();
        assert_eq!(listed, vec![("a.txt".to_string(), 400), ("sub/b.txt".to_string(), 1)]);

        let archive = pack_to_bytes(&fs, Path::new("d"), &PackOptions::default()).unwrap();
        let members = list_archive(&archive).unwrap();
        assert_eq!(members.len(), 2);
        let a = members.iter().find(|m| m.name == "a.txt").unwrap();
        assert_eq!(a.method, CompressionMethod::Deflate);
        assert_eq!(a.uncompressed_size, 400);
        assert!(a.compressed_size < 400);
        assert!(!a.is_directory);
    }
}
