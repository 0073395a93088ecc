//! Archive writer.
//!
//! Serializes a sequence of [`Entry`] records into one in-memory ZIP buffer:
//! a local header and payload per member, then the central directory and the
//! end-of-central-directory record.

use std::collections::HashSet;
use std::io::Write;

use flate2::Compression;
use flate2::Crc;
use flate2::write::DeflateEncoder;
use tracing::debug;

use crate::entry::{Entry, validate_name};
use crate::error::{Error, Result};

use super::structures::*;

/// 0xFFFF in the EOCD entry count means "see the ZIP64 record".
const MAX_MEMBERS: usize = u16::MAX as usize - 1;

/// Narrow a size or offset to 32 bits, refusing 0xFFFFFFFF which readers
/// take as a pointer to ZIP64 fields this writer never emits.
fn below_zip64_marker(value: usize) -> Option<u32> {
    u32::try_from(value).ok().filter(|&v| v < u32::MAX)
}

/// Options controlling member compression.
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    /// Store every member uncompressed.
    pub store: bool,
    /// DEFLATE level, 0-9.
    pub level: u32,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            store: false,
            level: 6,
        }
    }
}

/// Incremental ZIP writer over an owned buffer.
///
/// ```
/// use zipdir::zip::{WriteOptions, ZipWriter};
///
/// let mut writer = ZipWriter::new(WriteOptions::default());
/// writer.add("readme.txt", b"hello")?;
/// let archive: Vec<u8> = writer.finish()?;
/// assert!(archive.starts_with(b"PK\x03\x04"));
/// # Ok::<(), zipdir::Error>(())
/// ```
pub struct ZipWriter {
    options: WriteOptions,
    buf: Vec<u8>,
    central: Vec<(MemberHeader, u32)>,
    names: HashSet<String>,
}

impl ZipWriter {
    pub fn new(options: WriteOptions) -> Self {
        Self {
            options,
            buf: Vec::new(),
            central: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// Add one member named `name` whose full content is `data`.
    pub fn add(&mut self, name: &str, data: &[u8]) -> Result<()> {
        validate_name(name).map_err(|reason| Error::write(name, reason))?;
        if self.names.contains(name) {
            return Err(Error::write(name, "duplicate member name"));
        }
        if self.central.len() >= MAX_MEMBERS {
            return Err(Error::write(name, "too many members for a ZIP archive without ZIP64"));
        }

        let uncompressed_size =
            below_zip64_marker(data.len()).ok_or_else(|| Error::write(name, "member larger than 4 GiB"))?;
        let lfh_offset = below_zip64_marker(self.buf.len())
            .ok_or_else(|| Error::write(name, "archive larger than 4 GiB"))?;

        let mut crc = Crc::new();
        crc.update(data);

        let deflated = if self.options.store {
            None
        } else {
            let level = Compression::new(self.options.level.min(9));
            let compress_failed = |e: std::io::Error| Error::write(name, format!("compression failed: {e}"));
            let mut encoder = DeflateEncoder::new(Vec::new(), level);
            encoder.write_all(data).map_err(compress_failed)?;
            Some(encoder.finish().map_err(compress_failed)?)
        };

        // Fall back to storing when deflate does not pay off
        let (method, payload) = match deflated {
            Some(ref compressed) if compressed.len() < data.len() => {
                (CompressionMethod::Deflate, compressed.as_slice())
            }
            _ => (CompressionMethod::Stored, data),
        };

        let header = MemberHeader {
            file_name: name.to_string(),
            flags: if name.is_ascii() { 0 } else { FLAG_UTF8 },
            compression_method: method,
            crc32: crc.sum(),
            compressed_size: below_zip64_marker(payload.len())
                .ok_or_else(|| Error::write(name, "member larger than 4 GiB"))?,
            uncompressed_size,
        };

        header
            .write_local(&mut self.buf)
            .map_err(|e| Error::write(name, e.to_string()))?;
        self.buf.extend_from_slice(payload);

        debug!(
            name,
            method = ?method,
            size = data.len(),
            compressed = payload.len(),
            "added member"
        );

        self.names.insert(name.to_string());
        self.central.push((header, lfh_offset));
        Ok(())
    }

    /// Number of members added so far.
    pub fn len(&self) -> usize {
        self.central.len()
    }

    pub fn is_empty(&self) -> bool {
        self.central.is_empty()
    }

    /// Write the central directory and EOCD, returning the complete archive.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let cd_offset = self.buf.len();
        for (header, lfh_offset) in &self.central {
            header
                .write_central(*lfh_offset, &mut self.buf)
                .map_err(|e| Error::write(&header.file_name, e.to_string()))?;
        }
        let cd_size = self.buf.len() - cd_offset;

        let too_large = || Error::write("<central directory>", "archive larger than 4 GiB");
        let entries = u16::try_from(self.central.len())
            .ok()
            .filter(|&n| n < u16::MAX)
            .ok_or_else(|| Error::write("<central directory>", "too many members"))?;
        let eocd = EndOfCentralDirectory {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: entries,
            total_entries: entries,
            cd_size: below_zip64_marker(cd_size).ok_or_else(too_large)?,
            cd_offset: below_zip64_marker(cd_offset).ok_or_else(too_large)?,
            comment_len: 0,
        };
        eocd.write_to(&mut self.buf)
            .map_err(|e| Error::write("<end of central directory>", e.to_string()))?;

        Ok(self.buf)
    }
}

/// Serialize `entries` into a complete ZIP archive.
pub fn write_archive(entries: &[Entry], options: &WriteOptions) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(*options);
    for entry in entries {
        writer.add(&entry.name, &entry.data)?;
    }
    let archive = writer.finish()?;
    debug!(members = entries.len(), bytes = archive.len(), "wrote archive");
    Ok(archive)
}
