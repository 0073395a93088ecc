use std::collections::HashSet;
use std::io::Read;

use flate2::Crc;
use flate2::read::DeflateDecoder;
use tracing::debug;

use crate::entry::{Entry, validate_name};
use crate::error::{Error, Result};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, MemberInfo};

/// ZIP archive reader over an in-memory buffer.
pub struct ZipReader<'a> {
    parser: ZipParser<'a>,
}

impl<'a> ZipReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            parser: ZipParser::new(data),
        }
    }

    /// List all members of the archive, directories included.
    pub fn list_members(&self) -> Result<Vec<MemberInfo>> {
        self.parser.list_members()
    }

    /// Decompress one member fully into memory and verify its size and CRC-32.
    pub fn read_member(&self, member: &MemberInfo) -> Result<Vec<u8>> {
        let corrupt = |reason: String| Error::parse_member(&member.file_name, reason);

        if member.is_encrypted() {
            return Err(corrupt("encrypted members are not supported".into()));
        }

        let raw = self.parser.raw_data(member)?;
        let expected = usize::try_from(member.uncompressed_size)
            .map_err(|_| corrupt("member too large for this platform".into()))?;

        let data = match member.compression_method {
            CompressionMethod::Stored => raw.to_vec(),
            CompressionMethod::Deflate => {
                // Cap capacity and output by the declared size so a
                // lying header cannot inflate without bound
                let mut data = Vec::with_capacity(expected.min(raw.len().saturating_mul(4)));
                DeflateDecoder::new(raw)
                    .take(member.uncompressed_size.saturating_add(1))
                    .read_to_end(&mut data)
                    .map_err(|e| corrupt(format!("decompression failed: {e}")))?;
                data
            }
            CompressionMethod::Unknown(method) => {
                return Err(corrupt(format!("unsupported compression method {method}")));
            }
        };

        if data.len() != expected {
            return Err(corrupt(format!(
                "size mismatch: expected {expected} bytes, got {}",
                data.len()
            )));
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != member.crc32 {
            return Err(corrupt("CRC-32 mismatch".into()));
        }

        Ok(data)
    }
}

/// Parse a ZIP buffer into its file entries, in central directory order.
///
/// Directory members are skipped. Member names must be safe relative paths
/// and unique within the archive.
pub fn read_archive(data: &[u8]) -> Result<Vec<Entry>> {
    let reader = ZipReader::new(data);
    let members = reader.list_members()?;

    let mut names = HashSet::with_capacity(members.len());
    let mut entries = Vec::with_capacity(members.len());

    for member in &members {
        if member.is_directory {
            debug!(name = %member.file_name, "skipping directory member");
            continue;
        }
        validate_name(&member.file_name)
            .map_err(|reason| Error::parse_member(&member.file_name, format!("unsafe name: {reason}")))?;
        if !names.insert(member.file_name.as_str()) {
            return Err(Error::parse_member(&member.file_name, "duplicate member name"));
        }

        let data = reader.read_member(member)?;
        debug!(name = %member.file_name, size = data.len(), "read member");
        entries.push(Entry::new(member.file_name.clone(), data));
    }

    Ok(entries)
}
