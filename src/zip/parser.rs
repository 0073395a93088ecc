//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP file structures from an
//! in-memory archive buffer.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the buffer's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory to get metadata for all members
//! 4. For extraction, read each member's Local File Header to locate its data
//!
//! Every offset and length taken from the archive is bounds-checked against
//! the buffer, so a corrupt or hostile archive yields an error, never a panic.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use crate::error::{Error, Result};

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: usize = 65535;

/// Low-level ZIP parser over a borrowed archive buffer.
///
/// Typically used through [`ZipReader`](super::ZipReader) rather than directly.
pub struct ZipParser<'a> {
    data: &'a [u8],
}

impl<'a> ZipParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Borrow `len` bytes at `offset`, failing if the range leaves the buffer.
    fn slice(&self, offset: u64, len: u64, what: &str) -> Result<&'a [u8]> {
        let data: &'a [u8] = self.data;
        let start = usize::try_from(offset).ok();
        let end = offset.checked_add(len).and_then(|end| usize::try_from(end).ok());
        match (start, end) {
            (Some(start), Some(end)) if end <= data.len() => Ok(&data[start..end]),
            _ => Err(Error::parse(format!("{what} extends past end of archive"))),
        }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Handles both the simple case (no comment) and archives with
    /// comments by searching backwards for the signature.
    ///
    /// Returns the EOCD record and its offset in the buffer.
    pub fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        let size = self.data.len();
        if size < EndOfCentralDirectory::SIZE {
            return Err(Error::parse("too short to be a ZIP archive"));
        }

        // Common case: no comment, EOCD is the last 22 bytes
        let offset = size - EndOfCentralDirectory::SIZE;
        let tail = &self.data[offset..];
        if &tail[0..4] == EndOfCentralDirectory::SIGNATURE && tail[20..22] == [0, 0] {
            let eocd = EndOfCentralDirectory::from_bytes(tail)?;
            return Ok((eocd, offset as u64));
        }

        // Search backwards, the comment length must match the remaining bytes
        let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE).min(size);
        let search_start = size - search_size;
        let buf = &self.data[search_start..];

        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;

                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd = EndOfCentralDirectory::from_bytes(
                        &buf[i..i + EndOfCentralDirectory::SIZE],
                    )?;
                    return Ok((eocd, (search_start + i) as u64));
                }
            }
        }

        Err(Error::parse("end of central directory not found"))
    }

    /// Read the ZIP64 End of Central Directory record.
    ///
    /// Called when the regular EOCD indicates ZIP64 extensions are needed
    /// (fields set to 0xFFFF or 0xFFFFFFFF).
    pub fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD> {
        // The locator sits immediately before the regular EOCD
        let locator_offset = eocd_offset
            .checked_sub(Zip64EOCDLocator::SIZE as u64)
            .ok_or_else(|| Error::parse("missing ZIP64 end of central directory locator"))?;
        let locator = Zip64EOCDLocator::from_bytes(self.slice(
            locator_offset,
            Zip64EOCDLocator::SIZE as u64,
            "ZIP64 locator",
        )?)?;

        Zip64EOCD::from_bytes(self.slice(
            locator.eocd64_offset,
            Zip64EOCD::MIN_SIZE as u64,
            "ZIP64 end of central directory",
        )?)
    }

    /// List all members of the archive, in central directory order.
    pub fn list_members(&self) -> Result<Vec<MemberInfo>> {
        let (eocd, eocd_offset) = self.find_eocd()?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset)?;
            if eocd64.disk_number != 0 || eocd64.disk_with_cd != 0 {
                return Err(Error::parse("multi-disk archives are not supported"));
            }
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            if eocd.is_multi_disk() {
                return Err(Error::parse("multi-disk archives are not supported"));
            }
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        let cd_data = self.slice(cd_offset, cd_size, "central directory")?;

        // Each record takes at least CDFH_MIN_SIZE bytes, which bounds the
        // preallocation for a lying entry count
        if total_entries > (cd_data.len() / CDFH_MIN_SIZE) as u64 {
            return Err(Error::parse("central directory entry count exceeds its size"));
        }

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut cursor = Cursor::new(cd_data);

        for _ in 0..total_entries {
            entries.push(self.parse_cdfh(&mut cursor)?);
        }

        Ok(entries)
    }

    /// Parse a Central Directory File Header from a cursor.
    fn parse_cdfh(&self, cursor: &mut Cursor<&[u8]>) -> Result<MemberInfo> {
        let mut sig = [0u8; 4];
        cursor.read_exact(&mut sig).map_err(truncated)?;
        if sig != CDFH_SIGNATURE {
            return Err(Error::parse("invalid central directory file header"));
        }

        let _version_made_by = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let _version_needed = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let flags = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let compression_method = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let _last_mod_time = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let _last_mod_date = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let crc32 = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
        let mut compressed_size = cursor.read_u32::<LittleEndian>().map_err(truncated)? as u64;
        let mut uncompressed_size = cursor.read_u32::<LittleEndian>().map_err(truncated)? as u64;
        let file_name_length = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let extra_field_length = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let file_comment_length = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let _disk_number_start = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let _internal_attrs = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let _external_attrs = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
        let mut lfh_offset = cursor.read_u32::<LittleEndian>().map_err(truncated)? as u64;

        let mut file_name_bytes = vec![0u8; file_name_length as usize];
        cursor.read_exact(&mut file_name_bytes).map_err(truncated)?;
        let file_name = decode_file_name(&file_name_bytes, flags)?;

        // Directory entries end with '/'
        let is_directory = file_name.ends_with('/');

        // ZIP64 extended information lives in extra field 0x0001
        let extra_field_end = cursor.position() + extra_field_length as u64;
        if extra_field_end > cursor.get_ref().len() as u64 {
            return Err(Error::parse_member(file_name, "extra field extends past central directory"));
        }

        while cursor.position() + 4 <= extra_field_end {
            let header_id = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
            let field_size = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
            let field_end = (cursor.position() + field_size as u64).min(extra_field_end);

            if header_id == 0x0001 {
                // Fields are present only if the header field is 0xFFFFFFFF
                if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    uncompressed_size = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
                }
                if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    compressed_size = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
                }
                if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    lfh_offset = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
                }
            }
            cursor.set_position(field_end);
        }

        cursor.set_position(extra_field_end);

        // Skip over the file comment
        let comment_end = cursor.position() + file_comment_length as u64;
        if comment_end > cursor.get_ref().len() as u64 {
            return Err(Error::parse_member(file_name, "comment extends past central directory"));
        }
        cursor.set_position(comment_end);

        Ok(MemberInfo {
            file_name,
            flags,
            compression_method: CompressionMethod::from_u16(compression_method),
            compressed_size,
            uncompressed_size,
            crc32,
            lfh_offset,
            is_directory,
        })
    }

    /// Get the offset at which a member's (possibly compressed) data begins.
    ///
    /// The Local File Header has variable-length fields (filename, extra
    /// field) that may differ from the Central Directory entry, so the LFH
    /// itself is read to calculate where the data starts.
    pub fn data_offset(&self, member: &MemberInfo) -> Result<u64> {
        let lfh = self
            .slice(member.lfh_offset, LFH_SIZE as u64, "local file header")
            .map_err(|e| Error::parse_member(&member.file_name, e.to_string()))?;

        if &lfh[0..4] != LFH_SIGNATURE {
            return Err(Error::parse_member(&member.file_name, "invalid local file header"));
        }

        let file_name_length = u16::from_le_bytes([lfh[26], lfh[27]]) as u64;
        let extra_field_length = u16::from_le_bytes([lfh[28], lfh[29]]) as u64;

        Ok(member.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    /// Borrow the raw (possibly compressed) bytes of a member.
    pub fn raw_data(&self, member: &MemberInfo) -> Result<&'a [u8]> {
        let offset = self.data_offset(member)?;
        self.slice(offset, member.compressed_size, "member data")
            .map_err(|e| Error::parse_member(&member.file_name, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_archive() -> Vec<u8> {
        let mut buf = Vec::new();
        EndOfCentralDirectory {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: 0,
            total_entries: 0,
            cd_size: 0,
            cd_offset: 0,
            comment_len: 0,
        }
        .write_to(&mut buf)
        .unwrap();
        buf
    }

    #[test]
    fn test_empty_archive_has_no_members() {
        let data = empty_archive();
        assert!(ZipParser::new(&data).list_members().unwrap().is_empty());
    }

    #[test]
    fn test_eocd_found_behind_comment() {
        let mut data = empty_archive();
        let comment = b"made by hand";
        data[20..22].copy_from_slice(&(comment.len() as u16).to_le_bytes());
        data.extend_from_slice(comment);

        let (_, offset) = ZipParser::new(&data).find_eocd().unwrap();
        assert_eq!(offset, 0);
    }

    #[test]
    fn test_garbage_is_rejected() {
        let garbage: [&[u8]; 4] = [
            b"",
            b"PK",
            &[0xAB; 100],
            b"PK\x03\x04not really a zip file at all",
        ];
        for data in garbage {
            assert!(matches!(
                ZipParser::new(data).list_members(),
                Err(Error::ArchiveParse { .. })
            ));
        }
    }

    #[test]
    fn test_central_directory_out_of_range() {
        let mut data = empty_archive();
        // one entry, 46 byte directory at offset 1000
        data[8..10].copy_from_slice(&1u16.to_le_bytes());
        data[10..12].copy_from_slice(&1u16.to_le_bytes());
        data[12..16].copy_from_slice(&46u32.to_le_bytes());
        data[16..20].copy_from_slice(&1000u32.to_le_bytes());

        let err = ZipParser::new(&data).list_members().unwrap_err();
        assert!(err.to_string().contains("central directory"));
    }

    #[test]
    fn test_lying_entry_count_rejected() {
        let mut data = vec![0u8; 10];
        let mut eocd = empty_archive();
        eocd[8..10].copy_from_slice(&500u16.to_le_bytes());
        eocd[10..12].copy_from_slice(&500u16.to_le_bytes());
        eocd[12..16].copy_from_slice(&10u32.to_le_bytes());
        data.extend_from_slice(&eocd);

        assert!(ZipParser::new(&data).list_members().is_err());
    }
}
