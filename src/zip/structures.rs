use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor, Write};

use crate::error::{Error, Result};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// General purpose flag: member is encrypted.
pub const FLAG_ENCRYPTED: u16 = 1 << 0;
/// General purpose flag: file name is UTF-8.
pub const FLAG_UTF8: u16 = 1 << 11;

/// Version 2.0: DEFLATE, folders.
pub const VERSION_NEEDED: u16 = 20;
/// Upper byte 0 (MS-DOS attributes), lower byte the spec version.
pub const VERSION_MADE_BY: u16 = 20;

/// 1980-01-01 00:00:00, the earliest DOS timestamp.
pub const DOS_EPOCH_DATE: u16 = (1 << 5) | 1;
pub const DOS_EPOCH_TIME: u16 = 0;

pub(crate) fn truncated(_: io::Error) -> Error {
    Error::parse("truncated record")
}

/// CP437 characters for bytes 0x80..=0xFF; the low half is ASCII.
const CP437_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å',
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ',
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»',
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐',
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧',
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀',
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩',
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{a0}',
];

/// Decode a member name: UTF-8 when flag bit 11 is set, otherwise CP437,
/// the legacy ZIP encoding. CP437 maps every byte to a distinct character,
/// so distinct raw names stay distinct.
pub fn decode_file_name(raw: &[u8], flags: u16) -> Result<String> {
    if flags & FLAG_UTF8 != 0 {
        return String::from_utf8(raw.to_vec())
            .map_err(|_| Error::parse(format!("file name {} is not valid UTF-8", String::from_utf8_lossy(raw))));
    }
    Ok(raw
        .iter()
        .map(|&b| if b < 0x80 { b as char } else { CP437_HIGH[(b - 0x80) as usize] })
        .collect())
}

/// End of Central Directory (EOCD) - 22 bytes minimum
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(Error::parse("invalid end of central directory"));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>().map_err(truncated)?,
            disk_with_cd: cursor.read_u16::<LittleEndian>().map_err(truncated)?,
            disk_entries: cursor.read_u16::<LittleEndian>().map_err(truncated)?,
            total_entries: cursor.read_u16::<LittleEndian>().map_err(truncated)?,
            cd_size: cursor.read_u32::<LittleEndian>().map_err(truncated)?,
            cd_offset: cursor.read_u32::<LittleEndian>().map_err(truncated)?,
            comment_len: cursor.read_u16::<LittleEndian>().map_err(truncated)?,
        })
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(Self::SIGNATURE)?;
        out.write_u16::<LittleEndian>(self.disk_number)?;
        out.write_u16::<LittleEndian>(self.disk_with_cd)?;
        out.write_u16::<LittleEndian>(self.disk_entries)?;
        out.write_u16::<LittleEndian>(self.total_entries)?;
        out.write_u32::<LittleEndian>(self.cd_size)?;
        out.write_u32::<LittleEndian>(self.cd_offset)?;
        out.write_u16::<LittleEndian>(self.comment_len)
    }

    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }

    pub fn is_multi_disk(&self) -> bool {
        self.disk_number != 0 || self.disk_with_cd != 0 || self.disk_entries != self.total_entries
    }
}

/// ZIP64 End of Central Directory Locator - 20 bytes
pub struct Zip64EOCDLocator {
    pub disk_with_eocd64: u32,
    pub eocd64_offset: u64,
    pub total_disks: u32,
}

impl Zip64EOCDLocator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(Error::parse("invalid ZIP64 end of central directory locator"));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_with_eocd64: cursor.read_u32::<LittleEndian>().map_err(truncated)?,
            eocd64_offset: cursor.read_u64::<LittleEndian>().map_err(truncated)?,
            total_disks: cursor.read_u32::<LittleEndian>().map_err(truncated)?,
        })
    }
}

/// ZIP64 End of Central Directory - 56 bytes minimum
pub struct Zip64EOCD {
    pub eocd64_size: u64,
    pub version_made_by: u16,
    pub version_needed: u16,
    pub disk_number: u32,
    pub disk_with_cd: u32,
    pub disk_entries: u64,
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EOCD {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(Error::parse("invalid ZIP64 end of central directory"));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            eocd64_size: cursor.read_u64::<LittleEndian>().map_err(truncated)?,
            version_made_by: cursor.read_u16::<LittleEndian>().map_err(truncated)?,
            version_needed: cursor.read_u16::<LittleEndian>().map_err(truncated)?,
            disk_number: cursor.read_u32::<LittleEndian>().map_err(truncated)?,
            disk_with_cd: cursor.read_u32::<LittleEndian>().map_err(truncated)?,
            disk_entries: cursor.read_u64::<LittleEndian>().map_err(truncated)?,
            total_entries: cursor.read_u64::<LittleEndian>().map_err(truncated)?,
            cd_size: cursor.read_u64::<LittleEndian>().map_err(truncated)?,
            cd_offset: cursor.read_u64::<LittleEndian>().map_err(truncated)?,
        })
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// Header fields shared by the local file header and the central directory
/// record of one member written by this crate.
#[derive(Debug, Clone)]
pub struct MemberHeader {
    pub file_name: String,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

impl MemberHeader {
    fn write_common<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_u16::<LittleEndian>(VERSION_NEEDED)?;
        out.write_u16::<LittleEndian>(self.flags)?;
        out.write_u16::<LittleEndian>(self.compression_method.as_u16())?;
        out.write_u16::<LittleEndian>(DOS_EPOCH_TIME)?;
        out.write_u16::<LittleEndian>(DOS_EPOCH_DATE)?;
        out.write_u32::<LittleEndian>(self.crc32)?;
        out.write_u32::<LittleEndian>(self.compressed_size)?;
        out.write_u32::<LittleEndian>(self.uncompressed_size)?;
        out.write_u16::<LittleEndian>(self.name_len()?)?;
        // no extra field
        out.write_u16::<LittleEndian>(0)
    }

    fn name_len(&self) -> io::Result<u16> {
        u16::try_from(self.file_name.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "file name too long"))
    }

    /// Encode the local file header that precedes the member data.
    pub fn write_local<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(LFH_SIGNATURE)?;
        self.write_common(out)?;
        out.write_all(self.file_name.as_bytes())
    }

    /// Encode the central directory record pointing at `lfh_offset`.
    pub fn write_central<W: Write>(&self, lfh_offset: u32, out: &mut W) -> io::Result<()> {
        out.write_all(CDFH_SIGNATURE)?;
        out.write_u16::<LittleEndian>(VERSION_MADE_BY)?;
        self.write_common(out)?;
        // comment length, disk number start, internal attributes
        out.write_u16::<LittleEndian>(0)?;
        out.write_u16::<LittleEndian>(0)?;
        out.write_u16::<LittleEndian>(0)?;
        // external attributes
        out.write_u32::<LittleEndian>(0)?;
        out.write_u32::<LittleEndian>(lfh_offset)?;
        out.write_all(self.file_name.as_bytes())
    }
}

/// Member metadata as recorded in the central directory.
#[derive(Debug, Clone)]
pub struct MemberInfo {
    pub file_name: String,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub is_directory: bool,
}

impl MemberInfo {
    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eocd_layout() {
        let eocd = EndOfCentralDirectory {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: 2,
            total_entries: 2,
            cd_size: 0x60,
            cd_offset: 0x1234,
            comment_len: 0,
        };
        let mut buf = Vec::new();
        eocd.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), EndOfCentralDirectory::SIZE);
        assert_eq!(&buf[0..4], EndOfCentralDirectory::SIGNATURE);
        assert_eq!(&buf[16..20], &0x1234u32.to_le_bytes());

        let parsed = EndOfCentralDirectory::from_bytes(&buf).unwrap();
        assert_eq!(parsed.total_entries, 2);
        assert!(!parsed.is_zip64());
        assert!(!parsed.is_multi_disk());
    }

    #[test]
    fn test_local_header_layout() {
        let header = MemberHeader {
            file_name: "a/b.txt".into(),
            flags: 0,
            compression_method: CompressionMethod::Deflate,
            crc32: 0xDEADBEEF,
            compressed_size: 3,
            uncompressed_size: 5,
        };
        let mut buf = Vec::new();
        header.write_local(&mut buf).unwrap();
        assert_eq!(buf.len(), LFH_SIZE + 7);
        assert_eq!(&buf[0..4], LFH_SIGNATURE);
        assert_eq!(&buf[8..10], &8u16.to_le_bytes());
        assert_eq!(&buf[14..18], &0xDEADBEEFu32.to_le_bytes());
        assert_eq!(&buf[26..28], &7u16.to_le_bytes());
        assert_eq!(&buf[LFH_SIZE..], b"a/b.txt");

        let mut central = Vec::new();
        header.write_central(0x40, &mut central).unwrap();
        assert_eq!(central.len(), CDFH_MIN_SIZE + 7);
        assert_eq!(&central[42..46], &0x40u32.to_le_bytes());
    }

    #[test]
    fn test_file_name_decoding() {
        assert_eq!(decode_file_name(b"plain/ascii.txt", 0).unwrap(), "plain/ascii.txt");
        // 0x82 and 0x81 are e-acute and u-umlaut in CP437
        assert_eq!(decode_file_name(b"caf\x82.txt", 0).unwrap(), "café.txt");
        assert_ne!(
            decode_file_name(b"\x81.txt", 0).unwrap(),
            decode_file_name(b"\x82.txt", 0).unwrap()
        );
        assert_eq!(decode_file_name("café.txt".as_bytes(), FLAG_UTF8).unwrap(), "café.txt");
        assert!(decode_file_name(b"bad\xff.txt", FLAG_UTF8).is_err());
    }

    #[test]
    fn test_truncated_eocd_rejected() {
        assert!(EndOfCentralDirectory::from_bytes(b"PK\x05\x06\x00").is_err());
        assert!(Zip64EOCD::from_bytes(&[0u8; 10]).is_err());
    }
}
