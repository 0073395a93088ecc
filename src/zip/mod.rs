//! ZIP container encoding and decoding.
//!
//! ## Architecture
//!
//! - [`structures`]: record layouts (EOCD, file headers, ...) with their encoders and decoders
//! - [`parser`]: low-level parsing of ZIP structures from an archive buffer
//! - [`reader`]: decoding members into [`Entry`](crate::Entry) records
//! - [`writer`]: encoding [`Entry`](crate::Entry) records into an archive buffer
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions when reading
//! - STORED (no compression) and DEFLATE methods
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - Written archives are limited to 65535 members and 4 GiB

mod parser;
mod reader;
mod structures;
mod writer;

pub use parser::ZipParser;
pub use reader::{ZipReader, read_archive};
pub use structures::*;
pub use writer::{WriteOptions, ZipWriter, write_archive};
