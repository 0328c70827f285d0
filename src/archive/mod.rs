//! RDAR archive parsing and extraction.
//!
//! ## Architecture
//!
//! - [`structures`]: fixed-layout binary records (header, directory, file, data spec)
//! - [`directory`]: the in-memory central directory and hash lookup
//! - [`parser`]: low-level reads of the header and directory from a [`ReadAt`](crate::io::ReadAt) source
//! - [`extractor`]: the [`Archive`] handle that opens sub-files
//! - [`file`]: the [`ExtractedFile`] buffer with its read cursor
//!
//! ## Format Overview
//!
//! An archive consists of:
//! 1. A 172-byte header at offset 0 holding the central directory location
//! 2. Payloads, stored raw or as an 8-byte sub-header plus a compressed block
//! 3. The central directory: a 28-byte header followed by 56-byte file
//!    records (sorted by name hash), 16-byte data specs and 8-byte opaque
//!    records
//!
//! A file record owns a contiguous range of data specs; each one is a
//! sub-file. All integers are little-endian.
//!
//! ## Limitations
//!
//! - Read-only
//! - Names are not stored, lookups need the precomputed 64-bit hash
//! - Compressed payloads need an external decompression provider

mod directory;
mod extractor;
mod file;
mod parser;
mod structures;

pub use directory::CentralDirectory;
pub use extractor::{Archive, ArchiveOptions};
pub use file::ExtractedFile;
pub use parser::ArchiveParser;
pub use structures::*;
