//! Low-level archive parser.
//!
//! This module handles the binary parsing of archive structures,
//! reading from any source that implements the [`ReadAt`] trait.
//!
//! ## Parsing Strategy
//!
//! Archives are read from the front:
//! 1. Read the fixed 172-byte header at offset 0
//! 2. Validate the central directory range against the declared archive
//!    size and the real source length
//! 3. Read the central directory header, then all three record arrays in
//!    one request
//!
//! Payloads are only touched later, when a sub-file is opened.

use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result, alloc_buffer};
use crate::io::ReadAt;

use super::directory::CentralDirectory;
use super::structures::{ArchiveHeader, CentralDirectoryHeader};

/// Low-level archive parser.
///
/// Generic over the reader type so archives can come from local files or
/// memory.
///
/// ## Usage
///
/// Typically used through [`Archive`](super::Archive) rather than directly.
///
/// ## Example
///
/// ```ignore
/// let parser = ArchiveParser::new(reader);
/// let header = parser.read_header()?;
/// let directory = parser.read_central_directory(&header)?;
/// ```
pub struct ArchiveParser<R: ReadAt> {
    /// The underlying data source
    reader: Arc<R>,
    /// Total size of the source in bytes
    size: u64,
}

impl<R: ReadAt> ArchiveParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Read and validate the archive header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if the magic is wrong or the central
    /// directory does not fit inside the archive.
    pub fn read_header(&self) -> Result<ArchiveHeader> {
        if self.size < ArchiveHeader::SIZE as u64 {
            return Err(Error::Format(format!(
                "file is {} bytes, too small for an archive header",
                self.size
            )));
        }

        let mut buf = [0u8; ArchiveHeader::SIZE];
        self.reader.read_at(0, &mut buf)?;

        let header = ArchiveHeader::from_bytes(&buf)?;
        header.validate(self.size)?;

        debug!(
            "Archive header: central directory at {} ({} bytes), archive size {}",
            header.central_dir_offset, header.central_dir_size, header.archive_size
        );

        Ok(header)
    }

    /// Load the central directory described by `header`.
    ///
    /// The three record arrays are fetched with a single read into one
    /// buffer.
    pub fn read_central_directory(&self, header: &ArchiveHeader) -> Result<CentralDirectory> {
        let cd_header_end = header
            .central_dir_offset
            .checked_add(CentralDirectoryHeader::SIZE as u64)
            .filter(|&end| end <= self.size);
        if cd_header_end.is_none() {
            return Err(Error::Format(format!(
                "central directory header at {} runs past end of file ({} bytes)",
                header.central_dir_offset, self.size
            )));
        }

        let mut buf = [0u8; CentralDirectoryHeader::SIZE];
        self.reader.read_at(header.central_dir_offset, &mut buf)?;
        let cd_header = CentralDirectoryHeader::from_bytes(&buf)?;

        let records_len = cd_header
            .records_len()
            .ok_or_else(|| Error::Format("central directory record counts overflow".into()))?;
        let records_offset = header.central_dir_offset + CentralDirectoryHeader::SIZE as u64;
        let records_end = records_offset
            .checked_add(records_len)
            .filter(|&end| end <= self.size)
            .ok_or_else(|| {
                Error::Format(format!(
                    "central directory records ({records_len} bytes at {records_offset}) run past end of file"
                ))
            })?;

        if records_end - header.central_dir_offset > header.central_dir_size {
            debug!(
                "Central directory records extend {} bytes past the declared directory size",
                records_end - header.central_dir_offset - header.central_dir_size
            );
        }

        let payload = self.read_range(records_offset, records_len)?;

        debug!(
            "Central directory: {} files, {} data specs, {} opaque records",
            cd_header.file_count, cd_header.data_spec_count, cd_header.opaque_count
        );

        CentralDirectory::from_parts(cd_header, payload)
    }

    /// Read `len` bytes at `offset` into a freshly allocated buffer.
    pub fn read_range(&self, offset: u64, len: u64) -> Result<Vec<u8>> {
        let len = usize::try_from(len).map_err(|_| Error::OutOfMemory(usize::MAX))?;
        let mut buf = alloc_buffer(len)?;
        self.reader.read_at(offset, &mut buf)?;
        Ok(buf)
    }

    /// Total size of the underlying source.
    pub fn size(&self) -> u64 {
        self.size
    }
}
