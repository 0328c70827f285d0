use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::ops::Range;

use crate::error::{Error, Result};

/// Archive header at offset 0 - 172 bytes
#[derive(Debug, Clone)]
pub struct ArchiveHeader {
    pub magic: u32,
    pub reserved0: u32,
    pub central_dir_offset: u64,
    pub central_dir_size: u64,
    pub reserved1: u64,
    pub archive_size: u64,
    /// Never examined; carried as-is.
    pub padding: [u8; 132],
}

impl ArchiveHeader {
    /// `"RDAR"` read as a little-endian u32.
    pub const MAGIC: u32 = 0x5241_4452;
    pub const SIZE: usize = 172;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::Format("archive header truncated".into()));
        }

        let mut cursor = Cursor::new(data);

        let magic = cursor.read_u32::<LittleEndian>()?;
        if magic != Self::MAGIC {
            return Err(Error::Format(format!("bad archive magic {magic:#010x}")));
        }

        let reserved0 = cursor.read_u32::<LittleEndian>()?;
        let central_dir_offset = cursor.read_u64::<LittleEndian>()?;
        let central_dir_size = cursor.read_u64::<LittleEndian>()?;
        let reserved1 = cursor.read_u64::<LittleEndian>()?;
        let archive_size = cursor.read_u64::<LittleEndian>()?;
        let mut padding = [0u8; 132];
        cursor.read_exact(&mut padding)?;

        Ok(Self {
            magic,
            reserved0,
            central_dir_offset,
            central_dir_size,
            reserved1,
            archive_size,
            padding,
        })
    }

    /// Check the central directory lies inside both the declared archive
    /// size and the real length of the underlying source.
    pub fn validate(&self, actual_len: u64) -> Result<()> {
        let end = self
            .central_dir_offset
            .checked_add(self.central_dir_size)
            .ok_or_else(|| Error::Format("central directory range overflows".into()))?;

        if end > self.archive_size {
            return Err(Error::Format(format!(
                "central directory ends at {end}, past declared archive size {}",
                self.archive_size
            )));
        }

        if end > actual_len {
            return Err(Error::Format(format!(
                "central directory ends at {end}, past end of file ({actual_len} bytes)"
            )));
        }

        Ok(())
    }
}

/// Fixed fields at the start of the central directory - 28 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CentralDirectoryHeader {
    pub magic: u32,
    /// Combined size of the sections after `magic` and `size`.
    pub size: u32,
    pub checksum: u64,
    pub file_count: u32,
    pub data_spec_count: u32,
    pub opaque_count: u32,
}

impl CentralDirectoryHeader {
    pub const SIZE: usize = 28;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::Format("central directory header truncated".into()));
        }

        let mut cursor = Cursor::new(data);

        Ok(Self {
            magic: cursor.read_u32::<LittleEndian>()?,
            size: cursor.read_u32::<LittleEndian>()?,
            checksum: cursor.read_u64::<LittleEndian>()?,
            file_count: cursor.read_u32::<LittleEndian>()?,
            data_spec_count: cursor.read_u32::<LittleEndian>()?,
            opaque_count: cursor.read_u32::<LittleEndian>()?,
        })
    }

    /// Byte length of the three record arrays that follow the header.
    pub fn records_len(&self) -> Option<u64> {
        let files = u64::from(self.file_count).checked_mul(FileRecord::SIZE as u64)?;
        let specs = u64::from(self.data_spec_count).checked_mul(DataSpecRecord::SIZE as u64)?;
        let opaque = u64::from(self.opaque_count).checked_mul(OpaqueRecord::SIZE as u64)?;
        files.checked_add(specs)?.checked_add(opaque)
    }
}

/// One named file in the archive - 56 bytes
///
/// A file owns a half-open range of data specs (its sub-files) and a
/// parallel range of opaque records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRecord {
    pub hash: u64,
    /// Looks like a timestamp.
    pub opaque_stamp: [u8; 8],
    /// Looks like a type code.
    pub opaque_kind: [u8; 4],
    pub data_spec_begin: u32,
    pub data_spec_end: u32,
    pub opaque_begin: u32,
    pub opaque_end: u32,
    /// 20 bytes of digest-like data, unverified.
    pub digest: [u8; 20],
}

impl FileRecord {
    pub const SIZE: usize = 56;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::Format("file record truncated".into()));
        }

        let mut cursor = Cursor::new(data);

        let hash = cursor.read_u64::<LittleEndian>()?;
        let mut opaque_stamp = [0u8; 8];
        cursor.read_exact(&mut opaque_stamp)?;
        let mut opaque_kind = [0u8; 4];
        cursor.read_exact(&mut opaque_kind)?;
        let data_spec_begin = cursor.read_u32::<LittleEndian>()?;
        let data_spec_end = cursor.read_u32::<LittleEndian>()?;
        let opaque_begin = cursor.read_u32::<LittleEndian>()?;
        let opaque_end = cursor.read_u32::<LittleEndian>()?;
        let mut digest = [0u8; 20];
        cursor.read_exact(&mut digest)?;

        Ok(Self {
            hash,
            opaque_stamp,
            opaque_kind,
            data_spec_begin,
            data_spec_end,
            opaque_begin,
            opaque_end,
            digest,
        })
    }

    /// Number of sub-files, zero when the range is inverted.
    pub fn subfile_count(&self) -> u32 {
        self.data_spec_end.saturating_sub(self.data_spec_begin)
    }

    pub fn data_spec_range(&self) -> Range<u32> {
        self.data_spec_begin..self.data_spec_end
    }

    pub fn opaque_range(&self) -> Range<u32> {
        self.opaque_begin..self.opaque_end
    }
}

/// Location and sizes of one stored payload - 16 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSpecRecord {
    pub offset: u64,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

impl DataSpecRecord {
    pub const SIZE: usize = 16;

    /// Bytes preceding the payload of a compressed entry.
    pub const COMPRESSED_HEADER_SIZE: usize = 8;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::Format("data spec record truncated".into()));
        }

        let mut cursor = Cursor::new(data);

        Ok(Self {
            offset: cursor.read_u64::<LittleEndian>()?,
            compressed_size: cursor.read_u32::<LittleEndian>()?,
            uncompressed_size: cursor.read_u32::<LittleEndian>()?,
        })
    }

    /// Equal sizes mean the payload is stored raw.
    pub fn is_compressed(&self) -> bool {
        self.compressed_size != self.uncompressed_size
    }

    /// Bytes physically occupied in the archive.
    pub fn stored_size(&self) -> u32 {
        if self.is_compressed() {
            self.compressed_size
        } else {
            self.uncompressed_size
        }
    }
}

/// Uninterpreted 8-byte record from the third directory section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpaqueRecord(pub [u8; 8]);

impl OpaqueRecord {
    pub const SIZE: usize = 8;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let bytes = data
            .get(..Self::SIZE)
            .and_then(|b| <[u8; 8]>::try_from(b).ok())
            .ok_or_else(|| Error::Format("opaque record truncated".into()))?;
        Ok(Self(bytes))
    }
}
