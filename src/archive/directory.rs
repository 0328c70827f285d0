//! In-memory central directory.
//!
//! The three record arrays are loaded with a single read into one owned
//! buffer. Each array is a view (offset + count) into that buffer and
//! records are decoded on access by index.

use std::cmp::Ordering;

use tracing::warn;

use crate::error::{Error, Result};

use super::structures::{
    CentralDirectoryHeader, DataSpecRecord, FileRecord, OpaqueRecord,
};

#[derive(Debug, Clone, Copy)]
struct RecordView {
    offset: usize,
    count: usize,
    stride: usize,
}

impl RecordView {
    fn bytes<'a>(&self, payload: &'a [u8], index: usize) -> Option<&'a [u8]> {
        if index >= self.count {
            return None;
        }
        let start = self.offset + index * self.stride;
        payload.get(start..start + self.stride)
    }

    fn end(&self) -> usize {
        self.offset + self.count * self.stride
    }
}

/// Immutable index of file, data spec and opaque records
#[derive(Debug)]
pub struct CentralDirectory {
    header: CentralDirectoryHeader,
    payload: Vec<u8>,
    files: RecordView,
    data_specs: RecordView,
    opaque: RecordView,
    sorted: bool,
}

impl CentralDirectory {
    /// Build the directory from its header and the raw record arrays.
    ///
    /// `payload` must hold exactly the three arrays, back to back.
    pub fn from_parts(header: CentralDirectoryHeader, payload: Vec<u8>) -> Result<Self> {
        let expected = header
            .records_len()
            .ok_or_else(|| Error::Format("central directory record counts overflow".into()))?;
        if payload.len() as u64 != expected {
            return Err(Error::Format(format!(
                "central directory payload is {} bytes, records need {expected}",
                payload.len()
            )));
        }

        let files = RecordView {
            offset: 0,
            count: header.file_count as usize,
            stride: FileRecord::SIZE,
        };
        let data_specs = RecordView {
            offset: files.end(),
            count: header.data_spec_count as usize,
            stride: DataSpecRecord::SIZE,
        };
        let opaque = RecordView {
            offset: data_specs.end(),
            count: header.opaque_count as usize,
            stride: OpaqueRecord::SIZE,
        };

        let mut directory = Self {
            header,
            payload,
            files,
            data_specs,
            opaque,
            sorted: true,
        };

        let sorted = (1..directory.file_count())
            .all(|i| directory.hash_at(i - 1) <= directory.hash_at(i));
        directory.sorted = sorted;
        if !sorted {
            warn!("file records are not in hash order, lookups fall back to a linear scan");
        }

        Ok(directory)
    }

    pub fn header(&self) -> &CentralDirectoryHeader {
        &self.header
    }

    pub fn file_count(&self) -> usize {
        self.files.count
    }

    pub fn data_spec_count(&self) -> usize {
        self.data_specs.count
    }

    pub fn opaque_count(&self) -> usize {
        self.opaque.count
    }

    pub fn file_at(&self, index: usize) -> Option<FileRecord> {
        self.files
            .bytes(&self.payload, index)
            .and_then(|b| FileRecord::from_bytes(b).ok())
    }

    pub fn data_spec_at(&self, index: usize) -> Option<DataSpecRecord> {
        self.data_specs
            .bytes(&self.payload, index)
            .and_then(|b| DataSpecRecord::from_bytes(b).ok())
    }

    pub fn opaque_at(&self, index: usize) -> Option<OpaqueRecord> {
        self.opaque
            .bytes(&self.payload, index)
            .and_then(|b| OpaqueRecord::from_bytes(b).ok())
    }

    pub fn files(&self) -> impl Iterator<Item = FileRecord> + '_ {
        (0..self.file_count()).filter_map(|i| self.file_at(i))
    }

    /// Whether the file records are in ascending hash order.
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Find the index of the file record whose hash equals `hash`.
    pub fn find_by_hash(&self, hash: u64) -> Option<usize> {
        if !self.sorted {
            return (0..self.file_count()).find(|&i| self.hash_at(i) == hash);
        }

        let (mut lo, mut hi) = (0, self.file_count());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.hash_at(mid).cmp(&hash) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => return Some(mid),
            }
        }
        None
    }

    // The hash is the first field of a file record.
    fn hash_at(&self, index: usize) -> u64 {
        self.files
            .bytes(&self.payload, index)
            .and_then(|b| b.get(..8))
            .and_then(|b| <[u8; 8]>::try_from(b).ok())
            .map_or(0, u64::from_le_bytes)
    }
}
