use std::io::SeekFrom;

use crate::audio::{AudioRehoster, AudioResult};
use crate::error::{Error, Result};

/// A fully materialized sub-file with a read cursor.
///
/// The cursor always stays within `[0, len]`. Reads and seeks that would
/// leave that range fail with [`Error::InvalidArguments`] and leave the
/// cursor untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    data: Vec<u8>,
    cursor: u64,
}

impl ExtractedFile {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, cursor: 0 }
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn position(&self) -> u64 {
        self.cursor
    }

    pub fn is_eof(&self) -> bool {
        self.cursor == self.len()
    }

    /// Fill `buf` from the cursor and advance past it.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        let remaining = self.len() - self.cursor;
        if buf.len() as u64 > remaining {
            return Err(Error::InvalidArguments(format!(
                "read of {} bytes with {remaining} remaining",
                buf.len()
            )));
        }

        let start = self.cursor as usize;
        buf.copy_from_slice(&self.data[start..start + buf.len()]);
        self.cursor += buf.len() as u64;
        Ok(())
    }

    /// Read exactly `n` bytes into a new buffer.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let remaining = self.len() - self.cursor;
        if n as u64 > remaining {
            return Err(Error::InvalidArguments(format!(
                "read of {n} bytes with {remaining} remaining"
            )));
        }

        let mut buf = vec![0u8; n];
        self.read(&mut buf)?;
        Ok(buf)
    }

    /// Move the cursor. `SeekFrom::End(n)` targets `len + n`.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => i128::from(self.cursor) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(self.len()) + i128::from(delta),
        };

        if target < 0 || target > i128::from(self.len()) {
            return Err(Error::InvalidArguments(format!(
                "seek to {target} outside [0, {}]",
                self.len()
            )));
        }

        self.cursor = target as u64;
        Ok(self.cursor)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Rehost the buffer as standalone audio using the WAV encoder.
    ///
    /// The cursor is not used or moved.
    pub fn extract_audio(&self) -> Result<AudioResult> {
        AudioRehoster::new().rehost(&self.data)
    }
}
