//! RIFF chunk primitives and the `fmt ` chunk layout.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Cursor, Read};

use crate::error::{Error, Result};

pub const RIFF_MAGIC: &[u8; 4] = b"RIFF";
pub const WAVE_MAGIC: &[u8; 4] = b"WAVE";
pub const FMT_CHUNK: &[u8; 4] = b"fmt ";
pub const DATA_CHUNK: &[u8; 4] = b"data";

/// Ogg page capture pattern.
pub const OGG_CAPTURE_PATTERN: &[u8; 4] = b"OggS";

pub const WAVE_FORMAT_PCM: u16 = 0x0001;

/// Format tags whose extension uses the vendor layout.
const EXTENSIBLE_TAGS: [u16; 3] = [0xFFFE, 0xFFFF, 0x3040];
/// Extension size of a standard `WAVE_FORMAT_EXTENSIBLE` fmt chunk.
const CANONICAL_EXTENSION_SIZE: u16 = 22;
/// 2 reserved bytes + 32-bit format code.
const VENDOR_EXTENSION_MIN: u16 = 6;
const FMT_BODY_SIZE: u32 = 16;

/// Forward-only reader over a RIFF buffer.
///
/// Running out of bytes is a [`Error::Format`], never a panic.
pub(crate) struct ChunkReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> ChunkReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    pub fn remaining(&self) -> u64 {
        self.cursor.get_ref().len() as u64 - self.cursor.position()
    }

    pub fn read_fourcc(&mut self) -> Result<[u8; 4]> {
        let mut id = [0u8; 4];
        self.cursor.read_exact(&mut id).map_err(truncated)?;
        Ok(id)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.cursor.read_u16::<LittleEndian>().map_err(truncated)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.cursor.read_u32::<LittleEndian>().map_err(truncated)
    }

    /// Skip exactly `n` bytes.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        if n > self.remaining() {
            return Err(Error::Format(format!(
                "cannot skip {n} bytes, {} remaining",
                self.remaining()
            )));
        }
        self.cursor.set_position(self.cursor.position() + n);
        Ok(())
    }

    /// Skip up to `n` bytes, stopping at the end of the buffer.
    pub fn skip_clamped(&mut self, n: u64) {
        let n = n.min(self.remaining());
        self.cursor.set_position(self.cursor.position() + n);
    }

    /// Borrow the next `n` bytes, clamped to what is left, and move past them.
    pub fn take_clamped(&mut self, n: u64) -> &'a [u8] {
        let n = n.min(self.remaining());
        let data: &'a [u8] = *self.cursor.get_ref();
        let start = self.cursor.position() as usize;
        self.cursor.set_position(self.cursor.position() + n);
        &data[start..start + n as usize]
    }
}

fn truncated(err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::Format("RIFF stream truncated".into())
    } else {
        Error::Io(err)
    }
}

/// Decoded `fmt ` chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FmtChunk {
    pub chunk_size: u32,
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub avg_bytes_per_sec: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// Zero when the chunk has no extension.
    pub extension_size: u16,
    /// Format code from the vendor extension, zero otherwise.
    pub custom_format_code: u32,
}

impl FmtChunk {
    /// Read a `fmt ` chunk whose tag has already been consumed, leaving the
    /// reader at the next chunk.
    ///
    /// # Errors
    ///
    /// [`Error::Unsupported`] for the canonical 22-byte extensible layout
    /// and for vendor extensions shorter than 6 bytes.
    pub(crate) fn read(reader: &mut ChunkReader<'_>) -> Result<Self> {
        let chunk_size = reader.read_u32()?;
        if chunk_size < FMT_BODY_SIZE {
            return Err(Error::Format(format!("fmt chunk of {chunk_size} bytes")));
        }

        let mut fmt = Self {
            chunk_size,
            format_tag: reader.read_u16()?,
            channels: reader.read_u16()?,
            sample_rate: reader.read_u32()?,
            avg_bytes_per_sec: reader.read_u32()?,
            block_align: reader.read_u16()?,
            bits_per_sample: reader.read_u16()?,
            extension_size: 0,
            custom_format_code: 0,
        };

        if chunk_size > FMT_BODY_SIZE {
            fmt.extension_size = reader.read_u16()?;
            let ext = fmt.extension_size;

            if EXTENSIBLE_TAGS.contains(&fmt.format_tag) {
                if ext == CANONICAL_EXTENSION_SIZE {
                    return Err(Error::Unsupported(
                        "canonical WAVE_FORMAT_EXTENSIBLE fmt layout".into(),
                    ));
                }
                if ext < VENDOR_EXTENSION_MIN {
                    return Err(Error::Unsupported(format!(
                        "fmt extension size {ext} for format tag {:#06x}",
                        fmt.format_tag
                    )));
                }

                reader.skip(2)?;
                fmt.custom_format_code = reader.read_u32()?;
                reader.skip(u64::from(ext - VENDOR_EXTENSION_MIN))?;
            } else {
                reader.skip(u64::from(ext))?;
            }
        }

        if chunk_size % 2 == 1 {
            reader.skip_clamped(1);
        }

        Ok(fmt)
    }
}
