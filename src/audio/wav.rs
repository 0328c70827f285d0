//! Container encoders for rehosted PCM.

use byteorder::{LittleEndian, WriteBytesExt};

use super::riff::{DATA_CHUNK, FMT_CHUNK, RIFF_MAGIC, WAVE_FORMAT_PCM, WAVE_MAGIC};
use crate::error::{Error, Result};

/// Sample layout handed to an encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl PcmFormat {
    /// Bytes per sample frame.
    ///
    /// Returns [`Error::Format`] when the frame does not fit the 16-bit
    /// header field.
    pub fn block_align(&self) -> Result<u16> {
        let bytes_per_sample = u32::from(self.bits_per_sample).div_ceil(8);
        u16::try_from(u32::from(self.channels) * bytes_per_sample).map_err(|_| {
            Error::Format(format!(
                "{} channels of {} bits exceed the WAV block alignment field",
                self.channels, self.bits_per_sample
            ))
        })
    }

    pub fn byte_rate(&self) -> Result<u32> {
        let block_align = self.block_align()?;
        self.sample_rate
            .checked_mul(u32::from(block_align))
            .ok_or_else(|| {
                Error::Format(format!(
                    "{} Hz with {block_align}-byte frames exceeds the WAV byte rate field",
                    self.sample_rate
                ))
            })
    }
}

/// Produces a standards-compliant container around interleaved samples
pub trait ContainerEncoder {
    type Session: EncoderSession;

    fn begin(&self, format: PcmFormat) -> Result<Self::Session>;
}

/// One in-progress output file
pub trait EncoderSession {
    /// Append raw interleaved sample bytes.
    fn append_samples(&mut self, samples: &[u8]) -> Result<()>;

    /// Finalize the container and return its bytes.
    fn finish(self) -> Result<Vec<u8>>;
}

/// Canonical 44-byte-header RIFF/WAVE writer
#[derive(Debug, Clone, Copy, Default)]
pub struct WavEncoder;

#[derive(Debug)]
pub struct WavSession {
    format: PcmFormat,
    samples: Vec<u8>,
}

impl WavSession {
    const HEADER_SIZE: usize = 44;
}

impl ContainerEncoder for WavEncoder {
    type Session = WavSession;

    fn begin(&self, format: PcmFormat) -> Result<WavSession> {
        format.byte_rate()?;
        Ok(WavSession {
            format,
            samples: Vec::new(),
        })
    }
}

impl EncoderSession for WavSession {
    fn append_samples(&mut self, samples: &[u8]) -> Result<()> {
        self.samples
            .try_reserve(samples.len())
            .map_err(|_| Error::OutOfMemory(self.samples.len() + samples.len()))?;
        self.samples.extend_from_slice(samples);
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>> {
        let data_len = self.samples.len();
        let pad = data_len % 2;
        let riff_size = u32::try_from(Self::HEADER_SIZE - 8 + data_len + pad).map_err(|_| {
            Error::Unsupported(format!("{data_len} bytes of PCM exceed the RIFF size limit"))
        })?;

        let mut out = Vec::with_capacity(Self::HEADER_SIZE + data_len + pad);
        out.extend_from_slice(RIFF_MAGIC);
        out.write_u32::<LittleEndian>(riff_size)?;
        out.extend_from_slice(WAVE_MAGIC);

        out.extend_from_slice(FMT_CHUNK);
        out.write_u32::<LittleEndian>(16)?;
        out.write_u16::<LittleEndian>(WAVE_FORMAT_PCM)?;
        out.write_u16::<LittleEndian>(self.format.channels)?;
        out.write_u32::<LittleEndian>(self.format.sample_rate)?;
        out.write_u32::<LittleEndian>(self.format.byte_rate()?)?;
        out.write_u16::<LittleEndian>(self.format.block_align()?)?;
        out.write_u16::<LittleEndian>(self.format.bits_per_sample)?;

        out.extend_from_slice(DATA_CHUNK);
        out.write_u32::<LittleEndian>(data_len as u32)?;
        out.extend_from_slice(&self.samples);
        if pad == 1 {
            out.push(0);
        }

        Ok(out)
    }
}
