//! Rehosting of non-conformant RIFF audio.
//!
//! The archive's audio entries are RIFF/WAVE-shaped but break the WAV
//! rules: the `fmt ` extension uses a vendor layout, chunk sizes are
//! overstated, and the `data` chunks hold either an Ogg Opus stream or raw
//! PCM regardless of what `fmt ` declares. The scanner below walks the
//! chunks leniently and re-emits the payload in a valid container.

use tracing::{debug, trace};

use super::riff::{
    ChunkReader, DATA_CHUNK, FMT_CHUNK, FmtChunk, OGG_CAPTURE_PATTERN, RIFF_MAGIC, WAVE_MAGIC,
};
use super::wav::{ContainerEncoder, EncoderSession, PcmFormat, WavEncoder};
use super::{AudioFormat, AudioResult};
use crate::error::{Error, Result};

/// Classify one `data` chunk.
///
/// Rules, first match wins:
///
/// | # | condition                         | result |
/// |---|-----------------------------------|--------|
/// | 1 | body starts with `OggS`           | Opus   |
/// | 2 | anything else                     | PCM    |
///
/// The fmt chunk's vendor format code is only consulted after the content
/// check, and only to report a disagreement: both vendor codes have been
/// seen on Opus payloads, so the bytes decide.
pub fn classify_data(body: &[u8], fmt: &FmtChunk) -> AudioFormat {
    if body.starts_with(OGG_CAPTURE_PATTERN) {
        return AudioFormat::Opus;
    }

    if fmt.custom_format_code == AudioFormat::Opus.vendor_code() {
        debug!("fmt declares Opus but data has no Ogg capture pattern, treating as PCM");
    }
    AudioFormat::Pcm
}

/// Output accumulated while scanning
enum Payload<'a, S> {
    Empty,
    Opus(&'a [u8]),
    Pcm(S),
}

/// Scans RIFF-shaped buffers and rebuilds them as WAV or Opus
#[derive(Debug, Clone, Default)]
pub struct AudioRehoster<E: ContainerEncoder = WavEncoder> {
    encoder: E,
}

impl AudioRehoster<WavEncoder> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: ContainerEncoder> AudioRehoster<E> {
    pub fn with_encoder(encoder: E) -> Self {
        Self { encoder }
    }

    /// Rehost `data`.
    ///
    /// Returns [`Error::NotAudio`] when the buffer does not start with
    /// `RIFF`; callers batch-processing files treat that as "skip". A RIFF
    /// buffer without usable `data` chunks yields an
    /// [`AudioFormat::None`] result.
    ///
    /// Declared chunk sizes are clamped to the bytes left in the buffer.
    /// Opus chunks replace whatever was produced before them; consecutive
    /// PCM chunks are concatenated into one WAV stream. A PCM chunk that
    /// follows an Opus chunk starts a new WAV stream that replaces it.
    pub fn rehost(&self, data: &[u8]) -> Result<AudioResult> {
        if !data.starts_with(RIFF_MAGIC) {
            return Err(Error::NotAudio);
        }

        let mut reader = ChunkReader::new(data);
        reader.skip(4)?;
        let _riff_size = reader.read_u32()?;

        if &reader.read_fourcc()? != WAVE_MAGIC {
            return Err(Error::Format("RIFF form type is not WAVE".into()));
        }
        if &reader.read_fourcc()? != FMT_CHUNK {
            return Err(Error::Format("WAVE stream does not start with a fmt chunk".into()));
        }

        let fmt = FmtChunk::read(&mut reader)?;
        trace!("fmt chunk: {:?}", fmt);

        let mut payload: Payload<'_, E::Session> = Payload::Empty;

        while reader.remaining() >= 8 {
            let id = reader.read_fourcc()?;
            let declared = reader.read_u32()?;
            let size = u64::from(declared).min(reader.remaining());
            if size < u64::from(declared) {
                debug!(
                    "Chunk {:?} declares {} bytes, only {} remain",
                    String::from_utf8_lossy(&id),
                    declared,
                    size
                );
            }

            let body = reader.take_clamped(size);
            if size % 2 == 1 {
                reader.skip_clamped(1);
            }

            if &id != DATA_CHUNK {
                trace!("Skipping chunk {:?} ({} bytes)", String::from_utf8_lossy(&id), size);
                continue;
            }

            payload = match (classify_data(body, &fmt), payload) {
                (AudioFormat::Opus, _) => Payload::Opus(body),
                (_, Payload::Pcm(mut session)) => {
                    session.append_samples(body)?;
                    Payload::Pcm(session)
                }
                (_, _) => {
                    let mut session = self.encoder.begin(PcmFormat {
                        channels: fmt.channels,
                        sample_rate: fmt.sample_rate,
                        bits_per_sample: fmt.bits_per_sample,
                    })?;
                    session.append_samples(body)?;
                    Payload::Pcm(session)
                }
            };
        }

        if reader.remaining() > 0 {
            trace!("Ignoring {} trailing bytes", reader.remaining());
        }

        Ok(match payload {
            Payload::Empty => AudioResult::none(),
            Payload::Opus(body) => AudioResult::new(body.to_vec(), AudioFormat::Opus),
            Payload::Pcm(session) => AudioResult::new(session.finish()?, AudioFormat::Pcm),
        })
    }
}
