//! Audio extraction.
//!
//! Audio entries are wrapped in a RIFF container that does not conform to
//! the WAV specification, so a strict WAV reader rejects them. This module
//! pulls the payload out and repackages it: Ogg Opus data is returned
//! verbatim, anything else is treated as interleaved PCM and wrapped in a
//! valid WAV file.

mod rehost;
mod riff;
mod wav;

pub use rehost::{AudioRehoster, classify_data};
pub use riff::FmtChunk;
pub use wav::{ContainerEncoder, EncoderSession, PcmFormat, WavEncoder, WavSession};

/// Kind of payload produced by rehosting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    Pcm,
    Opus,
    None,
}

impl AudioFormat {
    /// File extension for the rehosted output.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            AudioFormat::Pcm => Some("wav"),
            AudioFormat::Opus => Some("opus"),
            AudioFormat::None => None,
        }
    }

    /// Format code the vendor writes into the fmt extension.
    pub fn vendor_code(&self) -> u32 {
        match self {
            AudioFormat::Pcm => 0x3102,
            AudioFormat::Opus => 0x4101,
            AudioFormat::None => 0,
        }
    }
}

/// Rehosted audio
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioResult {
    pub data: Vec<u8>,
    pub format: AudioFormat,
}

impl AudioResult {
    pub fn new(data: Vec<u8>, format: AudioFormat) -> Self {
        Self { data, format }
    }

    /// No usable audio content was found.
    pub fn none() -> Self {
        Self::new(Vec::new(), AudioFormat::None)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
