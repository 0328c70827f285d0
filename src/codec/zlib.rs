use std::io::Read;

use flate2::read::ZlibDecoder;
use tracing::debug;

use super::Decompressor;
use crate::error::{Error, Result};

/// zlib stream decoder backed by flate2
#[derive(Debug, Clone, Copy, Default)]
pub struct ZlibDecompressor;

impl ZlibDecompressor {
    pub const NAME: &'static str = "zlib";
}

impl Decompressor for ZlibDecompressor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn decompress(&self, src: &[u8], dst_capacity: usize) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        // One byte of slack lets the caller see an oversized stream.
        let mut decoder = ZlibDecoder::new(src).take(dst_capacity as u64 + 1);

        if let Err(e) = decoder.read_to_end(&mut out) {
            debug!("zlib decode failed after {} bytes: {}", out.len(), e);
            return Err(Error::DecompressionFailed {
                expected: dst_capacity,
                actual: out.len(),
            });
        }

        Ok(out)
    }
}
