use super::ReadAt;
use crate::error::{Error, Result};

/// Reader over an archive that is already in memory
pub struct MemoryReader {
    data: Vec<u8>,
}

impl MemoryReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl ReadAt for MemoryReader {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let range = usize::try_from(offset)
            .ok()
            .and_then(|start| Some(start..start.checked_add(buf.len())?))
            .filter(|range| range.end <= self.data.len())
            .ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "read past end of buffer",
                ))
            })?;

        buf.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
