mod local;
mod memory;

pub use local::{LocalFileReader, create_dir_all, file_exists, write_file};
pub use memory::MemoryReader;

use crate::error::Result;

/// Trait for random access reading from a data source
pub trait ReadAt: Send + Sync {
    /// Fill `buf` with the bytes starting at `offset`.
    ///
    /// A source shorter than `offset + buf.len()` is an error; partial
    /// reads are never returned.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Get the total size of the data source
    fn size(&self) -> u64;
}
