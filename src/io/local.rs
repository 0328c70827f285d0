use super::ReadAt;
use crate::error::Result;
use parking_lot::Mutex;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use tracing::trace;

/// Local file reader with random access support.
///
/// The file position is shared, so every seek+read pair runs under one
/// lock. Concurrent extractions against the same archive therefore never
/// observe each other's position.
pub struct LocalFileReader {
    file: Mutex<File>,
    size: u64,
}

impl LocalFileReader {
    pub fn new(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            file: Mutex::new(file),
            size,
        })
    }
}

impl ReadAt for LocalFileReader {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        trace!("read_at offset={} len={}", offset, buf.len());
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn size(&self) -> u64 {
        self.size
    }
}

pub fn file_exists(path: &Path) -> bool {
    path.is_file()
}

pub fn create_dir_all(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Write `data` to `path`, creating parent directories if needed
pub fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    std::fs::write(path, data)?;
    Ok(())
}
