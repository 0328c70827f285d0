//! Error types for archive, extraction and audio operations.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("No file record with hash {0}")]
    NotFound(u64),

    #[error("Out of memory allocating {0} bytes")]
    OutOfMemory(usize),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Decompression failed: expected {expected} bytes, got {actual}")]
    DecompressionFailed { expected: usize, actual: usize },

    #[error("Not a RIFF audio stream")]
    NotAudio,

    #[error("Access denied: {0}")]
    AccessDenied(io::Error),

    #[error("IO error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => Error::AccessDenied(err),
            _ => Error::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Allocate a zeroed buffer of exactly `len` bytes, reporting allocation
/// failure instead of aborting.
pub(crate) fn alloc_buffer(len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::OutOfMemory(len))?;
    buf.resize(len, 0);
    Ok(buf)
}
