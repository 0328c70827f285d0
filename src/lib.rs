//! # rdar
//!
//! A reader for RDAR game archives.
//!
//! This library opens an archive, loads its central directory, and
//! extracts embedded files by index or by precomputed 64-bit name hash.
//! Audio entries, which are stored in a non-conformant RIFF wrapper, can be
//! rehosted into a valid WAV file or a raw Ogg Opus stream.
//!
//! ## Features
//!
//! - Header and central directory validation
//! - Hash lookup over the sorted file table
//! - Stored and compressed payloads, with decompression delegated to a
//!   pluggable provider
//! - Audio rehosting with a lenient chunk scanner
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use rdar::{Archive, AudioFormat};
//!
//! fn main() -> rdar::Result<()> {
//!     let archive = Archive::open(Path::new("audio_1_general.archive"))?;
//!
//!     for index in 0..archive.record_count() {
//!         let file = archive.open_subfile(index, 0)?;
//!         match file.extract_audio() {
//!             Ok(audio) if audio.format != AudioFormat::None => {
//!                 println!("{index}: {} bytes of {:?}", audio.len(), audio.format);
//!             }
//!             _ => continue,
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod audio;
pub mod cli;
pub mod codec;
pub mod error;
pub mod io;

pub use archive::{Archive, ArchiveOptions, ExtractedFile, FileRecord};
pub use audio::{AudioFormat, AudioRehoster, AudioResult};
pub use cli::Cli;
pub use codec::{Decompressor, DecompressorRegistry};
pub use error::{Error, Result};
pub use io::{LocalFileReader, MemoryReader, ReadAt};
