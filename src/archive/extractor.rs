use std::path::Path;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::codec::{DEFAULT_PROVIDERS, Decompressor, DecompressorRegistry};
use crate::error::{Error, Result};
use crate::io::{LocalFileReader, ReadAt, write_file};

use super::directory::CentralDirectory;
use super::file::ExtractedFile;
use super::parser::ArchiveParser;
use super::structures::{ArchiveHeader, DataSpecRecord, FileRecord};

/// Settings applied when an archive is opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOptions {
    /// Decompression provider identifiers, probed in order.
    pub decompressors: Vec<String>,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            decompressors: DEFAULT_PROVIDERS.iter().map(ToString::to_string).collect(),
        }
    }
}

/// An open archive.
///
/// Holds the validated header, the loaded central directory and, when one
/// could be resolved, a decompression provider. Every extraction performs
/// a single range read on the source, so one archive can serve several
/// threads.
pub struct Archive<R: ReadAt = LocalFileReader> {
    parser: ArchiveParser<R>,
    header: ArchiveHeader,
    directory: CentralDirectory,
    decompressor: Option<Arc<dyn Decompressor>>,
}

impl Archive<LocalFileReader> {
    /// Open an archive with the default options and built-in providers.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(
            path,
            &ArchiveOptions::default(),
            &DecompressorRegistry::with_builtins(),
        )
    }

    pub fn open_with(
        path: &Path,
        options: &ArchiveOptions,
        registry: &DecompressorRegistry,
    ) -> Result<Self> {
        debug!("Opening archive: {:?}", path);
        let reader = Arc::new(LocalFileReader::new(path)?);
        Self::from_reader(reader, options, registry)
    }
}

impl<R: ReadAt> Archive<R> {
    /// Open an archive from any random-access source.
    pub fn from_reader(
        reader: Arc<R>,
        options: &ArchiveOptions,
        registry: &DecompressorRegistry,
    ) -> Result<Self> {
        let decompressor = registry.resolve(&options.decompressors);
        if decompressor.is_none() {
            debug!(
                "No decompression provider among {:?}, compressed entries cannot be opened",
                options.decompressors
            );
        }

        let parser = ArchiveParser::new(reader);
        let header = parser.read_header()?;
        let directory = parser.read_central_directory(&header)?;

        Ok(Self {
            parser,
            header,
            directory,
            decompressor,
        })
    }

    /// Release the directory and the source.
    pub fn close(self) {}

    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    pub fn directory(&self) -> &CentralDirectory {
        &self.directory
    }

    pub fn record_count(&self) -> usize {
        self.directory.file_count()
    }

    pub fn record_at(&self, index: usize) -> Result<FileRecord> {
        self.directory.file_at(index).ok_or_else(|| {
            Error::InvalidArguments(format!(
                "file index {index} out of range ({} files)",
                self.record_count()
            ))
        })
    }

    pub fn find_by_hash(&self, hash: u64) -> Result<usize> {
        self.directory.find_by_hash(hash).ok_or(Error::NotFound(hash))
    }

    pub fn has_decompressor(&self) -> bool {
        self.decompressor.is_some()
    }

    pub fn decompressor_name(&self) -> Option<&str> {
        self.decompressor.as_deref().map(|d| d.name())
    }

    /// Materialize sub-file `subfile` of file record `index`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArguments`] for an out-of-range index or sub-file
    /// - [`Error::Format`] when the record points outside the directory or
    ///   its payload outside the archive
    /// - [`Error::InvalidOperation`] for a compressed entry with no
    ///   decompression provider, or one that has become unavailable
    /// - [`Error::DecompressionFailed`] when the provider returns the wrong
    ///   number of bytes
    pub fn open_subfile(&self, index: usize, subfile: u32) -> Result<ExtractedFile> {
        let record = self.record_at(index)?;

        if subfile >= record.subfile_count() {
            return Err(Error::InvalidArguments(format!(
                "sub-file {subfile} out of range, file {index} has {}",
                record.subfile_count()
            )));
        }

        let spec_index = record.data_spec_begin as usize + subfile as usize;
        let spec = self.directory.data_spec_at(spec_index).ok_or_else(|| {
            Error::Format(format!(
                "file {index} references data spec {spec_index}, directory has {}",
                self.directory.data_spec_count()
            ))
        })?;

        trace!(
            "Opening file {} sub-file {}: offset={} compressed={} uncompressed={}",
            index, subfile, spec.offset, spec.compressed_size, spec.uncompressed_size
        );

        let stored_end = spec.offset.checked_add(u64::from(spec.stored_size()));
        if stored_end.is_none_or(|end| end > self.parser.size()) {
            return Err(Error::Format(format!(
                "data spec {spec_index} ({} bytes at {}) runs past end of archive",
                spec.stored_size(),
                spec.offset
            )));
        }

        let data = if spec.is_compressed() {
            self.decompress(&spec)?
        } else {
            self.parser
                .read_range(spec.offset, u64::from(spec.uncompressed_size))?
        };

        Ok(ExtractedFile::new(data))
    }

    /// Look up a file by name hash and open one of its sub-files.
    pub fn open_by_hash(&self, hash: u64, subfile: u32) -> Result<ExtractedFile> {
        let index = self.find_by_hash(hash)?;
        self.open_subfile(index, subfile)
    }

    /// Extract a sub-file to disk, returning the number of bytes written.
    pub fn extract_to_file(&self, index: usize, subfile: u32, output_path: &Path) -> Result<u64> {
        let file = self.open_subfile(index, subfile)?;
        write_file(output_path, file.as_bytes())?;
        Ok(file.len())
    }

    fn decompress(&self, spec: &DataSpecRecord) -> Result<Vec<u8>> {
        let decompressor = self.decompressor.as_ref().ok_or_else(|| {
            Error::InvalidOperation("compressed entry but no decompression provider loaded".into())
        })?;
        if !decompressor.available() {
            return Err(Error::InvalidOperation(format!(
                "decompression provider {} is no longer available",
                decompressor.name()
            )));
        }

        let header_size = DataSpecRecord::COMPRESSED_HEADER_SIZE;
        if (spec.compressed_size as usize) < header_size {
            return Err(Error::Format(format!(
                "compressed size {} smaller than the {header_size}-byte sub-header",
                spec.compressed_size
            )));
        }

        let scratch = self
            .parser
            .read_range(spec.offset, u64::from(spec.compressed_size))?;

        let expected = spec.uncompressed_size as usize;
        let data = decompressor.decompress(&scratch[header_size..], expected)?;
        if data.len() != expected {
            return Err(Error::DecompressionFailed {
                expected,
                actual: data.len(),
            });
        }

        Ok(data)
    }
}
