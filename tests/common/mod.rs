//! Synthetic archive and RIFF builders shared by the integration tests.

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::ZlibEncoder;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const HEADER_SIZE: usize = 172;
pub const CD_HEADER_SIZE: usize = 28;

/// One stored payload
#[derive(Debug, Clone)]
pub enum Blob {
    /// Stored as-is; compressed size == uncompressed size.
    Raw(Vec<u8>),
    /// zlib-compressed behind an 8-byte sub-header.
    Zlib(Vec<u8>),
    /// Arbitrary stored bytes with a declared uncompressed size.
    Packed { stored: Vec<u8>, uncompressed_size: u32 },
    /// A data spec written verbatim, with no payload behind it.
    Dangling { offset: u64, compressed_size: u32, uncompressed_size: u32 },
}

impl Blob {
    pub fn zlib_packed(data: &[u8], declared_size: u32) -> Self {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut stored = b"KARK".to_vec();
        stored.extend_from_slice(&(data.len() as u32).to_le_bytes());
        stored.extend_from_slice(&compressed);
        Blob::Packed {
            stored,
            uncompressed_size: declared_size,
        }
    }
}

#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    files: Vec<(u64, Vec<Blob>)>,
    opaque: Vec<[u8; 8]>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file record. Records are written in the order added.
    pub fn file(mut self, hash: u64, subfiles: Vec<Blob>) -> Self {
        self.files.push((hash, subfiles));
        self
    }

    pub fn raw(self, hash: u64, data: &[u8]) -> Self {
        self.file(hash, vec![Blob::Raw(data.to_vec())])
    }

    pub fn opaque(mut self, record: [u8; 8]) -> Self {
        self.opaque.push(record);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0u8; HEADER_SIZE];
        let mut specs: Vec<(u64, u32, u32)> = Vec::new();
        let mut records = Vec::new();

        for (hash, blobs) in &self.files {
            let begin = specs.len() as u32;
            for blob in blobs {
                let spec = match blob {
                    Blob::Raw(data) => {
                        let offset = out.len() as u64;
                        out.extend_from_slice(data);
                        (offset, data.len() as u32, data.len() as u32)
                    }
                    Blob::Zlib(data) => {
                        let Blob::Packed { stored, uncompressed_size } =
                            Blob::zlib_packed(data, data.len() as u32)
                        else {
                            unreachable!()
                        };
                        let offset = out.len() as u64;
                        out.extend_from_slice(&stored);
                        (offset, stored.len() as u32, uncompressed_size)
                    }
                    Blob::Packed { stored, uncompressed_size } => {
                        let offset = out.len() as u64;
                        out.extend_from_slice(stored);
                        (offset, stored.len() as u32, *uncompressed_size)
                    }
                    Blob::Dangling { offset, compressed_size, uncompressed_size } => {
                        (*offset, *compressed_size, *uncompressed_size)
                    }
                };
                specs.push(spec);
            }
            records.push((*hash, begin, specs.len() as u32));
        }

        let cd_offset = out.len() as u64;
        let records_len = records.len() * 56 + specs.len() * 16 + self.opaque.len() * 8;

        out.extend_from_slice(&0x0800_0000u32.to_le_bytes());
        out.extend_from_slice(&((CD_HEADER_SIZE - 8 + records_len) as u32).to_le_bytes());
        out.extend_from_slice(&0xDEAD_BEEF_u64.to_le_bytes());
        out.extend_from_slice(&(records.len() as u32).to_le_bytes());
        out.extend_from_slice(&(specs.len() as u32).to_le_bytes());
        out.extend_from_slice(&(self.opaque.len() as u32).to_le_bytes());

        for (i, (hash, begin, end)) in records.iter().enumerate() {
            out.extend_from_slice(&hash.to_le_bytes());
            out.extend_from_slice(&(1_600_000_000u64 + i as u64).to_le_bytes());
            out.extend_from_slice(&0x0000_0007u32.to_le_bytes());
            out.extend_from_slice(&begin.to_le_bytes());
            out.extend_from_slice(&end.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&[i as u8; 20]);
        }
        for (offset, compressed, uncompressed) in &specs {
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(&compressed.to_le_bytes());
            out.extend_from_slice(&uncompressed.to_le_bytes());
        }
        for record in &self.opaque {
            out.extend_from_slice(record);
        }

        let cd_size = (out.len() as u64) - cd_offset;
        let archive_size = out.len() as u64;
        write_header(&mut out, cd_offset, cd_size, archive_size);
        out
    }

    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

/// Overwrite the fixed header at the start of `out`.
pub fn write_header(out: &mut [u8], cd_offset: u64, cd_size: u64, archive_size: u64) {
    let mut header = Vec::with_capacity(HEADER_SIZE);
    header.extend_from_slice(b"RDAR");
    header.extend_from_slice(&0x0C00_0000u32.to_le_bytes());
    header.extend_from_slice(&cd_offset.to_le_bytes());
    header.extend_from_slice(&cd_size.to_le_bytes());
    header.extend_from_slice(&0u64.to_le_bytes());
    header.extend_from_slice(&archive_size.to_le_bytes());
    header.resize(HEADER_SIZE, 0);
    out[..HEADER_SIZE].copy_from_slice(&header);
}

/// Build a RIFF buffer from `fmt` body bytes and `(id, declared size, body)`
/// chunks. Odd-sized bodies get a pad byte.
pub fn riff(fmt: &[u8], chunks: &[(&[u8; 4], u32, &[u8])]) -> Vec<u8> {
    let mut out = b"RIFF".to_vec();
    out.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(fmt);

    for (id, declared, body) in chunks {
        out.extend_from_slice(*id);
        out.extend_from_slice(&declared.to_le_bytes());
        out.extend_from_slice(body);
        if body.len() % 2 == 1 {
            out.push(0);
        }
    }

    out
}

/// fmt chunk (size field included) using the vendor 6-byte extension.
pub fn vendor_fmt(channels: u16, sample_rate: u32, bits: u16, code: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&24u32.to_le_bytes());
    out.extend_from_slice(&0xFFFEu16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    let block_align = channels * bits / 8;
    out.extend_from_slice(&(sample_rate * u32::from(block_align)).to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits.to_le_bytes());
    out.extend_from_slice(&6u16.to_le_bytes());
    out.extend_from_slice(&[0, 0]);
    out.extend_from_slice(&code.to_le_bytes());
    out
}
