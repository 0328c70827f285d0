//! Rehosting RIFF-wrapped audio entries

mod common;

use common::{ArchiveBuilder, riff, vendor_fmt};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rdar::audio::{ContainerEncoder, EncoderSession, PcmFormat};
use rdar::{
    Archive, ArchiveOptions, AudioFormat, AudioRehoster, DecompressorRegistry, Error,
    MemoryReader,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// 16-byte PCM fmt chunk (size field included): mono, 8 kHz, 16-bit.
fn pcm_fmt() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&8_000u32.to_le_bytes());
    out.extend_from_slice(&16_000u32.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out
}

fn opus_fmt() -> Vec<u8> {
    vendor_fmt(2, 48_000, 16, AudioFormat::Opus.vendor_code())
}

fn ogg(tag: u8) -> Vec<u8> {
    let mut out = b"OggS".to_vec();
    out.extend_from_slice(&[0, 2, tag, tag, tag, tag]);
    out
}

fn rehost(data: &[u8]) -> rdar::Result<rdar::AudioResult> {
    AudioRehoster::new().rehost(data)
}

fn u32_at(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(buf[at..at + 4].try_into().unwrap())
}

fn u16_at(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

#[test]
fn test_non_riff_is_not_audio() {
    assert!(matches!(rehost(&ogg(1)), Err(Error::NotAudio)));
    assert!(matches!(rehost(b""), Err(Error::NotAudio)));
    assert!(matches!(rehost(b"RIF"), Err(Error::NotAudio)));
}

#[test]
fn test_riff_without_wave_form() {
    let mut data = b"RIFF\0\0\0\0AVI ".to_vec();
    data.extend_from_slice(&pcm_fmt());
    assert!(matches!(rehost(&data), Err(Error::Format(_))));
}

#[test]
fn test_wave_without_leading_fmt() {
    let mut data = b"RIFF\0\0\0\0WAVEdata".to_vec();
    data.extend_from_slice(&4u32.to_le_bytes());
    data.extend_from_slice(&[1, 2, 3, 4]);
    assert!(matches!(rehost(&data), Err(Error::Format(_))));
}

#[test]
fn test_truncated_fmt() {
    let data = riff(&pcm_fmt()[..10], &[]);
    assert!(matches!(rehost(&data), Err(Error::Format(_))));
}

#[test]
fn test_fmt_extension_past_end() {
    let mut fmt = vendor_fmt(2, 48_000, 16, 0x3102);
    fmt.truncate(20);
    assert!(matches!(rehost(&riff(&fmt, &[])), Err(Error::Format(_))));
}

#[test]
fn test_pcm_is_wrapped_in_wav() {
    let samples = [1u8, 2, 3, 4, 5, 6, 7, 8];
    let result = rehost(&riff(&pcm_fmt(), &[(b"data", 8, &samples)])).unwrap();

    assert_eq!(result.format, AudioFormat::Pcm);
    let wav = &result.data;
    assert_eq!(wav.len(), 44 + 8);
    assert_eq!(&wav[0..4], b"RIFF");
    assert_eq!(u32_at(wav, 4), 44);
    assert_eq!(&wav[8..16], b"WAVEfmt ");
    assert_eq!(u32_at(wav, 16), 16);
    assert_eq!(u16_at(wav, 20), 1);
    assert_eq!(u16_at(wav, 22), 1);
    assert_eq!(u32_at(wav, 24), 8_000);
    assert_eq!(u32_at(wav, 28), 16_000);
    assert_eq!(u16_at(wav, 32), 2);
    assert_eq!(u16_at(wav, 34), 16);
    assert_eq!(&wav[36..40], b"data");
    assert_eq!(u32_at(wav, 40), 8);
    assert_eq!(&wav[44..], &samples);
}

#[test]
fn test_pcm_chunks_are_concatenated() {
    let data = riff(
        &vendor_fmt(1, 22_050, 16, AudioFormat::Pcm.vendor_code()),
        &[
            (b"data", 3, &[1, 2, 3]),
            (b"JUNK", 5, &[9, 9, 9, 9, 9]),
            (b"data", 4, &[10, 11, 12, 13]),
        ],
    );
    let result = rehost(&data).unwrap();

    assert_eq!(result.format, AudioFormat::Pcm);
    assert_eq!(u32_at(&result.data, 24), 22_050);
    assert_eq!(u32_at(&result.data, 40), 7);
    assert_eq!(&result.data[44..51], &[1, 2, 3, 10, 11, 12, 13]);
    // odd data length gets a pad byte
    assert_eq!(result.data.len(), 44 + 8);
}

#[test]
fn test_opus_is_copied_verbatim() {
    let stream = ogg(7);
    let result = rehost(&riff(&opus_fmt(), &[(b"data", 10, &stream)])).unwrap();

    assert_eq!(result.format, AudioFormat::Opus);
    assert_eq!(result.data, stream);
}

#[test]
fn test_last_opus_chunk_wins() {
    let result = rehost(&riff(
        &opus_fmt(),
        &[(b"data", 10, &ogg(1)), (b"data", 10, &ogg(2))],
    ))
    .unwrap();

    assert_eq!(result.format, AudioFormat::Opus);
    assert_eq!(result.data, ogg(2));
}

#[test]
fn test_opus_after_pcm_replaces_it() {
    let result = rehost(&riff(
        &pcm_fmt(),
        &[(b"data", 4, &[1, 2, 3, 4]), (b"data", 10, &ogg(3))],
    ))
    .unwrap();

    assert_eq!(result.format, AudioFormat::Opus);
    assert_eq!(result.data, ogg(3));
}

#[test]
fn test_pcm_after_opus_starts_new_stream() {
    let result = rehost(&riff(
        &pcm_fmt(),
        &[
            (b"data", 10, &ogg(3)),
            (b"data", 2, &[5, 6]),
            (b"data", 2, &[7, 8]),
        ],
    ))
    .unwrap();

    assert_eq!(result.format, AudioFormat::Pcm);
    assert_eq!(u32_at(&result.data, 40), 4);
    assert_eq!(&result.data[44..], &[5, 6, 7, 8]);
}

#[test]
fn test_overstated_data_size_is_clamped() {
    let body = [3u8; 10];
    let result = rehost(&riff(&pcm_fmt(), &[(b"data", 1_000_000, &body)])).unwrap();

    assert_eq!(result.format, AudioFormat::Pcm);
    assert_eq!(u32_at(&result.data, 40), 10);
    assert_eq!(&result.data[44..], &body);

    let stream = ogg(4);
    let result = rehost(&riff(&opus_fmt(), &[(b"data", u32::MAX, &stream)])).unwrap();
    assert_eq!(result.format, AudioFormat::Opus);
    assert_eq!(result.data, stream);
}

#[test]
fn test_no_data_chunk() {
    let result = rehost(&riff(&pcm_fmt(), &[(b"LIST", 4, b"INFO")])).unwrap();
    assert_eq!(result.format, AudioFormat::None);
    assert!(result.is_empty());

    let result = rehost(&riff(&pcm_fmt(), &[])).unwrap();
    assert_eq!(result.format, AudioFormat::None);
}

#[test]
fn test_trailing_bytes_are_ignored() {
    let mut data = riff(&pcm_fmt(), &[(b"data", 2, &[1, 2])]);
    data.extend_from_slice(b"data\x10");

    let result = rehost(&data).unwrap();
    assert_eq!(result.format, AudioFormat::Pcm);
    assert_eq!(&result.data[44..], &[1, 2]);
}

#[test]
fn test_canonical_extensible_fmt_is_unsupported() {
    let mut fmt = Vec::new();
    fmt.extend_from_slice(&40u32.to_le_bytes());
    fmt.extend_from_slice(&0xFFFEu16.to_le_bytes());
    fmt.extend_from_slice(&2u16.to_le_bytes());
    fmt.extend_from_slice(&48_000u32.to_le_bytes());
    fmt.extend_from_slice(&192_000u32.to_le_bytes());
    fmt.extend_from_slice(&4u16.to_le_bytes());
    fmt.extend_from_slice(&16u16.to_le_bytes());
    fmt.extend_from_slice(&22u16.to_le_bytes());
    fmt.extend_from_slice(&[0u8; 22]);

    let data = riff(&fmt, &[(b"data", 10, &ogg(1))]);
    assert!(matches!(rehost(&data), Err(Error::Unsupported(_))));
}

#[test]
fn test_short_vendor_extension_is_unsupported() {
    let mut fmt = vendor_fmt(2, 48_000, 16, 0);
    // 16-byte body plus a 2-byte extension
    fmt.truncate(24);
    fmt[0..4].copy_from_slice(&20u32.to_le_bytes());
    fmt[20..22].copy_from_slice(&2u16.to_le_bytes());

    assert!(matches!(
        rehost(&riff(&fmt, &[(b"data", 2, &[0, 0])])),
        Err(Error::Unsupported(_))
    ));
}

#[test]
fn test_oversized_frame_is_rejected() {
    let mut fmt = pcm_fmt();
    fmt[6..8].copy_from_slice(&u16::MAX.to_le_bytes());
    fmt[18..20].copy_from_slice(&32u16.to_le_bytes());

    let data = riff(&fmt, &[(b"data", 4, &[1, 2, 3, 4])]);
    assert!(matches!(rehost(&data), Err(Error::Format(_))));
}

#[test]
fn test_content_overrides_declared_code() {
    let result = rehost(&riff(&opus_fmt(), &[(b"data", 4, &[1, 2, 3, 4])])).unwrap();
    assert_eq!(result.format, AudioFormat::Pcm);

    let pcm_declared = vendor_fmt(2, 48_000, 16, AudioFormat::Pcm.vendor_code());
    let result = rehost(&riff(&pcm_declared, &[(b"data", 10, &ogg(5))])).unwrap();
    assert_eq!(result.format, AudioFormat::Opus);
}

#[test]
fn test_audio_from_archive_entry() {
    let opus_entry = riff(&opus_fmt(), &[(b"data", 10, &ogg(9))]);
    let pcm_entry = riff(&pcm_fmt(), &[(b"data", 2, &[4, 2])]);
    let archive = Archive::from_reader(
        Arc::new(MemoryReader::new(
            ArchiveBuilder::new()
                .raw(1, &opus_entry)
                .raw(2, &pcm_entry)
                .raw(3, b"not a riff file")
                .build(),
        )),
        &ArchiveOptions::default(),
        &DecompressorRegistry::new(),
    )
    .unwrap();

    let opus = archive.open_by_hash(1, 0).unwrap().extract_audio().unwrap();
    assert_eq!(opus.format, AudioFormat::Opus);
    assert_eq!(opus.data, ogg(9));

    let pcm = archive.open_by_hash(2, 0).unwrap().extract_audio().unwrap();
    assert_eq!(pcm.format, AudioFormat::Pcm);
    assert_eq!(pcm.format.extension(), Some("wav"));
    assert_eq!(&pcm.data[44..], &[4, 2]);

    let other = archive.open_by_hash(3, 0).unwrap();
    assert!(matches!(other.extract_audio(), Err(Error::NotAudio)));
}

/// Records what the rehoster hands its encoder.
#[derive(Default)]
struct RecordingEncoder {
    formats: Rc<RefCell<Vec<PcmFormat>>>,
}

struct RecordingSession {
    chunks: Vec<Vec<u8>>,
}

impl ContainerEncoder for RecordingEncoder {
    type Session = RecordingSession;

    fn begin(&self, format: PcmFormat) -> rdar::Result<RecordingSession> {
        self.formats.borrow_mut().push(format);
        Ok(RecordingSession { chunks: Vec::new() })
    }
}

impl EncoderSession for RecordingSession {
    fn append_samples(&mut self, samples: &[u8]) -> rdar::Result<()> {
        self.chunks.push(samples.to_vec());
        Ok(())
    }

    fn finish(self) -> rdar::Result<Vec<u8>> {
        Ok(self.chunks.join(&b'|'))
    }
}

#[test]
fn test_custom_encoder() {
    let encoder = RecordingEncoder::default();
    let formats = Rc::clone(&encoder.formats);
    let rehoster = AudioRehoster::with_encoder(encoder);

    let result = rehoster
        .rehost(&riff(
            &vendor_fmt(2, 44_100, 24, AudioFormat::Pcm.vendor_code()),
            &[(b"data", 2, &[1, 2]), (b"data", 2, &[3, 4])],
        ))
        .unwrap();

    assert_eq!(result.format, AudioFormat::Pcm);
    assert_eq!(result.data, vec![1, 2, b'|', 3, 4]);
    assert_eq!(
        *formats.borrow(),
        vec![PcmFormat {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 24,
        }]
    );
}

proptest! {
    #[test]
    fn prop_data_size_is_clamped(declared in any::<u32>(), half_len in 0usize..512) {
        let body = vec![0u8; half_len * 2];
        let result = rehost(&riff(&pcm_fmt(), &[(b"data", declared, &body)])).unwrap();

        let expected = (declared as usize).min(body.len());
        prop_assert_eq!(result.format, AudioFormat::Pcm);
        prop_assert_eq!(u32_at(&result.data, 40) as usize, expected);
        prop_assert_eq!(result.data.len(), 44 + expected + expected % 2);
    }

    #[test]
    fn prop_arbitrary_chunks_never_panic(tail in proptest::collection::vec(any::<u8>(), 0..256)) {
        let mut data = riff(&pcm_fmt(), &[]);
        data.extend_from_slice(&tail);
        let _ = rehost(&data);
    }
}
