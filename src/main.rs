//! Main entry point for the rdar CLI application.
//!
//! Lists archive contents, extracts sub-files, or rehosts audio entries for
//! every archive on the command line. A failure on one file is reported
//! and skipped; a failure to open an archive skips that archive.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::Path;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

use rdar::archive::{Archive, ArchiveOptions};
use rdar::io::{create_dir_all, file_exists, write_file};
use rdar::{AudioFormat, Cli, DecompressorRegistry, Error};

/// Per-archive extraction counts
#[derive(Debug, Default)]
struct Summary {
    written: usize,
    skipped: usize,
    failed: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let registry = DecompressorRegistry::with_builtins();
    let options = cli.archive_options();

    let mut failed_archives = 0usize;
    for path in &cli.archives {
        if let Err(e) = process_archive(path, &cli, &options, &registry) {
            error!("{:#}", e);
            failed_archives += 1;
        }
    }

    if failed_archives > 0 {
        bail!(
            "{} of {} archives could not be processed",
            failed_archives,
            cli.archives.len()
        );
    }

    Ok(())
}

/// Process one archive based on CLI options.
///
/// This function handles three modes:
/// - List mode (`-l` or `-v`): display the file records
/// - Audio mode (`--audio`): rehost sub-file 0 of every record
/// - Otherwise: extract every sub-file of the selected records
///
/// # Arguments
///
/// * `path` - Path to the archive on disk
/// * `cli` - Parsed command-line options
/// * `options` - Archive settings (decompression providers to probe)
/// * `registry` - Known decompression providers
///
/// # Returns
///
/// Returns `Ok(())` once every selected record has been attempted.
/// Per-file failures are counted, not returned; only failing to open the
/// archive or create the output directory is an error.
fn process_archive(
    path: &Path,
    cli: &Cli,
    options: &ArchiveOptions,
    registry: &DecompressorRegistry,
) -> Result<()> {
    let archive = Archive::open_with(path, options, registry)
        .with_context(|| format!("Failed to open archive {}", path.display()))?;

    // List mode: display archive contents and exit
    if cli.list || cli.verbose {
        list_records(&archive, cli.verbose);
        return Ok(());
    }

    // Warn up front when compressed entries exist but cannot be decoded
    let directory = archive.directory();
    let has_compressed = (0..directory.data_spec_count())
        .filter_map(|i| directory.data_spec_at(i))
        .any(|spec| spec.is_compressed());
    if has_compressed && !archive.has_decompressor() {
        warn!(
            "{}: no decompression provider among {:?}, compressed entries will fail",
            path.display(),
            options.decompressors
        );
    }

    // Restrict to the requested hashes, if any
    let indices = select_records(&archive, &cli.hashes);

    let output_dir = cli.output_dir(path);
    create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create directory {}", output_dir.display()))?;

    // Extract or rehost each selected record
    let summary = if cli.audio {
        rehost_audio(&archive, &indices, &output_dir, cli)
    } else {
        extract_records(&archive, &indices, &output_dir, cli)
    };

    if !cli.is_very_quiet() {
        println!(
            "{}: {} written, {} skipped, {} failed",
            path.display(),
            summary.written,
            summary.skipped,
            summary.failed
        );
    }

    Ok(())
}

/// Resolve the record indices to process: all of them, or the ones named
/// by `--hash`.
fn select_records(archive: &Archive, hashes: &[u64]) -> Vec<usize> {
    if hashes.is_empty() {
        return (0..archive.record_count()).collect();
    }

    hashes
        .iter()
        .filter_map(|&hash| match archive.find_by_hash(hash) {
            Ok(index) => Some(index),
            Err(e) => {
                warn!("{}", e);
                None
            }
        })
        .collect()
}

/// List file records in the archive.
///
/// Supports two output formats:
/// - Simple format (`-l`): one name hash per line
/// - Verbose format (`-v`): table with sub-file count, stored and
///   uncompressed sizes, compression ratio, and totals
///
/// # Arguments
///
/// * `archive` - The open archive
/// * `verbose` - If true, display detailed information in table format
fn list_records(archive: &Archive, verbose: bool) {
    let directory = archive.directory();

    if verbose {
        // Print table header for verbose output
        println!(
            "{:>8}  {:>20}  {:>4}  {:>12}  {:>12}  {:>5}",
            "Index", "Hash", "Subs", "Stored", "Size", "Cmpr"
        );
        println!("{}", "-".repeat(70));
    }

    // Track totals for summary line
    let mut total_stored = 0u64;
    let mut total_size = 0u64;

    for (index, record) in directory.files().enumerate() {
        if !verbose {
            // Simple format: just the name hash
            println!("{}", record.hash);
            continue;
        }

        // Sum stored and uncompressed sizes over the record's sub-files
        let (stored, size) = record
            .data_spec_range()
            .filter_map(|i| directory.data_spec_at(i as usize))
            .fold((0u64, 0u64), |(stored, size), spec| {
                (
                    stored + u64::from(spec.stored_size()),
                    size + u64::from(spec.uncompressed_size),
                )
            });

        println!(
            "{:>8}  {:>20}  {:>4}  {:>12}  {:>12}  {}",
            index,
            record.hash,
            record.subfile_count(),
            stored,
            size,
            ratio(stored, size)
        );

        total_stored += stored;
        total_size += size;
    }

    // Print summary line in verbose mode
    if verbose {
        println!("{}", "-".repeat(70));
        println!(
            "{:>8}  {:>20}  {:>4}  {:>12}  {:>12}  {}",
            directory.file_count(),
            "",
            "",
            format_size(total_stored),
            format_size(total_size),
            ratio(total_stored, total_size)
        );
    }
}

/// Extract every sub-file of each record.
///
/// A record with one sub-file is written as `<dir>/<hash>`; one with
/// several as `<dir>/<hash>/<n>`.
///
/// # Arguments
///
/// * `archive` - The open archive
/// * `indices` - File record indices to extract
/// * `output_dir` - Directory the files are written under
/// * `cli` - Parsed command-line options (overwrite and quiet flags)
///
/// # Returns
///
/// Counts of sub-files written, skipped because the target exists, and
/// failed.
fn extract_records(archive: &Archive, indices: &[usize], output_dir: &Path, cli: &Cli) -> Summary {
    let mut summary = Summary::default();

    for &index in indices {
        let record = match archive.record_at(index) {
            Ok(record) => record,
            Err(e) => {
                warn!("{}", e);
                summary.failed += 1;
                continue;
            }
        };

        let count = record.subfile_count();
        for subfile in 0..count {
            // Multi-part records get a directory named after the hash
            let output_path = if count > 1 {
                output_dir
                    .join(record.hash.to_string())
                    .join(subfile.to_string())
            } else {
                output_dir.join(record.hash.to_string())
            };

            // Check if file exists and handle overwrite options
            if !should_write(&output_path, cli) {
                summary.skipped += 1;
                continue;
            }

            if !cli.is_quiet() {
                println!("  extracting: {}", output_path.display());
            }

            match archive.extract_to_file(index, subfile, &output_path) {
                Ok(_) => summary.written += 1,
                Err(e) => {
                    warn!("{} sub-file {}: {}", record.hash, subfile, e);
                    summary.failed += 1;
                }
            }
        }
    }

    summary
}

/// Rehost sub-file 0 of each record as `<dir>/<hash>.wav` or `.opus`.
///
/// Records that are not RIFF audio, or hold no audio data, are skipped.
fn rehost_audio(archive: &Archive, indices: &[usize], output_dir: &Path, cli: &Cli) -> Summary {
    let mut summary = Summary::default();

    for &index in indices {
        let Ok(record) = archive.record_at(index) else {
            summary.failed += 1;
            continue;
        };

        let audio = archive
            .open_subfile(index, 0)
            .and_then(|file| file.extract_audio());

        let audio = match audio {
            Ok(audio) => audio,
            Err(Error::NotAudio) => {
                summary.skipped += 1;
                continue;
            }
            Err(e) => {
                warn!("{}: {}", record.hash, e);
                summary.failed += 1;
                continue;
            }
        };

        let Some(extension) = audio.format.extension() else {
            debug!("{}: no audio data chunk", record.hash);
            summary.skipped += 1;
            continue;
        };

        let output_path = output_dir.join(format!("{}.{}", record.hash, extension));
        if !should_write(&output_path, cli) {
            summary.skipped += 1;
            continue;
        }

        if !cli.is_quiet() {
            let kind = if audio.format == AudioFormat::Opus { "opus" } else { "pcm" };
            println!("  rehosting ({}): {}", kind, output_path.display());
        }

        match write_file(&output_path, &audio.data) {
            Ok(()) => summary.written += 1,
            Err(e) => {
                warn!("{}: {}", output_path.display(), e);
                summary.failed += 1;
            }
        }
    }

    summary
}

/// Handle existing files based on overwrite options.
fn should_write(output_path: &Path, cli: &Cli) -> bool {
    if !file_exists(output_path) {
        return true;
    }

    if cli.never_overwrite {
        // -n flag: never overwrite, skip silently (unless quiet)
        if !cli.is_quiet() {
            eprintln!("Skipping: {} (file exists)", output_path.display());
        }
        return false;
    }

    if !cli.overwrite {
        // Default behavior: skip with suggestion to use -o
        if !cli.is_quiet() {
            eprintln!("Skipping: {} (use -o to overwrite)", output_path.display());
        }
        return false;
    }

    true
}

/// Percentage saved by compression.
fn ratio(stored: u64, size: u64) -> String {
    if size > 0 && stored <= size {
        format!("{:>4}%", 100 - (stored * 100 / size))
    } else {
        "  0%".to_string()
    }
}

/// Format a byte size into a human-readable string.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// assert_eq!(format_size(1048576), "1.00 MB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
