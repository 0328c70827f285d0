use std::path::{Path, PathBuf};

use clap::Parser;

use crate::archive::ArchiveOptions;

#[derive(Parser, Debug)]
#[command(name = "rdar")]
#[command(version)]
#[command(about = "Extract files and audio from RDAR game archives", long_about = None)]
#[command(after_help = "Examples:\n  \
  rdar -l basegame_1.archive            list file records\n  \
  rdar basegame_1.archive -d out        extract every sub-file into out/\n  \
  rdar --audio audio_1.archive          rehost audio entries as .wav/.opus\n  \
  rdar --hash 30289915656255236 a.archive   extract a single file by name hash")]
pub struct Cli {
    /// Archive files to process
    #[arg(value_name = "ARCHIVE", required = true)]
    pub archives: Vec<PathBuf>,

    /// List records (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely with sizes
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract into DIR (default: archive path without extension)
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<PathBuf>,

    /// Only extract files with these name hashes (decimal or 0x-prefixed hex)
    #[arg(long = "hash", value_name = "HASH", value_parser = parse_hash)]
    pub hashes: Vec<u64>,

    /// Rehost audio entries as .wav/.opus instead of writing raw data
    #[arg(long)]
    pub audio: bool,

    /// Decompression provider identifiers to probe, in order
    #[arg(long = "codec", value_name = "ID")]
    pub codecs: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        match self.quiet {
            0 => "warn",
            1 => "error",
            _ => "off",
        }
    }

    /// Output directory for `archive`.
    pub fn output_dir(&self, archive: &Path) -> PathBuf {
        match &self.extract_dir {
            Some(dir) => dir.clone(),
            None => archive.with_extension(""),
        }
    }

    pub fn archive_options(&self) -> ArchiveOptions {
        if self.codecs.is_empty() {
            ArchiveOptions::default()
        } else {
            ArchiveOptions {
                decompressors: self.codecs.clone(),
            }
        }
    }
}

fn parse_hash(value: &str) -> Result<u64, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| format!("invalid hash {value:?}: {e}"))
}
