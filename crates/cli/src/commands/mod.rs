//! Subcommands of the `wtt` tool.
//!
//! Each subcommand takes the same [`CommonArgs`]: a list of files or
//! directories plus the option overrides. Flags win over a `--defaults`
//! document, which wins over the built-in defaults.

mod convert;
mod cycles;
mod info;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::fs;
use std::path::PathBuf;
use wtt_io::riff::SizeCheck;
use wtt_io::sample::ExportEncoding;
use wtt_io::{Channel, Options};

/// Wavetable operations.
#[derive(Subcommand)]
pub enum Commands {
    /// Print container, encoding and cycle layout of each input
    Info {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Cut a plain sample into whole cycles and tag it as a wavetable
    MakeTable {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Convert .wt wavetables to tagged .wav files
    WtToWav {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Convert tagged .wav wavetables to .wt files
    WavToWt {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Rewrite the clm metadata block of .wav wavetables
    AddClm {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Write every cycle of each input to its own .wav file
    Slice {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Join all inputs, in order, into one wavetable
    Combine {
        #[command(flatten)]
        common: CommonArgs,

        /// Output file (default: <first input>_combined.wav)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Drop consecutive repeated cycles
    Dedupe {
        #[command(flatten)]
        common: CommonArgs,
    },
}

/// Inputs and option overrides shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Files or directories (directories are not searched recursively)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Samples per cycle; wins over the file's own metadata
    #[arg(short = 'w', long)]
    pub wave_size: Option<usize>,

    /// Interpolation mode to store (0-9)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=9))]
    pub interp: Option<u8>,

    /// Vendor comment to store in the clm block
    #[arg(short, long)]
    pub comment: Option<String>,

    /// Sample rate to store, in Hz (no resampling)
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Read the right channel of stereo .wav files
    #[arg(long)]
    pub right: bool,

    /// Fail on chunk sizes and trailing bytes that would otherwise be tolerated
    #[arg(long)]
    pub strict: bool,

    /// Write 32-bit float samples
    #[arg(long, conflicts_with = "int16")]
    pub float: bool,

    /// Write 16-bit integer samples
    #[arg(long)]
    pub int16: bool,

    /// Overwrite existing outputs
    #[arg(short, long)]
    pub force: bool,

    /// JSON document with default options
    #[arg(long, value_name = "JSON")]
    pub defaults: Option<PathBuf>,
}

impl CommonArgs {
    /// Resolve the effective options: built-in, then `--defaults`, then flags.
    pub fn options(&self) -> Result<Options> {
        let mut options = match &self.defaults {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read defaults: {}", path.display()))?;
                Options::from_json(&json)
                    .with_context(|| format!("Invalid defaults: {}", path.display()))?
            }
            None => Options::default(),
        };

        if let Some(wave_size) = self.wave_size {
            options.wave_size = Some(wave_size);
        }
        if let Some(interp) = self.interp {
            options.interpolation = Some(interp);
        }
        if let Some(comment) = &self.comment {
            options.vendor_comment = Some(comment.clone());
        }
        if let Some(rate) = self.sample_rate {
            options.sample_rate = Some(rate);
        }
        if self.right {
            options.channel = Channel::Right;
        }
        if self.strict {
            options.size_check = SizeCheck::Strict;
        }
        if self.float {
            options.encoding = Some(ExportEncoding::Float32);
        } else if self.int16 {
            options.encoding = Some(ExportEncoding::Int16);
        }
        options.force_overwrite |= self.force;

        options.validate()?;
        Ok(options)
    }
}

/// Execute a wavetable command.
pub fn execute(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Info { common } => info::run(&common),
        Commands::MakeTable { common } => convert::make_table(&common),
        Commands::WtToWav { common } => convert::wt_to_wav(&common),
        Commands::WavToWt { common } => convert::wav_to_wt(&common),
        Commands::AddClm { common } => convert::add_clm(&common),
        Commands::Slice { common } => cycles::slice(&common),
        Commands::Combine { common, output } => cycles::combine(&common, output),
        Commands::Dedupe { common } => cycles::dedupe(&common),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use wtt_io::cycles::PartialCycle;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Commands,
    }

    fn common(args: &[&str]) -> CommonArgs {
        let argv = ["wtt", "info"].iter().chain(args.iter());
        match TestCli::parse_from(argv).command {
            Commands::Info { common } => common,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_flags_map_to_options() {
        let options = common(&[
            "a.wav",
            "--wave-size",
            "1024",
            "--interp",
            "3",
            "--comment",
            "mine",
            "--right",
            "--strict",
            "--int16",
            "-f",
        ])
        .options()
        .unwrap();

        assert_eq!(options.wave_size, Some(1024));
        assert_eq!(options.interpolation, Some(3));
        assert_eq!(options.vendor_comment.as_deref(), Some("mine"));
        assert_eq!(options.channel, Channel::Right);
        assert_eq!(options.size_check, SizeCheck::Strict);
        assert_eq!(options.encoding, Some(ExportEncoding::Int16));
        assert!(options.force_overwrite);
    }

    #[test]
    fn test_no_flags_gives_defaults() {
        assert_eq!(common(&["a.wav"]).options().unwrap(), Options::default());
    }

    #[test]
    fn test_flags_override_defaults_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defaults.json");
        fs::write(
            &path,
            r#"{"wave_size": 2048, "partial_cycle": "truncate", "channel": "right"}"#,
        )
        .unwrap();

        let options = common(&["a.wav", "--defaults", path.to_str().unwrap(), "-w", "512"])
            .options()
            .unwrap();
        assert_eq!(options.wave_size, Some(512));
        assert_eq!(options.partial_cycle, PartialCycle::Truncate);
        assert_eq!(options.channel, Channel::Right);
    }

    #[test]
    fn test_zero_wave_size_rejected() {
        assert!(common(&["a.wav", "-w", "0"]).options().is_err());
    }

    #[test]
    fn test_float_conflicts_with_int16() {
        assert!(TestCli::try_parse_from(["wtt", "info", "a.wav", "--float", "--int16"]).is_err());
    }

    #[test]
    fn test_interp_out_of_range() {
        assert!(TestCli::try_parse_from(["wtt", "info", "a.wav", "--interp", "12"]).is_err());
    }
}
