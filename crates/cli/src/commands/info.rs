//! `wtt info`: print what a wavetable file contains.

use super::CommonArgs;
use crate::files::{expand_inputs, BatchSummary};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::error;
use wtt_io::wav::read_wav;
use wtt_io::wt::decode_wt;
use wtt_io::{sniff, validate_wavetable, ContainerKind, Options, Wavetable, WavetableError};

/// Inspect every input in order. Output is not interleaved, so this runs
/// sequentially.
pub fn run(args: &CommonArgs) -> Result<()> {
    let options = args.options()?;
    let files = expand_inputs(&args.inputs)?;

    let mut summary = BatchSummary {
        total: files.len(),
        failed: 0,
    };
    for (i, path) in files.iter().enumerate() {
        if i > 0 {
            println!();
        }
        if let Err(err) = inspect(path, &options) {
            error!("{:#}", err);
            summary.failed += 1;
        }
    }
    summary.into_result()
}

fn inspect(path: &Path, options: &Options) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read: {}", path.display()))?;
    let kind = sniff(&bytes).with_context(|| format!("Unrecognised file: {}", path.display()))?;
    let decode = options.decode_options();

    print_header(path, kind);

    match kind {
        ContainerKind::Wav => {
            let contents = read_wav(&bytes, &decode)
                .with_context(|| format!("Failed to decode: {}", path.display()))?;
            println!("Encoding: {}", contents.encoding);
            println!("Channels: {}", contents.format.channels);
            println!("Sample Rate: {} Hz", contents.format.sample_rate);
            println!("Samples: {}", format_number(contents.samples.len()));
            match &contents.metadata {
                Some(meta) => println!("clm Block: wave size {}", meta.wave_size),
                None => println!("clm Block: none"),
            }

            match contents.into_wavetable(&decode) {
                Ok(wavetable) => print_layout(&wavetable),
                Err(WavetableError::WaveSizeRequired) => {
                    println!();
                    println!("Cycles: unknown (no clm block, pass --wave-size)");
                }
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("Failed to split cycles: {}", path.display()))
                }
            }
        }
        ContainerKind::Wt => {
            let wavetable = decode_wt(&bytes, &decode)
                .with_context(|| format!("Failed to decode: {}", path.display()))?;
            println!("Encoding: {}", wavetable.source_encoding());
            println!("Samples: {}", format_number(wavetable.total_samples()));
            print_layout(&wavetable);
        }
    }

    Ok(())
}

fn print_header(path: &Path, kind: ContainerKind) {
    let filename = path.file_name().unwrap_or_default().to_string_lossy();
    let separator = "─".repeat(filename.chars().count() + 11);

    println!("Wavetable: {}", filename);
    println!("{}", separator);
    println!("Container: {}", kind);
}

fn print_layout(wavetable: &Wavetable) {
    println!();
    println!("Structure:");
    println!("  Wave Size: {} samples", wavetable.wave_size());
    println!("  Cycles: {}", wavetable.cycle_count());
    println!("  Interpolation: {}", wavetable.interpolation());
    if let Some(comment) = wavetable.vendor_comment() {
        println!("  Comment: {}", comment);
    }
    println!("  Peak: {:.4}", wavetable.peak());

    let report = validate_wavetable(wavetable);
    if !report.issues.is_empty() {
        println!();
        println!("Issues:");
        for issue in &report.issues {
            println!("  {}", issue.detailed_message());
        }
    }
}

/// Format a number with thousands separators.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(524288), "524,288");
        assert_eq!(format_number(1234567), "1,234,567");
    }
}
