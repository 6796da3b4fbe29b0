//! One-in, one-out conversions: `make-table`, `wt-to-wav`, `wav-to-wt`
//! and `add-clm`.

use super::CommonArgs;
use crate::files::{expand_inputs, load, load_kind, run_batch, sibling_path, write_output, WriteOutcome};
use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::info;
use wtt_io::cycles::PartialCycle;
use wtt_io::{container, ContainerKind, Options};

/// Source and target of a conversion.
struct Conversion {
    /// `None` accepts either container.
    source: Option<ContainerKind>,
    target: ContainerKind,
    /// Appended to the input's stem to name the output.
    suffix: &'static str,
}

/// Cut a plain sample into cycles, dropping a trailing partial cycle.
pub fn make_table(args: &CommonArgs) -> Result<()> {
    let mut options = args.options()?;
    options.partial_cycle = PartialCycle::Truncate;
    run(
        args,
        &options,
        &Conversion {
            source: None,
            target: ContainerKind::Wav,
            suffix: "_maketable",
        },
    )
}

pub fn wt_to_wav(args: &CommonArgs) -> Result<()> {
    run(
        args,
        &args.options()?,
        &Conversion {
            source: Some(ContainerKind::Wt),
            target: ContainerKind::Wav,
            suffix: "",
        },
    )
}

pub fn wav_to_wt(args: &CommonArgs) -> Result<()> {
    run(
        args,
        &args.options()?,
        &Conversion {
            source: Some(ContainerKind::Wav),
            target: ContainerKind::Wt,
            suffix: "",
        },
    )
}

/// Re-tag a `.wav` wavetable; the wave size comes from `--wave-size` or the
/// existing `clm ` block.
pub fn add_clm(args: &CommonArgs) -> Result<()> {
    run(
        args,
        &args.options()?,
        &Conversion {
            source: Some(ContainerKind::Wav),
            target: ContainerKind::Wav,
            suffix: "_addclm",
        },
    )
}

fn run(args: &CommonArgs, options: &Options, conversion: &Conversion) -> Result<()> {
    let files = expand_inputs(&args.inputs)?;
    run_batch(&files, |path| convert_one(path, options, conversion)).into_result()
}

fn convert_one(path: &Path, options: &Options, conversion: &Conversion) -> Result<()> {
    let wavetable = match conversion.source {
        Some(kind) => load_kind(path, options, kind)?,
        None => load(path, options)?.1,
    };
    let wavetable = options.apply(&wavetable)?;

    let bytes = container::encode(&wavetable, conversion.target, &options.encode_options())
        .with_context(|| format!("Failed to encode: {}", path.display()))?;
    let output = sibling_path(path, conversion.suffix, conversion.target.extension());
    if output == path {
        bail!("{} would overwrite its own input", output.display());
    }

    if write_output(&output, &bytes, options.force_overwrite)? == WriteOutcome::Written {
        info!(
            input = %path.display(),
            output = %output.display(),
            wave_size = wavetable.wave_size(),
            cycles = wavetable.cycle_count(),
            "converted"
        );
    }
    Ok(())
}
