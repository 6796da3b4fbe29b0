//! Cycle-level commands: `slice`, `combine` and `dedupe`.

use super::CommonArgs;
use crate::files::{
    cycles_dir, expand_inputs, load, run_batch, same_path, sibling_path, write_output,
    WriteOutcome,
};
use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use wtt_io::{container, cycles, ContainerKind, Options, Wavetable, WavetableError};

pub fn slice(args: &CommonArgs) -> Result<()> {
    let options = args.options()?;
    let files = expand_inputs(&args.inputs)?;
    run_batch(&files, |path| slice_one(path, &options)).into_result()
}

/// Write each cycle to `<stem>_<ext>_cycles/NNN.wav`, numbered from zero.
fn slice_one(path: &Path, options: &Options) -> Result<()> {
    let (_, wavetable) = load(path, options)?;
    let wavetable = options.apply(&wavetable)?;

    let dir = cycles_dir(path);
    if dir.exists() && !options.force_overwrite {
        warn!(dir = %dir.display(), "output folder exists, skipping (use --force to overwrite)");
        return Ok(());
    }
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create folder: {}", dir.display()))?;

    let slices = cycles::slice(&wavetable);
    let width = slice_name_width(slices.len());
    let encode = options.encode_options();
    for (index, single) in slices.iter().enumerate() {
        let bytes = container::encode(single, ContainerKind::Wav, &encode)
            .with_context(|| format!("Failed to encode cycle {} of {}", index, path.display()))?;
        let output = dir.join(format!("{:0width$}.wav", index, width = width));
        write_output(&output, &bytes, true)?;
    }

    info!(
        input = %path.display(),
        output = %dir.display(),
        cycles = slices.len(),
        "sliced"
    );
    Ok(())
}

/// Digits in slice file names: at least three, more for very long tables.
fn slice_name_width(count: usize) -> usize {
    count.saturating_sub(1).to_string().len().max(3)
}

/// Join every input, in the order given, into one `.wav` wavetable.
pub fn combine(args: &CommonArgs, output: Option<PathBuf>) -> Result<()> {
    let options = args.options()?;
    let mut files = expand_inputs(&args.inputs)?;
    let output = output.unwrap_or_else(|| sibling_path(&files[0], "_combined", "wav"));

    // A previous run may have left its output among the inputs.
    files.retain(|path| {
        let reused = same_path(path, &output);
        if reused {
            warn!(path = %path.display(), "skipping input that is the combine output");
        }
        !reused
    });
    if files.is_empty() {
        bail!("No inputs left to combine besides {}", output.display());
    }

    let assets: Vec<Wavetable> = files
        .par_iter()
        .map(|path| load(path, &options).map(|(_, wavetable)| wavetable))
        .collect::<Result<_>>()?;

    let combined = match cycles::combine(&assets) {
        Ok(combined) => combined,
        Err(err @ WavetableError::InconsistentWaveSize { index, .. }) => {
            return Err(err).with_context(|| format!("Cannot combine {}", files[index].display()))
        }
        Err(err) => return Err(err).context("Failed to combine inputs"),
    };
    let combined = options.apply(&combined)?;

    let bytes = container::encode(&combined, ContainerKind::Wav, &options.encode_options())
        .context("Failed to encode combined wavetable")?;

    if write_output(&output, &bytes, options.force_overwrite)? == WriteOutcome::Written {
        info!(
            inputs = files.len(),
            output = %output.display(),
            cycles = combined.cycle_count(),
            "combined"
        );
    }
    Ok(())
}

pub fn dedupe(args: &CommonArgs) -> Result<()> {
    let options = args.options()?;
    let files = expand_inputs(&args.inputs)?;
    run_batch(&files, |path| dedupe_one(path, &options)).into_result()
}

/// Writes `<stem>_dedupe.<ext>` in the input's own container, or nothing
/// when no cycle repeats its predecessor.
fn dedupe_one(path: &Path, options: &Options) -> Result<()> {
    let (kind, wavetable) = load(path, options)?;

    let outcome = cycles::dedupe(&wavetable);
    if !outcome.found_duplicates() {
        info!(input = %path.display(), "no duplicates found");
        return Ok(());
    }
    let removed = outcome.removed();
    let deduped = options.apply(&outcome.into_wavetable())?;

    let bytes = container::encode(&deduped, kind, &options.encode_options())
        .with_context(|| format!("Failed to encode: {}", path.display()))?;
    let output = sibling_path(path, "_dedupe", kind.extension());

    if write_output(&output, &bytes, options.force_overwrite)? == WriteOutcome::Written {
        info!(
            input = %path.display(),
            output = %output.display(),
            removed,
            cycles = deduped.cycle_count(),
            "deduplicated"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_name_width() {
        assert_eq!(slice_name_width(1), 3);
        assert_eq!(slice_name_width(256), 3);
        assert_eq!(slice_name_width(1000), 3);
        assert_eq!(slice_name_width(1001), 4);
    }
}
