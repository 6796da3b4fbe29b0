//! Cycle engine: slicing, deduplication, combining and wave-size derivation.
//!
//! All operations are pure functions over [`Wavetable`] values. They never
//! modify their input, so a failed operation cannot leave a half-edited asset.

use crate::error::{Result, WavetableError};
use crate::types::{Cycle, Interpolation, Wavetable};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// What to do with samples left over after the last whole cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartialCycle {
    /// Fail with [`WavetableError::IrregularCycleLength`].
    #[default]
    Reject,
    /// Drop the trailing partial cycle and log a warning.
    Truncate,
}

/// Pick the effective wave size. An explicit override always wins over the
/// value found in container metadata.
///
/// # Errors
///
/// - [`WavetableError::WaveSizeRequired`] if neither source supplies one
/// - [`WavetableError::InvalidWaveSize`] if the chosen value is zero
pub fn resolve_wave_size(from_metadata: Option<usize>, explicit: Option<usize>) -> Result<usize> {
    let wave_size = explicit
        .or(from_metadata)
        .ok_or(WavetableError::WaveSizeRequired)?;
    if wave_size == 0 {
        return Err(WavetableError::InvalidWaveSize(wave_size));
    }
    if let (Some(meta), Some(over)) = (from_metadata, explicit) {
        if meta != over {
            debug!(metadata = meta, explicit = over, "wave size override replaces metadata value");
        }
    }
    Ok(wave_size)
}

/// Resolve the wave size and check that `total_samples` divides evenly by it.
///
/// # Errors
///
/// The errors of [`resolve_wave_size`], plus
/// [`WavetableError::IrregularCycleLength`] when a partial cycle would remain.
pub fn derive_wave_size(
    from_metadata: Option<usize>,
    explicit: Option<usize>,
    total_samples: usize,
) -> Result<usize> {
    let wave_size = resolve_wave_size(from_metadata, explicit)?;
    if total_samples % wave_size != 0 {
        return Err(WavetableError::IrregularCycleLength {
            total: total_samples,
            wave_size,
        });
    }
    Ok(wave_size)
}

/// Split a flat buffer into cycles of exactly `wave_size` samples.
pub fn split_cycles(samples: &[f32], wave_size: usize) -> Result<Vec<Cycle>> {
    split_cycles_with(samples, wave_size, PartialCycle::Reject)
}

/// Split a flat buffer into cycles, handling a trailing remainder per `partial`.
pub fn split_cycles_with(
    samples: &[f32],
    wave_size: usize,
    partial: PartialCycle,
) -> Result<Vec<Cycle>> {
    if wave_size == 0 {
        return Err(WavetableError::InvalidWaveSize(wave_size));
    }

    let remainder = samples.len() % wave_size;
    if remainder != 0 {
        match partial {
            PartialCycle::Reject => {
                return Err(WavetableError::IrregularCycleLength {
                    total: samples.len(),
                    wave_size,
                })
            }
            PartialCycle::Truncate => warn!(
                dropped = remainder,
                wave_size, "dropping trailing partial cycle"
            ),
        }
    }

    Ok(samples
        .chunks_exact(wave_size)
        .map(|chunk| Cycle::new(chunk.to_vec()))
        .collect())
}

/// Produce one single-cycle wavetable per cycle, in playback order.
///
/// Each slice keeps the source's sample rate, comment and encoding. Index
/// `i` of the result is cycle `i` of the input.
pub fn slice(wavetable: &Wavetable) -> Vec<Wavetable> {
    wavetable
        .cycles()
        .iter()
        .map(|cycle| wavetable.with_cycles_unchecked(vec![cycle.clone()]))
        .collect()
}

/// Result of [`dedupe`].
#[derive(Debug, Clone, PartialEq)]
pub enum DedupeOutcome {
    /// At least one repeated cycle was removed.
    Deduplicated { wavetable: Wavetable, removed: usize },
    /// No cycle equalled its predecessor. Carries an unchanged copy of the input
    /// so the caller can still choose to write it out.
    NoDuplicatesFound(Wavetable),
}

impl DedupeOutcome {
    /// The resulting wavetable, whichever way it went.
    pub fn wavetable(&self) -> &Wavetable {
        match self {
            Self::Deduplicated { wavetable, .. } | Self::NoDuplicatesFound(wavetable) => wavetable,
        }
    }

    pub fn into_wavetable(self) -> Wavetable {
        match self {
            Self::Deduplicated { wavetable, .. } | Self::NoDuplicatesFound(wavetable) => wavetable,
        }
    }

    /// Number of cycles removed (zero when nothing was found).
    pub fn removed(&self) -> usize {
        match self {
            Self::Deduplicated { removed, .. } => *removed,
            Self::NoDuplicatesFound(_) => 0,
        }
    }

    pub fn found_duplicates(&self) -> bool {
        matches!(self, Self::Deduplicated { .. })
    }
}

/// Remove every cycle that is bit-identical to the cycle right before it.
///
/// Only consecutive repeats count: `[A, A, B, B, B, C]` becomes `[A, B, C]`
/// while `[A, B, A]` is left alone. When cycles are removed the interpolation
/// hint is reset to [`Interpolation::None`], since crossfade positions no
/// longer line up with the original table.
pub fn dedupe(wavetable: &Wavetable) -> DedupeOutcome {
    let cycles = wavetable.cycles();
    let mut kept: Vec<Cycle> = Vec::with_capacity(cycles.len());
    kept.push(cycles[0].clone());
    for pair in cycles.windows(2) {
        if pair[1] != pair[0] {
            kept.push(pair[1].clone());
        }
    }

    let removed = cycles.len() - kept.len();
    if removed == 0 {
        info!(cycles = cycles.len(), "no duplicate cycles found");
        return DedupeOutcome::NoDuplicatesFound(wavetable.clone());
    }

    info!(removed, remaining = kept.len(), "removed duplicate cycles");
    let deduped = wavetable
        .with_cycles_unchecked(kept)
        .with_interpolation(Interpolation::None);
    DedupeOutcome::Deduplicated {
        wavetable: deduped,
        removed,
    }
}

/// Concatenate the cycles of several assets, in the order given.
///
/// The result takes its sample rate, interpolation hint, comment and source
/// encoding from the first asset.
///
/// # Errors
///
/// - [`WavetableError::EmptyWavetable`] if `assets` is empty
/// - [`WavetableError::InconsistentWaveSize`] naming the first asset whose
///   wave size differs from the first asset's
pub fn combine(assets: &[Wavetable]) -> Result<Wavetable> {
    let first = assets.first().ok_or(WavetableError::EmptyWavetable)?;
    let expected = first.wave_size();

    if let Some((index, asset)) = assets
        .iter()
        .enumerate()
        .find(|(_, asset)| asset.wave_size() != expected)
    {
        return Err(WavetableError::InconsistentWaveSize {
            expected,
            found: asset.wave_size(),
            index,
        });
    }

    let cycles: Vec<Cycle> = assets
        .iter()
        .flat_map(|asset| asset.cycles().iter().cloned())
        .collect();
    debug!(assets = assets.len(), cycles = cycles.len(), "combining assets");
    first.with_cycles(cycles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle(value: f32) -> Cycle {
        Cycle::new(vec![value; 4])
    }

    fn table(values: &[f32]) -> Wavetable {
        Wavetable::new(values.iter().map(|&v| cycle(v)).collect()).unwrap()
    }

    #[test]
    fn test_resolve_override_wins() {
        assert_eq!(resolve_wave_size(Some(2048), Some(1024)).unwrap(), 1024);
        assert_eq!(resolve_wave_size(Some(2048), None).unwrap(), 2048);
        assert_eq!(resolve_wave_size(None, Some(256)).unwrap(), 256);
        assert!(matches!(
            resolve_wave_size(None, None),
            Err(WavetableError::WaveSizeRequired)
        ));
        assert!(matches!(
            resolve_wave_size(None, Some(0)),
            Err(WavetableError::InvalidWaveSize(0))
        ));
    }

    #[test]
    fn test_derive_divisibility() {
        assert!(matches!(
            derive_wave_size(None, Some(2048), 5000),
            Err(WavetableError::IrregularCycleLength {
                total: 5000,
                wave_size: 2048
            })
        ));
        assert_eq!(derive_wave_size(Some(2048), None, 4096).unwrap(), 2048);
    }

    #[test]
    fn test_split_truncate() {
        let samples = vec![0.5f32; 10];
        assert!(split_cycles(&samples, 4).is_err());
        let cycles = split_cycles_with(&samples, 4, PartialCycle::Truncate).unwrap();
        assert_eq!(cycles.len(), 2);
    }

    #[test]
    fn test_dedupe_consecutive_only() {
        let outcome = dedupe(&table(&[0.1, 0.1, 0.2, 0.2, 0.2, 0.3]));
        assert_eq!(outcome.removed(), 3);
        assert_eq!(outcome.wavetable().cycles(), table(&[0.1, 0.2, 0.3]).cycles());

        let outcome = dedupe(&table(&[0.1, 0.2, 0.1]));
        assert!(!outcome.found_duplicates());
        assert_eq!(outcome.wavetable().cycle_count(), 3);
    }

    #[test]
    fn test_dedupe_resets_interpolation() {
        let source = table(&[0.1, 0.1]).with_interpolation(Interpolation::Linear);
        let outcome = dedupe(&source);
        assert_eq!(outcome.wavetable().interpolation(), Interpolation::None);

        let untouched = table(&[0.1, 0.2]).with_interpolation(Interpolation::Linear);
        let outcome = dedupe(&untouched);
        assert_eq!(outcome.wavetable().interpolation(), Interpolation::Linear);
    }

    #[test]
    fn test_combine_rejects_mixed_sizes() {
        let a = Wavetable::from_samples(&vec![0.0; 2048], 2048).unwrap();
        let b = Wavetable::from_samples(&vec![0.0; 1024], 1024).unwrap();
        assert!(matches!(
            combine(&[a, b]),
            Err(WavetableError::InconsistentWaveSize {
                expected: 2048,
                found: 1024,
                index: 1
            })
        ));
        assert!(matches!(combine(&[]), Err(WavetableError::EmptyWavetable)));
    }

    #[test]
    fn test_slice_then_combine() {
        let source = table(&[0.1, 0.2, 0.3]);
        let slices = slice(&source);
        assert_eq!(slices.len(), 3);
        assert!(slices.iter().all(|s| s.cycle_count() == 1));
        assert_eq!(combine(&slices).unwrap(), source);
    }
}
