//! The canonical, container-independent wavetable model.
//!
//! Both codecs decode into a [`Wavetable`] and encode from one, and every
//! cycle-engine operation takes wavetables by reference and returns new ones.
//! Neither [`Cycle`] nor [`Wavetable`] exposes mutation after construction.

use crate::error::{Result, WavetableError};
use crate::sample::SampleEncoding;
use std::sync::Arc;

/// One waveform period.
///
/// Samples are shared behind an `Arc`, so slicing a wavetable or combining
/// assets never copies sample data. Equality is bit-exact: `0.0` and `-0.0`
/// differ, and two NaNs with the same payload are equal.
#[derive(Debug, Clone)]
pub struct Cycle {
    samples: Arc<[f32]>,
}

impl Cycle {
    /// Create a cycle from canonical samples.
    pub fn new(samples: impl Into<Arc<[f32]>>) -> Self {
        Self {
            samples: samples.into(),
        }
    }

    /// The canonical samples of this cycle.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of samples in this cycle.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the cycle holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
    }
}

impl PartialEq for Cycle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.samples, &other.samples)
            || (self.samples.len() == other.samples.len()
                && self
                    .samples
                    .iter()
                    .zip(other.samples.iter())
                    .all(|(a, b)| a.to_bits() == b.to_bits()))
    }
}

impl Eq for Cycle {}

/// Intended inter-cycle interpolation mode, stored in the vendor metadata.
///
/// This is a hint for the playing synth only; nothing here computes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interpolation {
    /// Step between cycles.
    #[default]
    None,
    /// Linear crossfade between cycles.
    Linear,
    /// Any other vendor-specific mode (spectral morphs and the like), 2-9.
    Other(u8),
}

impl Interpolation {
    /// Largest mode number the single-digit metadata field can hold.
    pub const MAX: u8 = 9;

    /// Convert from the stored digit.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Linear),
            2..=Self::MAX => Ok(Self::Other(value)),
            _ => Err(WavetableError::InvalidInterpolation(value)),
        }
    }

    /// Convert to the stored digit.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Linear => 1,
            Self::Other(value) => value,
        }
    }
}

impl std::fmt::Display for Interpolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Linear => write!(f, "linear"),
            Self::Other(value) => write!(f, "mode {}", value),
        }
    }
}

/// A complete wavetable: an ordered, non-empty list of equal-length cycles
/// plus the metadata that travels with them.
///
/// Invariants, checked on construction:
/// - `wave_size > 0`
/// - at least one cycle
/// - every cycle has exactly `wave_size` samples
#[derive(Debug, Clone, PartialEq)]
pub struct Wavetable {
    cycles: Vec<Cycle>,
    wave_size: usize,
    sample_rate: u32,
    interpolation: Interpolation,
    vendor_comment: Option<String>,
    source_encoding: SampleEncoding,
}

impl Wavetable {
    /// Default sample rate for assets whose container does not record one.
    pub const DEFAULT_SAMPLE_RATE: u32 = 88200;

    /// Build a wavetable from cycles, inferring the wave size from the first.
    ///
    /// # Errors
    ///
    /// - [`WavetableError::EmptyWavetable`] if `cycles` is empty
    /// - [`WavetableError::InvalidWaveSize`] if the cycles hold no samples
    /// - [`WavetableError::InconsistentWaveSize`] if the cycle lengths differ
    pub fn new(cycles: Vec<Cycle>) -> Result<Self> {
        let wave_size = cycles.first().ok_or(WavetableError::EmptyWavetable)?.len();
        if wave_size == 0 {
            return Err(WavetableError::InvalidWaveSize(0));
        }
        if let Some((index, cycle)) = cycles
            .iter()
            .enumerate()
            .find(|(_, cycle)| cycle.len() != wave_size)
        {
            return Err(WavetableError::InconsistentWaveSize {
                expected: wave_size,
                found: cycle.len(),
                index,
            });
        }

        Ok(Self {
            cycles,
            wave_size,
            sample_rate: Self::DEFAULT_SAMPLE_RATE,
            interpolation: Interpolation::None,
            vendor_comment: None,
            source_encoding: SampleEncoding::Float32,
        })
    }

    /// Split a flat sample buffer into cycles of `wave_size` samples.
    ///
    /// # Errors
    ///
    /// [`WavetableError::IrregularCycleLength`] when the buffer is not a whole
    /// number of cycles, plus the errors of [`Wavetable::new`].
    pub fn from_samples(samples: &[f32], wave_size: usize) -> Result<Self> {
        Self::new(crate::cycles::split_cycles(samples, wave_size)?)
    }

    /// Set the sample rate. This is a label only, no resampling happens.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(WavetableError::InvalidSampleRate(sample_rate));
        }
        self.sample_rate = sample_rate;
        Ok(self)
    }

    /// Set the interpolation hint.
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Set or clear the vendor comment.
    pub fn with_vendor_comment(mut self, comment: Option<String>) -> Self {
        self.vendor_comment = comment;
        self
    }

    /// Record which on-disk encoding the samples came from.
    pub fn with_source_encoding(mut self, encoding: SampleEncoding) -> Self {
        self.source_encoding = encoding;
        self
    }

    /// Same metadata, different cycles.
    ///
    /// The cycles must satisfy the same invariants as [`Wavetable::new`]; the
    /// wave size is re-derived from them.
    pub fn with_cycles(&self, cycles: Vec<Cycle>) -> Result<Self> {
        let fresh = Self::new(cycles)?;
        Ok(Self {
            cycles: fresh.cycles,
            wave_size: fresh.wave_size,
            sample_rate: self.sample_rate,
            interpolation: self.interpolation,
            vendor_comment: self.vendor_comment.clone(),
            source_encoding: self.source_encoding,
        })
    }

    /// Swap in cycles taken from this (or an equally sized) wavetable.
    ///
    /// Callers guarantee the cycles are non-empty and `wave_size` long.
    pub(crate) fn with_cycles_unchecked(&self, cycles: Vec<Cycle>) -> Self {
        debug_assert!(!cycles.is_empty());
        debug_assert!(cycles.iter().all(|c| c.len() == self.wave_size));
        Self {
            cycles,
            wave_size: self.wave_size,
            sample_rate: self.sample_rate,
            interpolation: self.interpolation,
            vendor_comment: self.vendor_comment.clone(),
            source_encoding: self.source_encoding,
        }
    }

    /// The cycles in playback order.
    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    /// Number of cycles.
    pub fn cycle_count(&self) -> usize {
        self.cycles.len()
    }

    /// Samples per cycle.
    pub fn wave_size(&self) -> usize {
        self.wave_size
    }

    /// Total sample count across all cycles.
    pub fn total_samples(&self) -> usize {
        self.wave_size * self.cycles.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn vendor_comment(&self) -> Option<&str> {
        self.vendor_comment.as_deref()
    }

    pub fn source_encoding(&self) -> SampleEncoding {
        self.source_encoding
    }

    /// Iterate over every sample in cycle order.
    pub fn samples(&self) -> impl Iterator<Item = f32> + '_ {
        self.cycles.iter().flat_map(|c| c.samples().iter().copied())
    }

    /// Copy all samples into one flat buffer.
    pub fn flatten(&self) -> Vec<f32> {
        let mut samples = Vec::with_capacity(self.total_samples());
        for cycle in &self.cycles {
            samples.extend_from_slice(cycle.samples());
        }
        samples
    }

    /// Largest absolute sample value across all cycles.
    pub fn peak(&self) -> f32 {
        self.cycles.iter().fold(0.0f32, |peak, c| peak.max(c.peak()))
    }

    /// Fail on the first NaN or infinite sample.
    ///
    /// # Errors
    ///
    /// [`WavetableError::NonFiniteSample`] naming the cycle and index.
    pub fn ensure_finite(&self) -> Result<()> {
        for (cycle, samples) in self.cycles.iter().enumerate() {
            if let Some((index, &value)) = samples
                .samples()
                .iter()
                .enumerate()
                .find(|(_, s)| !s.is_finite())
            {
                return Err(WavetableError::NonFiniteSample {
                    cycle,
                    index,
                    value,
                });
            }
        }
        Ok(())
    }
}
