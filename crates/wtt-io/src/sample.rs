//! Sample codec: raw on-disk sample buffers to canonical `f32` and back.
//!
//! Canonical samples nominally live in `[-1.0, 1.0]`. Three on-disk encodings
//! are understood when reading, but only two of them can be written: the
//! compact 8-bit encoding exists in legacy `.wt` files and is decode-only.
//! That restriction is expressed in the types, [`ExportEncoding`] simply has
//! no compact variant.

use crate::error::{Result, WavetableError};
use serde::{Deserialize, Serialize};

/// Scale between 16-bit integers and canonical floats.
const INT16_SCALE: f32 = 32768.0;

/// Scale between compact 8-bit integers and canonical floats.
const COMPACT8_SCALE: f32 = 128.0;

/// On-disk sample encodings the decoders understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleEncoding {
    /// Little-endian signed 16-bit PCM.
    Int16,
    /// Little-endian IEEE-754 single precision.
    Float32,
    /// Signed 8-bit integers scaled by 1/128 (legacy, read-only).
    Compact8,
}

impl SampleEncoding {
    /// Bytes per sample.
    pub fn width(self) -> usize {
        match self {
            Self::Int16 => 2,
            Self::Float32 => 4,
            Self::Compact8 => 1,
        }
    }

    /// The encoding to write when re-exporting data decoded from `self`.
    ///
    /// Float stays float to avoid re-quantization. Everything else goes to 16-bit.
    pub fn export_default(self) -> ExportEncoding {
        match self {
            Self::Float32 => ExportEncoding::Float32,
            Self::Int16 | Self::Compact8 => ExportEncoding::Int16,
        }
    }

    /// Get a human-readable name for this encoding.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Int16 => "16-bit PCM",
            Self::Float32 => "32-bit float",
            Self::Compact8 => "8-bit compact",
        }
    }
}

impl std::fmt::Display for SampleEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Encodings this crate is willing to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportEncoding {
    Int16,
    Float32,
}

impl ExportEncoding {
    /// Bytes per sample.
    pub fn width(self) -> usize {
        SampleEncoding::from(self).width()
    }

    /// Bits per sample as stored in a `fmt ` chunk.
    pub fn bits_per_sample(self) -> u16 {
        (self.width() * 8) as u16
    }
}

impl From<ExportEncoding> for SampleEncoding {
    fn from(encoding: ExportEncoding) -> Self {
        match encoding {
            ExportEncoding::Int16 => Self::Int16,
            ExportEncoding::Float32 => Self::Float32,
        }
    }
}

/// Whether the target container requires samples within `[-1.0, 1.0]`.
///
/// Integer encodings are always clamped. For float output the chunked
/// wavetable container is bounded, RIFF is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bounds {
    Bounded,
    Unbounded,
}

/// Decode a raw little-endian sample buffer into canonical floats.
///
/// # Errors
///
/// Returns [`WavetableError::MalformedSampleData`] when `bytes.len()` is not a
/// whole number of samples.
pub fn decode_samples(bytes: &[u8], encoding: SampleEncoding) -> Result<Vec<f32>> {
    let width = encoding.width();
    if bytes.len() % width != 0 {
        return Err(WavetableError::MalformedSampleData {
            len: bytes.len(),
            width,
        });
    }

    let samples = match encoding {
        SampleEncoding::Int16 => bytes
            .chunks_exact(2)
            .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]) as f32 / INT16_SCALE)
            .collect(),
        SampleEncoding::Float32 => bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
        SampleEncoding::Compact8 => bytes
            .iter()
            .map(|&byte| byte as i8 as f32 / COMPACT8_SCALE)
            .collect(),
    };

    Ok(samples)
}

/// Encode canonical floats into a fresh byte buffer.
pub fn encode_samples(samples: &[f32], encoding: ExportEncoding, bounds: Bounds) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * encoding.width());
    encode_samples_into(samples, encoding, bounds, &mut out);
    out
}

/// Encode canonical floats, appending to `out`.
pub fn encode_samples_into(
    samples: &[f32],
    encoding: ExportEncoding,
    bounds: Bounds,
    out: &mut Vec<u8>,
) {
    out.reserve(samples.len() * encoding.width());
    match encoding {
        ExportEncoding::Int16 => {
            for &sample in samples {
                out.extend_from_slice(&quantize_int16(sample).to_le_bytes());
            }
        }
        ExportEncoding::Float32 => {
            for &sample in samples {
                let value = match bounds {
                    Bounds::Bounded => sample.clamp(-1.0, 1.0),
                    Bounds::Unbounded => sample,
                };
                out.extend_from_slice(&value.to_le_bytes());
            }
        }
    }
}

/// Clamp, scale and round to the nearest 16-bit value, saturating at the ends.
fn quantize_int16(sample: f32) -> i16 {
    let scaled = (sample.clamp(-1.0, 1.0) * INT16_SCALE).round();
    scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16
}
