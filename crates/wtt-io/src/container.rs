//! Container detection and the codec capability shared by both formats.
//!
//! Callers that do not care which container they hold go through [`decode`]
//! and [`encode`]; the kind is sniffed from the leading bytes, never from a
//! file extension.

use crate::cycles::PartialCycle;
use crate::error::{Result, WavetableError};
use crate::metadata::CommentOverflow;
use crate::riff::{SizeCheck, RIFF_ID};
use crate::sample::ExportEncoding;
use crate::types::Wavetable;
use crate::wav::{self, Channel};
use crate::wt::{self, WT_MAGIC};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The two on-disk containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    /// RIFF/WAVE audio with an optional `clm ` block.
    Wav,
    /// Dedicated `vawt` chunked wavetable.
    Wt,
}

impl ContainerKind {
    /// Conventional file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Wt => "wt",
        }
    }

    /// Map a file extension (case-insensitive, no dot) to a kind.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "wav" => Some(Self::Wav),
            "wt" => Some(Self::Wt),
            _ => None,
        }
    }

    /// The codec for this container.
    pub fn codec(self) -> &'static dyn ContainerCodec {
        match self {
            Self::Wav => &WavCodec,
            Self::Wt => &WtCodec,
        }
    }
}

impl std::fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wav => write!(f, "RIFF/WAVE"),
            Self::Wt => write!(f, "vawt wavetable"),
        }
    }
}

/// Identify a container from its first four bytes.
///
/// # Errors
///
/// [`WavetableError::UnknownContainer`] for anything that is neither `RIFF`
/// nor `vawt`.
pub fn sniff(bytes: &[u8]) -> Result<ContainerKind> {
    match bytes.get(..4) {
        Some(tag) if tag == RIFF_ID.0 => Ok(ContainerKind::Wav),
        Some(tag) if tag == WT_MAGIC.0 => Ok(ContainerKind::Wt),
        _ => Err(WavetableError::UnknownContainer),
    }
}

/// Knobs that shape decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Override for the samples-per-cycle value found in the container.
    pub wave_size: Option<usize>,
    /// Which channel to keep from multichannel RIFF input.
    pub channel: Channel,
    /// How to react to size fields that disagree with the data present.
    pub size_check: SizeCheck,
    /// What to do with a trailing partial cycle.
    pub partial_cycle: PartialCycle,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            wave_size: None,
            channel: Channel::Left,
            size_check: SizeCheck::Lenient,
            partial_cycle: PartialCycle::Reject,
        }
    }
}

/// Knobs that shape encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Target sample encoding. `None` picks the source encoding's export default.
    pub encoding: Option<ExportEncoding>,
    /// Write the `clm ` block into RIFF output.
    pub include_metadata: bool,
    /// Handling of vendor comments longer than the block allows.
    pub comment_overflow: CommentOverflow,
    /// Refuse non-power-of-two wave sizes in `.wt` output.
    pub require_power_of_two: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            encoding: None,
            include_metadata: true,
            comment_overflow: CommentOverflow::Truncate,
            require_power_of_two: true,
        }
    }
}

impl EncodeOptions {
    /// The encoding to write for `wavetable`.
    pub fn resolve_encoding(&self, wavetable: &Wavetable) -> ExportEncoding {
        self.encoding
            .unwrap_or_else(|| wavetable.source_encoding().export_default())
    }
}

/// A container format that can turn bytes into a [`Wavetable`] and back.
pub trait ContainerCodec: Send + Sync {
    /// Which container this codec handles.
    fn kind(&self) -> ContainerKind;

    /// Parse a complete container held in memory.
    fn decode(&self, bytes: &[u8], options: &DecodeOptions) -> Result<Wavetable>;

    /// Serialize a wavetable into a complete container.
    fn encode(&self, wavetable: &Wavetable, options: &EncodeOptions) -> Result<Vec<u8>>;
}

/// RIFF/WAVE codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavCodec;

impl ContainerCodec for WavCodec {
    fn kind(&self) -> ContainerKind {
        ContainerKind::Wav
    }

    fn decode(&self, bytes: &[u8], options: &DecodeOptions) -> Result<Wavetable> {
        wav::decode_wav(bytes, options)
    }

    fn encode(&self, wavetable: &Wavetable, options: &EncodeOptions) -> Result<Vec<u8>> {
        wav::encode_wav(wavetable, options)
    }
}

/// `vawt` chunked wavetable codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct WtCodec;

impl ContainerCodec for WtCodec {
    fn kind(&self) -> ContainerKind {
        ContainerKind::Wt
    }

    fn decode(&self, bytes: &[u8], options: &DecodeOptions) -> Result<Wavetable> {
        wt::decode_wt(bytes, options)
    }

    fn encode(&self, wavetable: &Wavetable, options: &EncodeOptions) -> Result<Vec<u8>> {
        wt::encode_wt(wavetable, options)
    }
}

/// Sniff the container and decode it.
pub fn decode(bytes: &[u8], options: &DecodeOptions) -> Result<(ContainerKind, Wavetable)> {
    let kind = sniff(bytes)?;
    debug!(container = %kind, len = bytes.len(), "decoding");
    let wavetable = kind.codec().decode(bytes, options)?;
    Ok((kind, wavetable))
}

/// Encode into the given container.
pub fn encode(wavetable: &Wavetable, kind: ContainerKind, options: &EncodeOptions) -> Result<Vec<u8>> {
    kind.codec().encode(wavetable, options)
}
