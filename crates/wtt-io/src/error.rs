//! Error types for wavetable decoding, encoding and cycle editing.
//!
//! Every failure is a typed, recoverable value. A batch driver is expected to
//! report the error for one asset and carry on with the next.
//!
//! # Error Codes
//!
//! | Code | Variant |
//! |------|---------|
//! | E001 | MalformedSampleData |
//! | E002 | MissingRequiredChunk |
//! | E003 | UnsupportedEncoding |
//! | E004 | BadMagic |
//! | E005 | TruncatedContainer |
//! | E006 | EncodingFlagMismatch |
//! | E007 | InconsistentWaveSize |
//! | E008 | WaveSizeRequired |
//! | E009 | IrregularCycleLength |
//! | E010 | ChunkSizeMismatch |
//! | E011 | MalformedChunk |
//! | E012 | MalformedMetadata |
//! | E013 | MetadataCommentTooLong |
//! | E014 | InvalidWaveSize |
//! | E015 | InvalidSampleRate |
//! | E016 | InvalidInterpolation |
//! | E017 | EmptyWavetable |
//! | E018 | TooManyCycles |
//! | E019 | NonPowerOfTwoWaveSize |
//! | E020 | UnsupportedWavetableKind |
//! | E021 | UnsupportedChannel |
//! | E022 | NonFiniteSample |
//! | E023 | UnknownContainer |
//! | E024 | Config |

use crate::riff::FourCc;
use thiserror::Error;

/// Result type alias for wavetable operations.
pub type Result<T> = std::result::Result<T, WavetableError>;

/// Errors produced by the codecs and the cycle engine.
#[derive(Error, Debug)]
pub enum WavetableError {
    /// Raw sample bytes are not a whole number of samples.
    #[error("malformed sample data: {len} bytes is not a multiple of the {width}-byte sample width")]
    MalformedSampleData { len: usize, width: usize },

    /// A RIFF container lacks the `fmt ` or `data` chunk.
    #[error("missing required '{0}' chunk")]
    MissingRequiredChunk(FourCc),

    /// The `fmt ` chunk describes neither 16-bit PCM nor 32-bit float.
    #[error("unsupported encoding: format tag {format_tag:#06x} with {bits_per_sample} bits per sample")]
    UnsupportedEncoding { format_tag: u16, bits_per_sample: u16 },

    /// The container tag or form type does not match.
    #[error("bad magic: expected '{expected}', found '{found}'")]
    BadMagic { expected: FourCc, found: FourCc },

    /// Fewer bytes remain than the header declares.
    #[error("truncated container: header declares {expected} bytes, only {available} available")]
    TruncatedContainer { expected: usize, available: usize },

    /// The chunked-wavetable flag field names an encoding the sample codec cannot read.
    #[error("encoding flag mismatch: flags {flags:#06x} do not describe a supported sample encoding")]
    EncodingFlagMismatch { flags: u16 },

    /// Assets being combined (or cycles of one asset) disagree on samples per cycle.
    #[error("inconsistent wave size: expected {expected} samples per cycle, item {index} has {found}")]
    InconsistentWaveSize {
        expected: usize,
        found: usize,
        index: usize,
    },

    /// Neither container metadata nor an explicit override supplied a wave size.
    #[error("wave size required: no vendor metadata present and no explicit wave size given")]
    WaveSizeRequired,

    /// The flat sample buffer does not split into whole cycles.
    #[error("irregular cycle length: {total} samples is not a multiple of wave size {wave_size}")]
    IrregularCycleLength { total: usize, wave_size: usize },

    /// A chunk size field disagrees with the bytes actually present (strict mode).
    #[error("chunk size mismatch in '{id}': declared {declared} bytes, {actual} available")]
    ChunkSizeMismatch {
        id: FourCc,
        declared: usize,
        actual: usize,
    },

    /// A chunk is present but its payload cannot be interpreted.
    #[error("malformed '{id}' chunk: {reason}")]
    MalformedChunk { id: FourCc, reason: String },

    /// The vendor metadata block does not follow the expected layout.
    #[error("malformed vendor metadata: {0}")]
    MalformedMetadata(String),

    /// A vendor comment exceeds the metadata block limit and rejection was requested.
    #[error("vendor comment is {len} bytes, limit is {max}")]
    MetadataCommentTooLong { len: usize, max: usize },

    /// A wave size of zero was supplied.
    #[error("invalid wave size {0}: must be positive")]
    InvalidWaveSize(usize),

    /// A sample rate of zero was supplied.
    #[error("invalid sample rate {0}: must be positive")]
    InvalidSampleRate(u32),

    /// Interpolation modes are stored as a single decimal digit.
    #[error("invalid interpolation mode {0}: must be 0-9")]
    InvalidInterpolation(u8),

    /// The operation would produce (or was given) a wavetable with no cycles.
    #[error("wavetable has no cycles")]
    EmptyWavetable,

    /// The chunked-wavetable header stores the cycle count in 16 bits.
    #[error("too many cycles: {count} exceeds the container limit of {max}")]
    TooManyCycles { count: usize, max: usize },

    /// Wavetable synths expect power-of-two cycle lengths in `.wt` files.
    #[error("wave size {0} is not a power of two")]
    NonPowerOfTwoWaveSize(usize),

    /// The chunked-wavetable header marks the content as a one-shot or looped sample.
    #[error("unsupported wavetable kind: {0}")]
    UnsupportedWavetableKind(&'static str),

    /// The requested channel does not exist in the source data.
    #[error("channel {channel} requested but source has {channels} channel(s)")]
    UnsupportedChannel { channel: usize, channels: usize },

    /// Encoders refuse NaN and infinite samples.
    #[error("non-finite sample {value} at cycle {cycle}, index {index}")]
    NonFiniteSample {
        cycle: usize,
        index: usize,
        value: f32,
    },

    /// Container sniffing recognised neither format.
    #[error("unknown container: leading bytes are neither 'RIFF' nor 'vawt'")]
    UnknownContainer,

    /// A defaults document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl WavetableError {
    /// Get the stable error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedSampleData { .. } => "E001",
            Self::MissingRequiredChunk(_) => "E002",
            Self::UnsupportedEncoding { .. } => "E003",
            Self::BadMagic { .. } => "E004",
            Self::TruncatedContainer { .. } => "E005",
            Self::EncodingFlagMismatch { .. } => "E006",
            Self::InconsistentWaveSize { .. } => "E007",
            Self::WaveSizeRequired => "E008",
            Self::IrregularCycleLength { .. } => "E009",
            Self::ChunkSizeMismatch { .. } => "E010",
            Self::MalformedChunk { .. } => "E011",
            Self::MalformedMetadata(_) => "E012",
            Self::MetadataCommentTooLong { .. } => "E013",
            Self::InvalidWaveSize(_) => "E014",
            Self::InvalidSampleRate(_) => "E015",
            Self::InvalidInterpolation(_) => "E016",
            Self::EmptyWavetable => "E017",
            Self::TooManyCycles { .. } => "E018",
            Self::NonPowerOfTwoWaveSize(_) => "E019",
            Self::UnsupportedWavetableKind(_) => "E020",
            Self::UnsupportedChannel { .. } => "E021",
            Self::NonFiniteSample { .. } => "E022",
            Self::UnknownContainer => "E023",
            Self::Config(_) => "E024",
        }
    }
}
