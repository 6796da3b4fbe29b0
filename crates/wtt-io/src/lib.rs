//! # wtt-io
//!
//! Wavetable transcoding and cycle editing for the two containers common in
//! software wavetable synths: RIFF/WAVE files carrying a `clm ` block, and
//! the dedicated `vawt` (`.wt`) format.
//!
//! ## Format Overview
//!
//! ```text
//! ┌────────────────────────────────────────┐   ┌──────────────────────────┐
//! │ RIFF Header ("WAVE")                   │   │ "vawt" header            │
//! ├────────────────────────────────────────┤   │   - wave size            │
//! │ fmt  chunk (16-bit PCM or 32-bit float)│   │   - cycle count          │
//! ├────────────────────────────────────────┤   │   - encoding flags       │
//! │ clm  chunk (optional)                  │   ├──────────────────────────┤
//! │   - wave size                          │   │ cycle data, back to back │
//! │   - interpolation digit                │   │   - float32, int16 or    │
//! │   - vendor comment                     │   │     compact 8-bit        │
//! ├────────────────────────────────────────┤   └──────────────────────────┘
//! │ data chunk (cycles, back to back)      │
//! └────────────────────────────────────────┘
//! ```
//!
//! Both decode into one [`Wavetable`]: an immutable, non-empty list of
//! equal-length [`Cycle`]s plus sample rate, interpolation hint, vendor
//! comment and the encoding the samples came from. The [`cycles`] module
//! slices, dedupes and combines wavetables without touching their input.
//!
//! ## Example
//!
//! ```rust,ignore
//! use wtt_io::{container, cycles, ContainerKind, DecodeOptions, EncodeOptions};
//!
//! let bytes = std::fs::read("table.wav")?;
//! let (_, table) = container::decode(&bytes, &DecodeOptions::default())?;
//! let deduped = cycles::dedupe(&table).into_wavetable();
//! let out = container::encode(&deduped, ContainerKind::Wt, &EncodeOptions::default())?;
//! ```

pub mod config;
pub mod container;
pub mod cycles;
pub mod error;
pub mod metadata;
pub mod riff;
pub mod sample;
pub mod types;
pub mod validation;
pub mod wav;
pub mod wt;

// Re-export main types for convenience
pub use config::Options;
pub use container::{sniff, ContainerCodec, ContainerKind, DecodeOptions, EncodeOptions};
pub use cycles::{combine, dedupe, slice, DedupeOutcome, PartialCycle};
pub use error::{Result, WavetableError};
pub use metadata::{ClmMetadata, CommentOverflow};
pub use riff::SizeCheck;
pub use sample::{ExportEncoding, SampleEncoding};
pub use types::{Cycle, Interpolation, Wavetable};
pub use validation::{validate_wavetable, ValidationReport};
pub use wav::Channel;
