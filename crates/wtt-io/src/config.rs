//! User-facing options record.
//!
//! [`Options`] is what a driver fills from its command line or from a JSON
//! defaults document. It projects onto the codec-level [`DecodeOptions`] and
//! [`EncodeOptions`], and carries the metadata overrides applied between
//! decode and encode.
//!
//! ```json
//! {
//!   "wave_size": 2048,
//!   "interpolation": 1,
//!   "vendor_comment": "my tables",
//!   "channel": "right",
//!   "size_check": "strict",
//!   "encoding": "float32"
//! }
//! ```
//!
//! Every field is optional in the document.

use crate::container::{DecodeOptions, EncodeOptions};
use crate::cycles::PartialCycle;
use crate::error::{Result, WavetableError};
use crate::metadata::CommentOverflow;
use crate::riff::SizeCheck;
use crate::sample::ExportEncoding;
use crate::types::{Interpolation, Wavetable};
use crate::wav::Channel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Samples per cycle; wins over container metadata.
    pub wave_size: Option<usize>,
    /// Interpolation digit to store; `None` keeps the decoded value.
    pub interpolation: Option<u8>,
    /// Vendor comment to store; `None` keeps the decoded value.
    pub vendor_comment: Option<String>,
    pub channel: Channel,
    /// Only the driver looks at this.
    pub force_overwrite: bool,
    /// Sample rate label to store; no resampling happens.
    pub sample_rate: Option<u32>,
    pub size_check: SizeCheck,
    pub comment_overflow: CommentOverflow,
    pub partial_cycle: PartialCycle,
    /// Target encoding; `None` follows the source encoding.
    pub encoding: Option<ExportEncoding>,
}

impl Options {
    /// Parse a JSON defaults document and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Reject values that can never produce a valid wavetable.
    pub fn validate(&self) -> Result<()> {
        if self.wave_size == Some(0) {
            return Err(WavetableError::InvalidWaveSize(0));
        }
        if self.sample_rate == Some(0) {
            return Err(WavetableError::InvalidSampleRate(0));
        }
        if let Some(mode) = self.interpolation {
            Interpolation::from_u8(mode)?;
        }
        Ok(())
    }

    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            wave_size: self.wave_size,
            channel: self.channel,
            size_check: self.size_check,
            partial_cycle: self.partial_cycle,
        }
    }

    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            encoding: self.encoding,
            comment_overflow: self.comment_overflow,
            ..EncodeOptions::default()
        }
    }

    /// Apply the sample-rate, interpolation and comment overrides.
    pub fn apply(&self, wavetable: &Wavetable) -> Result<Wavetable> {
        let mut out = wavetable.clone();
        if let Some(rate) = self.sample_rate {
            out = out.with_sample_rate(rate)?;
        }
        if let Some(mode) = self.interpolation {
            out = out.with_interpolation(Interpolation::from_u8(mode)?);
        }
        if let Some(comment) = &self.vendor_comment {
            out = out.with_vendor_comment(Some(comment.clone()));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let options = Options::from_json("{}").unwrap();
        assert_eq!(options, Options::default());
        assert_eq!(options.channel, Channel::Left);
        assert_eq!(options.size_check, SizeCheck::Lenient);
        assert_eq!(options.comment_overflow, CommentOverflow::Truncate);
        assert_eq!(options.partial_cycle, PartialCycle::Reject);
    }

    #[test]
    fn test_full_document() {
        let options = Options::from_json(
            r#"{
                "wave_size": 2048,
                "interpolation": 1,
                "vendor_comment": "mine",
                "channel": "right",
                "force_overwrite": true,
                "sample_rate": 48000,
                "size_check": "strict",
                "comment_overflow": "reject",
                "partial_cycle": "truncate",
                "encoding": "float32"
            }"#,
        )
        .unwrap();

        let decode = options.decode_options();
        assert_eq!(decode.wave_size, Some(2048));
        assert_eq!(decode.channel, Channel::Right);
        assert_eq!(decode.size_check, SizeCheck::Strict);
        assert_eq!(decode.partial_cycle, PartialCycle::Truncate);

        let encode = options.encode_options();
        assert_eq!(encode.encoding, Some(ExportEncoding::Float32));
        assert_eq!(encode.comment_overflow, CommentOverflow::Reject);
        assert!(encode.include_metadata);
        assert!(options.force_overwrite);
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            Options::from_json(r#"{"wave_size": 0}"#),
            Err(WavetableError::InvalidWaveSize(0))
        ));
        assert!(matches!(
            Options::from_json(r#"{"interpolation": 12}"#),
            Err(WavetableError::InvalidInterpolation(12))
        ));
        assert!(matches!(
            Options::from_json(r#"{"wave_sise": 2048}"#),
            Err(WavetableError::Config(_))
        ));
        assert!(matches!(
            Options::from_json("not json"),
            Err(WavetableError::Config(_))
        ));
    }

    #[test]
    fn test_apply_overrides_only_what_is_set() {
        let table = Wavetable::from_samples(&[0.0; 4], 4)
            .unwrap()
            .with_vendor_comment(Some("original".to_string()))
            .with_interpolation(Interpolation::Linear);

        let untouched = Options::default().apply(&table).unwrap();
        assert_eq!(untouched, table);

        let options = Options {
            sample_rate: Some(44100),
            vendor_comment: Some("new".to_string()),
            ..Default::default()
        };
        let applied = options.apply(&table).unwrap();
        assert_eq!(applied.sample_rate(), 44100);
        assert_eq!(applied.vendor_comment(), Some("new"));
        assert_eq!(applied.interpolation(), Interpolation::Linear);
    }
}
