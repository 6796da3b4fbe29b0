//! Vendor wavetable metadata: the `clm ` chunk.
//!
//! Several wavetable synths store the cycle length in a small text chunk
//! inside an otherwise ordinary WAV file. This module is the only place that
//! knows its byte layout; everything else sees [`ClmMetadata`].
//!
//! ## Layout, version 1
//!
//! ```text
//! <!>2048 10000000 wavetable (vendor)
//! ^^^                                  prefix
//!    ^^^^                              wave size, decimal
//!        ^                             separator
//!         ^                            interpolation digit
//!          ^^^^^^^                     reserved flags, written as 0
//!                 ^                    separator
//!                  ^^^^^^^^^^^^^^^^^^  free-form comment
//! ```
//!
//! Readers tolerate trailing NUL padding, a missing comment, and a flag field
//! of unexpected width. The layout is not formally documented anywhere, so
//! [`CLM_LAYOUT_VERSION`] names the contract the parser and writer implement.

use crate::error::{Result, WavetableError};
use crate::types::{Interpolation, Wavetable};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Version of the `clm ` layout implemented here.
pub const CLM_LAYOUT_VERSION: u32 = 1;

/// Leading marker of every `clm ` payload.
pub const CLM_PREFIX: &[u8] = b"<!>";

/// Width of the flag field following the wave size.
pub const CLM_FLAG_FIELD_LEN: usize = 8;

/// Longest comment the writer will emit, in bytes.
pub const MAX_COMMENT_LEN: usize = 255;

/// Comment written when the wavetable carries none.
pub const DEFAULT_VENDOR_COMMENT: &str = "wavetable (wtt)";

/// What to do with a comment longer than [`MAX_COMMENT_LEN`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentOverflow {
    /// Cut at the last UTF-8 boundary that fits and log a warning.
    #[default]
    Truncate,
    /// Fail with [`WavetableError::MetadataCommentTooLong`].
    Reject,
}

/// The typed contents of a `clm ` chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClmMetadata {
    /// Samples per cycle.
    pub wave_size: usize,
    /// Inter-cycle interpolation hint.
    pub interpolation: Interpolation,
    /// Free-form vendor comment, if any.
    pub comment: Option<String>,
}

impl ClmMetadata {
    /// Metadata describing an existing wavetable.
    pub fn from_wavetable(wavetable: &Wavetable) -> Self {
        Self {
            wave_size: wavetable.wave_size(),
            interpolation: wavetable.interpolation(),
            comment: wavetable.vendor_comment().map(str::to_owned),
        }
    }

    /// Parse a `clm ` payload.
    ///
    /// # Errors
    ///
    /// [`WavetableError::MalformedMetadata`] if the prefix is missing, the wave
    /// size is not a positive decimal number, or the flag field is absent.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let trimmed_len = payload
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |last| last + 1);
        let payload = &payload[..trimmed_len];

        let rest = payload
            .strip_prefix(CLM_PREFIX)
            .ok_or_else(|| malformed("missing '<!>' prefix"))?;

        let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
        if digits == 0 {
            return Err(malformed("wave size is not a decimal number"));
        }
        let wave_size: usize = std::str::from_utf8(&rest[..digits])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| malformed("wave size out of range"))?;
        if wave_size == 0 {
            return Err(malformed("wave size is zero"));
        }

        let rest = rest[digits..]
            .strip_prefix(b" ")
            .ok_or_else(|| malformed("expected a space after the wave size"))?;

        let flags_len = rest.iter().position(|&b| b == b' ').unwrap_or(rest.len());
        let flags = &rest[..flags_len];
        let interpolation_digit = flags
            .first()
            .filter(|b| b.is_ascii_digit())
            .ok_or_else(|| malformed("missing interpolation flag"))?;
        if flags_len != CLM_FLAG_FIELD_LEN {
            debug!(width = flags_len, "unexpected clm flag field width");
        }
        let interpolation = Interpolation::from_u8(interpolation_digit - b'0')?;

        // The writer's own default stands in for "no comment".
        let comment = rest
            .get(flags_len + 1..)
            .filter(|c| !c.is_empty() && *c != DEFAULT_VENDOR_COMMENT.as_bytes())
            .map(|c| String::from_utf8_lossy(c).into_owned());

        debug!(wave_size, %interpolation, comment = ?comment, "parsed clm metadata");
        Ok(Self {
            wave_size,
            interpolation,
            comment,
        })
    }

    /// Serialize to a `clm ` payload. Padding is left to the RIFF writer.
    ///
    /// A missing comment is replaced by [`DEFAULT_VENDOR_COMMENT`], which
    /// [`ClmMetadata::parse`] reads back as no comment.
    ///
    /// # Errors
    ///
    /// [`WavetableError::MetadataCommentTooLong`] when the comment exceeds
    /// [`MAX_COMMENT_LEN`] and `overflow` is [`CommentOverflow::Reject`].
    pub fn to_bytes(&self, overflow: CommentOverflow) -> Result<Vec<u8>> {
        let comment = self.comment.as_deref().unwrap_or(DEFAULT_VENDOR_COMMENT);
        let comment = fit_comment(comment, overflow)?;

        let header = format!(
            "<!>{} {}{} ",
            self.wave_size,
            self.interpolation.as_u8(),
            "0".repeat(CLM_FLAG_FIELD_LEN - 1)
        );
        let mut payload = Vec::with_capacity(header.len() + comment.len());
        payload.extend_from_slice(header.as_bytes());
        payload.extend_from_slice(comment.as_bytes());
        Ok(payload)
    }
}

fn fit_comment(comment: &str, overflow: CommentOverflow) -> Result<&str> {
    if comment.len() <= MAX_COMMENT_LEN {
        return Ok(comment);
    }
    match overflow {
        CommentOverflow::Reject => Err(WavetableError::MetadataCommentTooLong {
            len: comment.len(),
            max: MAX_COMMENT_LEN,
        }),
        CommentOverflow::Truncate => {
            let mut cut = MAX_COMMENT_LEN;
            while !comment.is_char_boundary(cut) {
                cut -= 1;
            }
            warn!(len = comment.len(), kept = cut, "truncating vendor comment");
            Ok(&comment[..cut])
        }
    }
}

fn malformed(reason: &str) -> WavetableError {
    WavetableError::MalformedMetadata(reason.to_string())
}
