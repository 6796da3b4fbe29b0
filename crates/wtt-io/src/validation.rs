//! Structural checks on a decoded wavetable.
//!
//! Decoding already guarantees the model invariants. This module looks for
//! things that are legal but likely to cause trouble downstream, plus
//! non-finite samples, which decoders pass through but encoders refuse.
//!
//! # Issue Codes
//!
//! | Code | Severity | Description |
//! |------|----------|-------------|
//! | V001 | warning | Wave size is not a power of two |
//! | V002 | warning | Samples exceed the nominal [-1.0, 1.0] range |
//! | V003 | error   | Sample is NaN or infinite |
//! | V004 | warning | More than 256 cycles |
//! | V005 | warning | Too many cycles for a `.wt` file |
//! | V006 | warning | Vendor comment will be truncated |

use crate::metadata::MAX_COMMENT_LEN;
use crate::types::Wavetable;
use crate::wt::MAX_CYCLES;
use std::fmt;

/// Cycle count most wavetable synths load without complaint.
pub const TYPICAL_MAX_CYCLES: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// What a [`ValidationIssue`] is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueCode {
    /// V001
    NonPowerOfTwoWaveSize,
    /// V002
    SamplesOutOfRange,
    /// V003
    NonFiniteSample,
    /// V004
    ManyCycles,
    /// V005
    TooManyCyclesForWt,
    /// V006
    CommentTooLong,
}

impl IssueCode {
    /// Get the issue code string (e.g., "V001").
    pub fn code(&self) -> &'static str {
        match self {
            Self::NonPowerOfTwoWaveSize => "V001",
            Self::SamplesOutOfRange => "V002",
            Self::NonFiniteSample => "V003",
            Self::ManyCycles => "V004",
            Self::TooManyCyclesForWt => "V005",
            Self::CommentTooLong => "V006",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::NonFiniteSample => Severity::Error,
            _ => Severity::Warning,
        }
    }

    /// Get guidance on how to fix this issue.
    pub fn guidance(&self) -> &'static str {
        match self {
            Self::NonPowerOfTwoWaveSize => {
                "Use a wave size such as 256, 512, 1024 or 2048; .wt export requires a power of two."
            }
            Self::SamplesOutOfRange => {
                "Normalize the source. 16-bit and .wt output will clip samples beyond full scale."
            }
            Self::NonFiniteSample => {
                "Replace NaN or infinite values in the source; encoders refuse them."
            }
            Self::ManyCycles => "Some synths only load the first 256 cycles. Consider dedupe.",
            Self::TooManyCyclesForWt => "Export as .wav or split the table; .wt stores at most 65535 cycles.",
            Self::CommentTooLong => "Shorten the vendor comment to 255 bytes.",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One finding, with an optional location such as `cycle 3, index 17`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub code: IssueCode,
    pub message: String,
    pub location: Option<String>,
}

impl ValidationIssue {
    pub fn new(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            location: None,
        }
    }

    pub fn at(code: IssueCode, location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            location: Some(location.into()),
        }
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Format the issue with guidance.
    pub fn detailed_message(&self) -> String {
        format!("{}\n  Guidance: {}", self, self.code.guidance())
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "[{}] {}: {}", self.code, location, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

/// All findings for one wavetable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// True when there are no error-severity issues.
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity() == Severity::Warning)
    }

    pub fn has(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }
}

/// Inspect a wavetable and collect every issue found.
pub fn validate_wavetable(wavetable: &Wavetable) -> ValidationReport {
    let mut issues = Vec::new();

    let wave_size = wavetable.wave_size();
    if !wave_size.is_power_of_two() {
        issues.push(ValidationIssue::new(
            IssueCode::NonPowerOfTwoWaveSize,
            format!("wave size {} is not a power of two", wave_size),
        ));
    }

    let cycles = wavetable.cycle_count();
    if cycles > MAX_CYCLES {
        issues.push(ValidationIssue::new(
            IssueCode::TooManyCyclesForWt,
            format!("{} cycles exceeds the .wt limit of {}", cycles, MAX_CYCLES),
        ));
    } else if cycles > TYPICAL_MAX_CYCLES {
        issues.push(ValidationIssue::new(
            IssueCode::ManyCycles,
            format!("{} cycles, more than the usual {}", cycles, TYPICAL_MAX_CYCLES),
        ));
    }

    if let Some(comment) = wavetable.vendor_comment() {
        if comment.len() > MAX_COMMENT_LEN {
            issues.push(ValidationIssue::new(
                IssueCode::CommentTooLong,
                format!("vendor comment is {} bytes", comment.len()),
            ));
        }
    }

    let mut out_of_range = 0usize;
    for (c, cycle) in wavetable.cycles().iter().enumerate() {
        for (i, &sample) in cycle.samples().iter().enumerate() {
            if !sample.is_finite() {
                issues.push(ValidationIssue::at(
                    IssueCode::NonFiniteSample,
                    format!("cycle {}, index {}", c, i),
                    format!("sample is {}", sample),
                ));
            } else if sample.abs() > 1.0 {
                out_of_range += 1;
            }
        }
    }
    if out_of_range > 0 {
        issues.push(ValidationIssue::new(
            IssueCode::SamplesOutOfRange,
            format!(
                "{} samples exceed full scale, peak {:.3}",
                out_of_range,
                wavetable.peak()
            ),
        ));
    }

    ValidationReport { issues }
}
