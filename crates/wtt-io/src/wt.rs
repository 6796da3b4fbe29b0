//! `vawt` chunked wavetable codec.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ "vawt"                          4 bytes  │
//! │ wave size (u32 LE)              4 bytes  │
//! │ cycle count (u16 LE)            2 bytes  │
//! │ flags (u16 LE)                  2 bytes  │
//! ├──────────────────────────────────────────┤
//! │ cycle 0 │ cycle 1 │ ... │ cycle n-1      │
//! ├──────────────────────────────────────────┤
//! │ optional trailing metadata (ignored)     │
//! └──────────────────────────────────────────┘
//! ```
//!
//! Cycles follow each other with no padding. The container has no sample
//! rate field, so decoded tables get [`Wavetable::DEFAULT_SAMPLE_RATE`].

use crate::container::{DecodeOptions, EncodeOptions};
use crate::cycles::{resolve_wave_size, split_cycles_with};
use crate::error::{Result, WavetableError};
use crate::riff::{read_u16_le, read_u32_le, FourCc, SizeCheck};
use crate::sample::{decode_samples, encode_samples_into, Bounds, ExportEncoding, SampleEncoding};
use crate::types::Wavetable;
use tracing::{debug, info, warn};

/// Leading tag of every `.wt` file.
pub const WT_MAGIC: FourCc = FourCc(*b"vawt");

/// Size of the fixed header.
pub const WT_HEADER_LEN: usize = 12;

/// The cycle count is stored in 16 bits.
pub const MAX_CYCLES: usize = u16::MAX as usize;

/// Content is a one-shot sample rather than a wavetable.
pub const FLAG_SAMPLE: u16 = 0x0001;
/// Content is a looped sample.
pub const FLAG_LOOPED: u16 = 0x0002;
/// Samples are 16-bit integers.
pub const FLAG_INT16: u16 = 0x0004;
/// 16-bit samples use the full range; without it they peak at half scale.
pub const FLAG_FULL_RANGE: u16 = 0x0008;
/// Vendor metadata follows the sample data.
pub const FLAG_HAS_METADATA: u16 = 0x0010;
/// Samples are compact 8-bit integers.
pub const FLAG_COMPACT8: u16 = 0x0020;

const KNOWN_FLAGS: u16 =
    FLAG_SAMPLE | FLAG_LOOPED | FLAG_INT16 | FLAG_FULL_RANGE | FLAG_HAS_METADATA | FLAG_COMPACT8;

/// The fixed `.wt` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WtHeader {
    pub wave_size: u32,
    pub cycle_count: u16,
    pub flags: u16,
}

impl WtHeader {
    /// Parse the header from the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if let Some(found) = FourCc::from_slice(bytes) {
            if found != WT_MAGIC {
                return Err(WavetableError::BadMagic {
                    expected: WT_MAGIC,
                    found,
                });
            }
        }
        if bytes.len() < WT_HEADER_LEN {
            return Err(WavetableError::TruncatedContainer {
                expected: WT_HEADER_LEN,
                available: bytes.len(),
            });
        }

        Ok(Self {
            wave_size: read_u32_le(bytes, 4),
            cycle_count: read_u16_le(bytes, 8),
            flags: read_u16_le(bytes, 10),
        })
    }

    /// Header for writing `cycle_count` cycles of `wave_size` samples.
    pub fn for_export(wave_size: u32, cycle_count: u16, encoding: ExportEncoding) -> Self {
        let flags = match encoding {
            ExportEncoding::Int16 => FLAG_INT16 | FLAG_FULL_RANGE,
            ExportEncoding::Float32 => 0,
        };
        Self {
            wave_size,
            cycle_count,
            flags,
        }
    }

    /// The sample encoding the flags describe.
    ///
    /// # Errors
    ///
    /// - [`WavetableError::UnsupportedWavetableKind`] for one-shot or looped samples
    /// - [`WavetableError::EncodingFlagMismatch`] for unknown bits or conflicting encodings
    pub fn encoding(&self) -> Result<SampleEncoding> {
        if self.flags & FLAG_SAMPLE != 0 {
            return Err(WavetableError::UnsupportedWavetableKind("one-shot sample"));
        }
        if self.flags & FLAG_LOOPED != 0 {
            return Err(WavetableError::UnsupportedWavetableKind("looped sample"));
        }
        if self.flags & !KNOWN_FLAGS != 0 {
            return Err(WavetableError::EncodingFlagMismatch { flags: self.flags });
        }

        match (self.flags & FLAG_INT16 != 0, self.flags & FLAG_COMPACT8 != 0) {
            (true, true) => Err(WavetableError::EncodingFlagMismatch { flags: self.flags }),
            (true, false) => Ok(SampleEncoding::Int16),
            (false, true) => Ok(SampleEncoding::Compact8),
            (false, false) => Ok(SampleEncoding::Float32),
        }
    }

    /// Whether 16-bit data peaks at half scale.
    pub fn is_half_range(&self) -> bool {
        self.flags & FLAG_INT16 != 0 && self.flags & FLAG_FULL_RANGE == 0
    }

    pub fn has_metadata(&self) -> bool {
        self.flags & FLAG_HAS_METADATA != 0
    }

    pub fn to_bytes(&self) -> [u8; WT_HEADER_LEN] {
        let mut out = [0u8; WT_HEADER_LEN];
        out[0..4].copy_from_slice(&WT_MAGIC.0);
        out[4..8].copy_from_slice(&self.wave_size.to_le_bytes());
        out[8..10].copy_from_slice(&self.cycle_count.to_le_bytes());
        out[10..12].copy_from_slice(&self.flags.to_le_bytes());
        out
    }
}

/// Decode a `.wt` buffer.
///
/// # Errors
///
/// - [`WavetableError::BadMagic`] if the tag is not `vawt`
/// - [`WavetableError::TruncatedContainer`] if fewer bytes remain than the
///   header declares
/// - [`WavetableError::EncodingFlagMismatch`] for flags the sample codec
///   cannot honour
/// - [`WavetableError::ChunkSizeMismatch`] for unflagged trailing bytes in
///   strict mode
pub fn decode_wt(bytes: &[u8], options: &DecodeOptions) -> Result<Wavetable> {
    let header = WtHeader::parse(bytes)?;
    let encoding = header.encoding()?;
    debug!(
        wave_size = header.wave_size,
        cycles = header.cycle_count,
        flags = header.flags,
        "read vawt header"
    );

    let stored_wave_size = header.wave_size as usize;
    if stored_wave_size == 0 {
        return Err(WavetableError::InvalidWaveSize(0));
    }
    if header.cycle_count == 0 {
        return Err(WavetableError::EmptyWavetable);
    }

    let payload_len = stored_wave_size
        .checked_mul(header.cycle_count as usize)
        .and_then(|n| n.checked_mul(encoding.width()))
        .ok_or(WavetableError::InvalidWaveSize(stored_wave_size))?;
    let declared = WT_HEADER_LEN + payload_len;
    if bytes.len() < declared {
        return Err(WavetableError::TruncatedContainer {
            expected: declared,
            available: bytes.len(),
        });
    }

    let trailing = bytes.len() - declared;
    if trailing > 0 {
        if header.has_metadata() {
            debug!(trailing, "skipping trailing vawt metadata");
        } else if options.size_check == SizeCheck::Strict {
            return Err(WavetableError::ChunkSizeMismatch {
                id: WT_MAGIC,
                declared,
                actual: bytes.len(),
            });
        } else {
            warn!(trailing, "ignoring unexpected bytes after vawt payload");
        }
    }

    let mut samples = decode_samples(&bytes[WT_HEADER_LEN..declared], encoding)?;
    if header.is_half_range() {
        debug!("scaling half-range 16-bit data");
        samples.iter_mut().for_each(|s| *s *= 2.0);
    }

    let wave_size = resolve_wave_size(Some(stored_wave_size), options.wave_size)?;
    let cycles = split_cycles_with(&samples, wave_size, options.partial_cycle)?;
    let wavetable = Wavetable::new(cycles)?.with_source_encoding(encoding);

    info!(
        wave_size,
        cycles = wavetable.cycle_count(),
        encoding = %encoding,
        "decoded vawt wavetable"
    );
    Ok(wavetable)
}

/// Encode a wavetable as `.wt`.
///
/// Float output is clamped to `[-1.0, 1.0]`.
///
/// # Errors
///
/// - [`WavetableError::NonFiniteSample`] if any sample is NaN or infinite
/// - [`WavetableError::TooManyCycles`] above [`MAX_CYCLES`]
/// - [`WavetableError::NonPowerOfTwoWaveSize`] unless disabled in `options`
pub fn encode_wt(wavetable: &Wavetable, options: &EncodeOptions) -> Result<Vec<u8>> {
    wavetable.ensure_finite()?;

    let cycle_count = u16::try_from(wavetable.cycle_count()).map_err(|_| WavetableError::TooManyCycles {
        count: wavetable.cycle_count(),
        max: MAX_CYCLES,
    })?;
    let wave_size = wavetable.wave_size();
    if options.require_power_of_two && !wave_size.is_power_of_two() {
        return Err(WavetableError::NonPowerOfTwoWaveSize(wave_size));
    }
    let stored_wave_size =
        u32::try_from(wave_size).map_err(|_| WavetableError::InvalidWaveSize(wave_size))?;

    let encoding = options.resolve_encoding(wavetable);
    let header = WtHeader::for_export(stored_wave_size, cycle_count, encoding);

    let mut bytes = Vec::with_capacity(WT_HEADER_LEN + wavetable.total_samples() * encoding.width());
    bytes.extend_from_slice(&header.to_bytes());
    for cycle in wavetable.cycles() {
        encode_samples_into(cycle.samples(), encoding, Bounds::Bounded, &mut bytes);
    }

    debug!(
        wave_size,
        cycles = cycle_count,
        flags = header.flags,
        len = bytes.len(),
        "encoded vawt wavetable"
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cycle;

    fn header_bytes(wave_size: u32, count: u16, flags: u16) -> Vec<u8> {
        WtHeader {
            wave_size,
            cycle_count: count,
            flags,
        }
        .to_bytes()
        .to_vec()
    }

    #[test]
    fn test_float_roundtrip_is_exact() {
        let table = Wavetable::from_samples(&[0.1, -0.2, 0.3, 0.4, 0.5, -0.6, 0.7, -0.8], 4).unwrap();
        let bytes = encode_wt(&table, &EncodeOptions::default()).unwrap();

        assert_eq!(&bytes[..4], b"vawt");
        assert_eq!(bytes.len(), WT_HEADER_LEN + 8 * 4);
        assert_eq!(read_u16_le(&bytes, 10), 0);

        let decoded = decode_wt(&bytes, &DecodeOptions::default()).unwrap();
        assert_eq!(decoded.cycles(), table.cycles());
        assert_eq!(decoded.sample_rate(), Wavetable::DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn test_int16_flags() {
        let table = Wavetable::from_samples(&[0.5; 4], 4)
            .unwrap()
            .with_source_encoding(SampleEncoding::Int16);
        let bytes = encode_wt(&table, &EncodeOptions::default()).unwrap();
        assert_eq!(read_u16_le(&bytes, 10), FLAG_INT16 | FLAG_FULL_RANGE);

        let decoded = decode_wt(&bytes, &DecodeOptions::default()).unwrap();
        assert_eq!(decoded.source_encoding(), SampleEncoding::Int16);
        assert_eq!(decoded.flatten(), vec![0.5; 4]);
    }

    #[test]
    fn test_float_output_is_clamped() {
        let table = Wavetable::from_samples(&[1.5, -3.0], 2).unwrap();
        let bytes = encode_wt(&table, &EncodeOptions::default()).unwrap();
        let decoded = decode_wt(&bytes, &DecodeOptions::default()).unwrap();
        assert_eq!(decoded.flatten(), vec![1.0, -1.0]);
    }

    #[test]
    fn test_half_range_int16_is_scaled() {
        let mut bytes = header_bytes(2, 1, FLAG_INT16);
        bytes.extend_from_slice(&16384i16.to_le_bytes());
        bytes.extend_from_slice(&(-8192i16).to_le_bytes());
        let decoded = decode_wt(&bytes, &DecodeOptions::default()).unwrap();
        assert_eq!(decoded.flatten(), vec![1.0, -0.5]);
    }

    #[test]
    fn test_compact8_decodes() {
        let mut bytes = header_bytes(4, 1, FLAG_COMPACT8);
        bytes.extend_from_slice(&[0x00, 0x40, 0x80, 0xC0]);
        let decoded = decode_wt(&bytes, &DecodeOptions::default()).unwrap();
        assert_eq!(decoded.source_encoding(), SampleEncoding::Compact8);
        assert_eq!(decoded.flatten(), vec![0.0, 0.5, -1.0, -0.5]);
    }

    #[test]
    fn test_truncated_by_ten_bytes() {
        let table = Wavetable::from_samples(&[0.25; 256], 64).unwrap();
        let mut bytes = encode_wt(&table, &EncodeOptions::default()).unwrap();
        bytes.truncate(bytes.len() - 10);
        assert!(matches!(
            decode_wt(&bytes, &DecodeOptions::default()),
            Err(WavetableError::TruncatedContainer {
                expected: 1036,
                available: 1026
            })
        ));
    }

    #[test]
    fn test_bad_magic_and_short_header() {
        assert!(matches!(
            decode_wt(b"RIFF\0\0\0\0\0\0\0\0", &DecodeOptions::default()),
            Err(WavetableError::BadMagic { .. })
        ));
        assert!(matches!(
            decode_wt(b"vawt\x04\0", &DecodeOptions::default()),
            Err(WavetableError::TruncatedContainer { expected: 12, available: 6 })
        ));
    }

    #[test]
    fn test_flag_validation() {
        for (flags, sample_kind) in [(FLAG_SAMPLE, true), (FLAG_LOOPED, true)] {
            let bytes = header_bytes(4, 1, flags);
            assert_eq!(
                matches!(
                    decode_wt(&bytes, &DecodeOptions::default()),
                    Err(WavetableError::UnsupportedWavetableKind(_))
                ),
                sample_kind
            );
        }
        for flags in [FLAG_INT16 | FLAG_COMPACT8, 0x0100, 0x8000 | FLAG_INT16] {
            let bytes = header_bytes(4, 1, flags);
            assert!(matches!(
                decode_wt(&bytes, &DecodeOptions::default()),
                Err(WavetableError::EncodingFlagMismatch { .. })
            ));
        }
    }

    #[test]
    fn test_trailing_bytes() {
        let table = Wavetable::from_samples(&[0.0; 4], 4).unwrap();
        let mut bytes = encode_wt(&table, &EncodeOptions::default()).unwrap();
        bytes.extend_from_slice(b"junk");

        assert!(decode_wt(&bytes, &DecodeOptions::default()).is_ok());
        let strict = DecodeOptions {
            size_check: SizeCheck::Strict,
            ..Default::default()
        };
        assert!(matches!(
            decode_wt(&bytes, &strict),
            Err(WavetableError::ChunkSizeMismatch { .. })
        ));

        // Flagged metadata is fine even in strict mode.
        bytes[10..12].copy_from_slice(&FLAG_HAS_METADATA.to_le_bytes());
        assert!(decode_wt(&bytes, &strict).is_ok());
    }

    #[test]
    fn test_power_of_two_and_cycle_limits() {
        let table = Wavetable::from_samples(&[0.0; 6], 3).unwrap();
        assert!(matches!(
            encode_wt(&table, &EncodeOptions::default()),
            Err(WavetableError::NonPowerOfTwoWaveSize(3))
        ));
        let relaxed = EncodeOptions {
            require_power_of_two: false,
            ..Default::default()
        };
        assert!(encode_wt(&table, &relaxed).is_ok());

        let cycle = Cycle::new(vec![0.0f32; 1]);
        let huge = Wavetable::new(vec![cycle; MAX_CYCLES + 1]).unwrap();
        assert!(matches!(
            encode_wt(&huge, &EncodeOptions::default()),
            Err(WavetableError::TooManyCycles { count: 65536, max: 65535 })
        ));
    }

    #[test]
    fn test_wave_size_override_reshapes() {
        let table = Wavetable::from_samples(&[0.0; 8], 8).unwrap();
        let bytes = encode_wt(&table, &EncodeOptions::default()).unwrap();
        let options = DecodeOptions {
            wave_size: Some(2),
            ..Default::default()
        };
        let decoded = decode_wt(&bytes, &options).unwrap();
        assert_eq!(decoded.wave_size(), 2);
        assert_eq!(decoded.cycle_count(), 4);
    }
}
