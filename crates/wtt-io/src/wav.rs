//! RIFF/WAVE container codec.
//!
//! Decoding walks the chunk list, reads the `fmt ` and first `data` chunk,
//! keeps one channel, and takes the wave size from the `clm ` block or the
//! caller. Encoding always produces mono `fmt `, `clm `, `data`, in that order.

use crate::container::{DecodeOptions, EncodeOptions};
use crate::cycles::{resolve_wave_size, split_cycles_with};
use crate::error::{Result, WavetableError};
use crate::metadata::ClmMetadata;
use crate::riff::{
    find_chunk, parse_riff_chunks, read_u16_le, read_u32_le, RiffBuilder, SizeCheck,
    CHUNK_HEADER_LEN, CLM_CHUNK_ID, DATA_CHUNK_ID, FMT_CHUNK_ID, WAVE_FORMAT_ID,
};
use crate::sample::{decode_samples, encode_samples_into, Bounds, ExportEncoding, SampleEncoding};
use crate::types::{Interpolation, Wavetable};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// `WAVE_FORMAT_PCM`
pub const FORMAT_PCM: u16 = 0x0001;
/// `WAVE_FORMAT_IEEE_FLOAT`
pub const FORMAT_IEEE_FLOAT: u16 = 0x0003;
/// `WAVE_FORMAT_EXTENSIBLE`
pub const FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Length of the plain `fmt ` payload this codec writes.
pub const FMT_CHUNK_LEN: usize = 16;

/// Minimum payload of an extensible `fmt ` chunk, up to and including the GUID.
const FMT_EXTENSIBLE_LEN: usize = 40;

/// Offset of the sub-format GUID inside an extensible `fmt ` payload.
const SUB_FORMAT_OFFSET: usize = 24;

/// Channel to keep when the source has more than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Left,
    Right,
}

impl Channel {
    /// Zero-based index within an interleaved frame.
    pub fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

/// The fields of a `fmt ` chunk this codec cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FmtChunk {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// First two bytes of the sub-format GUID, for extensible chunks.
    pub sub_format: Option<u16>,
}

impl FmtChunk {
    /// Parse a `fmt ` payload.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        if payload.len() < FMT_CHUNK_LEN {
            return Err(WavetableError::MalformedChunk {
                id: FMT_CHUNK_ID,
                reason: format!("{} bytes, need at least {}", payload.len(), FMT_CHUNK_LEN),
            });
        }

        let format_tag = read_u16_le(payload, 0);
        let channels = read_u16_le(payload, 2);
        let sample_rate = read_u32_le(payload, 4);
        let block_align = read_u16_le(payload, 12);
        let bits_per_sample = read_u16_le(payload, 14);

        let sub_format = if format_tag == FORMAT_EXTENSIBLE {
            if payload.len() < FMT_EXTENSIBLE_LEN {
                return Err(WavetableError::MalformedChunk {
                    id: FMT_CHUNK_ID,
                    reason: format!(
                        "extensible format needs {} bytes, found {}",
                        FMT_EXTENSIBLE_LEN,
                        payload.len()
                    ),
                });
            }
            Some(read_u16_le(payload, SUB_FORMAT_OFFSET))
        } else {
            None
        };

        if channels == 0 {
            return Err(WavetableError::MalformedChunk {
                id: FMT_CHUNK_ID,
                reason: "channel count is zero".to_string(),
            });
        }

        Ok(Self {
            format_tag,
            channels,
            sample_rate,
            block_align,
            bits_per_sample,
            sub_format,
        })
    }

    /// A mono `fmt ` chunk for the given export encoding.
    pub fn mono(encoding: ExportEncoding, sample_rate: u32) -> Self {
        let width = encoding.width() as u16;
        Self {
            format_tag: match encoding {
                ExportEncoding::Int16 => FORMAT_PCM,
                ExportEncoding::Float32 => FORMAT_IEEE_FLOAT,
            },
            channels: 1,
            sample_rate,
            block_align: width,
            bits_per_sample: encoding.bits_per_sample(),
            sub_format: None,
        }
    }

    /// The effective format tag, looking through the extensible wrapper.
    pub fn effective_format(&self) -> u16 {
        self.sub_format.unwrap_or(self.format_tag)
    }

    /// Map the tag and bit depth onto a sample encoding.
    ///
    /// # Errors
    ///
    /// [`WavetableError::UnsupportedEncoding`] for anything but 16-bit PCM or
    /// 32-bit float.
    pub fn encoding(&self) -> Result<SampleEncoding> {
        match (self.effective_format(), self.bits_per_sample) {
            (FORMAT_PCM, 16) => Ok(SampleEncoding::Int16),
            (FORMAT_IEEE_FLOAT, 32) => Ok(SampleEncoding::Float32),
            _ => Err(WavetableError::UnsupportedEncoding {
                format_tag: self.effective_format(),
                bits_per_sample: self.bits_per_sample,
            }),
        }
    }

    /// Serialize as a 16-byte payload. Extensible fields are not written.
    pub fn to_bytes(&self) -> [u8; FMT_CHUNK_LEN] {
        let byte_rate = self.sample_rate.saturating_mul(self.block_align as u32);
        let mut out = [0u8; FMT_CHUNK_LEN];
        out[0..2].copy_from_slice(&self.format_tag.to_le_bytes());
        out[2..4].copy_from_slice(&self.channels.to_le_bytes());
        out[4..8].copy_from_slice(&self.sample_rate.to_le_bytes());
        out[8..12].copy_from_slice(&byte_rate.to_le_bytes());
        out[12..14].copy_from_slice(&self.block_align.to_le_bytes());
        out[14..16].copy_from_slice(&self.bits_per_sample.to_le_bytes());
        out
    }
}

/// A decoded RIFF file before it is cut into cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct WavContents {
    pub format: FmtChunk,
    pub encoding: SampleEncoding,
    /// Samples of the selected channel.
    pub samples: Vec<f32>,
    pub metadata: Option<ClmMetadata>,
}

impl WavContents {
    /// Cut the samples into cycles and attach metadata.
    pub fn into_wavetable(self, options: &DecodeOptions) -> Result<Wavetable> {
        let wave_size = resolve_wave_size(
            self.metadata.as_ref().map(|m| m.wave_size),
            options.wave_size,
        )?;
        let cycles = split_cycles_with(&self.samples, wave_size, options.partial_cycle)?;
        let (interpolation, comment) = match self.metadata {
            Some(meta) => (meta.interpolation, meta.comment),
            None => (Interpolation::None, None),
        };

        let sample_rate = match self.format.sample_rate {
            0 => {
                warn!(
                    fallback = Wavetable::DEFAULT_SAMPLE_RATE,
                    "fmt chunk has a zero sample rate"
                );
                Wavetable::DEFAULT_SAMPLE_RATE
            }
            rate => rate,
        };

        let wavetable = Wavetable::new(cycles)?
            .with_sample_rate(sample_rate)?
            .with_interpolation(interpolation)
            .with_vendor_comment(comment)
            .with_source_encoding(self.encoding);

        info!(
            wave_size,
            cycles = wavetable.cycle_count(),
            encoding = %self.encoding,
            "decoded RIFF wavetable"
        );
        Ok(wavetable)
    }
}

/// Parse a RIFF/WAVE buffer into its flat samples and metadata.
///
/// # Errors
///
/// - [`WavetableError::BadMagic`] for a non-`WAVE` form type
/// - [`WavetableError::MissingRequiredChunk`] without `fmt ` or `data`
/// - [`WavetableError::UnsupportedEncoding`] for other bit depths
/// - [`WavetableError::UnsupportedChannel`] when the requested channel is absent
/// - [`WavetableError::MalformedMetadata`] for a bad `clm ` block in strict mode
pub fn read_wav(bytes: &[u8], options: &DecodeOptions) -> Result<WavContents> {
    let (form, chunks) = parse_riff_chunks(bytes, options.size_check)?;
    if form != WAVE_FORMAT_ID {
        return Err(WavetableError::BadMagic {
            expected: WAVE_FORMAT_ID,
            found: form,
        });
    }

    let fmt_chunk =
        find_chunk(&chunks, FMT_CHUNK_ID).ok_or(WavetableError::MissingRequiredChunk(FMT_CHUNK_ID))?;
    let format = FmtChunk::parse(fmt_chunk.data)?;
    let encoding = format.encoding()?;
    debug!(
        channels = format.channels,
        sample_rate = format.sample_rate,
        bits = format.bits_per_sample,
        "read fmt chunk"
    );

    let mut data_chunks = chunks.iter().filter(|c| c.id == DATA_CHUNK_ID);
    let data_chunk = data_chunks
        .next()
        .ok_or(WavetableError::MissingRequiredChunk(DATA_CHUNK_ID))?;
    let extra = data_chunks.count();
    if extra > 0 {
        warn!(extra, "ignoring additional data chunks");
    }

    let metadata = match find_chunk(&chunks, CLM_CHUNK_ID) {
        None => None,
        Some(chunk) => match ClmMetadata::parse(chunk.data) {
            Ok(meta) => Some(meta),
            Err(err) if options.size_check == SizeCheck::Lenient => {
                warn!(error = %err, "ignoring unreadable clm chunk");
                None
            }
            Err(err) => return Err(err),
        },
    };

    let raw = extract_channel(data_chunk.data, &format, encoding, options.channel.index())?;
    let samples = decode_samples(&raw, encoding)?;

    Ok(WavContents {
        format,
        encoding,
        samples,
        metadata,
    })
}

/// Decode a RIFF/WAVE buffer into a wavetable.
pub fn decode_wav(bytes: &[u8], options: &DecodeOptions) -> Result<Wavetable> {
    read_wav(bytes, options)?.into_wavetable(options)
}

/// Encode a wavetable as mono RIFF/WAVE.
///
/// # Errors
///
/// - [`WavetableError::NonFiniteSample`] if any sample is NaN or infinite
/// - [`WavetableError::MetadataCommentTooLong`] per the overflow policy
pub fn encode_wav(wavetable: &Wavetable, options: &EncodeOptions) -> Result<Vec<u8>> {
    wavetable.ensure_finite()?;

    let encoding = options.resolve_encoding(wavetable);
    let format = FmtChunk::mono(encoding, wavetable.sample_rate());

    let mut data = Vec::with_capacity(wavetable.total_samples() * encoding.width());
    for cycle in wavetable.cycles() {
        encode_samples_into(cycle.samples(), encoding, Bounds::Unbounded, &mut data);
    }

    let clm = if options.include_metadata {
        Some(ClmMetadata::from_wavetable(wavetable).to_bytes(options.comment_overflow)?)
    } else {
        None
    };

    let hint = 3 * CHUNK_HEADER_LEN
        + FMT_CHUNK_LEN
        + data.len()
        + clm.as_ref().map_or(0, |c| c.len() + 1);
    let mut builder =
        RiffBuilder::with_capacity(WAVE_FORMAT_ID, hint).chunk(FMT_CHUNK_ID, &format.to_bytes());
    if let Some(clm) = &clm {
        builder = builder.chunk(CLM_CHUNK_ID, clm);
    }
    let bytes = builder.chunk(DATA_CHUNK_ID, &data).finish();

    debug!(
        encoding = ?encoding,
        metadata = clm.is_some(),
        len = bytes.len(),
        "encoded RIFF wavetable"
    );
    Ok(bytes)
}

/// Pull one channel's bytes out of interleaved frames.
fn extract_channel(
    data: &[u8],
    format: &FmtChunk,
    encoding: SampleEncoding,
    channel: usize,
) -> Result<Vec<u8>> {
    let channels = format.channels as usize;
    if channel >= channels {
        return Err(WavetableError::UnsupportedChannel { channel, channels });
    }

    let width = encoding.width();
    let frame = width * channels;
    if data.len() % frame != 0 {
        return Err(WavetableError::MalformedSampleData {
            len: data.len(),
            width: frame,
        });
    }
    if channels == 1 {
        return Ok(data.to_vec());
    }

    debug!(channel, channels, "extracting single channel");
    let start = channel * width;
    Ok(data
        .chunks_exact(frame)
        .flat_map(|f| f[start..start + width].iter().copied())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::CommentOverflow;
    use crate::sample::encode_samples;

    fn stereo_file(left: &[f32], right: &[f32]) -> Vec<u8> {
        let format = FmtChunk {
            format_tag: FORMAT_PCM,
            channels: 2,
            sample_rate: 44100,
            block_align: 4,
            bits_per_sample: 16,
            sub_format: None,
        };
        let mut data = Vec::new();
        for (l, r) in left.iter().zip(right) {
            data.extend(encode_samples(&[*l], ExportEncoding::Int16, Bounds::Bounded));
            data.extend(encode_samples(&[*r], ExportEncoding::Int16, Bounds::Bounded));
        }
        RiffBuilder::new(WAVE_FORMAT_ID)
            .chunk(FMT_CHUNK_ID, &format.to_bytes())
            .chunk(DATA_CHUNK_ID, &data)
            .finish()
    }

    #[test]
    fn test_fmt_encoding_mapping() {
        let mut fmt = FmtChunk::mono(ExportEncoding::Int16, 48000);
        assert_eq!(fmt.encoding().unwrap(), SampleEncoding::Int16);

        fmt.bits_per_sample = 24;
        assert!(matches!(
            fmt.encoding(),
            Err(WavetableError::UnsupportedEncoding {
                format_tag: FORMAT_PCM,
                bits_per_sample: 24
            })
        ));

        let float = FmtChunk::mono(ExportEncoding::Float32, 48000);
        assert_eq!(float.encoding().unwrap(), SampleEncoding::Float32);
        assert_eq!(float.to_bytes().len(), 16);
    }

    #[test]
    fn test_fmt_extensible() {
        let mut payload = vec![0u8; 40];
        payload[0..2].copy_from_slice(&FORMAT_EXTENSIBLE.to_le_bytes());
        payload[2..4].copy_from_slice(&1u16.to_le_bytes());
        payload[4..8].copy_from_slice(&44100u32.to_le_bytes());
        payload[12..14].copy_from_slice(&4u16.to_le_bytes());
        payload[14..16].copy_from_slice(&32u16.to_le_bytes());
        payload[24..26].copy_from_slice(&FORMAT_IEEE_FLOAT.to_le_bytes());

        let fmt = FmtChunk::parse(&payload).unwrap();
        assert_eq!(fmt.encoding().unwrap(), SampleEncoding::Float32);

        assert!(matches!(
            FmtChunk::parse(&payload[..18]),
            Err(WavetableError::MalformedChunk { .. })
        ));
    }

    #[test]
    fn test_stereo_channel_selection() {
        let bytes = stereo_file(&[0.5, 0.25, 0.5, 0.25], &[-0.5, -0.25, -0.5, -0.25]);
        let options = DecodeOptions {
            wave_size: Some(2),
            ..Default::default()
        };

        let left = decode_wav(&bytes, &options).unwrap();
        assert_eq!(left.flatten(), vec![0.5, 0.25, 0.5, 0.25]);
        assert_eq!(left.sample_rate(), 44100);

        let right = decode_wav(
            &bytes,
            &DecodeOptions {
                channel: Channel::Right,
                ..options.clone()
            },
        )
        .unwrap();
        assert_eq!(right.flatten(), vec![-0.5, -0.25, -0.5, -0.25]);
    }

    #[test]
    fn test_right_channel_of_mono_fails() {
        let table = Wavetable::from_samples(&[0.0; 4], 4).unwrap();
        let bytes = encode_wav(&table, &EncodeOptions::default()).unwrap();
        let options = DecodeOptions {
            channel: Channel::Right,
            ..Default::default()
        };
        assert!(matches!(
            decode_wav(&bytes, &options),
            Err(WavetableError::UnsupportedChannel {
                channel: 1,
                channels: 1
            })
        ));
    }

    #[test]
    fn test_missing_chunks() {
        let no_data = RiffBuilder::new(WAVE_FORMAT_ID)
            .chunk(FMT_CHUNK_ID, &FmtChunk::mono(ExportEncoding::Int16, 44100).to_bytes())
            .finish();
        assert!(matches!(
            decode_wav(&no_data, &DecodeOptions::default()),
            Err(WavetableError::MissingRequiredChunk(id)) if id == DATA_CHUNK_ID
        ));

        let no_fmt = RiffBuilder::new(WAVE_FORMAT_ID)
            .chunk(DATA_CHUNK_ID, &[0u8; 4])
            .finish();
        assert!(matches!(
            decode_wav(&no_fmt, &DecodeOptions::default()),
            Err(WavetableError::MissingRequiredChunk(id)) if id == FMT_CHUNK_ID
        ));
    }

    #[test]
    fn test_wrong_form_type() {
        let avi = RiffBuilder::new(crate::riff::FourCc(*b"AVI ")).finish();
        assert!(matches!(
            decode_wav(&avi, &DecodeOptions::default()),
            Err(WavetableError::BadMagic { .. })
        ));
    }

    #[test]
    fn test_wave_size_required_without_clm() {
        let table = Wavetable::from_samples(&[0.0; 8], 4).unwrap();
        let options = EncodeOptions {
            include_metadata: false,
            ..Default::default()
        };
        let bytes = encode_wav(&table, &options).unwrap();
        assert!(matches!(
            decode_wav(&bytes, &DecodeOptions::default()),
            Err(WavetableError::WaveSizeRequired)
        ));

        let decoded = decode_wav(
            &bytes,
            &DecodeOptions {
                wave_size: Some(2),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(decoded.cycle_count(), 4);
    }

    #[test]
    fn test_chunk_order_and_metadata() {
        let table = Wavetable::from_samples(&[0.5; 8], 4)
            .unwrap()
            .with_interpolation(Interpolation::Linear)
            .with_vendor_comment(Some("test".to_string()));
        let bytes = encode_wav(&table, &EncodeOptions::default()).unwrap();

        let (_, chunks) = parse_riff_chunks(&bytes, SizeCheck::Strict).unwrap();
        let ids: Vec<_> = chunks.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![FMT_CHUNK_ID, CLM_CHUNK_ID, DATA_CHUNK_ID]);

        let decoded = decode_wav(&bytes, &DecodeOptions::default()).unwrap();
        assert_eq!(decoded.wave_size(), 4);
        assert_eq!(decoded.interpolation(), Interpolation::Linear);
        assert_eq!(decoded.vendor_comment(), Some("test"));
    }

    #[test]
    fn test_malformed_clm_strict_vs_lenient() {
        let fmt = FmtChunk::mono(ExportEncoding::Float32, 44100).to_bytes();
        let data = encode_samples(&[0.0; 4], ExportEncoding::Float32, Bounds::Unbounded);
        let bytes = RiffBuilder::new(WAVE_FORMAT_ID)
            .chunk(FMT_CHUNK_ID, &fmt)
            .chunk(CLM_CHUNK_ID, b"garbage!")
            .chunk(DATA_CHUNK_ID, &data)
            .finish();

        let strict = DecodeOptions {
            size_check: SizeCheck::Strict,
            wave_size: Some(4),
            ..Default::default()
        };
        assert!(matches!(
            decode_wav(&bytes, &strict),
            Err(WavetableError::MalformedMetadata(_))
        ));

        let lenient = DecodeOptions {
            wave_size: Some(4),
            ..Default::default()
        };
        assert_eq!(decode_wav(&bytes, &lenient).unwrap().cycle_count(), 1);
    }

    #[test]
    fn test_encode_rejects_nan() {
        let table = Wavetable::from_samples(&[0.0, f32::NAN], 2).unwrap();
        assert!(matches!(
            encode_wav(&table, &EncodeOptions::default()),
            Err(WavetableError::NonFiniteSample { cycle: 0, index: 1, .. })
        ));
    }

    #[test]
    fn test_comment_overflow_reject() {
        let table = Wavetable::from_samples(&[0.0; 4], 4)
            .unwrap()
            .with_vendor_comment(Some("x".repeat(300)));
        let options = EncodeOptions {
            comment_overflow: CommentOverflow::Reject,
            ..Default::default()
        };
        assert!(matches!(
            encode_wav(&table, &options),
            Err(WavetableError::MetadataCommentTooLong { len: 300, .. })
        ));
    }
}
