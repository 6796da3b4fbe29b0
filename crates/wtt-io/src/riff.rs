//! RIFF chunk utilities.
//!
//! A RIFF file is a 12-byte header (`RIFF`, u32 size, form type) followed by
//! chunks of FourCC + u32 little-endian size + payload. Odd-sized payloads are
//! followed by one pad byte that the size field does not count.
//!
//! Rather than depending on a RIFF crate, parsing is done directly over a byte
//! slice and chunks borrow from it.

use crate::error::{Result, WavetableError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A four-character chunk or form identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    /// Read a FourCC from the first four bytes of `bytes`, if there are four.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.get(..4).map(|b| Self([b[0], b[1], b[2], b[3]]))
    }
}

impl std::fmt::Display for FourCc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &byte in &self.0 {
            let ch = if byte.is_ascii_graphic() || byte == b' ' {
                byte as char
            } else {
                '?'
            };
            write!(f, "{}", ch)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for FourCc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FourCc(\"{}\")", self)
    }
}

/// The FourCC identifier for RIFF.
pub const RIFF_ID: FourCc = FourCc(*b"RIFF");

/// The FourCC identifier for the WAVE format.
pub const WAVE_FORMAT_ID: FourCc = FourCc(*b"WAVE");

/// The FourCC identifier for the fmt chunk.
pub const FMT_CHUNK_ID: FourCc = FourCc(*b"fmt ");

/// The FourCC identifier for the data chunk.
pub const DATA_CHUNK_ID: FourCc = FourCc(*b"data");

/// The FourCC identifier for the vendor wavetable metadata chunk.
pub const CLM_CHUNK_ID: FourCc = FourCc(*b"clm ");

/// Size of the RIFF header: id, size, form type.
pub const RIFF_HEADER_LEN: usize = 12;

/// Size of a chunk header: id, size.
pub const CHUNK_HEADER_LEN: usize = 8;

/// How to treat size fields that disagree with the bytes present.
///
/// Real exporters occasionally over-report chunk sizes or leave the RIFF size
/// stale, so the default is to clamp and warn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeCheck {
    /// Any disagreement is a [`WavetableError::ChunkSizeMismatch`].
    Strict,
    /// Clamp to the available bytes and log a warning.
    #[default]
    Lenient,
}

/// A chunk borrowed from a RIFF buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiffChunk<'a> {
    /// The chunk's FourCC identifier.
    pub id: FourCc,
    /// The chunk's payload, excluding any pad byte.
    pub data: &'a [u8],
    /// Offset of the chunk header within the file.
    pub offset: usize,
}

/// Parse a RIFF buffer and return its form type and chunks in file order.
///
/// # Errors
///
/// - [`WavetableError::BadMagic`] if the buffer does not start with `RIFF`
/// - [`WavetableError::TruncatedContainer`] if the header is incomplete
/// - [`WavetableError::ChunkSizeMismatch`] in strict mode, for a RIFF size
///   field that disagrees with the buffer, a chunk that overruns it, or
///   bytes left over after the last chunk
pub fn parse_riff_chunks(data: &[u8], check: SizeCheck) -> Result<(FourCc, Vec<RiffChunk<'_>>)> {
    if let Some(found) = FourCc::from_slice(data) {
        if found != RIFF_ID {
            return Err(WavetableError::BadMagic {
                expected: RIFF_ID,
                found,
            });
        }
    }
    if data.len() < RIFF_HEADER_LEN {
        return Err(WavetableError::TruncatedContainer {
            expected: RIFF_HEADER_LEN,
            available: data.len(),
        });
    }

    let declared = read_u32_le(data, 4) as usize;
    let form = FourCc([data[8], data[9], data[10], data[11]]);

    // The RIFF size counts everything after the first 8 bytes.
    let actual = data.len() - CHUNK_HEADER_LEN;
    if declared != actual {
        match check {
            SizeCheck::Strict => {
                return Err(WavetableError::ChunkSizeMismatch {
                    id: RIFF_ID,
                    declared,
                    actual,
                })
            }
            SizeCheck::Lenient => warn!(declared, actual, "RIFF size field disagrees with file length"),
        }
    }
    // Strict mode has already proven the two agree; lenient mode trusts the buffer.
    let end = data.len();

    let mut chunks = Vec::new();
    let mut offset = RIFF_HEADER_LEN;

    while offset + CHUNK_HEADER_LEN <= end {
        let id = FourCc([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ]);
        let chunk_size = read_u32_le(data, offset + 4) as usize;
        let data_start = offset + CHUNK_HEADER_LEN;
        let available = end - data_start;

        let data_end = if chunk_size > available {
            match check {
                SizeCheck::Strict => {
                    return Err(WavetableError::ChunkSizeMismatch {
                        id,
                        declared: chunk_size,
                        actual: available,
                    })
                }
                SizeCheck::Lenient => {
                    warn!(chunk = %id, declared = chunk_size, available, "chunk overruns file, clamping");
                    end
                }
            }
        } else {
            data_start + chunk_size
        };

        debug!(chunk = %id, offset, size = data_end - data_start, "found chunk");
        chunks.push(RiffChunk {
            id,
            data: &data[data_start..data_end],
            offset,
        });

        // Move to next chunk (chunks are word-aligned)
        offset = data_end + (chunk_size % 2);
    }

    // A final pad byte may be missing (offset == end + 1); leftover bytes are not.
    if offset < end {
        match check {
            SizeCheck::Strict => {
                return Err(WavetableError::ChunkSizeMismatch {
                    id: RIFF_ID,
                    declared: offset - CHUNK_HEADER_LEN,
                    actual: end - CHUNK_HEADER_LEN,
                })
            }
            SizeCheck::Lenient => {
                warn!(trailing = end - offset, "ignoring bytes after last chunk")
            }
        }
    }

    Ok((form, chunks))
}

/// Find the first chunk with the given id.
pub fn find_chunk<'a>(chunks: &[RiffChunk<'a>], id: FourCc) -> Option<RiffChunk<'a>> {
    chunks.iter().find(|chunk| chunk.id == id).copied()
}

/// Incrementally assembles a RIFF file in memory.
///
/// Each chunk's size field is exactly its payload length; odd payloads get an
/// uncounted pad byte. The RIFF size is filled in by [`RiffBuilder::finish`].
#[derive(Debug, Clone)]
pub struct RiffBuilder {
    buffer: Vec<u8>,
}

impl RiffBuilder {
    /// Start a RIFF file of the given form type.
    pub fn new(form: FourCc) -> Self {
        Self::with_capacity(form, 0)
    }

    /// Start a RIFF file, reserving room for `payload_hint` bytes of chunks.
    pub fn with_capacity(form: FourCc, payload_hint: usize) -> Self {
        let mut buffer = Vec::with_capacity(RIFF_HEADER_LEN + payload_hint);
        buffer.extend_from_slice(&RIFF_ID.0);
        buffer.extend_from_slice(&0u32.to_le_bytes()); // patched in finish()
        buffer.extend_from_slice(&form.0);
        Self { buffer }
    }

    /// Append a chunk.
    pub fn chunk(mut self, id: FourCc, payload: &[u8]) -> Self {
        debug!(chunk = %id, size = payload.len(), "writing chunk");
        self.buffer.extend_from_slice(&id.0);
        self.buffer
            .extend_from_slice(&(payload.len() as u32).to_le_bytes());
        self.buffer.extend_from_slice(payload);
        if payload.len() % 2 != 0 {
            self.buffer.push(0);
        }
        self
    }

    /// Patch the RIFF size and return the finished file.
    pub fn finish(mut self) -> Vec<u8> {
        let riff_size = (self.buffer.len() - CHUNK_HEADER_LEN) as u32;
        self.buffer[4..8].copy_from_slice(&riff_size.to_le_bytes());
        self.buffer
    }
}

pub(crate) fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

pub(crate) fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}
