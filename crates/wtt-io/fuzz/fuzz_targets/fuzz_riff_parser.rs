//! Fuzz target for RIFF chunk walking and `clm ` parsing.
//!
//! Run with: `cargo +nightly fuzz run fuzz_riff_parser`

#![no_main]

use libfuzzer_sys::fuzz_target;
use wtt_io::metadata::ClmMetadata;
use wtt_io::riff::{parse_riff_chunks, SizeCheck};
use wtt_io::wav::FmtChunk;

fuzz_target!(|data: &[u8]| {
    for check in [SizeCheck::Strict, SizeCheck::Lenient] {
        let _ = parse_riff_chunks(data, check);
    }

    // Force a plausible header so the chunk walk itself gets exercised.
    if data.len() >= 12 {
        let mut modified = data.to_vec();
        modified[0..4].copy_from_slice(b"RIFF");
        modified[8..12].copy_from_slice(b"WAVE");
        if let Ok((_, chunks)) = parse_riff_chunks(&modified, SizeCheck::Lenient) {
            for chunk in chunks {
                let _ = FmtChunk::parse(chunk.data);
                let _ = ClmMetadata::parse(chunk.data);
            }
        }
    }

    let _ = ClmMetadata::parse(data);
});
