//! Fuzz target for the full decode path of both containers.
//!
//! Run with: `cargo +nightly fuzz run fuzz_wavetable_reader`

#![no_main]

use libfuzzer_sys::fuzz_target;
use wtt_io::container::{self, ContainerKind, DecodeOptions, EncodeOptions};
use wtt_io::{PartialCycle, SizeCheck};

fuzz_target!(|data: &[u8]| {
    let lenient = DecodeOptions {
        wave_size: Some(64),
        partial_cycle: PartialCycle::Truncate,
        ..Default::default()
    };
    let strict = DecodeOptions {
        size_check: SizeCheck::Strict,
        ..Default::default()
    };

    for options in [&lenient, &strict] {
        for kind in [ContainerKind::Wav, ContainerKind::Wt] {
            if let Ok(table) = kind.codec().decode(data, options) {
                // Anything that decodes must re-encode without panicking.
                let _ = container::encode(&table, ContainerKind::Wav, &EncodeOptions::default());
                let _ = container::encode(&table, ContainerKind::Wt, &EncodeOptions::default());
            }
        }
    }
});
