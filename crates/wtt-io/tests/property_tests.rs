//! Property-based tests for codec round trips and cycle-engine laws.

use proptest::prelude::*;
use wtt_io::container::{DecodeOptions, EncodeOptions};
use wtt_io::cycles::{combine, dedupe, slice};
use wtt_io::sample::{ExportEncoding, SampleEncoding};
use wtt_io::types::{Cycle, Interpolation, Wavetable};
use wtt_io::wav::{decode_wav, encode_wav};
use wtt_io::wt::{decode_wt, encode_wt};

/// Tables with a power-of-two wave size so both containers accept them.
fn wavetable_strategy() -> impl Strategy<Value = Wavetable> {
    (0u32..7, 1usize..12)
        .prop_flat_map(|(shift, cycles)| {
            let wave_size = 1usize << shift;
            (
                Just(wave_size),
                prop::collection::vec(-1.0f32..=1.0, wave_size * cycles),
                0u8..=Interpolation::MAX,
                prop::option::of("[a-z()]{1,32}"),
            )
        })
        .prop_map(|(wave_size, samples, interp, comment)| {
            Wavetable::from_samples(&samples, wave_size)
                .unwrap()
                .with_interpolation(Interpolation::from_u8(interp).unwrap())
                .with_vendor_comment(comment)
        })
}

/// Tables built from a small pool of cycles, so repeats are common.
fn repetitive_strategy() -> impl Strategy<Value = Wavetable> {
    prop::collection::vec(0usize..3, 1..20).prop_map(|picks| {
        let pool = [
            Cycle::new(vec![0.0f32, 0.5, 0.0, -0.5]),
            Cycle::new(vec![1.0f32, 0.0, -1.0, 0.0]),
            Cycle::new(vec![0.25f32; 4]),
        ];
        Wavetable::new(picks.into_iter().map(|i| pool[i].clone()).collect()).unwrap()
    })
}

proptest! {
    #[test]
    fn prop_riff_float_roundtrip_is_exact(table in wavetable_strategy()) {
        let bytes = encode_wav(&table, &EncodeOptions::default()).unwrap();
        let decoded = decode_wav(&bytes, &DecodeOptions::default()).unwrap();
        prop_assert_eq!(decoded, table);
    }

    #[test]
    fn prop_wt_float_roundtrip_is_exact(table in wavetable_strategy()) {
        let bytes = encode_wt(&table, &EncodeOptions::default()).unwrap();
        let decoded = decode_wt(&bytes, &DecodeOptions::default()).unwrap();
        prop_assert_eq!(decoded.cycles(), table.cycles());
        prop_assert_eq!(decoded.source_encoding(), SampleEncoding::Float32);
    }

    #[test]
    fn prop_int16_roundtrip_within_one_step(table in wavetable_strategy()) {
        let options = EncodeOptions {
            encoding: Some(ExportEncoding::Int16),
            ..Default::default()
        };
        for bytes in [
            encode_wav(&table, &options).unwrap(),
            encode_wt(&table, &options).unwrap(),
        ] {
            let decoded = if bytes.starts_with(b"RIFF") {
                decode_wav(&bytes, &DecodeOptions::default()).unwrap()
            } else {
                decode_wt(&bytes, &DecodeOptions::default()).unwrap()
            };
            prop_assert_eq!(decoded.wave_size(), table.wave_size());
            prop_assert_eq!(decoded.cycle_count(), table.cycle_count());
            for (a, b) in table.samples().zip(decoded.samples()) {
                prop_assert!((a - b).abs() <= 1.0 / 32768.0);
            }
        }
    }

    #[test]
    fn prop_dedupe_is_idempotent(table in repetitive_strategy()) {
        let once = dedupe(&table).into_wavetable();
        let twice = dedupe(&once);
        prop_assert!(!twice.found_duplicates());
        prop_assert_eq!(twice.into_wavetable(), once);
    }

    #[test]
    fn prop_dedupe_leaves_no_adjacent_repeats(table in repetitive_strategy()) {
        let outcome = dedupe(&table);
        let kept = outcome.wavetable().cycles();
        prop_assert!(kept.windows(2).all(|w| w[0] != w[1]));
        prop_assert_eq!(kept.len() + outcome.removed(), table.cycle_count());
    }

    #[test]
    fn prop_slice_combine_inverse(table in wavetable_strategy()) {
        let slices = slice(&table);
        prop_assert_eq!(slices.len(), table.cycle_count());
        prop_assert_eq!(combine(&slices).unwrap(), table);
    }
}
