//! Transpose and sliding-window invariants for the trace reader.
//!
//! The reference model is the on-disk contract itself: bit `o` of trace `i`
//! is `(bytes[o/8] >> (7 - o%8)) & 1`, and the column vector the reader
//! emits at absolute bit offset `o` must hold exactly those bits across
//! traces, for every window.

use proptest::prelude::*;
use wbat_trace::{TraceSet, WindowPlan, WindowReader};

fn write_set(dir: &std::path::Path, traces: &[Vec<u8>]) {
    for (i, t) in traces.iter().enumerate() {
        std::fs::write(TraceSet::trace_path(dir, i), t).unwrap();
        std::fs::write(TraceSet::plaintext_path(dir, i), [i as u8; 16]).unwrap();
        std::fs::write(TraceSet::ciphertext_path(dir, i), [0u8; 16]).unwrap();
    }
}

fn trace_bit(trace: &[u8], o: usize) -> bool {
    (trace[o / 8] >> (7 - o % 8)) & 1 == 1
}

/// Every window's columns match a direct per-bit transpose of the files.
fn check_windows(traces: &[Vec<u8>], window_bits: usize, step_bits: usize) {
    let dir = tempfile::tempdir().unwrap();
    write_set(dir.path(), traces);

    let set = TraceSet::open(dir.path(), traces.len()).unwrap();
    let plan = WindowPlan::new(window_bits, step_bits, set.trace_bytes()).unwrap();
    let mut reader = WindowReader::new(set, plan);

    let expected_windows = reader.num_windows();
    let mut seen = 0usize;

    while let Some(view) = reader.next_window().unwrap() {
        assert_eq!(view.len(), plan.window_bytes * 8);
        for (abs, column) in view.iter() {
            assert_eq!(column.len(), traces.len());
            for (i, t) in traces.iter().enumerate() {
                assert_eq!(
                    column.get(i),
                    trace_bit(t, abs as usize),
                    "trace {i}, bit {abs}"
                );
            }
        }
        seen += 1;
    }

    assert_eq!(seen, expected_windows, "window count must match the formula");
}

#[test]
fn single_window_covers_whole_trace() {
    let traces = vec![vec![0b1010_0101, 0xFF, 0x00], vec![0x0F, 0x80, 0x01]];
    check_windows(&traces, 24, 24);
}

#[test]
fn rolling_windows_with_overlap() {
    let traces: Vec<Vec<u8>> = (0..4u8)
        .map(|i| (0..10u8).map(|b| b.wrapping_mul(37).wrapping_add(i)).collect())
        .collect();
    // 4-byte window, 2-byte step over 10 bytes: starts 0,2,4,6.
    check_windows(&traces, 32, 16);
}

#[test]
fn trailing_partial_step_ends_flush() {
    let traces = vec![(0u8..9).collect::<Vec<u8>>()];
    // starts 0,2,4,5: the last step is clamped to a single byte.
    check_windows(&traces, 32, 16);
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 24, .. ProptestConfig::default() })]

    #[test]
    fn transpose_roundtrip(
        n in prop_oneof![Just(1usize), Just(8), Just(64)],
        len in 1usize..12,
        window_bits in 1usize..64,
        step_bits in 0usize..80,
        seed in any::<u64>(),
    ) {
        let mut state = seed | 1;
        let traces: Vec<Vec<u8>> = (0..n)
            .map(|_| {
                (0..len)
                    .map(|_| {
                        state = state
                            .wrapping_mul(6_364_136_223_846_793_005)
                            .wrapping_add(1_442_695_040_888_963_407);
                        (state >> 32) as u8
                    })
                    .collect()
            })
            .collect();
        check_windows(&traces, window_bits, step_bits);
    }
}

#[test]
fn transpose_roundtrip_many_traces() {
    // 256 traces is past the 64-bit limb boundary of the column vectors.
    let traces: Vec<Vec<u8>> = (0..256u16)
        .map(|i| (0..6u16).map(|b| (i.wrapping_mul(193) ^ b.wrapping_mul(77)) as u8).collect())
        .collect();
    check_windows(&traces, 16, 8);
}
