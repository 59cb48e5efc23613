//! Criterion benches for packed GF(2) elimination.
//!
//! Matrix shapes follow the attack workloads: a few thousand rows (window
//! sample vectors) over a few hundred columns (traces). Inputs are
//! deterministic across runs (LCG-based) so results are comparable over time.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use wbat_gf2::{BitMatrix, BitVec};

/// Deterministic “random” matrix, seeded by `seed`.
fn det_matrix(nrows: usize, ncols: usize, seed: u64) -> BitMatrix {
    // LCG constants (same as MSVC): a = 1664525, c = 1013904223.
    const A: u64 = 1_664_525;
    const C: u64 = 1_013_904_223;

    let mut state = A.wrapping_mul(seed).wrapping_add(C);
    let rows = (0..nrows)
        .map(|_| {
            BitVec::from_fn(ncols, |_| {
                state = state.wrapping_mul(A).wrapping_add(C);
                (state >> 16) & 1 == 1
            })
        })
        .collect();
    BitMatrix::from_rows(ncols, rows)
}

fn bench_elimination(c: &mut Criterion) {
    let mut group = c.benchmark_group("gf2_elimination");

    for &(nrows, ncols) in &[(512usize, 256usize), (2048, 256), (2048, 512)] {
        let m = det_matrix(nrows, ncols, 2024);

        group.bench_function(BenchmarkId::new("rref", format!("{nrows}x{ncols}")), |b| {
            b.iter(|| black_box(&m).rref());
        });

        group.bench_function(
            BenchmarkId::new("right_kernel_basis", format!("{nrows}x{ncols}")),
            |b| {
                b.iter(|| black_box(&m).right_kernel_basis());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_elimination);
criterion_main!(benches);
