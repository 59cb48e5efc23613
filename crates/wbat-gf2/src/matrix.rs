// crates/wbat-gf2/src/matrix.rs

//! Row-major GF(2) matrix with Gaussian elimination.
//!
//! Rows are packed [`BitVec`]s, so elimination touches 64 columns per word
//! operation. For the sizes WBAT cares about (a few thousand rows, a few
//! hundred columns) a full reduction runs well under a second.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

use crate::bitvec::BitVec;

/// Matrix over GF(2); each row is a `BitVec` of length `ncols`.
#[derive(Clone, Debug)]
pub struct BitMatrix {
    ncols: usize,
    rows: Vec<BitVec>,
}

/// Result of reducing a matrix to reduced row echelon form.
#[derive(Clone, Debug)]
pub struct Rref {
    /// The reduced rows (same count as the input; zero rows sink to the end).
    pub rows: Vec<BitVec>,
    /// Pivot column of reduced row `i`, for `i < rank`.
    pub pivots: Vec<usize>,
}

impl Rref {
    /// Rank of the reduced matrix.
    #[inline]
    #[must_use]
    pub fn rank(&self) -> usize {
        self.pivots.len()
    }
}

impl BitMatrix {
    /// Empty matrix with a fixed column count.
    #[must_use]
    pub fn new(ncols: usize) -> Self {
        Self { ncols, rows: Vec::new() }
    }

    /// Build from rows.
    ///
    /// # Panics
    /// Panics if any row length differs from `ncols`.
    #[must_use]
    pub fn from_rows(ncols: usize, rows: Vec<BitVec>) -> Self {
        for r in &rows {
            assert_eq!(r.len(), ncols, "row length must equal ncols");
        }
        Self { ncols, rows }
    }

    /// Append a row.
    ///
    /// # Panics
    /// Panics if the row length differs from `ncols`.
    pub fn push_row(&mut self, row: BitVec) {
        assert_eq!(row.len(), self.ncols, "row length must equal ncols");
        self.rows.push(row);
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    #[inline]
    #[must_use]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Borrow row `i`.
    #[inline]
    #[must_use]
    pub fn row(&self, i: usize) -> &BitVec {
        &self.rows[i]
    }

    /// Reduced row echelon form (the matrix itself is untouched).
    #[must_use]
    pub fn rref(&self) -> Rref {
        let mut rows = self.rows.clone();
        let nrows = rows.len();
        let mut pivots = Vec::new();
        let mut r = 0usize;

        for c in 0..self.ncols {
            if r == nrows {
                break;
            }
            let Some(i) = (r..nrows).find(|&i| rows[i].get(c)) else {
                continue;
            };
            rows.swap(r, i);
            let pivot_row = rows[r].clone();
            for (j, row) in rows.iter_mut().enumerate() {
                if j != r && row.get(c) {
                    row.xor_assign(&pivot_row);
                }
            }
            pivots.push(c);
            r += 1;
        }

        Rref { rows, pivots }
    }

    /// Rank (convenience shortcut over [`Self::rref`]).
    #[must_use]
    pub fn rank(&self) -> usize {
        self.rref().rank()
    }

    /// Basis of the right kernel `{ v : M · v = 0 }`.
    ///
    /// Returns `ncols - rank` nonzero vectors of length `ncols`. A vector `t`
    /// lies in the row space of `M` iff it is orthogonal to every basis
    /// vector.
    #[must_use]
    pub fn right_kernel_basis(&self) -> Vec<BitVec> {
        let rr = self.rref();
        let mut is_pivot = vec![false; self.ncols];
        for &p in &rr.pivots {
            is_pivot[p] = true;
        }

        let mut basis = Vec::with_capacity(self.ncols - rr.rank());
        for free in (0..self.ncols).filter(|&c| !is_pivot[c]) {
            let mut v = BitVec::zeros(self.ncols);
            v.set(free, true);
            // Pivot variable p of reduced row i satisfies
            //   x_p = sum over free columns f of row_i[f] * x_f.
            for (i, &p) in rr.pivots.iter().enumerate() {
                if rr.rows[i].get(free) {
                    v.set(p, true);
                }
            }
            basis.push(v);
        }
        basis
    }

    /// Solve `x · M = target` for a row vector `x` of length `nrows`.
    ///
    /// Returns `None` when `target` is not in the row space.
    ///
    /// # Panics
    /// Panics if `target.len() != ncols`.
    #[must_use]
    pub fn solve_left(&self, target: &BitVec) -> Option<BitVec> {
        assert_eq!(target.len(), self.ncols, "target length must equal ncols");
        let nrows = self.rows.len();

        // Eliminate while tracking row operations: after the loop,
        // rows[i] == ops[i] · M for every i.
        let mut rows = self.rows.clone();
        let mut ops: Vec<BitVec> = (0..nrows)
            .map(|i| BitVec::from_fn(nrows, |j| j == i))
            .collect();
        let mut pivots: Vec<(usize, usize)> = Vec::new(); // (row, col)
        let mut r = 0usize;

        for c in 0..self.ncols {
            if r == nrows {
                break;
            }
            let Some(i) = (r..nrows).find(|&i| rows[i].get(c)) else {
                continue;
            };
            rows.swap(r, i);
            ops.swap(r, i);
            let pivot_row = rows[r].clone();
            let pivot_op = ops[r].clone();
            for j in 0..nrows {
                if j != r && rows[j].get(c) {
                    rows[j].xor_assign(&pivot_row);
                    ops[j].xor_assign(&pivot_op);
                }
            }
            pivots.push((r, c));
            r += 1;
        }

        let mut residue = target.clone();
        let mut sol = BitVec::zeros(nrows);
        for &(row, col) in &pivots {
            if residue.get(col) {
                residue.xor_assign(&rows[row]);
                sol.xor_assign(&ops[row]);
            }
        }

        residue.is_zero().then_some(sol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn mat(ncols: usize, rows: &[&[usize]]) -> BitMatrix {
        BitMatrix::from_rows(
            ncols,
            rows.iter()
                .map(|support| {
                    let mut v = BitVec::zeros(ncols);
                    for &i in *support {
                        v.set(i, true);
                    }
                    v
                })
                .collect(),
        )
    }

    #[test]
    fn rref_known_small() {
        // [1 1 0]      [1 0 1]
        // [0 1 1]  →   [0 1 1]
        let m = mat(3, &[&[0, 1], &[1, 2]]);
        let rr = m.rref();
        assert_eq!(rr.pivots, vec![0, 1]);
        assert_eq!(rr.rows[0].support(), vec![0, 2]);
        assert_eq!(rr.rows[1].support(), vec![1, 2]);
    }

    #[test]
    fn kernel_is_orthogonal_to_rows() {
        let m = mat(5, &[&[0, 1], &[1, 2], &[0, 2]]); // rank 2
        let kernel = m.right_kernel_basis();
        assert_eq!(kernel.len(), 5 - 2);
        for k in &kernel {
            assert!(!k.is_zero());
            for i in 0..m.nrows() {
                assert!(!m.row(i).parity_and(k));
            }
        }
    }

    #[test]
    fn solve_left_recovers_combination() {
        let m = mat(6, &[&[0, 1], &[2, 3], &[4, 5], &[0, 5]]);
        // target = row0 + row2
        let target = m.row(0) ^ m.row(2);
        let sol = m.solve_left(&target).expect("in row space");

        let mut acc = BitVec::zeros(6);
        for i in 0..m.nrows() {
            if sol.get(i) {
                acc.xor_assign(m.row(i));
            }
        }
        assert_eq!(acc, target);
    }

    #[test]
    fn solve_left_rejects_outsider() {
        let m = mat(4, &[&[0, 1], &[2, 3]]);
        let mut t = BitVec::zeros(4);
        t.set(0, true); // e0 is not spanned by {e0+e1, e2+e3}
        assert!(m.solve_left(&t).is_none());
    }

    #[test]
    fn empty_matrix_kernel_is_everything() {
        let m = BitMatrix::new(3);
        let kernel = m.right_kernel_basis();
        assert_eq!(kernel.len(), 3);
    }

    proptest! {
        // Row-space membership via the kernel test agrees with solve_left,
        // and solutions really do reconstruct the target.
        #[test]
        fn membership_equivalence(
            seed in any::<u64>(),
            nrows in 1usize..12,
            ncols in 1usize..10,
        ) {
            let mut state = seed | 1;
            let mut next = || {
                state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
                state
            };

            let rows: Vec<BitVec> = (0..nrows)
                .map(|_| {
                    let bits = next();
                    BitVec::from_fn(ncols, |i| (bits >> (i % 64)) & 1 == 1)
                })
                .collect();
            let m = BitMatrix::from_rows(ncols, rows);
            let kernel = m.right_kernel_basis();

            // A random combination of rows must pass the parity checks and
            // be solvable.
            let pick = next();
            let mut combo = BitVec::zeros(ncols);
            for i in 0..nrows {
                if (pick >> (i % 64)) & 1 == 1 {
                    combo.xor_assign(m.row(i));
                }
            }
            prop_assert!(kernel.iter().all(|p| !combo.parity_and(p)));
            let sol = m.solve_left(&combo);
            prop_assert!(sol.is_some());

            // An arbitrary vector is in the row space iff all parity
            // checks pass.
            let probe_bits = next();
            let probe = BitVec::from_fn(ncols, |i| (probe_bits >> (i % 64)) & 1 == 1);
            let orthogonal = kernel.iter().all(|p| !probe.parity_and(p));
            prop_assert_eq!(orthogonal, m.solve_left(&probe).is_some());
        }
    }
}
