// crates/wbat-trace/src/reader.rs

//! Sliding-window column vectors over a trace set.
//!
//! For a window of `W` bytes starting at byte `o`, the reader exposes the
//! `8·W` column vectors `v[b] = (trace_0[b], …, trace_{N-1}[b])` for every
//! bit offset `b` in `[8o, 8o + 8W)`. Bit `j` of a packed trace byte is its
//! MSB-first position: `(byte >> (7 - j)) & 1`. That ordering is part of the
//! on-disk format contract.
//!
//! Windows advance by a step, reusing the overlap through a ring buffer:
//! each advance reads `step` fresh bytes per trace, transposes them, and
//! retires the same number of column vectors from the front. Because the
//! trace size is known up front, the reader never requests past end of
//! file; the final window simply ends flush with the traces and iteration
//! stops.

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

use std::collections::VecDeque;

use anyhow::{bail, Context, Result};
use tracing::warn;
use wbat_gf2::BitVec;

use crate::set::TraceSet;

/// Window/step geometry in bytes, normalized from bit-granular settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowPlan {
    /// Window size in bytes (≥ 1, ≤ trace size).
    pub window_bytes: usize,
    /// Step size in bytes (≥ 1, ≤ window).
    pub step_bytes: usize,
}

impl WindowPlan {
    /// Normalize window and step given in bits.
    ///
    /// Corrections are unambiguous and logged rather than fatal:
    /// `step > window` or `step == 0` fall back to `window / 4` (at least
    /// one bit). Both quantities are rounded up to byte boundaries and
    /// clamped to the trace size.
    pub fn new(window_bits: usize, step_bits: usize, trace_bytes: u64) -> Result<Self> {
        if window_bits == 0 {
            bail!("window size must be positive");
        }
        if trace_bytes == 0 {
            bail!("traces are empty");
        }

        let mut step_bits = step_bits;
        if step_bits > window_bits {
            warn!(
                step = step_bits,
                window = window_bits,
                "step larger than the window size, reducing to window/4"
            );
            step_bits = window_bits / 4;
        }
        if step_bits == 0 {
            step_bits = window_bits / 4;
        }
        step_bits = step_bits.max(1);

        let window_bytes = window_bits.div_ceil(8).min(trace_bytes as usize);
        let step_bytes = step_bits.div_ceil(8).min(trace_bytes as usize);

        Ok(Self {
            window_bytes,
            step_bytes,
        })
    }

    /// Number of windows over `trace_bytes` bytes:
    /// `ceil((L - W) / S) + 1`.
    #[must_use]
    pub fn num_windows(&self, trace_bytes: u64) -> usize {
        let l = trace_bytes as usize;
        (l - self.window_bytes).div_ceil(self.step_bytes) + 1
    }
}

/// One emitted window: a snapshot of the ring of column vectors.
#[derive(Debug)]
pub struct WindowView<'a> {
    /// 0-based window number.
    pub index: usize,
    /// Absolute bit offset of the first column vector.
    pub start_bit: u64,
    columns: &'a VecDeque<BitVec>,
}

impl WindowView<'_> {
    /// Number of column vectors in the window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the window holds no vectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate `(absolute_bit_offset, column_vector)` in file order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &BitVec)> + '_ {
        let start = self.start_bit;
        self.columns
            .iter()
            .enumerate()
            .map(move |(i, v)| (start + i as u64, v))
    }
}

/// Pull-based reader emitting consecutive windows of column vectors.
#[derive(Debug)]
pub struct WindowReader {
    set: TraceSet,
    plan: WindowPlan,
    ring: VecDeque<BitVec>,
    start_bit: u64,
    consumed: u64,
    emitted: usize,
    scratch: Vec<u8>,
}

impl WindowReader {
    /// Wrap a trace set with a window plan.
    #[must_use]
    pub fn new(set: TraceSet, plan: WindowPlan) -> Self {
        Self {
            set,
            plan,
            ring: VecDeque::with_capacity(plan.window_bytes * 8),
            start_bit: 0,
            consumed: 0,
            emitted: 0,
            scratch: Vec::new(),
        }
    }

    /// The underlying trace set (plaintexts/ciphertexts stay accessible).
    #[must_use]
    pub fn set(&self) -> &TraceSet {
        &self.set
    }

    /// The normalized window plan.
    #[must_use]
    pub fn plan(&self) -> WindowPlan {
        self.plan
    }

    /// Total number of windows this reader will emit.
    #[must_use]
    pub fn num_windows(&self) -> usize {
        self.plan.num_windows(self.set.trace_bytes())
    }

    /// Produce the next window, or `None` once the traces are covered.
    pub fn next_window(&mut self) -> Result<Option<WindowView<'_>>> {
        if self.emitted == 0 {
            self.advance(self.plan.window_bytes)?;
        } else {
            // Stop once the current window already reaches the end.
            if self.consumed >= self.set.trace_bytes() {
                return Ok(None);
            }
            let remaining = (self.set.trace_bytes() - self.consumed) as usize;
            self.advance(self.plan.step_bytes.min(remaining))?;
        }

        self.emitted += 1;
        Ok(Some(WindowView {
            index: self.emitted - 1,
            start_bit: self.start_bit,
            columns: &self.ring,
        }))
    }

    /// Read `nbytes` from every trace, transpose, and rotate the ring.
    fn advance(&mut self, nbytes: usize) -> Result<()> {
        let ntraces = self.set.ntraces();
        let mut fresh: Vec<BitVec> = (0..nbytes * 8).map(|_| BitVec::zeros(ntraces)).collect();

        self.scratch.resize(nbytes, 0);
        for t in 0..ntraces {
            self.set
                .read_into(t, &mut self.scratch)
                .with_context(|| format!("reading {nbytes} bytes of trace {t}"))?;
            for (bi, &byte) in self.scratch.iter().enumerate() {
                if byte == 0 {
                    continue;
                }
                for j in 0..8 {
                    if (byte >> (7 - j)) & 1 == 1 {
                        fresh[(bi << 3) | j].set(t, true);
                    }
                }
            }
        }

        let evict = if self.emitted == 0 { 0 } else { fresh.len() };
        for v in fresh {
            self.ring.push_back(v);
        }
        for _ in 0..evict {
            self.ring.pop_front();
        }
        self.start_bit += evict as u64;
        self.consumed += nbytes as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_rounds_and_corrects() {
        // 100 bits -> 13 bytes; step 0 -> window/4 = 25 bits -> 4 bytes.
        let p = WindowPlan::new(100, 0, 1000).unwrap();
        assert_eq!(p.window_bytes, 13);
        assert_eq!(p.step_bytes, 4);

        // step > window collapses to window/4.
        let p = WindowPlan::new(64, 1000, 1000).unwrap();
        assert_eq!(p.step_bytes, 2);

        // tiny window: step stays at least one bit -> one byte.
        let p = WindowPlan::new(2, 0, 1000).unwrap();
        assert_eq!(p.window_bytes, 1);
        assert_eq!(p.step_bytes, 1);

        // both clamp to the trace size.
        let p = WindowPlan::new(8 * 100, 8 * 100, 10).unwrap();
        assert_eq!(p.window_bytes, 10);
        assert_eq!(p.step_bytes, 10);

        assert!(WindowPlan::new(0, 8, 10).is_err());
    }

    #[test]
    fn window_count_formula() {
        let p = WindowPlan {
            window_bytes: 4,
            step_bytes: 2,
        };
        // starts 0,2,4,6 for L=10
        assert_eq!(p.num_windows(10), 4);
        // exact cover
        assert_eq!(p.num_windows(4), 1);
        // trailing partial step still yields one final window
        assert_eq!(p.num_windows(9), 4); // starts 0,2,4,5
    }
}
