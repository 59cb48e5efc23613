// crates/wbat-attacks/src/report.rs

//! Match records, the per-byte candidate aggregate, and the final report.

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

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use wbat_targets::{printable, Guess};

/// How a prediction vector was located inside a window.
#[derive(Clone, Debug, Serialize)]
pub enum Witness {
    /// A column vector equal to the prediction (first order).
    Single {
        /// Up to 10 absolute bit offsets holding the value, file order.
        offsets: Vec<u64>,
        /// Total number of offsets holding the value.
        total: usize,
    },
    /// Two column vectors whose XOR equals the prediction (second order).
    Pair {
        /// Up to 5 offsets of the first share.
        first: Vec<u64>,
        /// Total offsets holding the first share's value.
        first_total: usize,
        /// Up to 5 offsets of the second share.
        second: Vec<u64>,
        /// Total offsets holding the second share's value.
        second_total: usize,
    },
    /// A GF(2) combination of sample vectors XOR-ing to the prediction.
    Combination {
        /// Absolute bit offsets of the combined samples, ascending.
        offsets: Vec<u64>,
    },
}

/// One reported match, tied to the window that produced it.
#[derive(Clone, Debug, Serialize)]
pub struct Match {
    /// 0-based window number.
    pub window: usize,
    /// The guess whose prediction vector matched.
    pub guess: Guess,
    /// Where the prediction was found.
    pub witness: Witness,
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.witness {
            Witness::Single { offsets, total } => write!(
                f,
                "MATCH (single): window {}, {}, offsets ({total} total): {offsets:?}",
                self.window + 1,
                self.guess
            ),
            Witness::Pair {
                first,
                first_total,
                second,
                second_total,
            } => write!(
                f,
                "MATCH (double): window {}, {}, offsets ({first_total} and {second_total} total): {first:?} {second:?}",
                self.window + 1,
                self.guess
            ),
            Witness::Combination { offsets } => {
                write!(
                    f,
                    "MATCH (linear): window {}, {}, {} offsets",
                    self.window + 1,
                    self.guess,
                    offsets.len()
                )?;
                if let (Some(lo), Some(hi)) = (offsets.first(), offsets.last()) {
                    write!(f, " spanning {lo}..{hi}")?;
                }
                write!(f, ": {offsets:?}")
            }
        }
    }
}

/// Per-byte key candidates accumulated across windows.
///
/// Insert-only: re-recording a `(position, key)` pair bumps the hit count
/// and leaves the candidate set unchanged, so the set only ever grows.
#[derive(Clone, Debug, Default)]
pub struct Candidates {
    sets: [BTreeSet<u8>; 16],
    hits: [u64; 16],
}

impl Candidates {
    /// Fresh, empty aggregate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a match for `key` at byte position `pos`.
    ///
    /// # Panics
    /// Panics if `pos > 15`.
    pub fn record(&mut self, pos: u8, key: u8) {
        self.sets[pos as usize].insert(key);
        self.hits[pos as usize] += 1;
    }

    /// Number of recorded matches per byte position.
    #[must_use]
    pub fn hits(&self) -> &[u64; 16] {
        &self.hits
    }

    /// Candidate keys for byte position `pos`, ascending.
    #[must_use]
    pub fn at(&self, pos: u8) -> &BTreeSet<u8> {
        &self.sets[pos as usize]
    }

    /// True if any byte position has a candidate.
    #[must_use]
    pub fn any(&self) -> bool {
        self.sets.iter().any(|s| !s.is_empty())
    }

    /// Fold `other` into `self` (set union + hit sums).
    pub fn merge(&mut self, other: &Self) {
        for (pos, set) in other.sets.iter().enumerate() {
            self.sets[pos].extend(set);
            self.hits[pos] += other.hits[pos];
        }
    }

    /// 32-hex-character example key: the smallest candidate per byte,
    /// `??` where nothing was recovered.
    #[must_use]
    pub fn example_key(&self) -> String {
        let mut out = String::with_capacity(32);
        for set in &self.sets {
            match set.first() {
                Some(k) => out.push_str(&format!("{k:02x}")),
                None => out.push_str("??"),
            }
        }
        out
    }
}

/// Final, render-ready attack result.
#[derive(Clone, Debug, Serialize)]
pub struct Report {
    /// Matches per byte position.
    pub hits: Vec<u64>,
    /// Candidate keys per byte position, ascending.
    pub candidates: Vec<Vec<u8>>,
    /// 32-hex example key (`??` per unrecovered byte).
    pub example: String,
}

impl Report {
    /// Snapshot an aggregate into a report.
    #[must_use]
    pub fn from_candidates(c: &Candidates) -> Self {
        Self {
            hits: c.hits().to_vec(),
            candidates: (0..16u8).map(|p| c.at(p).iter().copied().collect()).collect(),
            example: c.example_key(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Matches (by position): {:?}", self.hits)?;
        writeln!(f, "Key candidates found:")?;
        for (pos, keys) in self.candidates.iter().enumerate() {
            if keys.is_empty() {
                continue;
            }
            let rendered: Vec<String> = keys
                .iter()
                .map(|&k| format!("0x{k:02x}{}", printable(k)))
                .collect();
            writeln!(f, "S-Box #{pos}: {}", rendered.join(","))?;
        }
        write!(f, "\nExample: {}", self.example)
    }
}

/// Everything a finished attack run produced.
#[derive(Debug, Default)]
pub struct AttackOutcome {
    /// The global candidate aggregate.
    pub candidates: Candidates,
    /// Every reported match, in discovery order.
    pub matches: Vec<Match>,
    /// Windows examined.
    pub windows: usize,
    /// Windows skipped for failing a precondition (LDA only).
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_key_renders_gaps() {
        let mut c = Candidates::new();
        c.record(0, 0x2b);
        c.record(5, 0x5a);
        c.record(5, 0x10); // smaller candidate wins the example slot
        let ex = c.example_key();
        assert_eq!(ex.len(), 32);
        assert!(ex.starts_with("2b????????10"));
        assert!(ex.ends_with("??"));
    }

    #[test]
    fn record_is_idempotent_on_sets_but_counts_hits() {
        let mut c = Candidates::new();
        c.record(3, 0x41);
        c.record(3, 0x41);
        assert_eq!(c.at(3).len(), 1);
        assert_eq!(c.hits()[3], 2);
    }

    #[test]
    fn merge_is_monotonic() {
        let mut a = Candidates::new();
        a.record(0, 1);
        let before: Vec<u8> = a.at(0).iter().copied().collect();

        let mut b = Candidates::new();
        b.record(0, 2);
        b.record(9, 7);
        a.merge(&b);

        for k in before {
            assert!(a.at(0).contains(&k), "merge must never drop candidates");
        }
        assert!(a.at(0).contains(&2));
        assert!(a.at(9).contains(&7));
    }

    #[test]
    fn report_display_has_example_line() {
        let mut c = Candidates::new();
        c.record(1, b'+');
        let text = Report::from_candidates(&c).to_string();
        assert!(text.contains("S-Box #1: 0x2b('+')"));
        assert!(text.contains("\nExample: ??2b"));
    }
}
