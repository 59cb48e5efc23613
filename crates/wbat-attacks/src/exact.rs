// crates/wbat-attacks/src/exact.rs

//! Exact Matching Attack.
//!
//! Index each window's column vectors by value, then probe every prediction
//! vector: a first-order hit is a column equal to the prediction; a
//! second-order hit is a pair of columns whose XOR equals it, which defeats
//! first-order Boolean masking. The all-zeros and all-ones vectors are
//! excluded as the first share of a pair (they pair with everything) but
//! remain valid single-match sources.

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

use std::collections::HashMap;

use anyhow::Result;
use tracing::{debug, info};
use wbat_gf2::BitVec;
use wbat_targets::Guess;
use wbat_trace::WindowReader;

use crate::report::{AttackOutcome, Match, Witness};

/// Maximum witness offsets kept for a single (first-order) match.
const SINGLE_WITNESS_CAP: usize = 10;
/// Maximum witness offsets kept per share of a pair match.
const PAIR_WITNESS_CAP: usize = 5;

/// Attack order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    /// Single-column matches only.
    First,
    /// Single-column matches plus XOR pairs.
    Second,
}

/// Knobs for [`run_exact`].
#[derive(Clone, Copy, Debug)]
pub struct ExactOptions {
    /// Maximum attack order.
    pub order: Order,
    /// Abort after the first window that produced any match.
    pub stop_on_first_match: bool,
}

impl Default for ExactOptions {
    fn default() -> Self {
        Self {
            order: Order::First,
            stop_on_first_match: false,
        }
    }
}

/// Run the exact matching attack over every window of `reader`.
pub fn run_exact(
    reader: &mut WindowReader,
    targets: &[(BitVec, Guess)],
    opts: &ExactOptions,
) -> Result<AttackOutcome> {
    let total_windows = reader.num_windows();
    let ntraces = reader.set().ntraces();
    let ones = BitVec::ones(ntraces);
    let mut outcome = AttackOutcome::default();

    while let Some(view) = reader.next_window()? {
        info!(
            window = view.index + 1,
            total_windows,
            start_bit = view.start_bit,
            vectors = view.len(),
            "scanning window"
        );

        // Column value -> absolute bit offsets, in file order.
        let mut index: HashMap<&BitVec, Vec<u64>> = HashMap::new();
        for (off, v) in view.iter() {
            index.entry(v).or_default().push(off);
        }
        debug!(
            unique = index.len(),
            targets = targets.len(),
            "window indexed"
        );

        let mut found = false;
        for (target, guess) in targets {
            if let Some(offsets) = index.get(target) {
                let m = Match {
                    window: view.index,
                    guess: *guess,
                    witness: Witness::Single {
                        offsets: offsets.iter().copied().take(SINGLE_WITNESS_CAP).collect(),
                        total: offsets.len(),
                    },
                };
                info!("{m}");
                outcome.candidates.record(guess.pos, guess.key);
                outcome.matches.push(m);
                found = true;
            }

            if opts.order == Order::Second {
                for (v1, offs1) in &index {
                    if v1.is_zero() || **v1 == ones {
                        continue;
                    }
                    let v2 = target ^ *v1;
                    if let Some(offs2) = index.get(&v2) {
                        let m = Match {
                            window: view.index,
                            guess: *guess,
                            witness: Witness::Pair {
                                first: offs1.iter().copied().take(PAIR_WITNESS_CAP).collect(),
                                first_total: offs1.len(),
                                second: offs2.iter().copied().take(PAIR_WITNESS_CAP).collect(),
                                second_total: offs2.len(),
                            },
                        };
                        info!("{m}");
                        outcome.candidates.record(guess.pos, guess.key);
                        outcome.matches.push(m);
                        found = true;
                    }
                }
            }
        }

        outcome.windows += 1;
        if found && opts.stop_on_first_match {
            info!("stopping after first matching window");
            break;
        }
    }

    Ok(outcome)
}
