// crates/wbat-attacks/src/lda.rs

//! Linear Decoding Attack.
//!
//! Within a window, the distinct non-trivial column vectors form the rows of
//! a GF(2) matrix `M` (one row per retained sample offset, columns indexed
//! by trace). A prediction lies in the row space of `M` iff it is orthogonal
//! to every vector of a right-kernel basis, the parity checks. Solving
//! `x · M = target` only happens on a hit, so the occasional fresh Gaussian
//! solve is cheap.
//!
//! Windows whose kernel is trivial carry no redundancy (`rank == ntraces`):
//! every vector would pass, so the window is skipped with a warning. A run
//! where every window was skipped fails.

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

use std::collections::HashSet;

use anyhow::{bail, Result};
use tracing::{debug, info, warn};
use wbat_gf2::{BitMatrix, BitVec};
use wbat_targets::Guess;
use wbat_trace::WindowReader;

use crate::report::{AttackOutcome, Match, Witness};

/// Knobs for [`run_lda`].
#[derive(Clone, Copy, Debug, Default)]
pub struct LdaOptions {
    /// Abort after the first window that produced any match.
    pub stop_on_first_match: bool,
}

/// Run the linear decoding attack over every window of `reader`.
pub fn run_lda(
    reader: &mut WindowReader,
    targets: &[(BitVec, Guess)],
    opts: &LdaOptions,
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
            "decoding window"
        );

        // Distinct non-trivial columns in file order; remember the first
        // offset at which each value occurred so solutions can name
        // concrete sample positions.
        let mut seen: HashSet<&BitVec> = HashSet::new();
        let mut rows: Vec<BitVec> = Vec::new();
        let mut row_offsets: Vec<u64> = Vec::new();
        for (off, v) in view.iter() {
            if v.is_zero() || *v == ones {
                continue;
            }
            if seen.insert(v) {
                rows.push(v.clone());
                row_offsets.push(off);
            }
        }

        outcome.windows += 1;
        if rows.is_empty() {
            warn!(
                window = view.index + 1,
                "window holds only trivial sample vectors, skipping"
            );
            outcome.skipped += 1;
            continue;
        }

        let matrix = BitMatrix::from_rows(ntraces, rows);
        let checks = matrix.right_kernel_basis();
        debug!(
            rows = matrix.nrows(),
            parity_checks = checks.len(),
            targets = targets.len(),
            "built window matrix"
        );
        if checks.is_empty() {
            warn!(
                window = view.index + 1,
                rows = matrix.nrows(),
                ntraces,
                "window has no redundancy (rank equals trace count), skipping"
            );
            outcome.skipped += 1;
            continue;
        }

        let mut found = false;
        for (target, guess) in targets {
            if checks.iter().any(|p| target.parity_and(p)) {
                continue;
            }
            // The parity checks vouch for membership, so a solution exists.
            let Some(sol) = matrix.solve_left(target) else {
                debug!("parity checks passed but solve failed; skipping target");
                continue;
            };
            let offsets: Vec<u64> = sol.support().iter().map(|&i| row_offsets[i]).collect();
            let m = Match {
                window: view.index,
                guess: *guess,
                witness: Witness::Combination { offsets },
            };
            info!("{m}");
            outcome.candidates.record(guess.pos, guess.key);
            outcome.matches.push(m);
            found = true;
        }

        if found && opts.stop_on_first_match {
            info!("stopping after first matching window");
            break;
        }
    }

    if outcome.windows > 0 && outcome.skipped == outcome.windows {
        bail!(
            "no window satisfied the decoding precondition; \
             use more traces than window bits"
        );
    }

    Ok(outcome)
}
