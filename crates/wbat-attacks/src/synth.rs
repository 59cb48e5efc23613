// crates/wbat-attacks/src/synth.rs

//! Synthetic leaky trace sets.
//!
//! Writes a `NNNN.bin`/`NNNN.pt`/`NNNN.ct` directory the attacks can be
//! pointed at: seeded random plaintexts, real AES-128 ciphertexts, uniform
//! noise bits, and (optionally) an injected first-round S-box leak. Used by
//! the CLI `simulate` subcommand, demos, and the end-to-end tests.

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

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use rand::{rngs::StdRng, Rng as _, SeedableRng};
use tracing::info;
use wbat_targets::block::encrypt_block;
use wbat_targets::sbox::SBOX;
use wbat_trace::TraceSet;

/// What the synthetic traces leak.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Leak {
    /// Pure noise; every bit independent uniform.
    Uniform,
    /// Trace byte `b` (`b < 16`) equals `SBOX[pt[b] ^ key[b]]`.
    Unmasked,
    /// First-order Boolean masking: byte `2b` is a random share `m`,
    /// byte `2b + 1` is `m ^ SBOX[pt[b] ^ key[b]]`.
    Masked,
}

/// Parameters for one synthetic trace set.
#[derive(Clone, Copy, Debug)]
pub struct SynthSpec {
    /// Number of executions to record.
    pub ntraces: usize,
    /// Packed size of each trace.
    pub trace_bytes: usize,
    /// The AES-128 key being "attacked".
    pub key: [u8; 16],
    /// Seed for plaintexts, noise, and shares.
    pub seed: u64,
    /// Leak model.
    pub leak: Leak,
}

/// Generate and write a trace set under `dir` (created if missing).
pub fn write_leaky_traces(dir: &Path, spec: &SynthSpec) -> Result<()> {
    if spec.ntraces == 0 {
        bail!("need at least one trace");
    }
    let min_bytes = match spec.leak {
        Leak::Uniform => 1,
        Leak::Unmasked => 16,
        Leak::Masked => 32,
    };
    if spec.trace_bytes < min_bytes {
        bail!(
            "trace size {} too small for the {:?} leak model (need >= {min_bytes} bytes)",
            spec.trace_bytes,
            spec.leak
        );
    }

    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let mut rng = StdRng::seed_from_u64(spec.seed);

    for i in 0..spec.ntraces {
        let pt: [u8; 16] = rng.random();
        let ct = encrypt_block(&spec.key, &pt);

        let mut trace = vec![0u8; spec.trace_bytes];
        rng.fill(&mut trace[..]);

        match spec.leak {
            Leak::Uniform => {}
            Leak::Unmasked => {
                for b in 0..16 {
                    trace[b] = SBOX[(pt[b] ^ spec.key[b]) as usize];
                }
            }
            Leak::Masked => {
                for b in 0..16 {
                    let share: u8 = rng.random();
                    trace[2 * b] = share;
                    trace[2 * b + 1] = share ^ SBOX[(pt[b] ^ spec.key[b]) as usize];
                }
            }
        }

        fs::write(TraceSet::trace_path(dir, i), &trace)
            .with_context(|| format!("writing trace {i}"))?;
        fs::write(TraceSet::plaintext_path(dir, i), pt)
            .with_context(|| format!("writing plaintext {i}"))?;
        fs::write(TraceSet::ciphertext_path(dir, i), ct)
            .with_context(|| format!("writing ciphertext {i}"))?;
    }

    info!(
        ntraces = spec.ntraces,
        trace_bytes = spec.trace_bytes,
        leak = ?spec.leak,
        seed = spec.seed,
        "synthetic trace set written"
    );
    Ok(())
}
