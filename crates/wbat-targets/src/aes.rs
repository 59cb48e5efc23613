// crates/wbat-targets/src/aes.rs

//! AES target vectors: first-round S-box output bits under a key guess.
//!
//! For guess `(b, lin, k)` the predicted bit of trace `i` is
//! `parity(SBOX[pt_i[b] ^ k] & lin)`; every guess also emits its bitwise
//! complement (`negated = true`), which catches leakage of the inverted
//! bit. The `parity(x & lin)` products are precomputed as a 256×256 table
//! so generation is a flat scan over traces × positions × masks × keys.

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

use std::str::FromStr;

use anyhow::{bail, Context, Result};
use rand::Rng;
use wbat_gf2::BitVec;

use crate::sbox::{INV_SBOX, SBOX};
use crate::{Guess, TargetSource};

/// Which side of the cipher the predictions model.
///
/// Only the plaintext side (first-round S-box) is reachable from the
/// command line; the ciphertext side exists for completeness of the seam.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Side {
    /// First-round S-box on `pt[b] ^ k`.
    #[default]
    Plaintext,
    /// Last-round inverse S-box on `ct[b] ^ k`.
    Ciphertext,
}

/// Linear-mask selection: an explicit list or one of the presets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MaskSpec {
    /// Explicit comma-separated masks.
    List(Vec<u8>),
    /// Every nonzero mask `1..=255`.
    All,
    /// The 8 single-bit masks plus 8 sampled multi-bit masks.
    Random16,
    /// The 8 single-bit masks plus 24 sampled multi-bit masks.
    Random32,
}

impl FromStr for MaskSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Self::All),
            "random16" => Ok(Self::Random16),
            "random32" => Ok(Self::Random32),
            csv => {
                let masks = csv
                    .split(',')
                    .map(|tok| {
                        tok.trim()
                            .parse::<u8>()
                            .with_context(|| format!("bad mask value {tok:?}"))
                    })
                    .collect::<Result<Vec<u8>>>()?;
                Ok(Self::List(masks))
            }
        }
    }
}

impl MaskSpec {
    /// Materialize the mask list. The RNG only matters for the random
    /// presets; pass a seeded one so reports are reproducible.
    pub fn resolve<R: Rng>(&self, rng: &mut R) -> Result<Vec<u8>> {
        match self {
            Self::List(masks) => {
                if masks.is_empty() || masks.contains(&0) {
                    bail!("masks must be a non-empty list of values in 1..=255");
                }
                Ok(masks.clone())
            }
            Self::All => Ok((1..=255).collect()),
            Self::Random16 => Ok(sample_masks(rng, 16)),
            Self::Random32 => Ok(sample_masks(rng, 32)),
        }
    }
}

/// The 8 powers of two followed by `total - 8` distinct multi-bit masks.
fn sample_masks<R: Rng>(rng: &mut R, total: usize) -> Vec<u8> {
    let mut masks: Vec<u8> = (0..8).map(|i| 1u8 << i).collect();
    let pool: Vec<u8> = (1..=255u8).filter(|m| m & (m - 1) != 0).collect();
    for idx in rand::seq::index::sample(rng, pool.len(), total - 8) {
        masks.push(pool[idx]);
    }
    masks
}

/// AES target generator configuration.
#[derive(Clone, Debug)]
pub struct AesTargets {
    positions: Vec<u8>,
    masks: Vec<u8>,
    keys: Vec<u8>,
    side: Side,
}

impl AesTargets {
    /// Configure the generator.
    ///
    /// `positions` are state byte indices in `0..16`; `masks` are nonzero
    /// linear masks. Every key byte `0..=255` is enumerated unless
    /// restricted with [`Self::with_keys`].
    pub fn new(positions: Vec<u8>, masks: Vec<u8>, side: Side) -> Result<Self> {
        if positions.is_empty() || positions.iter().any(|&p| p > 15) {
            bail!("byte positions must be a non-empty subset of 0..=15");
        }
        if masks.is_empty() || masks.contains(&0) {
            bail!("masks must be a non-empty list of values in 1..=255");
        }
        Ok(Self {
            positions,
            masks,
            keys: (0..=255).collect(),
            side,
        })
    }

    /// Restrict the enumerated key bytes (e.g. to printable characters).
    pub fn with_keys(mut self, keys: Vec<u8>) -> Result<Self> {
        if keys.is_empty() {
            bail!("key charset must not be empty");
        }
        self.keys = keys;
        Ok(self)
    }

    /// Attacked byte positions.
    #[must_use]
    pub fn positions(&self) -> &[u8] {
        &self.positions
    }

    /// Linear masks in use.
    #[must_use]
    pub fn masks(&self) -> &[u8] {
        &self.masks
    }

    /// Number of `(vector, guess)` pairs `generate` will emit.
    #[must_use]
    pub fn num_targets(&self) -> usize {
        self.positions.len() * self.masks.len() * self.keys.len() * 2
    }
}

/// `parity(x & lin)` for every `(lin, x)`.
fn scalar_table() -> Vec<[u8; 256]> {
    let mut table = vec![[0u8; 256]; 256];
    for (lin, row) in table.iter_mut().enumerate() {
        for (x, cell) in row.iter_mut().enumerate() {
            *cell = ((lin & x).count_ones() & 1) as u8;
        }
    }
    table
}

impl TargetSource for AesTargets {
    fn generate(&self, pts: &[[u8; 16]], cts: &[[u8; 16]]) -> Vec<(BitVec, Guess)> {
        let n = pts.len();
        debug_assert_eq!(n, cts.len());
        let scalar = scalar_table();

        let mut out = Vec::with_capacity(self.num_targets());
        for &pos in &self.positions {
            for &mask in &self.masks {
                let row = &scalar[mask as usize];
                for &key in &self.keys {
                    let mut t = BitVec::zeros(n);
                    for i in 0..n {
                        let x = match self.side {
                            Side::Plaintext => SBOX[(pts[i][pos as usize] ^ key) as usize],
                            Side::Ciphertext => INV_SBOX[(cts[i][pos as usize] ^ key) as usize],
                        };
                        if row[x as usize] == 1 {
                            t.set(i, true);
                        }
                    }
                    let negated = t.complement();
                    out.push((
                        t,
                        Guess {
                            pos,
                            mask,
                            key,
                            negated: false,
                        },
                    ));
                    out.push((
                        negated,
                        Guess {
                            pos,
                            mask,
                            key,
                            negated: true,
                        },
                    ));
                }
            }
        }
        out
    }
}
