// crates/wbat-targets/src/lib.rs

//! Prediction (target) vectors for trace attacks.
//!
//! A *target source* turns the recorded plaintext/ciphertext pairs into
//! predicted per-trace bit vectors, one per [`Guess`]. The matchers then
//! look for those vectors (or combinations of sample vectors equal to
//! them) inside trace windows. AES is the implemented cipher; a second
//! cipher is a new implementation of the same trait.

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

pub mod aes;
pub mod block;
pub mod sbox;

use std::fmt;

use serde::{Deserialize, Serialize};
use wbat_gf2::BitVec;

pub use aes::{AesTargets, MaskSpec, Side};

/// Names one prediction: which state byte, which linear output mask,
/// which key-byte guess, and whether the vector is complemented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Guess {
    /// Byte position in the 16-byte state, `0..16`.
    pub pos: u8,
    /// Linear mask over the S-box output, `1..=255`.
    pub mask: u8,
    /// Key byte guess.
    pub key: u8,
    /// True for the bitwise complement of the prediction.
    pub negated: bool,
}

impl fmt::Display for Guess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sbox #{:02}, lin.mask 0x{:02x}, key 0x{:02x} {}, negated {}",
            self.pos,
            self.mask,
            self.key,
            printable(self.key),
            self.negated
        )
    }
}

/// Render a key byte for humans: the character itself when graphic,
/// a placeholder dot otherwise.
#[must_use]
pub fn printable(k: u8) -> String {
    if k.is_ascii_graphic() || k == b' ' {
        format!("('{}')", k as char)
    } else {
        "(·)".to_owned()
    }
}

/// Capability turning PT/CT pairs into prediction vectors.
///
/// Implementations must be pure: identical inputs yield the identical,
/// deterministically ordered vector list.
pub trait TargetSource {
    /// Generate one `(vector, guess)` pair per enumerated guess, with the
    /// complemented vector emitted right after each plain one.
    fn generate(&self, pts: &[[u8; 16]], cts: &[[u8; 16]]) -> Vec<(BitVec, Guess)>;
}
