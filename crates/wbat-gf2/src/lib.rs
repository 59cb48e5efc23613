// crates/wbat-gf2/src/lib.rs

//! Packed GF(2) primitives used across the WBAT workspace.
//!
//! - [`BitVec`]: fixed-length bit vector stored in 64-bit limbs, with
//!   word-wise XOR/AND/NOT, popcount, and the `parity(a & b)` scalar product.
//! - [`BitMatrix`]: row-major matrix of `BitVec` rows with reduced row
//!   echelon form, right-kernel bases, and left-solving
//!   (`x · M = target`).
//!
//! This crate is intentionally small and self-contained; everything else in
//! the workspace builds on these two types.

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

pub mod bitvec;
pub mod matrix;

pub use bitvec::BitVec;
pub use matrix::{BitMatrix, Rref};
