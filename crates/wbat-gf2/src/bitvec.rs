// crates/wbat-gf2/src/bitvec.rs

//! Fixed-length packed bit vector.
//!
//! Bits are stored LSB-first inside 64-bit limbs. Limb bits at positions
//! `>= len` are always zero; every operation restores this invariant, so
//! `Eq` and `Hash` can work limb-wise without masking.

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

use std::fmt;
use std::ops::{BitAnd, BitXor, BitXorAssign};

const LIMB_BITS: usize = 64;

/// Packed bit vector of fixed length over GF(2).
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct BitVec {
    len: usize,
    limbs: Vec<u64>,
}

impl BitVec {
    /// All-zeros vector of length `len`.
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self {
            len,
            limbs: vec![0u64; len.div_ceil(LIMB_BITS)],
        }
    }

    /// All-ones vector of length `len`.
    #[must_use]
    pub fn ones(len: usize) -> Self {
        let mut v = Self {
            len,
            limbs: vec![u64::MAX; len.div_ceil(LIMB_BITS)],
        };
        v.mask_tail();
        v
    }

    /// Build a vector of length `len` from a bit-producing closure.
    #[must_use]
    pub fn from_fn<F: FnMut(usize) -> bool>(len: usize, mut f: F) -> Self {
        let mut v = Self::zeros(len);
        for i in 0..len {
            if f(i) {
                v.set(i, true);
            }
        }
        v
    }

    /// Number of bits.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the vector has zero length.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read bit `i`.
    ///
    /// # Panics
    /// Panics if `i >= len`.
    #[inline]
    #[must_use]
    pub fn get(&self, i: usize) -> bool {
        assert!(i < self.len, "bit index {i} out of range {}", self.len);
        (self.limbs[i / LIMB_BITS] >> (i % LIMB_BITS)) & 1 == 1
    }

    /// Write bit `i`.
    ///
    /// # Panics
    /// Panics if `i >= len`.
    #[inline]
    pub fn set(&mut self, i: usize, value: bool) {
        assert!(i < self.len, "bit index {i} out of range {}", self.len);
        let mask = 1u64 << (i % LIMB_BITS);
        if value {
            self.limbs[i / LIMB_BITS] |= mask;
        } else {
            self.limbs[i / LIMB_BITS] &= !mask;
        }
    }

    /// Number of set bits.
    #[must_use]
    pub fn popcount(&self) -> usize {
        self.limbs.iter().map(|l| l.count_ones() as usize).sum()
    }

    /// True iff no bit is set.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.limbs.iter().all(|&l| l == 0)
    }

    /// True iff every bit is set.
    #[must_use]
    pub fn is_ones(&self) -> bool {
        self.popcount() == self.len
    }

    /// Bitwise complement (respecting the length).
    #[must_use]
    pub fn complement(&self) -> Self {
        let mut out = Self {
            len: self.len,
            limbs: self.limbs.iter().map(|l| !l).collect(),
        };
        out.mask_tail();
        out
    }

    /// XOR `other` into `self` in place.
    ///
    /// # Panics
    /// Panics if lengths differ.
    pub fn xor_assign(&mut self, other: &Self) {
        assert_eq!(self.len, other.len, "length mismatch in xor");
        for (a, b) in self.limbs.iter_mut().zip(&other.limbs) {
            *a ^= b;
        }
    }

    /// Parity of `self & other`, i.e. the GF(2) scalar product.
    ///
    /// # Panics
    /// Panics if lengths differ.
    #[must_use]
    pub fn parity_and(&self, other: &Self) -> bool {
        assert_eq!(self.len, other.len, "length mismatch in scalar product");
        let mut acc = 0u32;
        for (a, b) in self.limbs.iter().zip(&other.limbs) {
            acc ^= (a & b).count_ones();
        }
        acc & 1 == 1
    }

    /// Indices of the set bits, ascending.
    #[must_use]
    pub fn support(&self) -> Vec<usize> {
        (0..self.len).filter(|&i| self.get(i)).collect()
    }

    /// Clear any limb bits beyond `len`.
    fn mask_tail(&mut self) {
        let tail = self.len % LIMB_BITS;
        if tail != 0 {
            if let Some(last) = self.limbs.last_mut() {
                *last &= (1u64 << tail) - 1;
            }
        }
    }
}

impl BitXorAssign<&BitVec> for BitVec {
    fn bitxor_assign(&mut self, rhs: &BitVec) {
        self.xor_assign(rhs);
    }
}

impl BitXor<&BitVec> for &BitVec {
    type Output = BitVec;

    fn bitxor(self, rhs: &BitVec) -> BitVec {
        let mut out = self.clone();
        out.xor_assign(rhs);
        out
    }
}

impl BitAnd<&BitVec> for &BitVec {
    type Output = BitVec;

    fn bitand(self, rhs: &BitVec) -> BitVec {
        assert_eq!(self.len, rhs.len, "length mismatch in and");
        BitVec {
            len: self.len,
            limbs: self
                .limbs
                .iter()
                .zip(&rhs.limbs)
                .map(|(a, b)| a & b)
                .collect(),
        }
    }
}

impl fmt::Debug for BitVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitVec[{}; ", self.len)?;
        // Long vectors are abbreviated; the head is enough for diagnostics.
        let shown = self.len.min(64);
        for i in 0..shown {
            write!(f, "{}", u8::from(self.get(i)))?;
        }
        if shown < self.len {
            write!(f, "…")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_roundtrip() {
        let mut v = BitVec::zeros(130);
        v.set(0, true);
        v.set(63, true);
        v.set(64, true);
        v.set(129, true);
        assert!(v.get(0) && v.get(63) && v.get(64) && v.get(129));
        assert!(!v.get(1) && !v.get(65));
        assert_eq!(v.popcount(), 4);

        v.set(64, false);
        assert!(!v.get(64));
        assert_eq!(v.popcount(), 3);
    }

    #[test]
    fn ones_and_complement_respect_length() {
        for len in [1usize, 7, 8, 63, 64, 65, 200] {
            let ones = BitVec::ones(len);
            assert_eq!(ones.popcount(), len);
            assert!(ones.is_ones());

            let zeros = ones.complement();
            assert!(zeros.is_zero());
            assert_eq!(zeros, BitVec::zeros(len));

            // complement twice is identity
            assert_eq!(zeros.complement(), ones);
        }
    }

    #[test]
    fn xor_is_self_inverse() {
        let a = BitVec::from_fn(100, |i| i % 3 == 0);
        let b = BitVec::from_fn(100, |i| i % 5 == 0);
        let mut c = &a ^ &b;
        c ^= &b;
        assert_eq!(c, a);
    }

    #[test]
    fn parity_and_matches_naive() {
        let a = BitVec::from_fn(77, |i| i % 2 == 0);
        let b = BitVec::from_fn(77, |i| i % 3 == 0);
        let naive = (0..77).filter(|&i| a.get(i) && b.get(i)).count() % 2 == 1;
        assert_eq!(a.parity_and(&b), naive);
        assert_eq!((&a & &b).popcount() % 2 == 1, naive);
    }

    #[test]
    fn equal_vectors_hash_equal() {
        use std::collections::HashMap;
        let a = BitVec::from_fn(65, |i| i == 64);
        let mut b = BitVec::zeros(65);
        b.set(64, true);

        let mut m = HashMap::new();
        m.insert(a, 1u32);
        assert_eq!(m.get(&b), Some(&1));
    }

    #[test]
    fn support_lists_set_bits() {
        let v = BitVec::from_fn(10, |i| i == 1 || i == 8);
        assert_eq!(v.support(), vec![1, 8]);
    }
}
