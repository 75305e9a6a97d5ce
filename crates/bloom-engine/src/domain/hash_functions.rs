//! Hash functions for the Bloom filter
//!
//! Two xxHash64 digests with distinct fixed seeds are combined with the
//! enhanced Kirsch-Mitzenmacher scheme:
//!
//! `index_i = (h1 + i*h2 + i*(i-1)/2) mod m` for `i` in `0..k`
//!
//! The quadratic term breaks up the index correlation plain double hashing
//! shows when `h2` is small relative to `m`.

use std::hash::Hasher;

use twox_hash::XxHash64;

/// Seed for the first base digest
pub const SEED_1: u64 = 0;

/// Seed for the second base digest
pub const SEED_2: u64 = 6917;

/// Hash bytes with xxHash64 under the given seed
pub fn xxhash64(bytes: &[u8], seed: u64) -> u64 {
    let mut hasher = XxHash64::with_seed(seed);
    hasher.write(bytes);
    hasher.finish()
}

/// Compute the two base digests `(h1, h2)` for serialized key bytes
pub fn base_hashes(bytes: &[u8]) -> (u64, u64) {
    (xxhash64(bytes, SEED_1), xxhash64(bytes, SEED_2))
}

/// Lazily derive `k` bit positions in `[0, m)` for serialized key bytes
///
/// # Panics
///
/// Panics if `m` is 0.
pub(crate) fn hash_positions(bytes: &[u8], k: usize, m: usize) -> IndexIter {
    let (h1, h2) = base_hashes(bytes);
    IndexIter::new(h1, h2, k, m)
}

/// Iterator over the positions produced by enhanced double hashing
///
/// Works on residues mod `m`, stepping by `h2 + i` each round, so the exact
/// (non-wrapping) formula is reproduced without wide arithmetic.
#[derive(Clone, Debug)]
pub(crate) struct IndexIter {
    current: u64,
    step: u64,
    round: u64,
    remaining: usize,
    m: u64,
}

impl IndexIter {
    /// Create an iterator from precomputed base digests
    ///
    /// # Panics
    ///
    /// Panics if `m` is 0.
    pub(crate) fn new(h1: u64, h2: u64, k: usize, m: usize) -> Self {
        assert!(m > 0, "bit count must be positive");
        let m = m as u64;
        Self {
            current: h1 % m,
            step: h2 % m,
            round: 0,
            remaining: k,
            m,
        }
    }
}

impl Iterator for IndexIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let index = self.current;
        // T(i+1) - T(i) = i for the triangular term; all operands are < m
        self.current = (self.current + self.step + self.round % self.m) % self.m;
        self.round += 1;

        Some(index as usize)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for IndexIter {}
