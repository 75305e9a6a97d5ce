//! Packed bit array backing a Bloom filter
//!
//! Bits only ever go from 0 to 1. There is no clear or unset operation.

use bitvec::prelude::*;

use crate::error::FilterError;

/// Fixed-size, monotonic bit array
#[derive(Clone, PartialEq, Eq)]
pub struct BitStore {
    bits: BitVec<u64, Lsb0>,
}

impl BitStore {
    /// Allocate `len` zeroed bits
    ///
    /// Fails with [`FilterError::AllocationFailed`] instead of aborting when
    /// the backing words cannot be allocated.
    pub fn new(len: usize) -> Result<Self, FilterError> {
        let alloc_failed = || FilterError::AllocationFailed { bits: len };

        let word_count = len.div_ceil(u64::BITS as usize);
        let mut words: Vec<u64> = Vec::new();
        words
            .try_reserve_exact(word_count)
            .map_err(|_| alloc_failed())?;
        words.resize(word_count, 0);

        let mut bits = BitVec::<u64, Lsb0>::try_from_vec(words).map_err(|_| alloc_failed())?;
        bits.truncate(len);

        Ok(Self { bits })
    }

    /// Number of addressable bits
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether the store has no bits at all
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Set the bit at `index` to 1; a no-op if it is already set
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn set(&mut self, index: usize) {
        self.bits.set(index, true);
    }

    /// Read the bit at `index`
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        self.bits[index]
    }

    /// Number of bits currently set
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    /// Bytes needed to hold the bits, `ceil(len / 8)`
    pub fn size_in_bytes(&self) -> usize {
        self.bits.len().div_ceil(8)
    }
}

impl std::fmt::Debug for BitStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitStore")
            .field("len", &self.len())
            .field("ones", &self.count_ones())
            .finish()
    }
}
