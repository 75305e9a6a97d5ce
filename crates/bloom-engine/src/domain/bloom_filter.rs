//! Core Bloom filter engine
//!
//! INVARIANTS:
//! - No false negatives: once `add(x)` succeeds, `contains(x)` returns true
//! - Bits only go from 0 to 1; sizing never changes after construction
//! - `num_items` counts successful `add` calls, not distinct keys

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use tracing::{debug, warn};

use super::bit_store::BitStore;
use super::config::FilterConfig;
use super::hash_functions::hash_positions;
use super::parameters::{calculate_fpr, calculate_optimal_parameters, DerivedParameters};
use crate::error::FilterError;
use crate::ports::{BuiltinKey, BuiltinSerializer, KeyBytes, KeySerializer};

/// Bloom filter for probabilistic membership testing
///
/// Generic over the key type `K` and the [`KeySerializer`] `S` that turns
/// keys into bytes. `contains` answers "definitely not present" (`false`) or
/// "possibly present" (`true`); false positives occur at roughly the
/// configured error rate while `len() <= capacity()`.
///
/// The filter does no locking. `add` takes `&mut self` and the queries take
/// `&self`, so sharing across threads needs an outer lock such as an
/// `RwLock`, which lets queries overlap with each other but not with `add`.
pub struct BloomFilter<K: ?Sized, S = BuiltinSerializer> {
    config: FilterConfig,
    params: DerivedParameters,
    bits: BitStore,
    num_items: usize,
    serializer: S,
    _key: PhantomData<fn(&K)>,
}

impl<K: BuiltinKey + ?Sized> BloomFilter<K> {
    /// Create a filter for built-in key shapes
    ///
    /// # Arguments
    /// * `capacity` - Expected number of items (n)
    /// * `error_rate` - Target false positive rate at capacity (p)
    pub fn new(capacity: usize, error_rate: f64) -> Result<Self, FilterError> {
        Self::with_serializer(capacity, error_rate, BuiltinSerializer)
    }

    /// Create a filter for built-in key shapes with explicit sizing
    ///
    /// # Arguments
    /// * `bit_count` - Number of bits (m), at least 1
    /// * `hash_count` - Number of hash functions (k), at least 1
    pub fn with_size(bit_count: usize, hash_count: usize) -> Result<Self, FilterError> {
        Self::with_parameters(
            DerivedParameters::new(bit_count, hash_count)?,
            BuiltinSerializer,
        )
    }
}

impl<K: ?Sized, S: KeySerializer<K>> BloomFilter<K, S> {
    /// Create a filter that serializes keys with `serializer`
    pub fn with_serializer(
        capacity: usize,
        error_rate: f64,
        serializer: S,
    ) -> Result<Self, FilterError> {
        Self::from_config(FilterConfig::new(capacity, error_rate)?, serializer)
    }

    /// Create a filter from a configuration
    ///
    /// Sizing happens here and only here.
    pub fn from_config(config: FilterConfig, serializer: S) -> Result<Self, FilterError> {
        config.validate()?;
        let params = calculate_optimal_parameters(&config)?;
        Self::build(config, params, serializer)
    }

    /// Create a filter with explicit bit and hash counts
    ///
    /// No capacity is given, so [`capacity`](Self::capacity) reports the load
    /// at which `hash_count` is optimal for `bit_count` and
    /// [`error_rate`](Self::error_rate) the theoretical rate at that load.
    /// The over-capacity warning uses that implied capacity.
    pub fn with_parameters(params: DerivedParameters, serializer: S) -> Result<Self, FilterError> {
        params.validate()?;
        Self::build(params.implied_config(), params, serializer)
    }

    fn build(
        config: FilterConfig,
        params: DerivedParameters,
        serializer: S,
    ) -> Result<Self, FilterError> {
        let bits = BitStore::new(params.bit_count).inspect_err(|err| {
            warn!(bit_count = params.bit_count, error = %err, "Bit array allocation failed");
        })?;

        debug!(
            capacity = config.capacity,
            error_rate = config.error_rate,
            bit_count = params.bit_count,
            hash_count = params.hash_count,
            "Bloom filter created"
        );

        Ok(Self {
            config,
            params,
            bits,
            num_items: 0,
            serializer,
            _key: PhantomData,
        })
    }

    /// Insert an item into the filter
    ///
    /// After a successful insert, `contains(item)` is guaranteed to return
    /// true. The item counter is bumped even when the item was already
    /// present. On serialization failure nothing is changed.
    pub fn add(&mut self, item: &K) -> Result<(), FilterError> {
        let bytes = self.serialize(item)?;
        for index in hash_positions(&bytes, self.params.hash_count, self.params.bit_count) {
            self.bits.set(index);
        }
        self.num_items += 1;

        if self.num_items == self.config.capacity.saturating_add(1) {
            warn!(
                capacity = self.config.capacity,
                error_rate = self.config.error_rate,
                "Bloom filter capacity exceeded, false positive rate no longer bounded"
            );
        }

        Ok(())
    }

    /// Insert every item, stopping at the first serialization failure
    ///
    /// Items before the failing one stay inserted.
    pub fn add_all<'k, I>(&mut self, items: I) -> Result<(), FilterError>
    where
        I: IntoIterator<Item = &'k K>,
        K: 'k,
    {
        for item in items {
            self.add(item)?;
        }
        Ok(())
    }

    /// Test if an item might be in the filter
    ///
    /// Returns:
    /// - `Ok(true)` if the item might be in the set (could be a false positive)
    /// - `Ok(false)` if the item is definitely NOT in the set
    ///
    /// Serialization failures are returned as errors, never as `false`.
    pub fn contains(&self, item: &K) -> Result<bool, FilterError> {
        let bytes = self.serialize(item)?;
        Ok(self.check(&bytes))
    }

    /// Test several items at once, preserving input order
    ///
    /// All items are serialized before any bit is read, so a single failure
    /// aborts the whole batch.
    pub fn contains_batch<'k, I>(&self, items: I) -> Result<Vec<bool>, FilterError>
    where
        I: IntoIterator<Item = &'k K>,
        K: 'k,
    {
        let serialized = items
            .into_iter()
            .map(|item| self.serialize(item))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(serialized.iter().map(|bytes| self.check(bytes)).collect())
    }

    /// Estimate the current false positive rate
    ///
    /// Formula: FPR = (1 - e^(-kn/m))^k with n = number of `add` calls
    pub fn estimated_false_positive_rate(&self) -> f64 {
        calculate_fpr(self.params.bit_count, self.num_items, self.params.hash_count)
    }

    fn serialize<'a>(&self, item: &'a K) -> Result<KeyBytes<'a>, FilterError> {
        self.serializer.serialize(item).map_err(|err| {
            debug!(error = %err, "Key serialization failed");
            FilterError::from(err)
        })
    }

    #[inline]
    fn check(&self, bytes: &[u8]) -> bool {
        hash_positions(bytes, self.params.hash_count, self.params.bit_count)
            .all(|index| self.bits.get(index))
    }
}

impl<K: ?Sized, S> BloomFilter<K, S> {
    /// Get the configuration the filter was built from
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Get the derived sizing
    pub fn parameters(&self) -> DerivedParameters {
        self.params
    }

    /// Get the expected number of items
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Get the target false positive rate
    pub fn error_rate(&self) -> f64 {
        self.config.error_rate
    }

    /// Get the filter size in bits (m)
    pub fn size(&self) -> usize {
        self.params.bit_count
    }

    /// Alias for [`size`](Self::size)
    pub fn bit_count(&self) -> usize {
        self.params.bit_count
    }

    /// Get the number of hash functions (k)
    pub fn hash_count(&self) -> usize {
        self.params.hash_count
    }

    /// Get the number of `add` calls so far
    pub fn len(&self) -> usize {
        self.num_items
    }

    /// Alias for [`len`](Self::len)
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// Whether nothing has been added yet
    pub fn is_empty(&self) -> bool {
        self.num_items == 0
    }

    /// Get the number of bits set in the filter
    pub fn bits_set(&self) -> usize {
        self.bits.count_ones()
    }

    /// Get the size of the bit array in bytes
    pub fn size_in_bytes(&self) -> usize {
        self.bits.size_in_bytes()
    }

    /// Get the key serializer
    pub fn serializer(&self) -> &S {
        &self.serializer
    }
}

impl<K: ?Sized, S: Clone> Clone for BloomFilter<K, S> {
    fn clone(&self) -> Self {
        Self {
            config: self.config,
            params: self.params,
            bits: self.bits.clone(),
            num_items: self.num_items,
            serializer: self.serializer.clone(),
            _key: PhantomData,
        }
    }
}

impl<K: ?Sized, S> fmt::Debug for BloomFilter<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BloomFilter")
            .field("capacity", &self.config.capacity)
            .field("error_rate", &format_args!("{:.2e}", self.config.error_rate))
            .field("serializer", &format_args!("{}", type_name::<S>()))
            .field("size", &self.params.bit_count)
            .field("hash_count", &self.params.hash_count)
            .field("num_items", &self.num_items)
            .finish()
    }
}
