//! Optimal Bloom filter parameter calculation
//!
//! Formulas:
//! - m = ceil(-n*ln(p) / (ln(2)^2))  -- optimal bits
//! - k = ceil((m/n) * ln(2))         -- optimal hash functions
//! - FPR = (1 - e^(-kn/m))^k         -- false positive rate after n inserts

use std::f64::consts::LN_2;

use super::config::FilterConfig;
use crate::error::FilterError;

/// Largest bit count the bit store can address
pub const MAX_BIT_COUNT: usize = usize::MAX >> 3;

/// Sizing derived once from a [`FilterConfig`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DerivedParameters {
    /// Number of bits in the filter (m)
    pub bit_count: usize,
    /// Number of hash functions (k)
    pub hash_count: usize,
}

impl DerivedParameters {
    /// Explicit sizing, bypassing derivation from a capacity
    ///
    /// Both counts must be at least 1, and `bit_count` must be addressable.
    pub fn new(bit_count: usize, hash_count: usize) -> Result<Self, FilterError> {
        let params = Self {
            bit_count,
            hash_count,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check both counts are usable by a filter
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.bit_count == 0 {
            return Err(FilterError::InvalidBitCount {
                bit_count: self.bit_count,
            });
        }
        if self.hash_count == 0 {
            return Err(FilterError::InvalidHashCount {
                hash_count: self.hash_count,
            });
        }
        if self.bit_count >= MAX_BIT_COUNT {
            return Err(FilterError::FilterTooLarge {
                bits: self.bit_count as f64,
                max: MAX_BIT_COUNT,
            });
        }
        Ok(())
    }

    /// Load at which `hash_count` is optimal for `bit_count`
    ///
    /// n = floor(m * ln(2) / k), at least 1.
    pub fn implied_capacity(&self) -> usize {
        let n = (self.bit_count as f64 * LN_2 / self.hash_count as f64).floor();
        (n as usize).max(1)
    }

    /// Configuration describing explicitly sized parameters
    ///
    /// Capacity is [`implied_capacity`](Self::implied_capacity) and the error
    /// rate is the theoretical false positive rate at that load. The result
    /// is descriptive only and is not re-validated.
    pub fn implied_config(&self) -> FilterConfig {
        let capacity = self.implied_capacity();
        FilterConfig {
            capacity,
            error_rate: self.expected_false_positive_rate(capacity),
        }
    }

    /// Theoretical false positive rate once `capacity` items are inserted
    pub fn expected_false_positive_rate(&self, capacity: usize) -> f64 {
        calculate_fpr(self.bit_count, capacity, self.hash_count)
    }
}

/// Calculate optimal Bloom filter parameters for a validated configuration
///
/// Both results are clamped to a minimum of 1. Fails with
/// [`FilterError::FilterTooLarge`] when the bit count cannot be addressed.
pub fn calculate_optimal_parameters(
    config: &FilterConfig,
) -> Result<DerivedParameters, FilterError> {
    let n = config.capacity as f64;
    let ln2_squared = LN_2 * LN_2;

    let m = (-n * config.error_rate.ln() / ln2_squared).ceil();
    if m.is_nan() || m >= MAX_BIT_COUNT as f64 {
        return Err(FilterError::FilterTooLarge {
            bits: m,
            max: MAX_BIT_COUNT,
        });
    }
    let bit_count = (m as usize).max(1);

    let k = ((bit_count as f64 / n) * LN_2).ceil() as usize;
    let hash_count = k.max(1);

    Ok(DerivedParameters {
        bit_count,
        hash_count,
    })
}

/// Calculate the false positive rate for given parameters
///
/// Formula: FPR = (1 - e^(-kn/m))^k
///
/// Returns 0.0 for an empty or zero-sized filter, saturates non-finite
/// results to 1.0 and clamps everything else into [0.0, 1.0].
pub fn calculate_fpr(m: usize, n: usize, k: usize) -> f64 {
    if m == 0 || n == 0 {
        return 0.0;
    }

    let exponent = -(k as f64) * (n as f64) / (m as f64);
    let rate = (1.0 - exponent.exp()).powf(k as f64);
    if !rate.is_finite() {
        return 1.0;
    }
    rate.clamp(0.0, 1.0)
}
