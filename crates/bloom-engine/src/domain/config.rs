//! Filter configuration and validation
//!
//! # Example
//!
//! ```
//! use bloom_engine::domain::FilterConfigBuilder;
//!
//! let config = FilterConfigBuilder::new()
//!     .capacity(100_000)
//!     .error_rate(0.01)
//!     .build()
//!     .expect("Valid config");
//! assert_eq!(config.capacity, 100_000);
//! ```

use crate::error::FilterError;
use serde::{Deserialize, Serialize};

/// Default expected item count
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Default target false positive probability
pub const DEFAULT_ERROR_RATE: f64 = 0.01;

/// Bloom filter configuration
///
/// Fixed for the lifetime of a filter. Both fields are checked by
/// [`FilterConfig::validate`] before any filter is sized from them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Expected number of items (n)
    pub capacity: usize,
    /// Target false positive probability at capacity (p), in (0, 1)
    pub error_rate: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            error_rate: DEFAULT_ERROR_RATE,
        }
    }
}

impl FilterConfig {
    /// Create a new configuration with validation
    pub fn new(capacity: usize, error_rate: f64) -> Result<Self, FilterError> {
        let config = Self {
            capacity,
            error_rate,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate capacity and error rate
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.capacity == 0 {
            return Err(FilterError::InvalidCapacity {
                capacity: self.capacity,
            });
        }

        if self.error_rate.is_nan() || self.error_rate <= 0.0 || self.error_rate >= 1.0 {
            return Err(FilterError::InvalidErrorRate {
                error_rate: self.error_rate,
            });
        }

        Ok(())
    }

    /// Builder-style method to set capacity
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Builder-style method to set error rate
    pub fn with_error_rate(mut self, error_rate: f64) -> Self {
        self.error_rate = error_rate;
        self
    }
}

/// Builder for FilterConfig with validation
///
/// Unset fields fall back to [`FilterConfig::default`].
#[derive(Debug, Default)]
pub struct FilterConfigBuilder {
    capacity: Option<usize>,
    error_rate: Option<f64>,
}

impl FilterConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the expected number of items
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Set the target false positive probability
    pub fn error_rate(mut self, error_rate: f64) -> Self {
        self.error_rate = Some(error_rate);
        self
    }

    /// Build the FilterConfig, validating all parameters
    pub fn build(self) -> Result<FilterConfig, FilterError> {
        let defaults = FilterConfig::default();

        FilterConfig::new(
            self.capacity.unwrap_or(defaults.capacity),
            self.error_rate.unwrap_or(defaults.error_rate),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FilterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.error_rate, DEFAULT_ERROR_RATE);
    }

    #[test]
    fn test_config_rejects_zero_capacity() {
        let result = FilterConfig::new(0, 0.01);
        assert!(matches!(
            result,
            Err(FilterError::InvalidCapacity { capacity: 0 })
        ));
    }

    #[test]
    fn test_config_rejects_out_of_range_error_rate() {
        for error_rate in [0.0, 1.0, 1.5, -0.1, f64::NAN, f64::INFINITY] {
            let result = FilterConfig::new(100, error_rate);
            assert!(
                matches!(result, Err(FilterError::InvalidErrorRate { .. })),
                "error_rate {} should be rejected",
                error_rate
            );
        }
    }

    #[test]
    fn test_capacity_checked_before_error_rate() {
        let result = FilterConfig::new(0, 2.0);
        assert!(matches!(result, Err(FilterError::InvalidCapacity { .. })));
    }

    #[test]
    fn test_config_accepts_boundary_neighbours() {
        assert!(FilterConfig::new(1, f64::MIN_POSITIVE).is_ok());
        assert!(FilterConfig::new(1, 0.999_999).is_ok());
    }

    #[test]
    fn test_with_methods_do_not_validate() {
        let config = FilterConfig::default().with_capacity(0).with_error_rate(0.5);
        assert_eq!(config.capacity, 0);
        assert!(matches!(
            config.validate(),
            Err(FilterError::InvalidCapacity { .. })
        ));
    }

    #[test]
    fn test_builder_creates_valid_config() {
        let config = FilterConfigBuilder::new()
            .capacity(500)
            .error_rate(0.001)
            .build()
            .expect("Should create valid config");

        assert_eq!(config.capacity, 500);
        assert_eq!(config.error_rate, 0.001);
    }

    #[test]
    fn test_builder_uses_defaults() {
        let config = FilterConfigBuilder::new()
            .error_rate(0.05)
            .build()
            .expect("Should use default capacity");

        assert_eq!(config.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.error_rate, 0.05);
    }

    #[test]
    fn test_builder_rejects_invalid_error_rate() {
        let result = FilterConfigBuilder::new().error_rate(1.0).build();
        assert!(matches!(result, Err(FilterError::InvalidErrorRate { .. })));
    }
}
