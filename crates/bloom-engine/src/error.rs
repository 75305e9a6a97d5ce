//! Error types for the Bloom filter engine

use thiserror::Error;

use crate::ports::SerializeError;

/// Boxed cause carried by serialization failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur when building or using a Bloom filter
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid capacity: {capacity} (must be greater than 0)")]
    InvalidCapacity { capacity: usize },

    #[error("Invalid error rate: {error_rate} (must be between 0 and 1, exclusive)")]
    InvalidErrorRate { error_rate: f64 },

    #[error("Invalid bit count: {bit_count} (must be greater than 0)")]
    InvalidBitCount { bit_count: usize },

    #[error("Invalid hash count: {hash_count} (must be greater than 0)")]
    InvalidHashCount { hash_count: usize },

    #[error("Filter size exceeds maximum: {bits} bits > {max}")]
    FilterTooLarge { bits: f64, max: usize },

    #[error("Failed to allocate memory for bit array of {bits} bits")]
    AllocationFailed { bits: usize },

    #[error("Unsupported key type: {type_name} (provide a custom serializer)")]
    UnsupportedKeyType { type_name: String },

    #[error("Serialization error: {source}")]
    Serialization {
        #[source]
        source: BoxError,
    },
}

impl FilterError {
    /// Wrap an arbitrary serializer failure
    pub fn serialization(source: impl Into<BoxError>) -> Self {
        Self::Serialization {
            source: source.into(),
        }
    }
}

impl From<SerializeError> for FilterError {
    fn from(err: SerializeError) -> Self {
        match err {
            SerializeError::Unsupported { type_name } => {
                FilterError::UnsupportedKeyType { type_name }
            }
            SerializeError::Failed(source) => FilterError::Serialization { source },
        }
    }
}
