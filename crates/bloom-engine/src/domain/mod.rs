//! Domain Layer - Pure filter logic
//!
//! This layer contains:
//! - Core Bloom filter engine
//! - Bit storage
//! - Hash functions and index derivation
//! - Parameter calculations
//! - Configuration
//!
//! RULES:
//! - No I/O operations
//! - No async code
//! - No internal locking

pub mod bit_store;
pub mod bloom_filter;
pub mod config;
pub mod hash_functions;
pub mod parameters;

pub use bit_store::BitStore;
pub use bloom_filter::BloomFilter;
pub use config::{FilterConfig, FilterConfigBuilder};
pub use parameters::{calculate_fpr, calculate_optimal_parameters, DerivedParameters};
