//! # Bloom Engine
//!
//! Generic probabilistic set membership with a Bloom filter.
//!
//! Given a target capacity and an acceptable false positive probability, the
//! filter answers "definitely not present" or "possibly present" for any key,
//! and never gives a false negative.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): Pure filter logic, no I/O
//!   - `BloomFilter`: The engine (add, contains, contains_batch, FPR estimate),
//!     sized from a capacity and error rate or explicitly with `with_size`
//!   - `BitStore`: Packed, monotonic bit array
//!   - `FilterConfig` / `FilterConfigBuilder`: Validated construction input
//!   - `DerivedParameters`: Optimal bit count (m) and hash count (k)
//!   - `hash_functions`: xxHash64 digests and enhanced double hashing
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `KeySerializer`: Turns keys into bytes (closures qualify)
//!   - `BuiltinSerializer`: Fixed encodings for bytes, text, floats, integers
//!
//! ## Invariants
//!
//! - No false negatives: if `add(x)` succeeded, `contains(x)` returns true
//! - m = ceil(-n*ln(p) / ln(2)^2), k = ceil((m/n) * ln(2)), both at least 1
//! - FPR estimate = (1 - e^(-kn/m))^k, clamped to [0, 1]
//!
//! ## Concurrency
//!
//! The engine has no internal locking. Wrap it in a read-write lock when
//! several threads share one filter.
//!
//! ## Usage Example
//!
//! ```
//! use bloom_engine::BloomFilter;
//!
//! let mut filter = BloomFilter::<str>::new(1000, 0.01)?;
//! filter.add("apple")?;
//! filter.add("banana")?;
//!
//! assert!(filter.contains("apple")?);
//! assert_eq!(filter.contains_batch(["apple", "banana"])?, vec![true, true]);
//! assert_eq!(filter.len(), 2);
//! # Ok::<(), bloom_engine::FilterError>(())
//! ```
//!
//! Keys outside the built-in shapes bring their own serializer:
//!
//! ```
//! use bloom_engine::BloomFilter;
//!
//! let serializer = |pair: &(u32, u32)| -> Result<Vec<u8>, std::convert::Infallible> {
//!     Ok([pair.0.to_le_bytes(), pair.1.to_le_bytes()].concat())
//! };
//! let mut filter = BloomFilter::<(u32, u32), _>::with_serializer(100, 0.01, serializer)?;
//! filter.add(&(1, 2))?;
//! assert!(filter.contains(&(1, 2))?);
//! # Ok::<(), bloom_engine::FilterError>(())
//! ```

pub mod domain;
pub mod error;
pub mod ports;

// Re-exports for convenience
pub use domain::{BloomFilter, DerivedParameters, FilterConfig, FilterConfigBuilder};
pub use error::{BoxError, FilterError};
pub use ports::{BuiltinKey, BuiltinSerializer, KeyBytes, KeySerializer, SerializeError};
