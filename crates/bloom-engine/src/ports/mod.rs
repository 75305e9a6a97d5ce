//! Ports Layer
//!
//! Defines the seams where callers plug into the engine:
//! - Key serialization (driven port) - turns domain keys into bytes

pub mod serializer;

pub use serializer::{BuiltinKey, BuiltinSerializer, KeyBytes, KeySerializer, SerializeError};
