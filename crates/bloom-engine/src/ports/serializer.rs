//! Key serialization port (driven port)
//!
//! The filter never looks at keys directly. A [`KeySerializer`] supplied by
//! the caller turns each key into bytes, and only those bytes are hashed.
//! Serializers must be deterministic: the same key must always produce the
//! same bytes, otherwise `contains` cannot find bits set by an earlier `add`.
//!
//! Any closure `Fn(&K) -> Result<Vec<u8>, E>` is a serializer. For the
//! closed set of built-in key shapes, [`BuiltinSerializer`] applies these
//! fixed encodings:
//!
//! | key shape | encoding |
//! |---|---|
//! | raw bytes (`[u8]`, `[u8; N]`, `Vec<u8>`) | unchanged |
//! | text (`str`, `String`) | UTF-8 |
//! | floating point (`f32`, `f64`) | 8-byte IEEE-754 `f64`, big-endian |
//! | integers (`i8`..`i128`, `u8`..`u128`, `isize`, `usize`) | 8-byte two's complement, little-endian |
//!
//! Integers outside the `i64` range fail to serialize. Type-erased keys
//! (`dyn Any`) are matched against the owned versions of these shapes at
//! runtime and rejected with [`SerializeError::Unsupported`] otherwise.

use std::any::Any;
use std::fmt;
use std::ops::Deref;

use thiserror::Error;

use crate::error::BoxError;

/// Serialized form of a key
///
/// Borrows from the key when the encoding is the key itself, and keeps
/// fixed-width encodings inline so the query path does not allocate.
#[derive(Clone, PartialEq, Eq)]
pub enum KeyBytes<'a> {
    /// Bytes borrowed from the key
    Borrowed(&'a [u8]),
    /// An 8-byte scalar encoding
    Word([u8; 8]),
    /// Bytes produced by a custom serializer
    Owned(Vec<u8>),
}

impl Deref for KeyBytes<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match *self {
            KeyBytes::Borrowed(bytes) => bytes,
            KeyBytes::Word(ref word) => word.as_slice(),
            KeyBytes::Owned(ref bytes) => bytes.as_slice(),
        }
    }
}

impl AsRef<[u8]> for KeyBytes<'_> {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl fmt::Debug for KeyBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeyBytes").field(&&**self).finish()
    }
}

/// Failure reported by a serializer
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("no built-in encoding for key type {type_name}")]
    Unsupported { type_name: String },

    #[error(transparent)]
    Failed(BoxError),
}

impl SerializeError {
    /// Wrap an arbitrary failure cause
    pub fn failed(cause: impl Into<BoxError>) -> Self {
        SerializeError::Failed(cause.into())
    }
}

/// Converts keys of type `K` into bytes for hashing
pub trait KeySerializer<K: ?Sized> {
    /// Serialize `key`; must be deterministic and free of side effects
    fn serialize<'a>(&self, key: &'a K) -> Result<KeyBytes<'a>, SerializeError>;
}

impl<K, F, E> KeySerializer<K> for F
where
    K: ?Sized,
    F: Fn(&K) -> Result<Vec<u8>, E>,
    E: Into<BoxError>,
{
    fn serialize<'a>(&self, key: &'a K) -> Result<KeyBytes<'a>, SerializeError> {
        self(key).map(KeyBytes::Owned).map_err(SerializeError::failed)
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Key shapes with a fixed built-in encoding
///
/// Sealed: the set is closed. Other key types need a custom serializer.
pub trait BuiltinKey: sealed::Sealed {
    /// Encode the key with its built-in rule
    fn key_bytes(&self) -> Result<KeyBytes<'_>, SerializeError>;
}

/// Serializer applying the built-in encodings of [`BuiltinKey`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuiltinSerializer;

impl<K: BuiltinKey + ?Sized> KeySerializer<K> for BuiltinSerializer {
    #[inline]
    fn serialize<'a>(&self, key: &'a K) -> Result<KeyBytes<'a>, SerializeError> {
        key.key_bytes()
    }
}

impl<T: BuiltinKey + ?Sized> sealed::Sealed for &T {}

impl<T: BuiltinKey + ?Sized> BuiltinKey for &T {
    fn key_bytes(&self) -> Result<KeyBytes<'_>, SerializeError> {
        (**self).key_bytes()
    }
}

impl sealed::Sealed for [u8] {}

impl BuiltinKey for [u8] {
    fn key_bytes(&self) -> Result<KeyBytes<'_>, SerializeError> {
        Ok(KeyBytes::Borrowed(self))
    }
}

impl<const N: usize> sealed::Sealed for [u8; N] {}

impl<const N: usize> BuiltinKey for [u8; N] {
    fn key_bytes(&self) -> Result<KeyBytes<'_>, SerializeError> {
        Ok(KeyBytes::Borrowed(self))
    }
}

impl sealed::Sealed for Vec<u8> {}

impl BuiltinKey for Vec<u8> {
    fn key_bytes(&self) -> Result<KeyBytes<'_>, SerializeError> {
        Ok(KeyBytes::Borrowed(self))
    }
}

impl sealed::Sealed for str {}

impl BuiltinKey for str {
    fn key_bytes(&self) -> Result<KeyBytes<'_>, SerializeError> {
        Ok(KeyBytes::Borrowed(self.as_bytes()))
    }
}

impl sealed::Sealed for String {}

impl BuiltinKey for String {
    fn key_bytes(&self) -> Result<KeyBytes<'_>, SerializeError> {
        Ok(KeyBytes::Borrowed(self.as_bytes()))
    }
}

impl sealed::Sealed for f64 {}

impl BuiltinKey for f64 {
    fn key_bytes(&self) -> Result<KeyBytes<'_>, SerializeError> {
        Ok(KeyBytes::Word(self.to_be_bytes()))
    }
}

impl sealed::Sealed for f32 {}

impl BuiltinKey for f32 {
    fn key_bytes(&self) -> Result<KeyBytes<'_>, SerializeError> {
        Ok(KeyBytes::Word(f64::from(*self).to_be_bytes()))
    }
}

macro_rules! lossless_integer_keys {
    ($($ty:ty),*) => {
        $(
            impl sealed::Sealed for $ty {}

            impl BuiltinKey for $ty {
                fn key_bytes(&self) -> Result<KeyBytes<'_>, SerializeError> {
                    Ok(KeyBytes::Word(i64::from(*self).to_le_bytes()))
                }
            }
        )*
    };
}

macro_rules! checked_integer_keys {
    ($($ty:ty),*) => {
        $(
            impl sealed::Sealed for $ty {}

            impl BuiltinKey for $ty {
                fn key_bytes(&self) -> Result<KeyBytes<'_>, SerializeError> {
                    let value = i64::try_from(*self).map_err(|_| {
                        SerializeError::failed(format!(
                            "integer {} does not fit in an 8-byte two's-complement encoding",
                            self
                        ))
                    })?;
                    Ok(KeyBytes::Word(value.to_le_bytes()))
                }
            }
        )*
    };
}

lossless_integer_keys!(i8, i16, i32, i64, u8, u16, u32);
checked_integer_keys!(isize, i128, usize, u64, u128);

impl sealed::Sealed for dyn Any {}

macro_rules! downcast_key {
    ($key:expr, $($ty:ty),*) => {
        $(
            if let Some(value) = $key.downcast_ref::<$ty>() {
                return value.key_bytes();
            }
        )*
    };
}

impl BuiltinKey for dyn Any {
    fn key_bytes(&self) -> Result<KeyBytes<'_>, SerializeError> {
        downcast_key!(self, Vec<u8>, &'static [u8], String, &'static str, f64, f32);
        downcast_key!(self, i8, i16, i32, i64, i128, isize);
        downcast_key!(self, u8, u16, u32, u64, u128, usize);

        // Only the TypeId survives type erasure
        Err(SerializeError::Unsupported {
            type_name: format!("dyn Any ({:?})", Any::type_id(self)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode<K: BuiltinKey + ?Sized>(key: &K) -> Vec<u8> {
        BuiltinSerializer
            .serialize(key)
            .expect("built-in key should encode")
            .to_vec()
    }

    #[test]
    fn test_bytes_are_unchanged() {
        assert_eq!(encode(b"raw\x00bytes".as_slice()), b"raw\x00bytes");
        assert_eq!(encode(&[1u8, 2, 3]), vec![1, 2, 3]);
        assert_eq!(encode(&vec![9u8, 8]), vec![9, 8]);
        assert!(matches!(
            BuiltinSerializer.serialize(b"abc".as_slice()),
            Ok(KeyBytes::Borrowed(_))
        ));
    }

    #[test]
    fn test_text_is_utf8() {
        assert_eq!(encode("héllo"), "héllo".as_bytes());
        assert_eq!(encode(&String::from("héllo")), "héllo".as_bytes());
        assert_eq!(encode(&"via reference"), b"via reference");
    }

    #[test]
    fn test_floats_are_big_endian_f64() {
        assert_eq!(encode(&1.5f64), vec![0x3F, 0xF8, 0, 0, 0, 0, 0, 0]);
        assert_eq!(encode(&1.5f32), encode(&1.5f64));
        assert_eq!(encode(&-0.0f64), vec![0x80, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_integers_are_little_endian_twos_complement() {
        assert_eq!(encode(&1i64), vec![1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(encode(&-1i32), vec![0xFF; 8]);
        assert_eq!(encode(&258u16), vec![2, 1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(encode(&42u8), encode(&42i64));
        assert_eq!(encode(&42usize), encode(&42i64));
        assert_eq!(encode(&-7i128), encode(&-7i64));
    }

    #[test]
    fn test_out_of_range_integers_fail() {
        for result in [
            BuiltinSerializer.serialize(&u64::MAX),
            BuiltinSerializer.serialize(&(i64::MAX as u128 + 1)),
            BuiltinSerializer.serialize(&i128::MIN),
        ] {
            assert!(matches!(result, Err(SerializeError::Failed(_))));
        }

        assert_eq!(encode(&(i64::MAX as u64)), i64::MAX.to_le_bytes());
    }

    #[test]
    fn test_encoding_is_deterministic() {
        assert_eq!(encode("same"), encode("same"));
        assert_eq!(encode(&3.25f64), encode(&3.25f64));
        assert_eq!(encode(&-99i64), encode(&-99i64));
    }

    #[test]
    fn test_dyn_any_uses_builtin_rules() {
        let keys: Vec<Box<dyn Any>> = vec![
            Box::new(String::from("text")),
            Box::new("static text"),
            Box::new(vec![1u8, 2]),
            Box::new(2.5f64),
            Box::new(-3i32),
            Box::new(7u64),
        ];
        let expected = [
            b"text".to_vec(),
            b"static text".to_vec(),
            vec![1, 2],
            encode(&2.5f64),
            encode(&-3i64),
            encode(&7i64),
        ];

        for (key, expected) in keys.iter().zip(expected) {
            assert_eq!(encode(&**key), expected);
        }
    }

    #[test]
    fn test_dyn_any_rejects_other_shapes() {
        let key: Box<dyn Any> = Box::new(true);
        let result = BuiltinSerializer.serialize(&*key);
        let expected = format!("dyn Any ({:?})", std::any::TypeId::of::<bool>());
        assert!(matches!(
            result,
            Err(SerializeError::Unsupported { ref type_name }) if *type_name == expected
        ));

        let key: Box<dyn Any> = Box::new((1u8, 2u8));
        assert!(BuiltinSerializer.serialize(&*key).is_err());
    }

    #[test]
    fn test_closure_serializer() {
        let serializer = |key: &(u32, u32)| -> Result<Vec<u8>, std::convert::Infallible> {
            let mut bytes = key.0.to_be_bytes().to_vec();
            bytes.extend_from_slice(&key.1.to_be_bytes());
            Ok(bytes)
        };

        let bytes = serializer.serialize(&(1u32, 2u32)).expect("infallible");
        assert_eq!(&*bytes, &[0, 0, 0, 1, 0, 0, 0, 2]);
    }

    #[test]
    fn test_closure_failure_is_wrapped() {
        let serializer = |_: &str| -> Result<Vec<u8>, String> { Err("boom".to_string()) };

        let err = serializer.serialize("key").expect_err("should fail");
        assert!(matches!(err, SerializeError::Failed(_)));
        assert_eq!(err.to_string(), "boom");
    }
}
