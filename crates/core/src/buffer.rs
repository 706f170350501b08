//! Byte buffers and their script representations
//!
//! A [`ByteBuffer`] is an immutable, owned byte string. Scripts hand buffers
//! over as arrays of numbers or as hex strings, and can ask for them back as
//! arrays, hex strings, raw ASCII strings or a hexdump. Every conversion
//! produces a new value; the buffer itself never changes after construction.
//!
//! Buffers frequently carry key material, so their storage is zeroed when
//! they are dropped.

use std::fmt;
use std::ops::{Add, AddAssign};

use derive_more::Deref;
use tracing::trace;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result, ResultExt};
use crate::hexdump;
use crate::value::Value;

/// An owned, immutable byte string
#[derive(Clone, Default, PartialEq, Eq, Hash, Deref, Zeroize, ZeroizeOnDrop)]
#[deref(forward)]
pub struct ByteBuffer(Vec<u8>);

impl ByteBuffer {
    /// Create an empty buffer
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Build a buffer from a sequence of script numbers
    ///
    /// Each element is reduced modulo 256. The first element that is not a
    /// number fails the whole conversion with [`Error::InvalidElement`],
    /// citing its zero-based index.
    pub fn from_numbers(items: &[Value]) -> Result<Self> {
        let mut bytes = try_alloc(items.len())?;
        for (index, item) in items.iter().enumerate() {
            let n = item.as_integer().ok_or_else(|| Error::InvalidElement {
                index,
                value: item.to_string(),
            })?;
            bytes.push(n.rem_euclid(256) as u8);
        }
        Ok(Self(bytes))
    }

    /// Build a buffer from integers, each reduced modulo 256
    pub fn from_integers<I>(items: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        Self(items.into_iter().map(|n| n.rem_euclid(256) as u8).collect())
    }

    /// Parse a case-insensitive hex string, two digits per byte
    ///
    /// # Errors
    ///
    /// [`Error::OddLength`] for an odd number of characters, and
    /// [`Error::InvalidHexDigit`] naming the first bad character and its index.
    pub fn from_hex(hex: &str) -> Result<Self> {
        if hex.len() % 2 != 0 {
            return Err(Error::OddLength);
        }
        let mut bytes = try_alloc(hex.len() / 2)?;
        bytes.resize(hex.len() / 2, 0);
        hex::decode_to_slice(hex, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Take each character of `text` as one byte, truncating code points
    ///
    /// No printability check is made.
    pub fn from_ascii(text: &str) -> Result<Self> {
        let mut bytes = try_alloc(text.chars().count())?;
        bytes.extend(text.chars().map(|c| c as u32 as u8));
        Ok(Self(bytes))
    }

    /// Coerce a script value: sequences as numbers, strings as hex
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Sequence(items) => Self::from_numbers(items),
            Value::String(hex) => Self::from_hex(hex),
            _ => Err(Error::WrongInputShape),
        }
    }

    /// Borrow the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert to a script sequence of numbers (0-255)
    pub fn to_value(&self) -> Value {
        Value::Sequence(self.iter().map(|&b| Value::Integer(b.into())).collect())
    }

    /// Lower-case hex string, two digits per byte
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Each byte emitted verbatim as one character
    pub fn to_ascii(&self) -> String {
        self.iter().map(|&b| char::from(b)).collect()
    }

    /// Hexdump text, eight bytes per row, offsets starting at zero
    pub fn to_hexdump(&self) -> String {
        hexdump::dump(&self.0)
    }

    /// CRC-32 of the contents as a 4-byte big-endian buffer
    pub fn crc32(&self) -> Self {
        Self(crc32fast::hash(&self.0).to_be_bytes().to_vec())
    }

    /// Join buffers in order
    ///
    /// Returns `None` when no buffers are given, which is distinct from
    /// joining empty buffers.
    pub fn concat<'a, I>(parts: I) -> Result<Option<Self>>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let parts: Vec<&Self> = parts.into_iter().collect();
        if parts.is_empty() {
            return Ok(None);
        }

        let total = parts.iter().map(|p| p.len()).sum();
        let mut joined = try_alloc(total)?;
        for part in &parts {
            joined.extend_from_slice(part);
        }

        trace!(parts = parts.len(), len = total, "Concatenated buffers");
        Ok(Some(Self(joined)))
    }

    /// Join script values in order, coercing each one to a buffer
    ///
    /// A value that fails coercion aborts the whole join, reported with its
    /// one-based argument position. Buffers coerced so far are scrubbed and
    /// released before the error is returned.
    pub fn concat_values(values: &[Value]) -> Result<Option<Self>> {
        let buffers = values
            .iter()
            .enumerate()
            .map(|(i, v)| Self::from_value(v).argument(i + 1, "buffer"))
            .collect::<Result<Vec<_>>>()?;
        Self::concat(&buffers)
    }

    /// Take ownership of the bytes, leaving nothing behind to scrub
    pub fn into_vec(mut self) -> Vec<u8> {
        std::mem::take(&mut self.0)
    }
}

/// Reserve exactly `len` bytes, reporting failure instead of aborting
fn try_alloc(len: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    bytes.try_reserve_exact(len)?;
    Ok(bytes)
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for ByteBuffer {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for ByteBuffer {
    fn from(bytes: &[u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

impl TryFrom<&Value> for ByteBuffer {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self> {
        Self::from_value(value)
    }
}

impl From<&ByteBuffer> for Value {
    fn from(buffer: &ByteBuffer) -> Self {
        buffer.to_value()
    }
}

impl Add<&ByteBuffer> for &ByteBuffer {
    type Output = ByteBuffer;

    fn add(self, rhs: &ByteBuffer) -> ByteBuffer {
        let mut joined = Vec::with_capacity(self.len() + rhs.len());
        joined.extend_from_slice(self);
        joined.extend_from_slice(rhs);
        ByteBuffer(joined)
    }
}

impl Add for ByteBuffer {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        &self + &rhs
    }
}

impl AddAssign<&Self> for ByteBuffer {
    fn add_assign(&mut self, rhs: &Self) {
        // Grow into fresh storage so the old allocation can be scrubbed
        let joined = &*self + rhs;
        *self = joined;
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ByteBuffer {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ByteBuffer {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}
