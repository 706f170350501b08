//! Typed DESFire keys
//!
//! A [`KeyMaterial`] pairs the raw key bytes with the algorithm they belong
//! to and the key version byte. The length of the bytes is checked against
//! the algorithm when the key is built, so a key value is always usable by
//! the card-protocol layer as-is.

use std::fmt;
use std::str::FromStr;

use derive_more::Display;
use tracing::trace;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::buffer::ByteBuffer;
use crate::error::{Error, Result, ResultExt};
use crate::value::Value;

/// Key algorithms supported by DESFire cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyType {
    /// Single DES, 8 bytes
    #[display("DES")]
    #[cfg_attr(feature = "serde", serde(rename = "DES"))]
    Des,
    /// Two-key triple DES, 16 bytes
    #[display("3DES")]
    #[cfg_attr(feature = "serde", serde(rename = "3DES"))]
    TripleDes,
    /// Three-key triple DES, 24 bytes
    #[display("3K3DES")]
    #[cfg_attr(feature = "serde", serde(rename = "3K3DES"))]
    ThreeKeyTripleDes,
    /// AES-128, 16 bytes
    #[display("AES")]
    #[cfg_attr(feature = "serde", serde(rename = "AES"))]
    Aes,
}

impl KeyType {
    /// All key types, in card order
    pub const ALL: [Self; 4] = [Self::Des, Self::TripleDes, Self::ThreeKeyTripleDes, Self::Aes];

    /// Key length in bytes mandated by the algorithm
    pub const fn key_len(self) -> usize {
        match self {
            Self::Des => 8,
            Self::TripleDes => 16,
            Self::ThreeKeyTripleDes => 24,
            Self::Aes => 16,
        }
    }

    /// Canonical upper-case name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Des => "DES",
            Self::TripleDes => "3DES",
            Self::ThreeKeyTripleDes => "3K3DES",
            Self::Aes => "AES",
        }
    }
}

impl FromStr for KeyType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownKeyType(s.to_owned()))
    }
}

/// A secret key tagged with its algorithm and version
///
/// The key bytes are zeroed when the value is dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    #[zeroize(skip)]
    key_type: KeyType,
    bytes: ByteBuffer,
    version: u8,
}

impl KeyMaterial {
    /// Create a key with version 0
    ///
    /// # Errors
    ///
    /// [`Error::KeyLengthMismatch`] if `bytes` is not exactly
    /// [`KeyType::key_len`] bytes long.
    pub fn new(key_type: KeyType, bytes: ByteBuffer) -> Result<Self> {
        let expected = key_type.key_len();
        if bytes.len() != expected {
            return Err(Error::KeyLengthMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        trace!(key_type = %key_type, "Created key");
        Ok(Self {
            key_type,
            bytes,
            version: 0,
        })
    }

    /// Replace the version byte
    #[must_use]
    pub fn with_version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// Read a `{t, k, v}` key record from a script value
    ///
    /// `t` names the algorithm (case-insensitive), `k` is a buffer literal
    /// and the optional `v` is the version, truncated to a byte.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Record(_) = value else {
            return Err(Error::TypeMismatch("table").with_context("key must be a record"));
        };

        let key_type = value
            .field("t")
            .ok_or(Error::MissingField("t"))
            .and_then(|t| t.as_str().ok_or(Error::TypeMismatch("string")))
            .and_then(str::parse::<KeyType>)
            .context("key type invalid")?;

        let version = match value.field("v") {
            None | Some(Value::Nil) => 0,
            Some(v) => v.as_integer().ok_or(Error::InvalidKeyVersion)? as u8,
        };

        let bytes = value
            .field("k")
            .ok_or(Error::MissingField("k"))
            .and_then(ByteBuffer::from_value)
            .context("key string invalid")?;

        Ok(Self::new(key_type, bytes)?.with_version(version))
    }

    /// Render the key as a `{t, k, v}` script record
    pub fn to_value(&self) -> Value {
        Value::record([
            ("t", Value::from(self.key_type.name())),
            ("k", self.bytes.to_value()),
            ("v", Value::from(self.version)),
        ])
    }

    /// Key algorithm
    pub const fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Raw key bytes, for building a card-protocol key handle
    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_bytes()
    }

    /// Key bytes as a buffer
    pub const fn buffer(&self) -> &ByteBuffer {
        &self.bytes
    }

    /// Key version byte
    pub const fn version(&self) -> u8 {
        self.version
    }

    /// Diagnostic rendering, e.g. `AES:00112233445566778899aabbccddeeff (V:001)`
    ///
    /// This prints the secret and is meant for interactive inspection only.
    pub fn describe(&self) -> String {
        format!(
            "{}:{} (V:{:03})",
            self.key_type,
            self.bytes.to_hex(),
            self.version
        )
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key_type", &self.key_type)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl TryFrom<&Value> for KeyMaterial {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self> {
        Self::from_value(value)
    }
}
