//! CMAC and HMAC computation over byte buffers
//!
//! Both MACs are selected by an identifier string, the same names the shell
//! has always accepted (`"aes-128-cbc"`, `"sha256"`, ...). Names are looked up
//! case-insensitively in a fixed catalog of block ciphers and digests.
//!
//! Key schedules and MAC states scrub themselves on drop, and the raw MAC is
//! held in zeroing storage until it is copied into the returned buffer.

use aes::{Aes128, Aes192, Aes256};
use cipher::{BlockSizeUser, KeySizeUser};
use cmac::Cmac;
use derive_more::Display;
use des::{Des, TdesEde2, TdesEde3};
use digest::{KeyInit, Mac};
use hmac::Hmac;
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512, Sha512_224, Sha512_256};
use tracing::{debug, instrument};
use zeroize::{Zeroize, Zeroizing};

use crate::buffer::ByteBuffer;
use crate::error::{Error, Result};

/// Block ciphers usable for CMAC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum CmacCipher {
    /// AES with a 128-bit key
    #[display("aes-128-cbc")]
    Aes128,
    /// AES with a 192-bit key
    #[display("aes-192-cbc")]
    Aes192,
    /// AES with a 256-bit key
    #[display("aes-256-cbc")]
    Aes256,
    /// Single DES
    #[display("des-cbc")]
    Des,
    /// Two-key triple DES
    #[display("des-ede-cbc")]
    TdesEde2,
    /// Three-key triple DES
    #[display("des-ede3-cbc")]
    TdesEde3,
}

impl CmacCipher {
    const CATALOG: &'static [(&'static str, Self)] = &[
        ("aes-128-cbc", Self::Aes128),
        ("aes128", Self::Aes128),
        ("aes-192-cbc", Self::Aes192),
        ("aes192", Self::Aes192),
        ("aes-256-cbc", Self::Aes256),
        ("aes256", Self::Aes256),
        ("des-cbc", Self::Des),
        ("des", Self::Des),
        ("des-ede-cbc", Self::TdesEde2),
        ("des-ede3-cbc", Self::TdesEde3),
        ("des3", Self::TdesEde3),
    ];

    /// Resolve a cipher identifier
    pub fn from_name(name: &str) -> Result<Self> {
        lookup(Self::CATALOG, name).ok_or_else(|| Error::UnknownCipher(name.to_owned()))
    }

    /// Native key length in bytes
    pub fn key_len(self) -> usize {
        match self {
            Self::Aes128 => Aes128::key_size(),
            Self::Aes192 => Aes192::key_size(),
            Self::Aes256 => Aes256::key_size(),
            Self::Des => Des::key_size(),
            Self::TdesEde2 => TdesEde2::key_size(),
            Self::TdesEde3 => TdesEde3::key_size(),
        }
    }

    /// Block size in bytes, which is also the MAC length
    pub fn block_size(self) -> usize {
        match self {
            Self::Aes128 => Aes128::block_size(),
            Self::Aes192 => Aes192::block_size(),
            Self::Aes256 => Aes256::block_size(),
            Self::Des => Des::block_size(),
            Self::TdesEde2 => TdesEde2::block_size(),
            Self::TdesEde3 => TdesEde3::block_size(),
        }
    }

    fn compute(self, key: &[u8], input: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        match self {
            Self::Aes128 => compute::<Cmac<Aes128>>(key, input),
            Self::Aes192 => compute::<Cmac<Aes192>>(key, input),
            Self::Aes256 => compute::<Cmac<Aes256>>(key, input),
            Self::Des => compute::<Cmac<Des>>(key, input),
            Self::TdesEde2 => compute::<Cmac<TdesEde2>>(key, input),
            Self::TdesEde3 => compute::<Cmac<TdesEde3>>(key, input),
        }
    }
}

/// Message digests usable for HMAC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum HmacDigest {
    /// MD5
    #[display("md5")]
    Md5,
    /// SHA-1
    #[display("sha1")]
    Sha1,
    /// SHA-224
    #[display("sha224")]
    Sha224,
    /// SHA-256
    #[display("sha256")]
    Sha256,
    /// SHA-384
    #[display("sha384")]
    Sha384,
    /// SHA-512
    #[display("sha512")]
    Sha512,
    /// SHA-512/224
    #[display("sha512-224")]
    Sha512_224,
    /// SHA-512/256
    #[display("sha512-256")]
    Sha512_256,
}

impl HmacDigest {
    const CATALOG: &'static [(&'static str, Self)] = &[
        ("md5", Self::Md5),
        ("sha1", Self::Sha1),
        ("sha-1", Self::Sha1),
        ("sha224", Self::Sha224),
        ("sha-224", Self::Sha224),
        ("sha2-224", Self::Sha224),
        ("sha256", Self::Sha256),
        ("sha-256", Self::Sha256),
        ("sha2-256", Self::Sha256),
        ("sha384", Self::Sha384),
        ("sha-384", Self::Sha384),
        ("sha2-384", Self::Sha384),
        ("sha512", Self::Sha512),
        ("sha-512", Self::Sha512),
        ("sha2-512", Self::Sha512),
        ("sha512-224", Self::Sha512_224),
        ("sha2-512/224", Self::Sha512_224),
        ("sha512-256", Self::Sha512_256),
        ("sha2-512/256", Self::Sha512_256),
    ];

    /// Resolve a digest identifier
    pub fn from_name(name: &str) -> Result<Self> {
        lookup(Self::CATALOG, name).ok_or_else(|| Error::UnknownDigest(name.to_owned()))
    }

    /// Digest length in bytes, which is also the MAC length
    pub const fn output_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha224 | Self::Sha512_224 => 28,
            Self::Sha256 | Self::Sha512_256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    fn compute(self, key: &[u8], input: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        match self {
            Self::Md5 => compute::<Hmac<Md5>>(key, input),
            Self::Sha1 => compute::<Hmac<Sha1>>(key, input),
            Self::Sha224 => compute::<Hmac<Sha224>>(key, input),
            Self::Sha256 => compute::<Hmac<Sha256>>(key, input),
            Self::Sha384 => compute::<Hmac<Sha384>>(key, input),
            Self::Sha512 => compute::<Hmac<Sha512>>(key, input),
            Self::Sha512_224 => compute::<Hmac<Sha512_224>>(key, input),
            Self::Sha512_256 => compute::<Hmac<Sha512_256>>(key, input),
        }
    }
}

fn lookup<T: Copy>(catalog: &[(&str, T)], name: &str) -> Option<T> {
    catalog
        .iter()
        .find(|(id, _)| id.eq_ignore_ascii_case(name))
        .map(|&(_, entry)| entry)
}

/// Run one MAC over `input`, keeping the raw tag in zeroing storage
pub(crate) fn compute<M>(key: &[u8], input: &[u8]) -> Result<Zeroizing<Vec<u8>>>
where
    M: Mac + KeyInit,
{
    let mut mac = <M as KeyInit>::new_from_slice(key).map_err(|e| Error::crypto([e]))?;
    Mac::update(&mut mac, input);
    let mut tag = mac.finalize().into_bytes();
    let out = Zeroizing::new(tag.to_vec());
    tag.as_mut_slice().zeroize();
    Ok(out)
}

/// Copy a raw tag into a new buffer; the working copy is scrubbed on return
fn into_buffer(tag: Zeroizing<Vec<u8>>) -> ByteBuffer {
    ByteBuffer::from(tag.as_slice())
}

/// Compute the CMAC of `input` with the block cipher named by `cipher`
///
/// # Errors
///
/// - [`Error::UnknownCipher`] if `cipher` is not in the catalog
/// - [`Error::KeyLengthMismatch`] if `key` is not the cipher's key length
/// - [`Error::Crypto`] if the primitive rejects the key
#[instrument(level = "debug", skip(input, key), fields(input_len = input.len()))]
pub fn cmac(cipher: &str, input: &ByteBuffer, key: &ByteBuffer) -> Result<ByteBuffer> {
    cmac_with(CmacCipher::from_name(cipher)?, input, key)
}

/// Compute the CMAC of `input` with an already resolved cipher
pub fn cmac_with(cipher: CmacCipher, input: &ByteBuffer, key: &ByteBuffer) -> Result<ByteBuffer> {
    let expected = cipher.key_len();
    if key.len() != expected {
        debug!(%cipher, expected, actual = key.len(), "CMAC key length mismatch");
        return Err(Error::KeyLengthMismatch {
            expected,
            actual: key.len(),
        });
    }

    cipher.compute(key, input).map(into_buffer)
}

/// Compute the HMAC of `input` with the digest named by `digest`
///
/// Keys of any length are accepted.
///
/// # Errors
///
/// - [`Error::UnknownDigest`] if `digest` is not in the catalog
/// - [`Error::Crypto`] if the primitive rejects the key
#[instrument(level = "debug", skip(input, key), fields(input_len = input.len()))]
pub fn hmac(digest: &str, input: &ByteBuffer, key: &ByteBuffer) -> Result<ByteBuffer> {
    hmac_with(HmacDigest::from_name(digest)?, input, key)
}

/// Compute the HMAC of `input` with an already resolved digest
pub fn hmac_with(digest: HmacDigest, input: &ByteBuffer, key: &ByteBuffer) -> Result<ByteBuffer> {
    digest.compute(key, input).map(into_buffer)
}
