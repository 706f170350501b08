//! AES key diversification
//!
//! Derives a card specific key from a master key and the card UID,
//! optionally bound to an application, a key number and a system string.
//! The CMAC input is the magic byte `0x01` followed by the diversification
//! body twice:
//!
//! ```text
//! 01 || UID(7) [AID(3, big-endian)] [KNO(1)] [PAD] || UID(7) [AID] [KNO] [PAD]
//! ```
//!
//! Keys already written to cards depend on this exact layout.

use aes::Aes128;
use cmac::Cmac;
use tracing::{debug, instrument};
use zeroize::Zeroizing;

use crate::buffer::ByteBuffer;
use crate::error::{Error, Result, ResultExt};
use crate::key::{KeyMaterial, KeyType};
use crate::mac;
use crate::value::Value;

/// Required UID length in bytes
pub const UID_LEN: usize = 7;

/// Mask applied to application IDs
pub const AID_MASK: u32 = 0x00ff_ffff;

const MAGIC: u8 = 0x01;

/// Inputs of one key diversification
///
/// ```ignore
/// let card_key = Diversification::new(master, uid)
///     .aid(0x3042f5)
///     .key_number(1)
///     .derive()?;
/// ```
#[derive(Debug, Clone)]
pub struct Diversification {
    master: KeyMaterial,
    uid: ByteBuffer,
    aid: Option<u32>,
    key_number: Option<u8>,
    pad: Option<ByteBuffer>,
}

impl Diversification {
    /// Start a diversification of `master` for the card with `uid`
    pub const fn new(master: KeyMaterial, uid: ByteBuffer) -> Self {
        Self {
            master,
            uid,
            aid: None,
            key_number: None,
            pad: None,
        }
    }

    /// Bind the derived key to an application; only the low 24 bits are used
    #[must_use]
    pub fn aid(mut self, aid: u32) -> Self {
        self.aid = Some(aid & AID_MASK);
        self
    }

    /// Bind the derived key to a key number
    #[must_use]
    pub fn key_number(mut self, key_number: u8) -> Self {
        self.key_number = Some(key_number);
        self
    }

    /// Append a padding or system identifier to the body
    #[must_use]
    pub fn pad(mut self, pad: ByteBuffer) -> Self {
        self.pad = Some(pad);
        self
    }

    /// Compute the diversified key
    pub fn derive(&self) -> Result<KeyMaterial> {
        diversify(
            &self.master,
            &self.uid,
            self.aid,
            self.key_number,
            self.pad.as_ref(),
        )
    }
}

/// Derive a card key from `master`
///
/// The result has the master's algorithm and version.
///
/// # Errors
///
/// - [`Error::UnsupportedAlgorithm`] for anything but AES master keys
/// - [`Error::InvalidUidLength`] if `uid` is not 7 bytes long
/// - [`Error::Crypto`] if the CMAC computation fails
#[instrument(level = "debug", skip_all, fields(key_type = %master.key_type()))]
pub fn diversify(
    master: &KeyMaterial,
    uid: &ByteBuffer,
    aid: Option<u32>,
    key_number: Option<u8>,
    pad: Option<&ByteBuffer>,
) -> Result<KeyMaterial> {
    match master.key_type() {
        KeyType::Aes => diversify_aes(master, uid, aid, key_number, pad),
        key_type @ (KeyType::Des | KeyType::TripleDes | KeyType::ThreeKeyTripleDes) => {
            Err(Error::UnsupportedAlgorithm(key_type))
        }
    }
}

fn diversify_aes(
    master: &KeyMaterial,
    uid: &ByteBuffer,
    aid: Option<u32>,
    key_number: Option<u8>,
    pad: Option<&ByteBuffer>,
) -> Result<KeyMaterial> {
    if uid.len() != UID_LEN {
        return Err(Error::InvalidUidLength { actual: uid.len() });
    }

    let body_len = UID_LEN
        + aid.map_or(0, |_| 3)
        + key_number.map_or(0, |_| 1)
        + pad.map_or(0, |p| p.len());

    let mut message = Zeroizing::new(Vec::new());
    message.try_reserve_exact(1 + 2 * body_len)?;
    message.push(MAGIC);
    for _ in 0..2 {
        message.extend_from_slice(uid);
        if let Some(aid) = aid {
            message.extend_from_slice(&(aid & AID_MASK).to_be_bytes()[1..]);
        }
        if let Some(key_number) = key_number {
            message.push(key_number);
        }
        if let Some(pad) = pad {
            message.extend_from_slice(pad);
        }
    }

    debug!(
        body_len,
        has_aid = aid.is_some(),
        has_key_number = key_number.is_some(),
        pad_len = pad.map_or(0, |p| p.len()),
        "Diversifying AES key"
    );

    let derived = mac::compute::<Cmac<Aes128>>(master.as_bytes(), &message)?;
    Ok(KeyMaterial::new(KeyType::Aes, ByteBuffer::from(derived.as_slice()))?
        .with_version(master.version()))
}

/// Diversify from script arguments: key record, UID buffer, then the
/// optional AID, key number and padding
///
/// AID and key number take part only when they are numbers, the padding
/// whenever it is not nil. Failures name the argument they came from.
pub fn diversify_values(
    key: &Value,
    uid: &Value,
    aid: &Value,
    key_number: &Value,
    pad: &Value,
) -> Result<Value> {
    let master = KeyMaterial::from_value(key).argument(1, "key")?;
    if master.key_type() != KeyType::Aes {
        return Err(Error::UnsupportedAlgorithm(master.key_type()).with_argument(1, "key"));
    }

    let uid = ByteBuffer::from_value(uid).argument(2, "uid")?;
    if uid.len() != UID_LEN {
        return Err(Error::InvalidUidLength { actual: uid.len() }.with_argument(2, "uid"));
    }

    let aid = aid.as_integer().map(|n| n as u32 & AID_MASK);
    let key_number = key_number.as_integer().map(|n| n as u8);
    let pad = match pad {
        Value::Nil => None,
        other => Some(ByteBuffer::from_value(other).argument(5, "pad")?),
    };

    let derived = diversify(&master, &uid, aid, key_number, pad.as_ref())
        .context("Key generation error")?;
    Ok(derived.to_value())
}
