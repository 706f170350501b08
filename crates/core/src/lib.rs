//! Core data types for the DESFire shell
//!
//! This crate holds the card-independent half of the shell: byte buffers,
//! typed keys, MAC computation and key diversification. The scripting layer
//! builds these values from user input and hands raw bytes and key types to
//! the card-protocol library; no I/O happens here.
//!
//! ## Overview
//!
//! - [`ByteBuffer`]: owned byte strings with array, hex, ASCII and hexdump
//!   representations, plus ordered concatenation
//! - [`KeyMaterial`]: DES, 3DES, 3K3DES and AES keys with a version byte
//! - [`mac`]: CMAC and HMAC over named ciphers and digests
//! - [`diversify`]: AES key diversification from a card UID
//! - [`access`]: access rights, communication modes and key settings
//!
//! Everything that may hold secret material zeroes its storage on drop.
//!
//! ```ignore
//! use desfsh_core::prelude::*;
//!
//! let master = KeyMaterial::new(KeyType::Aes, ByteBuffer::from_hex("00112233445566778899aabbccddeeff")?)?;
//! let card_key = Diversification::new(master, ByteBuffer::from_hex("04782e21801d80")?)
//!     .aid(0x3042f5)
//!     .key_number(1)
//!     .derive()?;
//! println!("{}", card_key.describe());
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

pub mod access;
pub mod buffer;
pub mod diversify;
pub mod hexdump;
pub mod key;
pub mod mac;
pub mod value;

// Core error types
mod error;
pub use error::{Error, Result, ResultExt};

// Re-exports for common types
pub use access::{AccessKey, AccessRights, CommMode, KeySettings};
pub use buffer::ByteBuffer;
pub use diversify::{Diversification, diversify, diversify_values};
pub use key::{KeyMaterial, KeyType};
pub use mac::{CmacCipher, HmacDigest, cmac, hmac};
pub use value::Value;

/// Prelude module containing commonly used traits and types
pub mod prelude {
    pub use crate::{
        AccessRights, ByteBuffer, CommMode, Diversification, Error, KeyMaterial, KeyType, Result,
        ResultExt, Value,
        hexdump::{Direction, trace_buffer},
        mac::{cmac, hmac},
    };
}
