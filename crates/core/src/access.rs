//! File access rights, communication modes and key settings
//!
//! These are the small card parameters the command layer passes through to
//! the card. They are parsed from script values, packed into the bytes the
//! card expects and rendered for trace output; nothing here acts on them.

use std::fmt;
use std::str::FromStr;

use derive_more::Display;

use crate::error::{Error, Result};
use crate::value::Value;

/// Key reference in one access-rights nibble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "u8", into = "u8"))]
pub enum AccessKey {
    /// Access with the given key number (0-13)
    Key(u8),
    /// Free access
    Free,
    /// No access
    Denied,
}

impl AccessKey {
    /// Decode the low four bits of `nibble`
    pub const fn from_nibble(nibble: u8) -> Self {
        match nibble & 0x0f {
            0x0e => Self::Free,
            0x0f => Self::Denied,
            n => Self::Key(n),
        }
    }

    /// Encode as a four-bit value
    pub const fn to_nibble(self) -> u8 {
        match self {
            Self::Key(n) => n & 0x0f,
            Self::Free => 0x0e,
            Self::Denied => 0x0f,
        }
    }
}

impl fmt::Display for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_nibble() {
            0x0e => f.write_str("**"),
            0x0f => f.write_str("--"),
            n => write!(f, "{n:02}"),
        }
    }
}

impl From<u8> for AccessKey {
    fn from(nibble: u8) -> Self {
        Self::from_nibble(nibble)
    }
}

impl From<AccessKey> for u8 {
    fn from(key: AccessKey) -> Self {
        key.to_nibble()
    }
}

/// Access rights of a card file
///
/// Packed as `rd << 12 | wr << 8 | rw << 4 | ca`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessRights {
    /// Read access
    #[cfg_attr(feature = "serde", serde(rename = "rd"))]
    pub read: AccessKey,
    /// Write access
    #[cfg_attr(feature = "serde", serde(rename = "wr"))]
    pub write: AccessKey,
    /// Combined read and write access
    #[cfg_attr(feature = "serde", serde(rename = "rw"))]
    pub read_write: AccessKey,
    /// Access to change these rights
    #[cfg_attr(feature = "serde", serde(rename = "ca"))]
    pub change: AccessKey,
}

impl AccessRights {
    /// Unpack the 16-bit card representation
    pub const fn from_u16(acl: u16) -> Self {
        Self {
            read: AccessKey::from_nibble((acl >> 12) as u8),
            write: AccessKey::from_nibble((acl >> 8) as u8),
            read_write: AccessKey::from_nibble((acl >> 4) as u8),
            change: AccessKey::from_nibble(acl as u8),
        }
    }

    /// Pack into the 16-bit card representation
    pub const fn to_u16(self) -> u16 {
        (self.read.to_nibble() as u16) << 12
            | (self.write.to_nibble() as u16) << 8
            | (self.read_write.to_nibble() as u16) << 4
            | self.change.to_nibble() as u16
    }

    /// Parse a packed number or an `{rd, wr, rw, ca}` record
    pub fn from_value(value: &Value) -> Result<Self> {
        if let Some(acl) = value.as_integer() {
            return Ok(Self::from_u16(acl as u16));
        }

        let Value::Record(_) = value else {
            return Err(Error::TypeMismatch("number or table"));
        };

        let nibble = |field: &'static str, name: &'static str| {
            value
                .field(field)
                .and_then(Value::as_integer)
                .map(|n| AccessKey::from_nibble(n as u8))
                .ok_or(Error::InvalidAccessRights(name))
        };

        Ok(Self {
            read: nibble("rd", "read")?,
            write: nibble("wr", "write")?,
            read_write: nibble("rw", "read/write")?,
            change: nibble("ca", "change")?,
        })
    }

    /// Render as an `{rd, wr, rw, ca}` record of nibbles
    pub fn to_value(self) -> Value {
        Value::record([
            ("rd", Value::from(self.read.to_nibble())),
            ("wr", Value::from(self.write.to_nibble())),
            ("rw", Value::from(self.read_write.to_nibble())),
            ("ca", Value::from(self.change.to_nibble())),
        ])
    }
}

impl fmt::Display for AccessRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RD:{} WR:{} RW:{} CA:{}",
            self.read, self.write, self.read_write, self.change
        )
    }
}

impl From<u16> for AccessRights {
    fn from(acl: u16) -> Self {
        Self::from_u16(acl)
    }
}

impl From<AccessRights> for u16 {
    fn from(rights: AccessRights) -> Self {
        rights.to_u16()
    }
}

/// Communication mode for file data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum CommMode {
    /// Plain transfer
    #[display("PLAIN")]
    Plain,
    /// Plain transfer secured by a MAC
    #[display("MAC")]
    Mac,
    /// Fully enciphered transfer
    #[display("CRYPT")]
    #[cfg_attr(feature = "serde", serde(rename = "CRYPT"))]
    Enciphered,
}

impl CommMode {
    /// Decode the card byte
    ///
    /// `0x02` is the alternative encoding of plain transfer and decodes as
    /// [`CommMode::Plain`]; the mode is normalised, so [`CommMode::to_byte`]
    /// then yields `0x00`. Callers that must forward the script's byte
    /// unchanged keep the raw value alongside the decoded mode.
    pub fn from_byte(mode: u8) -> Result<Self> {
        match mode {
            0x00 | 0x02 => Ok(Self::Plain),
            0x01 => Ok(Self::Mac),
            0x03 => Ok(Self::Enciphered),
            other => Err(Error::UnknownCommMode(format!("0x{other:02x}"))),
        }
    }

    /// Card byte for this mode
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::Plain => 0x00,
            Self::Mac => 0x01,
            Self::Enciphered => 0x03,
        }
    }

    /// Parse a mode byte or a mode name
    pub fn from_value(value: &Value) -> Result<Self> {
        if let Some(mode) = value.as_integer() {
            return Self::from_byte(mode as u8);
        }
        match value {
            Value::String(name) => name.parse(),
            _ => Err(Error::TypeMismatch("number or string")),
        }
    }
}

impl FromStr for CommMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        [Self::Plain, Self::Mac, Self::Enciphered]
            .into_iter()
            .find(|mode| mode.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownCommMode(s.to_owned()))
    }
}

/// Key settings byte of an application or of the card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySettings(pub u8);

impl KeySettings {
    const CHANGE_KEY: [&'static str; 16] = [
        "AMK", "K01", "K02", "K03", "K04", "K05", "K06", "K07", "K08", "K09", "K10", "K11", "K12",
        "K13", "SLF", "---",
    ];

    /// Key allowed to change application keys (high nibble)
    pub const fn change_key(self) -> u8 {
        self.0 >> 4
    }

    /// Whether the settings themselves may still be changed
    pub const fn config_changeable(self) -> bool {
        self.0 & 0x08 != 0
    }

    /// Whether creating and deleting files needs no master key
    pub const fn free_create_delete(self) -> bool {
        self.0 & 0x04 != 0
    }

    /// Whether directory listing needs no master key
    pub const fn free_directory_list(self) -> bool {
        self.0 & 0x02 != 0
    }

    /// Whether the master key may be changed
    pub const fn master_key_changeable(self) -> bool {
        self.0 & 0x01 != 0
    }
}

impl fmt::Display for KeySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let free_create = self.free_create_delete();
        write!(
            f,
            "0x{:02x} = AKC:{} CONF:{} CA/F:{} DA/F:{} LIST:{} MKC:{}",
            self.0,
            Self::CHANGE_KEY[usize::from(self.change_key())],
            if self.config_changeable() { "M" } else { "-" },
            if free_create { "*" } else { "M" },
            if free_create { "M/*" } else { "M" },
            if self.free_directory_list() { "*" } else { "M" },
            if self.master_key_changeable() { "M" } else { "-" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_key_nibbles() {
        assert_eq!(AccessKey::from_nibble(0x0e), AccessKey::Free);
        assert_eq!(AccessKey::from_nibble(0x0f), AccessKey::Denied);
        assert_eq!(AccessKey::from_nibble(0x13), AccessKey::Key(3));
        assert_eq!(AccessKey::Key(13).to_string(), "13");
        assert_eq!(AccessKey::Key(0).to_string(), "00");
        assert_eq!(AccessKey::Free.to_string(), "**");
        assert_eq!(AccessKey::Denied.to_string(), "--");
    }

    #[test]
    fn test_rights_packing() {
        let rights = AccessRights::from_u16(0x01ef);
        assert_eq!(rights.read, AccessKey::Key(0));
        assert_eq!(rights.write, AccessKey::Key(1));
        assert_eq!(rights.read_write, AccessKey::Free);
        assert_eq!(rights.change, AccessKey::Denied);
        assert_eq!(rights.to_u16(), 0x01ef);
        assert_eq!(rights.to_string(), "RD:00 WR:01 RW:** CA:--");
    }

    #[test]
    fn test_rights_from_record() {
        let record = Value::record([
            ("rd", Value::Integer(0x0e)),
            ("wr", Value::Integer(0)),
            ("rw", Value::Integer(1)),
            ("ca", Value::Integer(0x0f)),
        ]);
        let rights = AccessRights::from_value(&record).unwrap();
        assert_eq!(rights.to_u16(), 0xe01f);
        assert_eq!(AccessRights::from_value(&rights.to_value()).unwrap(), rights);
        assert_eq!(
            AccessRights::from_value(&Value::Integer(0xe01f)).unwrap(),
            rights
        );
    }

    #[test]
    fn test_rights_errors() {
        let missing_rw = Value::record([
            ("rd", Value::Integer(0)),
            ("wr", Value::Integer(0)),
            ("ca", Value::Integer(0)),
        ]);
        assert_eq!(
            AccessRights::from_value(&missing_rw).unwrap_err().to_string(),
            "read/write access: number expected"
        );

        let bad_read = Value::record([("rd", Value::from("key"))]);
        assert_eq!(
            AccessRights::from_value(&bad_read).unwrap_err(),
            Error::InvalidAccessRights("read")
        );

        assert_eq!(
            AccessRights::from_value(&Value::from("rw")).unwrap_err().to_string(),
            "number or table expected"
        );
    }

    #[test]
    fn test_comm_mode_names() {
        assert_eq!("plain".parse::<CommMode>().unwrap(), CommMode::Plain);
        assert_eq!("Mac".parse::<CommMode>().unwrap(), CommMode::Mac);
        assert_eq!("CRYPT".parse::<CommMode>().unwrap(), CommMode::Enciphered);
        assert_eq!(
            "AES".parse::<CommMode>().unwrap_err().to_string(),
            "unknown communication mode 'AES'"
        );
    }

    #[test]
    fn test_comm_mode_bytes() {
        assert_eq!(CommMode::from_byte(0x02).unwrap(), CommMode::Plain);
        assert_eq!(CommMode::from_byte(0x03).unwrap(), CommMode::Enciphered);
        assert_eq!(CommMode::Mac.to_byte(), 0x01);
        assert!(CommMode::from_byte(0x04).is_err());

        assert_eq!(
            CommMode::from_value(&Value::Integer(1)).unwrap(),
            CommMode::Mac
        );
        assert_eq!(
            CommMode::from_value(&Value::from("crypt")).unwrap(),
            CommMode::Enciphered
        );
        assert_eq!(
            CommMode::from_value(&Value::Nil).unwrap_err(),
            Error::TypeMismatch("number or string")
        );
    }

    #[test]
    fn test_comm_mode_alternative_plain_is_normalised() {
        let mode = CommMode::from_byte(0x02).unwrap();
        assert_eq!(mode, CommMode::from_byte(0x00).unwrap());
        assert_eq!(mode.to_byte(), 0x00);
        assert_eq!(mode.to_string(), "PLAIN");

        for mode in [CommMode::Plain, CommMode::Mac, CommMode::Enciphered] {
            assert_eq!(CommMode::from_byte(mode.to_byte()).unwrap(), mode);
        }
    }

    #[test]
    fn test_key_settings_display() {
        assert_eq!(
            KeySettings(0x0f).to_string(),
            "0x0f = AKC:AMK CONF:M CA/F:* DA/F:M/* LIST:* MKC:M"
        );
        assert_eq!(
            KeySettings(0xe0).to_string(),
            "0xe0 = AKC:SLF CONF:- CA/F:M DA/F:M LIST:M MKC:-"
        );
        assert_eq!(KeySettings(0x1b).change_key(), 1);
        assert!(!KeySettings(0x1b).free_create_delete());
    }
}
