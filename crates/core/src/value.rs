//! Script values handed over by the command layer
//!
//! The scripting engine passes loosely typed arguments: numbers, strings,
//! arrays and records. [`Value`] is the owned form of those arguments, and the
//! `from_value` constructors across this crate coerce it into typed data the
//! same way the shell always has.

use std::collections::BTreeMap;
use std::fmt;

/// A loosely typed script value
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    /// Absent value
    #[default]
    Nil,
    /// Integer number
    Integer(i64),
    /// Floating point number
    Number(f64),
    /// Text or raw byte string
    String(String),
    /// Ordered sequence, indexed from 1 on the script side
    Sequence(Vec<Self>),
    /// Record with named fields
    Record(BTreeMap<String, Self>),
}

impl Value {
    /// Build a record from `(field, value)` pairs
    pub fn record<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Self)>,
    {
        Self::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Whether this is [`Value::Nil`]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Whether this value coerces to a number
    pub fn is_number(&self) -> bool {
        self.as_integer().is_some()
    }

    /// Coerce to an integer the way the script engine does
    ///
    /// Floats are truncated toward zero and strings holding a decimal or
    /// `0x`-prefixed hexadecimal number are parsed.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Number(f) => float_to_integer(*f),
            Self::String(s) => parse_number(s),
            _ => None,
        }
    }

    /// Borrow the string contents, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a record field; `None` for missing fields and non-records
    pub fn field(&self, name: &str) -> Option<&Self> {
        match self {
            Self::Record(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Script type name of this value
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Integer(_) | Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Sequence(_) | Self::Record(_) => "table",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("nil"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::Sequence(_) | Self::Record(_) => f.write_str("table"),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<Self>> for Value {
    fn from(items: Vec<Self>) -> Self {
        Self::Sequence(items)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<u8> for Value {
    fn from(n: u8) -> Self {
        Self::Integer(n.into())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Integer(n.into())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Nil, Into::into)
    }
}

fn float_to_integer(f: f64) -> Option<i64> {
    f.is_finite().then(|| f.trunc() as i64)
}

/// Parse a decimal, `0x` hexadecimal or floating point literal with at most
/// one leading sign
fn parse_number(s: &str) -> Option<i64> {
    let s = s.trim();
    let (negative, body) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let hex = body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"));
    let magnitude = match hex {
        Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
            u64::from_str_radix(hex, 16).ok()?
        }
        Some(_) => return None,
        None if !body.is_empty() && body.bytes().all(|b| b.is_ascii_digit()) => {
            body.parse::<u64>().ok()?
        }
        // Float bodies must not carry a second sign
        None if body.starts_with(['-', '+']) => return None,
        None => {
            let f = body.parse::<f64>().ok()?;
            return float_to_integer(if negative { -f } else { f });
        }
    };

    if negative {
        0i64.checked_sub_unsigned(magnitude)
    } else {
        i64::try_from(magnitude).ok()
    }
}
