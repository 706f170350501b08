//! Core error type for all buffer, key and MAC operations
//!
//! Every error in this crate is local and recoverable: it aborts the current
//! operation only, and any secret storage owned by that operation has already
//! been scrubbed by the time the error reaches the caller.

use std::collections::TryReserveError;
use std::fmt;

use crate::key::KeyType;

/// Result type for DESFire shell core operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Core error type that encompasses all possible errors in the crate
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    //
    // Buffer coercion errors
    //
    /// Value is neither a byte sequence nor a string
    #[error("array or hexstring expected")]
    WrongInputShape,

    /// Hex string with an odd number of characters
    #[error("length of hexstring must be even")]
    OddLength,

    /// Hex string containing a character outside `[0-9a-fA-F]`
    #[error("invalid character '{ch}' at index {index}")]
    InvalidHexDigit {
        /// Offending character
        ch: char,
        /// Index of the character in the string
        index: usize,
    },

    /// Sequence element that is not a number
    #[error("index {index} --> '{value}' is not a valid number")]
    InvalidElement {
        /// Zero-based index of the element
        index: usize,
        /// Textual form of the element
        value: String,
    },

    /// Storage for a buffer could not be reserved
    #[error("out of memory")]
    AllocationFailure,

    //
    // Key errors
    //
    /// Key or MAC key of the wrong size
    #[error("key length {actual} invalid, expected {expected} bytes")]
    KeyLengthMismatch {
        /// Length mandated by the algorithm
        expected: usize,
        /// Length that was supplied
        actual: usize,
    },

    /// Unknown key algorithm name
    #[error("unknown key type '{0}'")]
    UnknownKeyType(String),

    /// Key version that is not a number
    #[error("key version invalid, number expected")]
    InvalidKeyVersion,

    /// Operation not implemented for this key algorithm
    #[error("key type {0} not implemented")]
    UnsupportedAlgorithm(KeyType),

    /// Card UID that is not 7 bytes long
    #[error("UID length {actual} invalid, expected 7 bytes")]
    InvalidUidLength {
        /// Length that was supplied
        actual: usize,
    },

    /// Required record field is absent
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    //
    // Card parameter errors
    //
    /// Unknown communication mode name or byte
    #[error("unknown communication mode '{0}'")]
    UnknownCommMode(String),

    /// Malformed access rights record
    #[error("{0} access: number expected")]
    InvalidAccessRights(&'static str),

    /// Script value of the wrong kind
    #[error("{0} expected")]
    TypeMismatch(&'static str),

    //
    // Crypto provider errors
    //
    /// Cipher identifier not present in the CMAC catalog
    #[error("cipher '{0}' unknown")]
    UnknownCipher(String),

    /// Digest identifier not present in the HMAC catalog
    #[error("message digest '{0}' unknown")]
    UnknownDigest(String),

    /// Failure reported by the underlying cryptographic primitives
    #[error("{0}")]
    Crypto(String),

    //
    // General errors
    //
    /// Error attributed to a positional argument
    #[error("bad argument #{index} ({name}: {source})")]
    Argument {
        /// One-based argument position
        index: usize,
        /// Argument name
        name: &'static str,
        /// Source error
        source: Box<Self>,
    },

    /// Context error with message and source error
    #[error("{context}: {source}")]
    Context {
        /// Contextual message
        context: String,
        /// Source error
        source: Box<Self>,
    },
}

impl Error {
    /// Create a new error with context information
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Attribute this error to the argument at `index` (one-based)
    pub fn with_argument(self, index: usize, name: &'static str) -> Self {
        Self::Argument {
            index,
            name,
            source: Box::new(self),
        }
    }

    /// Build a crypto failure from the provider's pending errors, oldest first
    pub fn crypto<I>(errors: I) -> Self
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        let mut message = String::from("Crypto error:\n");
        for err in errors {
            message.push_str(&err.to_string());
            message.push('\n');
        }
        Self::Crypto(message)
    }

    /// Innermost error, with every argument and context layer removed
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Argument { source, .. } | Self::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<TryReserveError> for Error {
    fn from(_: TryReserveError) -> Self {
        Self::AllocationFailure
    }
}

impl From<hex::FromHexError> for Error {
    fn from(err: hex::FromHexError) -> Self {
        match err {
            hex::FromHexError::OddLength => Self::OddLength,
            hex::FromHexError::InvalidHexCharacter { c, index } => {
                Self::InvalidHexDigit { ch: c, index }
            }
            // Only produced by decoding into fixed-size slices
            hex::FromHexError::InvalidStringLength => Self::OddLength,
        }
    }
}

/// Extension trait for Result with core Errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<S: Into<String>>(self, context: S) -> Result<T>;

    /// Attribute an error to a positional argument
    fn argument(self, index: usize, name: &'static str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context<S: Into<String>>(self, context: S) -> Self {
        self.map_err(|e| e.with_context(context))
    }

    fn argument(self, index: usize, name: &'static str) -> Self {
        self.map_err(|e| e.with_argument(index, name))
    }
}
