use std::fmt::Display;
use std::{io, str};

use serde::{de, ser};

/// Error type for `serde_qstring`.
///
/// Decoding stops at the first error. A record may already have had some of
/// its earlier fields assigned when a later field fails; the partially built
/// value is dropped and never returned to the caller.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The value (or decode target) cannot be used at the top level,
    /// e.g. a bare integer or a `None`.
    #[error("{0} is not supported")]
    InvalidArgument(String),

    /// The shape has no querystring representation (raw bytes,
    /// data-carrying enum variants, ...).
    #[error("{0} is not supported")]
    TypeUnsupported(String),

    /// A value could not be interpreted as the requested shape.
    #[error("\"{value}\" can not be assigned to {expected}")]
    TypeMismatch { expected: String, value: String },

    /// A numeric value is well-formed but does not fit the requested width.
    #[error("\"{value}\" is out of range for {expected}")]
    RangeError { expected: String, value: String },

    /// A fixed-size array received more elements than it can hold.
    #[error("index out of range [{length}] with array of length {capacity}")]
    ArrayIndexOutOfRange { capacity: usize, length: usize },

    /// Dictionary keys must be string-like to become selectors.
    #[error("map key must be a string, got {0}")]
    MapKeyTypeError(String),

    /// Decoding directly into a list requires exactly one root key.
    #[error("expected a single root key to decode a list, found {0}")]
    MultipleRootKeys(usize),

    /// A key nests more selectors than `Config::max_depth` allows.
    #[error("key `{key}` exceeds the maximum nesting depth of {max_depth}")]
    DepthLimitExceeded { key: String, max_depth: usize },

    #[error("{0}")]
    Custom(String),

    #[error(transparent)]
    Utf8(#[from] str::Utf8Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn mismatch(expected: impl Display, value: impl Display) -> Self {
        Error::TypeMismatch {
            expected: expected.to_string(),
            value: value.to_string(),
        }
    }

    pub(crate) fn out_of_range(expected: impl Display, value: impl Display) -> Self {
        Error::RangeError {
            expected: expected.to_string(),
            value: value.to_string(),
        }
    }

    pub(crate) fn top_level(shape: &str) -> Self {
        Error::InvalidArgument(format!("{shape} at the top level"))
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Error::Utf8(e.utf8_error())
    }
}

impl de::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: Display,
    {
        Error::Custom(msg.to_string())
    }
}

impl ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: Display,
    {
        Error::Custom(msg.to_string())
    }
}
