use std::io::Write;

use serde::de;

use crate::error::Result;
use crate::ser::{EncodingSink, QsSerializer};
use crate::QsDeserializer;

/// Configuration for serialization and deserialization behavior.
///
/// There is no process-wide state: every entry point either takes a
/// `Config` explicitly or uses `Config::default()`.
///
/// ## Nesting Depth
///
/// `max_depth` bounds the number of `[selector]` segments a single key may
/// carry. Keys nesting deeper than this are rejected with
/// [`Error::DepthLimitExceeded`](crate::Error::DepthLimitExceeded), which keeps
/// maliciously nested input from exhausting the stack. A `max_depth` of 0
/// only admits flat `key=value` pairs.
///
/// Default value: `max_depth = 16`
///
/// ```
/// use serde_qstring::{Config, Map, Value};
///
/// let config = Config::new().max_depth(1);
/// assert!(config.deserialize_str::<Map<String, Value>>("a[b][c]=1").is_err());
///
/// let map: Map<String, Value> = Config::new().deserialize_str("a[b][c]=1").unwrap();
/// assert_eq!(map["a"]["b"]["c"], Value::from("1"));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub(crate) max_depth: usize,
    pub(crate) use_form_encoding: bool,
    pub(crate) array_format: ArrayFormat,
}

/// How list elements are keyed when serializing.
///
/// Every format is accepted when deserializing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrayFormat {
    /// Use the `a[0]=1&a[1]=2` format.
    Indexed,
    /// Use the `a[]=1&a[]=2` format.
    EmptyIndexed,
    /// Use the `a=1&a=2` format.
    Unindexed,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub const fn new() -> Self {
        Self {
            max_depth: 16,
            use_form_encoding: cfg!(feature = "default_to_form_encoding"),
            array_format: ArrayFormat::Indexed,
        }
    }

    /// Specifies the maximum number of nested selectors a key may use.
    /// Default is 16.
    pub const fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// By default keys are written with literal brackets (`a[b]=1`) and
    /// only the characters that are structural in a querystring are
    /// percent-encoded.
    ///
    /// With form encoding every non-alphanumeric byte other than `*-._` is
    /// percent-encoded, including the brackets: `a%5Bb%5D=1`.
    ///
    /// Both forms are accepted when deserializing, since keys are unescaped
    /// before their selectors are split.
    pub const fn use_form_encoding(mut self, use_form_encoding: bool) -> Self {
        self.use_form_encoding = use_form_encoding;
        self
    }

    /// Specifies how lists should be keyed during serialization.
    ///
    /// The default is `Indexed`, which results in keys like `a[0]=1&a[1]=2`.
    pub const fn array_format(mut self, array_format: ArrayFormat) -> Self {
        self.array_format = array_format;
        self
    }

    /// Deserializes a querystring from a `&[u8]` using this `Config`.
    pub fn deserialize_bytes<T: de::DeserializeOwned>(self, input: &[u8]) -> Result<T> {
        T::deserialize(QsDeserializer::with_config(self, input))
    }

    /// Deserializes a querystring from a `&str` using this `Config`.
    pub fn deserialize_str<T: de::DeserializeOwned>(self, input: &str) -> Result<T> {
        self.deserialize_bytes(input.as_bytes())
    }

    /// Serializes an object to a querystring using this `Config`.
    pub fn serialize_string<T: serde::Serialize + ?Sized>(self, input: &T) -> Result<String> {
        let mut buffer = Vec::with_capacity(128);
        self.serialize_to_writer(input, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Serializes an object to a querystring using this `Config`.
    pub fn serialize_to_writer<T: serde::Serialize + ?Sized, W: Write>(
        self,
        input: &T,
        writer: &mut W,
    ) -> Result<()> {
        let mut serializer = QsSerializer::new(EncodingSink::new(writer, self), self);
        input.serialize(&mut serializer)
    }

    /// Serializes an object into its flat `(key, value)` pairs, in emission
    /// order and without percent-encoding.
    ///
    /// A top-level string has no pair structure and is rejected here.
    pub fn serialize_pairs<T: serde::Serialize + ?Sized>(
        self,
        input: &T,
    ) -> Result<Vec<(String, String)>> {
        let mut pairs = Vec::new();
        let mut serializer = QsSerializer::new(&mut pairs, self);
        input.serialize(&mut serializer)?;
        Ok(pairs)
    }
}
