//! Deserialization support for querystrings.
//!
//! ### An overview of the design of `QsDeserializer`
//!
//! Querystring parameters arrive unordered: `a[1]=y&b=2&a[0]=x` is the same
//! input as `a[0]=x&a[1]=y&b=2`. The whole input is therefore parsed up front
//! in three steps before any value is produced:
//!
//! 1. `parse` splits the input into pairs, unescapes each token and inserts
//!    it into a tree keyed by the `[selector]` segments of its key.
//! 2. `compact` decides, per subtree, whether the children form a list
//!    (only `[]` or only numeric selectors) or a map (anything else), and
//!    produces a `CompactNode`.
//! 3. The serde type hints of the target then drive the walk over that
//!    tree: `NodeDeserializer` handles one subtree, `LeafDeserializer` a
//!    single token, and `ZeroDeserializer` fills in record fields with no
//!    key and unfilled slots of fixed-size arrays.
//!
//! `QsDeserializer` is the entry point and is what decides which top-level
//! shapes make sense for a querystring.

mod compact;
mod parse;
mod string_parser;
mod zero;

use std::collections::{btree_map, BTreeMap};

use serde::de::{self, IntoDeserializer};

use crate::error::{Error, Result};
use crate::value::{Map, Value};
use crate::Config;

use compact::{compact_root, parse_integer_key, CompactNode};
use string_parser::LeafDeserializer;
use zero::{ZeroDeserializer, ZeroSeq};

/// Deserializes a querystring from a `&[u8]`.
///
/// ```
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, PartialEq)]
/// struct Query {
///     name: String,
///     age: u8,
///     occupation: String,
/// }
///
/// let q = Query {
///     name: "Alice".to_owned(),
///     age: 24,
///     occupation: "Student".to_owned(),
/// };
///
/// assert_eq!(
///     serde_qstring::from_bytes::<Query>(b"name=Alice&age=24&occupation=Student").unwrap(),
///     q
/// );
/// ```
pub fn from_bytes<T: de::DeserializeOwned>(input: &[u8]) -> Result<T> {
    Config::default().deserialize_bytes(input)
}

/// Deserializes a querystring from a `&str`.
///
/// ```
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, PartialEq)]
/// struct Query {
///     name: String,
///     tags: Vec<String>,
///     page: Option<u32>,
/// }
///
/// let q: Query = serde_qstring::from_str("tags[]=a&tags[]=b&name=Alice").unwrap();
/// assert_eq!(
///     q,
///     Query {
///         name: "Alice".to_owned(),
///         tags: vec!["a".to_owned(), "b".to_owned()],
///         page: None,
///     }
/// );
/// ```
pub fn from_str<T: de::DeserializeOwned>(input: &str) -> Result<T> {
    from_bytes(input.as_bytes())
}

/// Decodes a querystring into a dynamic, sorted map.
///
/// ```
/// use serde_qstring::Value;
///
/// let map = serde_qstring::decode_to_map("b[]=1&b[]=2&a=x").unwrap();
/// assert_eq!(map["a"], Value::from("x"));
/// assert_eq!(map["b"][1], Value::from("2"));
/// ```
pub fn decode_to_map(input: &str) -> Result<Map<String, Value>> {
    from_str(input)
}

/// Unescapes the whole querystring without interpreting its structure.
///
/// Unescaping is lenient: a `%` that does not start a valid escape, as in
/// `%zz` or a trailing `%`, is kept as it is rather than rejected. Only
/// escapes that decode to invalid UTF-8 are an error.
///
/// ```
/// let raw = serde_qstring::decode_to_string("a%5Bb%5D=hello+world").unwrap();
/// assert_eq!(raw, "a[b]=hello world");
///
/// let raw = serde_qstring::decode_to_string("discount=50%zz&tail=%").unwrap();
/// assert_eq!(raw, "discount=50%zz&tail=%");
///
/// assert!(serde_qstring::decode_to_string("a=%FF").is_err());
/// ```
pub fn decode_to_string(input: &str) -> Result<String> {
    from_str(input)
}

/// Decodes the list held under the only root key of the querystring.
///
/// ```
/// use serde_qstring::{Error, Value};
///
/// let list = serde_qstring::decode_to_list("ids[]=3&ids[]=1").unwrap();
/// assert_eq!(list, vec![Value::from("3"), Value::from("1")]);
///
/// let err = serde_qstring::decode_to_list("a[]=1&b[]=2").unwrap_err();
/// assert!(matches!(err, Error::MultipleRootKeys(2)));
/// ```
pub fn decode_to_list(input: &str) -> Result<Vec<Value>> {
    from_str(input)
}

/// A deserializer for the querystring format.
///
/// Supported top-level outputs are structs, maps and strings. Lists and
/// fixed-size arrays are accepted when the input has a single root key,
/// whose value is decoded as the list. `Option` and newtype wrappers are
/// transparent.
pub struct QsDeserializer<'a> {
    input: &'a [u8],
    config: Config,
}

impl<'a> QsDeserializer<'a> {
    /// Returns a new `QsDeserializer` using the default `Config`.
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(Config::default(), input)
    }

    /// Returns a new `QsDeserializer` using the given `Config`.
    pub fn with_config(config: Config, input: &'a [u8]) -> Self {
        QsDeserializer { input, config }
    }

    fn roots(&self) -> Result<BTreeMap<String, CompactNode>> {
        Ok(compact_root(parse::parse(self.input, self.config)?))
    }

    /// The value of the only root key, or `None` for an empty input.
    fn single_root(&self) -> Result<Option<CompactNode>> {
        let mut roots = self.roots()?;
        match roots.len() {
            0 => Ok(None),
            1 => Ok(roots.pop_first().map(|(_, node)| node)),
            n => Err(Error::MultipleRootKeys(n)),
        }
    }
}

macro_rules! top_level_unsupported {
    ($($method:ident => $shape:expr,)*) => {
        $(
            fn $method<V>(self, _visitor: V) -> Result<V::Value>
            where
                V: de::Visitor<'de>,
            {
                Err(Error::top_level($shape))
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for QsDeserializer<'_> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        // root keys are never read as a list, even when all are integers
        self.deserialize_map(visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_map(NodeMap::new(self.roots()?))
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_map(RecordAccess::new(self.roots()?, fields))
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_string(parse::decode_str(self.input)?.into_owned())
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.single_root()? {
            Some(node) => NodeDeserializer(node).deserialize_seq(visitor),
            None => visitor.visit_seq(ZeroSeq(0)),
        }
    }

    fn deserialize_tuple<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.single_root()? {
            Some(node) => NodeDeserializer(node).deserialize_tuple(len, visitor),
            None => visitor.visit_seq(ZeroSeq(len)),
        }
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::top_level("unit struct"))
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::top_level("enum"))
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    top_level_unsupported! {
        deserialize_bool => "bool",
        deserialize_i8 => "integer",
        deserialize_i16 => "integer",
        deserialize_i32 => "integer",
        deserialize_i64 => "integer",
        deserialize_u8 => "integer",
        deserialize_u16 => "integer",
        deserialize_u32 => "integer",
        deserialize_u64 => "integer",
        deserialize_f32 => "float",
        deserialize_f64 => "float",
        deserialize_char => "char",
        deserialize_unit => "unit",
        deserialize_bytes => "bytes",
        deserialize_byte_buf => "bytes",
        deserialize_identifier => "identifier",
    }
}

/// The keys of a non-empty map parsed as integers, if all of them are.
///
/// Untyped targets read such a map as a list ordered by key. Only the
/// compactor's unsigned indices become arrays on their own, so this is
/// what turns `a[-1]=x&a[3]=y` into a list.
fn integer_keyed(map: &BTreeMap<String, CompactNode>) -> Option<Vec<i64>> {
    if map.is_empty() {
        return None;
    }
    map.keys().map(|key| parse_integer_key(key)).collect()
}

fn in_key_order(map: BTreeMap<String, CompactNode>, keys: Vec<i64>) -> Vec<CompactNode> {
    let mut entries: Vec<_> = keys.into_iter().zip(map.into_values()).collect();
    entries.sort_by_key(|(key, _)| *key);
    entries.into_iter().map(|(_, node)| node).collect()
}

/// Deserializes one compacted subtree.
struct NodeDeserializer(CompactNode);

impl NodeDeserializer {
    /// The single token of a leaf, or a mismatch against `expected`.
    fn into_leaf(self, expected: &str) -> Result<LeafDeserializer> {
        match self.0 {
            CompactNode::Leaf(mut values) if values.len() == 1 => {
                Ok(LeafDeserializer(values.pop().unwrap_or_default()))
            }
            node => Err(Error::mismatch(expected, node.describe())),
        }
    }

    /// The elements of a list: array elements, or one element per value
    /// of a repeated plain key.
    fn into_items(self, expected: &str) -> Result<Vec<CompactNode>> {
        match self.0 {
            CompactNode::Array(items) => Ok(items),
            ref node if node.is_empty_sentinel() => Ok(Vec::new()),
            CompactNode::Leaf(values) => Ok(values
                .into_iter()
                .map(|v| CompactNode::Leaf(vec![v]))
                .collect()),
            node @ CompactNode::Map(_) => Err(Error::mismatch(expected, node.describe())),
        }
    }
}

macro_rules! deserialize_leaf {
    ($($method:ident => $expected:expr,)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: de::Visitor<'de>,
            {
                self.into_leaf($expected)?.$method(visitor)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for NodeDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.0 {
            CompactNode::Leaf(mut values) if values.len() == 1 => {
                visitor.visit_string(values.pop().unwrap_or_default())
            }
            CompactNode::Leaf(values) => visitor.visit_seq(NodeSeq::new(
                values.into_iter().map(|v| CompactNode::Leaf(vec![v])).collect(),
                0,
            )),
            CompactNode::Array(items) => visitor.visit_seq(NodeSeq::new(items, 0)),
            CompactNode::Map(map) => match integer_keyed(&map) {
                Some(order) => visitor.visit_seq(NodeSeq::new(in_key_order(map, order), 0)),
                None => visitor.visit_map(NodeMap::new(map)),
            },
        }
    }

    deserialize_leaf! {
        deserialize_bool => "bool",
        deserialize_i8 => "i8",
        deserialize_i16 => "i16",
        deserialize_i32 => "i32",
        deserialize_i64 => "i64",
        deserialize_u8 => "u8",
        deserialize_u16 => "u16",
        deserialize_u32 => "u32",
        deserialize_u64 => "u64",
        deserialize_f32 => "f32",
        deserialize_f64 => "f64",
        deserialize_char => "char",
        deserialize_str => "string",
        deserialize_string => "string",
        deserialize_identifier => "identifier",
        deserialize_unit => "unit",
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if self.0.is_empty_sentinel() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let items = self.into_items("list")?;
        visitor.visit_seq(NodeSeq::new(items, 0))
    }

    fn deserialize_tuple<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let items = self.into_items(&format!("array of length {len}"))?;
        if items.len() > len {
            return Err(Error::ArrayIndexOutOfRange {
                capacity: len,
                length: items.len(),
            });
        }
        let padding = len - items.len();
        visitor.visit_seq(NodeSeq::new(items, padding))
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.0 {
            CompactNode::Map(map) => visitor.visit_map(NodeMap::new(map)),
            // a plain value where a dictionary is expected carries no entries
            CompactNode::Leaf(_) => visitor.visit_map(NodeMap::new(BTreeMap::new())),
            node @ CompactNode::Array(_) => Err(Error::mismatch("map", node.describe())),
        }
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.0 {
            CompactNode::Map(map) => visitor.visit_map(RecordAccess::new(map, fields)),
            ref node if node.is_empty_sentinel() => {
                visitor.visit_map(RecordAccess::new(BTreeMap::new(), fields))
            }
            node => Err(Error::mismatch(name, node.describe())),
        }
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if self.0.as_single().is_none() {
            return Err(Error::TypeUnsupported(format!(
                "data-carrying variant of enum {name}"
            )));
        }
        self.into_leaf(name)?
            .deserialize_enum(name, variants, visitor)
    }

    fn deserialize_bytes<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::TypeUnsupported("bytes".to_string()))
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

/// List elements followed by `padding` zero values.
struct NodeSeq {
    items: std::vec::IntoIter<CompactNode>,
    padding: usize,
}

impl NodeSeq {
    fn new(items: Vec<CompactNode>, padding: usize) -> Self {
        NodeSeq {
            items: items.into_iter(),
            padding,
        }
    }
}

impl<'de> de::SeqAccess<'de> for NodeSeq {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        if let Some(node) = self.items.next() {
            return seed.deserialize(NodeDeserializer(node)).map(Some);
        }
        if self.padding > 0 {
            self.padding -= 1;
            return seed.deserialize(ZeroDeserializer).map(Some);
        }
        Ok(None)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len() + self.padding)
    }
}

/// Dictionary entries. Keys are single tokens and may parse into any
/// scalar key type.
struct NodeMap {
    iter: btree_map::IntoIter<String, CompactNode>,
    value: Option<CompactNode>,
}

impl NodeMap {
    fn new(map: BTreeMap<String, CompactNode>) -> Self {
        NodeMap {
            iter: map.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for NodeMap {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        if let Some((key, value)) = self.iter.next() {
            self.value = Some(value);
            return seed.deserialize(LeafDeserializer(key)).map(Some);
        }
        Ok(None)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(node) => seed.deserialize(NodeDeserializer(node)),
            None => Err(de::Error::custom(
                "value requested before its key was deserialized",
            )),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

/// Record fields, visited in declaration order.
///
/// Every declared field is yielded whether or not the input has a key for
/// it: absent fields deserialize to their zero value. Input keys that are
/// not declared fields are ignored.
pub(crate) struct RecordAccess {
    entries: BTreeMap<String, CompactNode>,
    fields: std::slice::Iter<'static, &'static str>,
    value: Option<CompactNode>,
}

impl RecordAccess {
    pub(crate) fn new(
        entries: BTreeMap<String, CompactNode>,
        fields: &'static [&'static str],
    ) -> Self {
        RecordAccess {
            entries,
            fields: fields.iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for RecordAccess {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        let Some(&field) = self.fields.next() else {
            return Ok(None);
        };
        self.value = self.entries.remove(field);
        let key: de::value::StrDeserializer<Error> = field.into_deserializer();
        seed.deserialize(key).map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(node) => seed.deserialize(NodeDeserializer(node)),
            None => seed.deserialize(ZeroDeserializer),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.fields.len())
    }
}
