//! A dynamically typed querystring value.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

use serde::de::{Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, Serializer};

/// The dictionary type used by [`Value::Map`], sorted by key.
pub type Map<K = String, V = Value> = BTreeMap<K, V>;

/// Any value that can be written to or read from a querystring.
///
/// Decoding produces only `String`, `List` and `Map`: every leaf of a
/// querystring is text. The numeric and boolean variants exist so that
/// values can be built by hand and serialized.
///
/// Indexing with `&str` or `usize` never panics; a missing entry is
/// `Value::Null`.
///
/// ```
/// use serde_qstring::Value;
///
/// let value: Value = serde_qstring::from_str("a[b][0]=x&a[b][1]=y").unwrap();
/// assert_eq!(value["a"]["b"][1], Value::from("y"));
/// assert!(value["a"]["missing"].is_null());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(Map<String, Value>),
}

static NULL: Value = Value::Null;

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl Index<&str> for Value {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        match self {
            Value::Map(map) => map.get(key).unwrap_or(&NULL),
            _ => &NULL,
        }
    }
}

impl Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        match self {
            Value::List(items) => items.get(index).unwrap_or(&NULL),
            _ => &NULL,
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident,)*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => UInt,
    u16 => UInt,
    u32 => UInt,
    u64 => UInt,
    f32 => Float,
    f64 => Float,
    String => String,
    &str => String,
    Vec<Value> => List,
    Map<String, Value> => Map,
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::UInt(u) => serializer.serialize_u64(*u),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => serializer.collect_seq(items),
            Value::Map(map) => serializer.collect_map(map),
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any querystring value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Value, E> {
        Ok(Value::UInt(v))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut map = Map::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            map.insert(key, value);
        }
        Ok(Value::Map(map))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{Map, Value};

    #[test]
    fn index_missing_is_null() {
        let value = Value::from(Map::from([("a".to_string(), Value::from("1"))]));
        assert_eq!(value["a"], Value::from("1"));
        assert!(value["b"].is_null());
        assert!(value[0].is_null());
        assert!(value["a"]["deeper"].is_null());
    }

    #[test]
    fn integer_keyed_map_becomes_list() {
        let value: Value = crate::from_str("a[-1]=x&a[2]=z&a[1]=y").unwrap();
        assert_eq!(
            value["a"],
            Value::List(vec![Value::from("x"), Value::from("y"), Value::from("z")])
        );
    }

    #[test]
    fn root_keys_stay_a_map() {
        let value: Value = crate::from_str("0=a&1=b").unwrap();
        assert_eq!(value["0"], Value::from("a"));
        assert_eq!(value["1"], Value::from("b"));
        assert_eq!(crate::to_string(&value).unwrap(), "0=a&1=b");
    }

    #[test]
    fn signed_keys_need_digits() {
        let value: Value = crate::from_str("a[%2B1]=x&a[2]=y").unwrap();
        assert_eq!(value["a"]["+1"], Value::from("x"));
        assert_eq!(value["a"]["2"], Value::from("y"));
    }

    #[test]
    fn mixed_keys_stay_a_map() {
        let value: Value = crate::from_str("a[-1]=x&a[b]=y").unwrap();
        assert_eq!(value["a"]["b"], Value::from("y"));
        assert_eq!(value["a"]["-1"], Value::from("x"));
    }

    #[test]
    fn accessors() {
        let value: Value = crate::from_str("s=x&l[]=1").unwrap();
        assert_eq!(value["s"].as_str(), Some("x"));
        assert_eq!(value["l"].as_list().map(<[Value]>::len), Some(1));
        assert_eq!(value.as_map().map(|m| m.len()), Some(2));
    }
}
