//! Serialization support for querystrings.

mod empty;
mod encode;
pub(crate) mod key;

use std::io::Write;

use serde::ser;

use crate::error::{Error, Result};
use crate::{ArrayFormat, Config};

pub use empty::is_empty;
use key::KeyPath;

/// Serializes a value into a querystring.
///
/// ```
/// use serde::Serialize;
///
/// #[derive(Serialize)]
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
///     serde_qstring::to_string(&q).unwrap(),
///     "name=Alice&age=24&occupation=Student"
/// );
/// ```
pub fn to_string<T: ser::Serialize + ?Sized>(input: &T) -> Result<String> {
    Config::default().serialize_string(input)
}

/// Serializes a value into a generic writer object.
///
/// ```
/// use std::collections::BTreeMap;
///
/// let map = BTreeMap::from([("b", vec!["x", "y"]), ("a", vec![])]);
///
/// let mut buffer = Vec::new();
/// serde_qstring::to_writer(&map, &mut buffer).unwrap();
/// assert_eq!(String::from_utf8(buffer).unwrap(), "a=&b[0]=x&b[1]=y");
/// ```
pub fn to_writer<T: ser::Serialize + ?Sized, W: Write>(input: &T, writer: &mut W) -> Result<()> {
    Config::default().serialize_to_writer(input, writer)
}

/// Serializes a value into flat, unescaped `(key, value)` pairs in the order
/// they would be written.
///
/// ```
/// use std::collections::BTreeMap;
///
/// let map = BTreeMap::from([("user", BTreeMap::from([("name", "A B")]))]);
/// assert_eq!(
///     serde_qstring::to_pairs(&map).unwrap(),
///     vec![("user[name]".to_string(), "A B".to_string())]
/// );
/// ```
pub fn to_pairs<T: ser::Serialize + ?Sized>(input: &T) -> Result<Vec<(String, String)>> {
    Config::default().serialize_pairs(input)
}

/// Receives the flat pairs produced by `QsSerializer`.
pub trait PairSink {
    /// Appends one `key=value` pair. Neither side is escaped yet.
    fn append_pair(&mut self, key: &str, value: &str) -> Result<()>;

    /// Appends a string serialized at the top level, which is written as the
    /// whole querystring rather than as a pair.
    fn append_query(&mut self, _query: &str) -> Result<()> {
        Err(Error::InvalidArgument(
            "string without key/value structure".to_string(),
        ))
    }
}

impl PairSink for Vec<(String, String)> {
    fn append_pair(&mut self, key: &str, value: &str) -> Result<()> {
        self.push((key.to_string(), value.to_string()));
        Ok(())
    }
}

impl<S: PairSink + ?Sized> PairSink for &mut S {
    fn append_pair(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).append_pair(key, value)
    }

    fn append_query(&mut self, query: &str) -> Result<()> {
        (**self).append_query(query)
    }
}

/// Percent-encodes pairs and joins them with `&` into a writer.
pub struct EncodingSink<'w, W: Write> {
    writer: &'w mut W,
    first_kv: bool,
    use_form_encoding: bool,
}

impl<'w, W: Write> EncodingSink<'w, W> {
    pub fn new(writer: &'w mut W, config: Config) -> Self {
        EncodingSink {
            writer,
            first_kv: true,
            use_form_encoding: config.use_form_encoding,
        }
    }

    fn write_encoded(&mut self, token: &str) -> Result<()> {
        for chunk in encode::encode(token, self.use_form_encoding) {
            self.writer.write_all(chunk.as_bytes())?;
        }
        Ok(())
    }
}

impl<W: Write> PairSink for EncodingSink<'_, W> {
    fn append_pair(&mut self, key: &str, value: &str) -> Result<()> {
        if self.first_kv {
            self.first_kv = false;
        } else {
            self.writer.write_all(b"&")?;
        }
        self.write_encoded(key)?;
        self.writer.write_all(b"=")?;
        self.write_encoded(value)
    }

    fn append_query(&mut self, query: &str) -> Result<()> {
        let encoded = encode::encode_query(query, self.use_form_encoding);
        self.writer.write_all(encoded.as_bytes())?;
        Ok(())
    }
}

/// A serializer for the querystring format.
///
/// Nested values are flattened into bracketed keys: serializing
/// `{user: {name: "John"}}` pushes `user` onto the key stack, then writes
/// `name` as the pair `user[name]=John`.
///
/// * Records write one pair per (non-skipped) field, in declaration order.
/// * Maps need string-like keys and write their entries sorted by key.
/// * Lists are keyed according to `Config::array_format`.
/// * `None`, `()` and empty lists or maps write the empty sentinel `key=`.
///
/// At the top level only records, maps and strings are accepted.
pub struct QsSerializer<S: PairSink> {
    sink: S,
    key: KeyPath,
    config: Config,
}

impl<S: PairSink> QsSerializer<S> {
    /// Creates a new `QsSerializer` writing into the given sink.
    pub fn new(sink: S, config: Config) -> Self {
        QsSerializer {
            sink,
            key: KeyPath::new(),
            config,
        }
    }

    /// Consumes the serializer, returning its sink.
    pub fn into_inner(self) -> S {
        self.sink
    }

    /// Writes `value` at the current key. `shape` names the value for the
    /// error raised when there is no key to write it under.
    fn write_value(&mut self, shape: &str, value: &str) -> Result<()> {
        if self.key.is_root() {
            return Err(Error::top_level(shape));
        }
        self.sink.append_pair(self.key.as_str(), value)
    }

    fn write_sentinel(&mut self, shape: &str) -> Result<()> {
        self.write_value(shape, "")
    }

    fn pop_key(&mut self) -> Result<()> {
        if self.key.pop() {
            Ok(())
        } else {
            Err(Error::Custom("internal error: no key found".to_string()))
        }
    }
}

macro_rules! serialize_itoa {
    ($($ty:ty => $meth:ident,)*) => {
        $(
            fn $meth(self, v: $ty) -> Result<Self::Ok> {
                let mut buffer = itoa::Buffer::new();
                self.write_value("integer", buffer.format(v))
            }
        )*
    };
}

macro_rules! serialize_ryu {
    ($($ty:ty => $meth:ident,)*) => {
        $(
            fn $meth(self, v: $ty) -> Result<Self::Ok> {
                let mut buffer = ryu::Buffer::new();
                self.write_value("float", buffer.format(v))
            }
        )*
    };
}

impl<'a, S: PairSink> ser::Serializer for &'a mut QsSerializer<S> {
    type Ok = ();
    type Error = Error;
    type SerializeSeq = QsSeq<'a, S>;
    type SerializeTuple = QsSeq<'a, S>;
    type SerializeTupleStruct = QsSeq<'a, S>;
    type SerializeTupleVariant = ser::Impossible<(), Error>;
    type SerializeMap = QsMap<'a, S>;
    type SerializeStruct = Self;
    type SerializeStructVariant = ser::Impossible<(), Error>;

    serialize_itoa! {
        u8  => serialize_u8,
        u16 => serialize_u16,
        u32 => serialize_u32,
        u64 => serialize_u64,
        i8  => serialize_i8,
        i16 => serialize_i16,
        i32 => serialize_i32,
        i64 => serialize_i64,
    }
    serialize_ryu! {
        f32 => serialize_f32,
        f64 => serialize_f64,
    }

    fn serialize_bool(self, v: bool) -> Result<Self::Ok> {
        self.write_value("bool", if v { "true" } else { "false" })
    }

    fn serialize_char(self, v: char) -> Result<Self::Ok> {
        let mut b = [0; 4];
        self.write_value("char", v.encode_utf8(&mut b))
    }

    fn serialize_str(self, v: &str) -> Result<Self::Ok> {
        if self.key.is_root() {
            return self.sink.append_query(v);
        }
        self.write_value("string", v)
    }

    fn serialize_bytes(self, _value: &[u8]) -> Result<Self::Ok> {
        Err(Error::TypeUnsupported("bytes".to_string()))
    }

    fn serialize_unit(self) -> Result<Self::Ok> {
        self.write_sentinel("unit")
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Self::Ok> {
        self.write_sentinel(name)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Self::Ok> {
        self.write_value("enum", variant)
    }

    fn serialize_newtype_struct<T: ?Sized + ser::Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Self::Ok> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + ser::Serialize>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _value: &T,
    ) -> Result<Self::Ok> {
        Err(Error::TypeUnsupported(format!("enum variant {name}::{variant}")))
    }

    fn serialize_none(self) -> Result<Self::Ok> {
        self.write_sentinel("none")
    }

    fn serialize_some<T: ?Sized + ser::Serialize>(self, value: &T) -> Result<Self::Ok> {
        value.serialize(self)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        QsSeq::new(self)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        QsSeq::new(self)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        QsSeq::new(self)
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::TypeUnsupported(format!("enum variant {name}::{variant}")))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(QsMap::new(self))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::TypeUnsupported(format!("enum variant {name}::{variant}")))
    }
}

impl<S: PairSink> ser::SerializeStruct for &mut QsSerializer<S> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        self.key.push(key);
        value.serialize(&mut **self)?;
        self.pop_key()
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(())
    }
}

#[doc(hidden)]
pub struct QsSeq<'s, S: PairSink> {
    qs: &'s mut QsSerializer<S>,
    counter: usize,
}

impl<'a, S: PairSink> QsSeq<'a, S> {
    fn new(qs: &'a mut QsSerializer<S>) -> Result<Self> {
        if qs.key.is_root() {
            return Err(Error::top_level("sequence"));
        }
        Ok(Self { qs, counter: 0 })
    }

    fn element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        let format = self.qs.config.array_format;
        match format {
            ArrayFormat::Indexed => {
                let mut buffer = itoa::Buffer::new();
                self.qs.key.push(buffer.format(self.counter));
            }
            ArrayFormat::EmptyIndexed => self.qs.key.push(""),
            ArrayFormat::Unindexed => {}
        }
        self.counter += 1;

        value.serialize(&mut *self.qs)?;
        if format != ArrayFormat::Unindexed {
            self.qs.pop_key()?;
        }
        Ok(())
    }

    fn finish(self) -> Result<()> {
        if self.counter == 0 {
            self.qs.write_sentinel("sequence")?;
        }
        Ok(())
    }
}

impl<S: PairSink> ser::SerializeSeq for QsSeq<'_, S> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        self.element(value)
    }

    fn end(self) -> Result<Self::Ok> {
        self.finish()
    }
}

impl<S: PairSink> ser::SerializeTuple for QsSeq<'_, S> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        self.element(value)
    }

    fn end(self) -> Result<Self::Ok> {
        self.finish()
    }
}

impl<S: PairSink> ser::SerializeTupleStruct for QsSeq<'_, S> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        self.element(value)
    }

    fn end(self) -> Result<Self::Ok> {
        self.finish()
    }
}

#[doc(hidden)]
pub struct QsMap<'s, S: PairSink> {
    qs: &'s mut QsSerializer<S>,
    /// Each entry's key segment and the pairs its value wrote, held back
    /// until `end` so they can be written sorted by key.
    entries: Vec<(String, Vec<(String, String)>)>,
}

impl<'a, S: PairSink> QsMap<'a, S> {
    fn new(qs: &'a mut QsSerializer<S>) -> Self {
        Self {
            qs,
            entries: Vec::new(),
        }
    }
}

impl<S: PairSink> ser::SerializeMap for QsMap<'_, S> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        key.serialize(KeySerializer {
            key: &mut self.qs.key,
        })
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        let mut entry = QsSerializer {
            sink: Vec::new(),
            key: std::mem::take(&mut self.qs.key),
            config: self.qs.config,
        };
        let written = value.serialize(&mut entry);
        self.qs.key = entry.key;
        written?;

        let segment = self.qs.key.last_segment().to_string();
        self.qs.pop_key()?;
        self.entries.push((segment, entry.sink));
        Ok(())
    }

    fn end(self) -> Result<Self::Ok> {
        let QsMap { qs, mut entries } = self;
        // the top-level map has no key to hold the sentinel
        if entries.is_empty() && !qs.key.is_root() {
            return qs.write_sentinel("map");
        }
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        for (_, pairs) in entries {
            for (key, value) in pairs {
                qs.sink.append_pair(&key, &value)?;
            }
        }
        Ok(())
    }
}

/// Pushes a map key onto the key stack. Only string-like keys can become
/// selectors.
struct KeySerializer<'a> {
    key: &'a mut KeyPath,
}

impl KeySerializer<'_> {
    fn unsupported(shape: &str) -> Error {
        Error::MapKeyTypeError(shape.to_string())
    }
}

macro_rules! key_unsupported {
    ($($ty:ty => $meth:ident,)*) => {
        $(
            fn $meth(self, _v: $ty) -> Result<Self::Ok> {
                Err(Self::unsupported(stringify!($ty)))
            }
        )*
    };
}

impl ser::Serializer for KeySerializer<'_> {
    type Ok = ();
    type Error = Error;
    type SerializeSeq = ser::Impossible<Self::Ok, Error>;
    type SerializeTuple = ser::Impossible<Self::Ok, Error>;
    type SerializeTupleStruct = ser::Impossible<Self::Ok, Error>;
    type SerializeTupleVariant = ser::Impossible<Self::Ok, Error>;
    type SerializeMap = ser::Impossible<Self::Ok, Error>;
    type SerializeStruct = ser::Impossible<Self::Ok, Error>;
    type SerializeStructVariant = ser::Impossible<Self::Ok, Error>;

    key_unsupported! {
        bool => serialize_bool,
        u8  => serialize_u8,
        u16 => serialize_u16,
        u32 => serialize_u32,
        u64 => serialize_u64,
        i8  => serialize_i8,
        i16 => serialize_i16,
        i32 => serialize_i32,
        i64 => serialize_i64,
        f32 => serialize_f32,
        f64 => serialize_f64,
    }

    fn serialize_char(self, v: char) -> Result<Self::Ok> {
        let mut b = [0; 4];
        self.key.push(v.encode_utf8(&mut b));
        Ok(())
    }

    fn serialize_str(self, v: &str) -> Result<Self::Ok> {
        self.key.push(v);
        Ok(())
    }

    fn serialize_bytes(self, _value: &[u8]) -> Result<Self::Ok> {
        Err(Self::unsupported("bytes"))
    }

    fn serialize_unit(self) -> Result<Self::Ok> {
        Err(Self::unsupported("unit"))
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Self::Ok> {
        Err(Self::unsupported(name))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Self::Ok> {
        self.key.push(variant);
        Ok(())
    }

    fn serialize_newtype_struct<T: ?Sized + ser::Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Self::Ok> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + ser::Serialize>(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Self::Ok> {
        Err(Self::unsupported(name))
    }

    fn serialize_none(self) -> Result<Self::Ok> {
        Err(Self::unsupported("none"))
    }

    fn serialize_some<T: ?Sized + ser::Serialize>(self, _value: &T) -> Result<Self::Ok> {
        Err(Self::unsupported("option"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(Self::unsupported("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(Self::unsupported("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(Self::unsupported(name))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Self::unsupported(name))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Self::unsupported("map"))
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(Self::unsupported(name))
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Self::unsupported(name))
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;
    use serde::Serialize;

    use super::{to_pairs, to_string, QsSerializer};
    use crate::{ArrayFormat, Config, Error};

    #[derive(Serialize)]
    struct Inner {
        x: u8,
        tags: Vec<&'static str>,
    }

    #[derive(Serialize)]
    struct Outer {
        name: &'static str,
        inner: Inner,
        empty: Vec<u8>,
        missing: Option<u8>,
    }

    fn outer() -> Outer {
        Outer {
            name: "a b",
            inner: Inner {
                x: 1,
                tags: vec!["p", "q"],
            },
            empty: vec![],
            missing: None,
        }
    }

    #[test]
    fn pairs_follow_declaration_order() {
        let pairs = to_pairs(&outer()).unwrap();
        let pairs: Vec<_> = pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(
            pairs,
            vec![
                ("name", "a b"),
                ("inner[x]", "1"),
                ("inner[tags][0]", "p"),
                ("inner[tags][1]", "q"),
                ("empty", ""),
                ("missing", ""),
            ]
        );
    }

    #[test]
    fn array_formats() {
        let data = BTreeMap::from([("a", vec![1, 2])]);
        let serialize = |format| {
            Config::new()
                .array_format(format)
                .serialize_string(&data)
                .unwrap()
        };
        assert_eq!(serialize(ArrayFormat::Indexed), "a[0]=1&a[1]=2");
        assert_eq!(serialize(ArrayFormat::EmptyIndexed), "a[]=1&a[]=2");
        assert_eq!(serialize(ArrayFormat::Unindexed), "a=1&a=2");
    }

    #[test]
    fn scalars() {
        #[derive(Serialize)]
        struct Scalars {
            t: bool,
            f: bool,
            i: i64,
            u: u64,
            x: f64,
            c: char,
            unit: (),
        }
        let s = Scalars {
            t: true,
            f: false,
            i: i64::MIN,
            u: u64::MAX,
            x: 1.5,
            c: 'z',
            unit: (),
        };
        assert_eq!(
            to_string(&s).unwrap(),
            "t=true&f=false&i=-9223372036854775808&u=18446744073709551615&x=1.5&c=z&unit="
        );
    }

    #[test]
    fn root_shapes() {
        assert!(matches!(to_string(&1u8), Err(Error::InvalidArgument(_))));
        assert!(matches!(to_string(&None::<u8>), Err(Error::InvalidArgument(_))));
        assert!(matches!(to_string(&vec![1, 2]), Err(Error::InvalidArgument(_))));
        assert!(matches!(to_string(&()), Err(Error::InvalidArgument(_))));
        assert_eq!(to_string("a=b c").unwrap(), "a=b+c");
        assert_eq!(to_string(&BTreeMap::<String, u8>::new()).unwrap(), "");
        assert!(matches!(to_pairs("a=b"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn map_keys_must_be_strings() {
        let err = to_string(&BTreeMap::from([(1, "a")])).unwrap_err();
        assert!(matches!(err, Error::MapKeyTypeError(_)), "got: {err:?}");

        #[derive(Serialize, PartialEq, Eq, PartialOrd, Ord)]
        #[serde(rename_all = "lowercase")]
        enum Key {
            Alpha,
        }
        assert_eq!(to_string(&BTreeMap::from([(Key::Alpha, 1)])).unwrap(), "alpha=1");
    }

    #[test]
    fn data_carrying_variants_are_unsupported() {
        #[derive(Serialize)]
        enum Shape {
            Circle(u8),
        }
        let err = to_string(&BTreeMap::from([("s", Shape::Circle(1))])).unwrap_err();
        assert!(matches!(err, Error::TypeUnsupported(_)), "got: {err:?}");
    }

    #[test]
    fn serializer_into_inner() {
        let mut serializer = QsSerializer::new(Vec::new(), Config::default());
        serde::Serialize::serialize(&BTreeMap::from([("k", "v")]), &mut serializer).unwrap();
        assert_eq!(
            serializer.into_inner(),
            vec![("k".to_string(), "v".to_string())]
        );
    }
}
