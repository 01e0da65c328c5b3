use std::num::IntErrorKind;

use serde::de::{self, IntoDeserializer, Unexpected};

use crate::error::{Error, Result};

/// Deserializes a single querystring token into a scalar.
///
/// Integers are parsed in base 10 and range checked against the requested
/// width. Booleans accept `true`/`false` and `1`/`0`. Anything that is not a
/// scalar request falls back to the raw string.
pub(crate) struct LeafDeserializer(pub String);

/// Parses a base-10 integer, separating malformed text from values that
/// are well-formed but do not fit.
fn parse_integer<T>(value: &str, expected: &'static str) -> Result<T>
where
    T: TryFrom<i128>,
{
    let wide = value.parse::<i128>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            Error::out_of_range(expected, value)
        }
        _ => Error::mismatch(expected, value),
    })?;
    T::try_from(wide).map_err(|_| Error::out_of_range(expected, value))
}

macro_rules! deserialize_integer {
    ($($ty:ident => $method:ident, $visit:ident,)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: de::Visitor<'de>,
            {
                visitor.$visit(parse_integer::<$ty>(&self.0, stringify!($ty))?)
            }
        )*
    };
}

macro_rules! deserialize_float {
    ($($ty:ident => $method:ident, $visit:ident,)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: de::Visitor<'de>,
            {
                match self.0.parse::<$ty>() {
                    Ok(val) => visitor.$visit(val),
                    Err(_) => Err(Error::mismatch(stringify!($ty), &self.0)),
                }
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for LeafDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_string(self.0)
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.0.as_str() {
            "0" | "false" => visitor.visit_bool(false),
            "1" | "true" => visitor.visit_bool(true),
            _ => Err(Error::mismatch("bool", &self.0)),
        }
    }

    deserialize_integer! {
        i8 => deserialize_i8, visit_i8,
        i16 => deserialize_i16, visit_i16,
        i32 => deserialize_i32, visit_i32,
        i64 => deserialize_i64, visit_i64,
        u8 => deserialize_u8, visit_u8,
        u16 => deserialize_u16, visit_u16,
        u32 => deserialize_u32, visit_u32,
        u64 => deserialize_u64, visit_u64,
    }

    deserialize_float! {
        f32 => deserialize_f32, visit_f32,
        f64 => deserialize_f64, visit_f64,
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let mut chars = self.0.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(Error::mismatch("char", &self.0)),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if self.0.is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if self.0.is_empty() {
            visitor.visit_unit()
        } else {
            Err(Error::mismatch("unit", &self.0))
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

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_enum(self)
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

    fn deserialize_seq<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::mismatch("list", &self.0))
    }

    fn deserialize_tuple<V>(self, len: usize, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::mismatch(format!("array of length {len}"), &self.0))
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

    fn deserialize_map<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::mismatch("map", &self.0))
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::mismatch(name, &self.0))
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    serde::forward_to_deserialize_any! {
        str string identifier
    }
}

impl<'de> de::EnumAccess<'de> for LeafDeserializer {
    type Error = Error;
    type Variant = UnitOnly;

    fn variant_seed<T>(self, seed: T) -> Result<(T::Value, Self::Variant)>
    where
        T: de::DeserializeSeed<'de>,
    {
        let name: de::value::StringDeserializer<Error> = self.0.into_deserializer();
        let variant = seed.deserialize(name)?;
        Ok((variant, UnitOnly))
    }
}

/// Variant access for enums written as a bare variant name.
pub(crate) struct UnitOnly;

impl<'de> de::VariantAccess<'de> for UnitOnly {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<T>(self, _seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        Err(de::Error::invalid_type(
            Unexpected::UnitVariant,
            &"newtype variant",
        ))
    }

    fn tuple_variant<V>(self, _len: usize, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(de::Error::invalid_type(
            Unexpected::UnitVariant,
            &"tuple variant",
        ))
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(de::Error::invalid_type(
            Unexpected::UnitVariant,
            &"struct variant",
        ))
    }
}
