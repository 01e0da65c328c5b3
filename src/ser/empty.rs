use serde::ser::{self, Serialize};

use crate::error::{Error, Result};

/// Returns `true` if `value` holds the zero value of its shape.
///
/// Meant for `#[serde(skip_serializing_if = "serde_qstring::is_empty")]`,
/// which omits a field instead of writing `field=`:
///
/// - `false`, `0`, `0.0` and `""` are empty
/// - `None`, `()` and empty lists and maps are empty
/// - `Some(_)`, structs and enum variants are never empty
///
/// ```
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Query {
///     #[serde(skip_serializing_if = "serde_qstring::is_empty")]
///     a: String,
///     b: String,
/// }
///
/// let q = Query { a: String::new(), b: String::new() };
/// assert_eq!(serde_qstring::to_string(&q).unwrap(), "b=");
/// ```
pub fn is_empty<T: Serialize + ?Sized>(value: &T) -> bool {
    value.serialize(EmptyProbe).unwrap_or(false)
}

/// Answers whether a value is empty without serializing its contents.
struct EmptyProbe;

/// Compound values are empty until their first element.
struct EmptyCompound(bool);

macro_rules! probe_zero {
    ($($ty:ty => $method:ident,)*) => {
        $(
            fn $method(self, v: $ty) -> Result<bool> {
                Ok(v == <$ty>::default())
            }
        )*
    };
}

impl ser::Serializer for EmptyProbe {
    type Ok = bool;
    type Error = Error;
    type SerializeSeq = EmptyCompound;
    type SerializeTuple = EmptyCompound;
    type SerializeTupleStruct = EmptyCompound;
    type SerializeTupleVariant = EmptyCompound;
    type SerializeMap = EmptyCompound;
    type SerializeStruct = EmptyCompound;
    type SerializeStructVariant = EmptyCompound;

    probe_zero! {
        bool => serialize_bool,
        i8 => serialize_i8,
        i16 => serialize_i16,
        i32 => serialize_i32,
        i64 => serialize_i64,
        i128 => serialize_i128,
        u8 => serialize_u8,
        u16 => serialize_u16,
        u32 => serialize_u32,
        u64 => serialize_u64,
        u128 => serialize_u128,
        f32 => serialize_f32,
        f64 => serialize_f64,
    }

    fn serialize_char(self, _v: char) -> Result<bool> {
        Ok(false)
    }

    fn serialize_str(self, v: &str) -> Result<bool> {
        Ok(v.is_empty())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<bool> {
        Ok(v.is_empty())
    }

    fn serialize_none(self) -> Result<bool> {
        Ok(true)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, _value: &T) -> Result<bool> {
        Ok(false)
    }

    fn serialize_unit(self) -> Result<bool> {
        Ok(true)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<bool> {
        Ok(false)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<bool> {
        Ok(false)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<bool> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<bool> {
        Ok(false)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<EmptyCompound> {
        Ok(EmptyCompound(len.is_none_or(|len| len == 0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<EmptyCompound> {
        Ok(EmptyCompound(len == 0))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<EmptyCompound> {
        Ok(EmptyCompound(len == 0))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<EmptyCompound> {
        Ok(EmptyCompound(false))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<EmptyCompound> {
        Ok(EmptyCompound(len.is_none_or(|len| len == 0)))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<EmptyCompound> {
        Ok(EmptyCompound(false))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<EmptyCompound> {
        Ok(EmptyCompound(false))
    }
}

impl ser::SerializeSeq for EmptyCompound {
    type Ok = bool;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, _value: &T) -> Result<()> {
        self.0 = false;
        Ok(())
    }

    fn end(self) -> Result<bool> {
        Ok(self.0)
    }
}

impl ser::SerializeTuple for EmptyCompound {
    type Ok = bool;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, _value: &T) -> Result<()> {
        self.0 = false;
        Ok(())
    }

    fn end(self) -> Result<bool> {
        Ok(self.0)
    }
}

impl ser::SerializeTupleStruct for EmptyCompound {
    type Ok = bool;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _value: &T) -> Result<()> {
        self.0 = false;
        Ok(())
    }

    fn end(self) -> Result<bool> {
        Ok(self.0)
    }
}

impl ser::SerializeTupleVariant for EmptyCompound {
    type Ok = bool;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _value: &T) -> Result<()> {
        Ok(())
    }

    fn end(self) -> Result<bool> {
        Ok(self.0)
    }
}

impl ser::SerializeMap for EmptyCompound {
    type Ok = bool;
    type Error = Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, _key: &T) -> Result<()> {
        self.0 = false;
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, _value: &T) -> Result<()> {
        Ok(())
    }

    fn end(self) -> Result<bool> {
        Ok(self.0)
    }
}

impl ser::SerializeStruct for EmptyCompound {
    type Ok = bool;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        _value: &T,
    ) -> Result<()> {
        Ok(())
    }

    fn end(self) -> Result<bool> {
        Ok(self.0)
    }
}

impl ser::SerializeStructVariant for EmptyCompound {
    type Ok = bool;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        _value: &T,
    ) -> Result<()> {
        Ok(())
    }

    fn end(self) -> Result<bool> {
        Ok(self.0)
    }
}
