mod map;
mod seq;

use serde::ser::{Error as _, Serialize, SerializeMap as _};

use crate::value::ser::map::{SerializeMap, SerializeRecord};
use crate::value::ser::seq::SerializeSeq;
use crate::value::Map;
use crate::{Error, Result, Value};

/// Convert a `T` to a `Value`.
///
/// Structs become [`Record`][crate::Record]s that keep the struct name and
/// the field order, so `$Title` resolves against a serialized page the same
/// way it would against a hand built record. Maps become [`Value::Map`] and
/// must have string keys, sequences and tuples become [`Value::List`].
/// Unit variants render as their name, other variants become a one entry map
/// keyed by the variant name.
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
pub fn to_value<T>(value: T) -> Result<Value>
where
    T: Serialize,
{
    value.serialize(Serializer)
}

/// Objects and functions have no data representation and serialize as unit.
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Value::None | Value::Object(_) | Value::Func(_) => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => serializer.collect_seq(items),
            Value::Map(entries) => serializer.collect_map(entries),
            Value::Record(record) => {
                let mut m = serializer.serialize_map(None)?;
                for (name, value) in record.fields() {
                    m.serialize_entry(name, value)?;
                }
                m.end()
            }
        }
    }
}

/// Wraps `value` in a one entry map keyed by an enum variant name.
fn tagged(variant: &str, value: Value) -> Value {
    let mut entries = Map::new();
    entries.insert(variant.to_owned(), value);
    Value::Map(entries)
}

fn integer<T>(n: T) -> Result<Value>
where
    T: TryInto<i64>,
{
    n.try_into()
        .map(Value::Integer)
        .map_err(|_| Error::custom("out of range integral type conversion attempted"))
}

/// Serializer whose output is a `Value`.
pub struct Serializer;

impl serde::Serializer for Serializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeSeq;
    type SerializeTuple = SerializeSeq;
    type SerializeTupleStruct = SerializeSeq;
    type SerializeTupleVariant = SerializeSeq;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeRecord;
    type SerializeStructVariant = SerializeRecord;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        integer(v)
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        integer(v)
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        integer(v)
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        integer(v)
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        integer(v)
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        integer(v)
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        integer(v)
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        integer(v)
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(v.iter().copied().collect())
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::None)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::None)
    }

    fn serialize_unit_struct(self, _: &'static str) -> Result<Value> {
        Ok(Value::None)
    }

    fn serialize_unit_variant(self, _: &'static str, _: u32, variant: &'static str) -> Result<Value> {
        Ok(Value::from(variant))
    }

    fn serialize_newtype_struct<T>(self, _: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        Ok(tagged(variant, to_value(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeSeq> {
        Ok(SerializeSeq::new(len.unwrap_or_default(), None))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeSeq> {
        Ok(SerializeSeq::new(len, None))
    }

    fn serialize_tuple_struct(self, _: &'static str, len: usize) -> Result<SerializeSeq> {
        Ok(SerializeSeq::new(len, None))
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeSeq> {
        Ok(SerializeSeq::new(len, Some(variant)))
    }

    fn serialize_map(self, _: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::default())
    }

    fn serialize_struct(self, name: &'static str, _: usize) -> Result<SerializeRecord> {
        Ok(SerializeRecord::new(name))
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
        _: usize,
    ) -> Result<SerializeRecord> {
        Ok(SerializeRecord::variant(variant))
    }
}
