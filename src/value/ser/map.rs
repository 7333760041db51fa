use serde::ser::{Error as _, Serialize};

use crate::value::ser::tagged;
use crate::value::{Map, Record};
use crate::{to_value, Error, Result, Value};

/// Collects map entries into a [`Value::Map`].
///
/// Template names are strings so only keys that serialize to a string are
/// accepted, this includes `char` and unit enum variants.
#[derive(Default)]
pub struct SerializeMap {
    entries: Map<String, Value>,
    pending: Option<String>,
}

/// Collects struct fields into a [`Record`] named after the struct.
///
/// A struct variant becomes a record named after the variant, wrapped in a
/// one entry map keyed by that name.
pub struct SerializeRecord {
    record: Record,
    is_variant: bool,
}

impl SerializeRecord {
    pub fn new(name: &str) -> Self {
        Self {
            record: Record::new(name),
            is_variant: false,
        }
    }

    pub fn variant(name: &str) -> Self {
        Self {
            record: Record::new(name),
            is_variant: true,
        }
    }

    fn finish(self) -> Value {
        if self.is_variant {
            let name = self.record.name().to_owned();
            tagged(&name, Value::from(self.record))
        } else {
            Value::from(self.record)
        }
    }
}

fn to_key<T>(key: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    match to_value(key) {
        Ok(Value::String(key)) => Ok(key),
        Ok(other) => Err(Error::custom(format!(
            "map key must be a string, found {}",
            other.human()
        ))),
        Err(_) => Err(Error::custom("map key must be a string")),
    }
}

impl serde::ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.pending = Some(to_key(key)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match self.pending.take() {
            Some(key) => {
                self.entries.insert(key, to_value(value)?);
                Ok(())
            }
            None => Err(Error::custom("map value serialized before its key")),
        }
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Map(self.entries))
    }
}

impl serde::ser::SerializeStruct for SerializeRecord {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.record.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl serde::ser::SerializeStructVariant for SerializeRecord {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        serde::ser::SerializeStruct::serialize_field(self, key, value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}
