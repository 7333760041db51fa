use serde::ser::Serialize;

use crate::value::ser::tagged;
use crate::value::List;
use crate::{to_value, Error, Result, Value};

/// Collects elements into a [`Value::List`].
///
/// Used for sequences, tuples and tuple structs. For a tuple variant the list
/// is wrapped in a one entry map keyed by the variant name.
pub struct SerializeSeq {
    items: List<Value>,
    variant: Option<&'static str>,
}

impl SerializeSeq {
    pub fn new(len: usize, variant: Option<&'static str>) -> Self {
        Self {
            items: List::with_capacity(len),
            variant,
        }
    }

    fn push<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.items.push(to_value(value)?);
        Ok(())
    }

    fn finish(self) -> Result<Value> {
        let list = Value::List(self.items);
        Ok(match self.variant {
            Some(name) => tagged(name, list),
            None => list,
        })
    }
}

macro_rules! impl_seq {
    ($($serialize:ident::$method:ident),+) => {
        $(
            impl serde::ser::$serialize for SerializeSeq {
                type Ok = Value;
                type Error = Error;

                fn $method<T>(&mut self, value: &T) -> Result<()>
                where
                    T: ?Sized + Serialize,
                {
                    self.push(value)
                }

                fn end(self) -> Result<Value> {
                    self.finish()
                }
            }
        )+
    };
}

impl_seq! {
    SerializeSeq::serialize_element,
    SerializeTuple::serialize_element,
    SerializeTupleStruct::serialize_field,
    SerializeTupleVariant::serialize_field
}
