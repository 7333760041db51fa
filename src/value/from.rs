//! Conversions from host data into [`Value`].

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::value::{Func, List, Map, Object, Record};
use crate::Value;

macro_rules! convert {
    ($($ty:ty => |$v:ident| $make:expr;)+) => {
        $(
            impl From<$ty> for Value {
                fn from($v: $ty) -> Self {
                    $make
                }
            }
        )+
    };
}

convert! {
    () => |_unit| Value::None;
    bool => |b| Value::Bool(b);
    i8 => |n| Value::Integer(n.into());
    i16 => |n| Value::Integer(n.into());
    i32 => |n| Value::Integer(n.into());
    i64 => |n| Value::Integer(n);
    u8 => |n| Value::Integer(n.into());
    u16 => |n| Value::Integer(n.into());
    u32 => |n| Value::Integer(n.into());
    f32 => |n| Value::Float(n.into());
    f64 => |n| Value::Float(n);
    String => |s| Value::String(s);
    &str => |s| Value::String(s.to_owned());
    Cow<'_, str> => |s| Value::String(s.into_owned());
    Record => |record| Value::Record(Arc::new(record));
    Func => |func| Value::Func(func);
}

/// Shared objects are passed through without copying.
impl<T> From<Arc<T>> for Value
where
    T: Object + 'static,
{
    fn from(object: Arc<T>) -> Self {
        Value::Object(object)
    }
}

impl<V> From<Option<V>> for Value
where
    V: Into<Value>,
{
    fn from(opt: Option<V>) -> Self {
        opt.map_or(Value::None, Into::into)
    }
}

impl<V> From<Vec<V>> for Value
where
    V: Into<Value>,
{
    fn from(items: Vec<V>) -> Self {
        items.into_iter().collect()
    }
}

impl<V, const N: usize> From<[V; N]> for Value
where
    V: Into<Value>,
{
    fn from(items: [V; N]) -> Self {
        items.into_iter().collect()
    }
}

impl<V> FromIterator<V> for Value
where
    V: Into<Value>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = V>,
    {
        Value::List(iter.into_iter().map(Into::into).collect::<List<_>>())
    }
}

impl<K, V> From<BTreeMap<K, V>> for Value
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(entries: BTreeMap<K, V>) -> Self {
        map_from(entries)
    }
}

impl<K, V> From<HashMap<K, V>> for Value
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(entries: HashMap<K, V>) -> Self {
        map_from(entries)
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Value
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(entries: [(K, V); N]) -> Self {
        map_from(entries)
    }
}

fn map_from<I, K, V>(entries: I) -> Value
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    Value::Map(
        entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<Map<_, _>>(),
    )
}
