//! Defines the [`Value`] enum, representing any host data a template can be
//! rendered against.

mod from;
#[cfg(feature = "serde")]
mod ser;

pub use std::collections::BTreeMap as Map;
use std::fmt;
use std::mem;
use std::sync::Arc;
pub use std::vec::Vec as List;

#[cfg(feature = "serde")]
pub use crate::value::ser::to_value;

/// Data to be rendered represented as a recursive enum.
#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(List<Value>),
    Map(Map<String, Value>),
    /// A generic record: named fields plus callable methods.
    Record(Arc<Record>),
    /// A self-describing value that resolves names itself.
    Object(Arc<dyn Object>),
    /// A callable, invoked with the evaluated arguments of a reference.
    Func(Func),
}

/// A value that resolves symbols itself.
///
/// When a template references `$Name` or `$Name(args)` and the current
/// context is an object, resolution is delegated entirely to
/// [`get`][Object::get]. Returning [`Value::None`] means the name is absent,
/// which renders as nothing.
///
/// # Examples
///
/// ```
/// use ssviewer::{Object, Value};
///
/// struct Counter(i64);
///
/// impl Object for Counter {
///     fn get(&self, name: &str, args: &[Value]) -> Value {
///         match (name, args) {
///             ("Count", []) => Value::Integer(self.0),
///             ("Plus", [Value::Integer(n)]) => Value::Integer(self.0 + n),
///             _ => Value::None,
///         }
///     }
/// }
/// ```
pub trait Object: Send + Sync {
    /// Resolve `name` called with `args`.
    fn get(&self, name: &str, args: &[Value]) -> Value;

    /// The ordered items to iterate when this object is used as a loop
    /// context, e.g. the rows of a data list.
    fn items(&self) -> Option<List<Value>> {
        None
    }
}

/// A named record with ordered fields and methods.
///
/// Methods are probed before fields when a name is resolved against a record.
#[derive(Clone, Default, PartialEq)]
pub struct Record {
    name: String,
    fields: List<(String, Value)>,
    methods: Map<String, Func>,
}

/// A host function callable from a template.
#[derive(Clone)]
pub struct Func(Arc<dyn Fn(&[Value]) -> Value + Send + Sync>);

impl Record {
    /// Construct an empty record with the given type name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: List::new(),
            methods: Map::new(),
        }
    }

    /// Add a field, replacing any existing field with the same name.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Add a method.
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Func::new(f));
        self
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name, value)),
        }
    }

    /// The type name of the record.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a field by name.
    pub fn get_field(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Look up a method by name.
    pub fn get_method(&self, name: &str) -> Option<&Func> {
        self.methods.get(name)
    }

    /// Iterate over the fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> Extend<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl Func {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.0)(args)
    }
}

impl Value {
    /// Returns a human readable name for the kind of value.
    pub(crate) fn human(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
            Value::Object(_) => "object",
            Value::Func(_) => "function",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::None
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(s), Self::Bool(o)) => s == o,
            (Self::Integer(s), Self::Integer(o)) => s == o,
            (Self::Float(s), Self::Float(o)) => s == o,
            (Self::String(s), Self::String(o)) => s == o,
            (Self::List(s), Self::List(o)) => s == o,
            (Self::Map(s), Self::Map(o)) => s == o,
            (Self::Record(s), Self::Record(o)) => s == o,
            (Self::Object(s), Self::Object(o)) => Arc::ptr_eq(s, o),
            (Self::Func(s), Self::Func(o)) => s == o,
            _ => mem::discriminant(self) == mem::discriminant(other),
        }
    }
}

impl PartialEq for Func {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Integer(i) => f.debug_tuple("Integer").field(i).finish(),
            Self::Float(n) => f.debug_tuple("Float").field(n).finish(),
            Self::String(s) => f.debug_tuple("String").field(s).finish(),
            Self::List(l) => f.debug_tuple("List").field(l).finish(),
            Self::Map(m) => f.debug_tuple("Map").field(m).finish(),
            Self::Record(r) => fmt::Debug::fmt(r, f),
            Self::Object(_) => f.write_str("Object(..)"),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Record");
        d.field("name", &self.name);
        d.field("fields", &self.fields);
        d.field("methods", &self.methods.keys());
        d.finish()
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Func(..)")
    }
}
