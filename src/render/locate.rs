//! Resolves names against a context value.

use crate::Value;

/// The name retried when a symbol can't be resolved against a context.
const FALLBACK: &str = "Fallback";

/// Resolves `name` called with `args` against `context`.
///
/// An [`Object`][crate::Object] context resolves the name itself. Otherwise
/// a map is indexed by key, and a record is probed for a method and then a
/// field. If that finds nothing, or only [`Value::None`], the context's
/// `Fallback` is resolved and the lookup is retried against it. Zero values
/// such as `""`, `0` and `false` are found values and are not retried. A resolved function is called with the
/// arguments. Absent names resolve to [`Value::None`].
pub fn locate(context: &Value, name: &str, args: &[Value]) -> Value {
    let value = match context {
        Value::Object(object) => object.get(name, args),
        context => match lookup(context, name) {
            Some(value) if !value.is_none() => value,
            _ if name != FALLBACK => fallback(context, name, args),
            _ => Value::None,
        },
    };

    match value {
        Value::Func(f) => f.call(args),
        value => value,
    }
}

fn lookup(context: &Value, name: &str) -> Option<Value> {
    match context {
        Value::Map(map) => map.get(name).cloned(),
        Value::Record(record) => record
            .get_method(name)
            .cloned()
            .map(Value::Func)
            .or_else(|| record.get_field(name).cloned()),
        _ => None,
    }
}

fn fallback(context: &Value, name: &str, args: &[Value]) -> Value {
    let fallback = locate(context, FALLBACK, &[]);
    if fallback.is_none() {
        return Value::None;
    }
    tracing::trace!(name, "retrying against fallback");
    locate(&fallback, name, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::{value, Object, Record};

    #[test]
    fn locate_map_key() {
        let ctx = value! { Title: "Home" };
        assert_eq!(locate(&ctx, "Title", &[]), Value::from("Home"));
        assert_eq!(locate(&ctx, "Missing", &[]), Value::None);
    }

    #[test]
    fn locate_record_method_before_field() {
        let record = Record::new("Page")
            .field("Title", "field")
            .method("Title", |_| Value::from("method"))
            .method("Double", |args| match args {
                [Value::Integer(n)] => Value::Integer(n * 2),
                _ => Value::None,
            });
        let ctx = Value::from(record);
        assert_eq!(locate(&ctx, "Title", &[]), Value::from("method"));
        assert_eq!(locate(&ctx, "Double", &[Value::from(21)]), Value::from(42));
    }

    #[test]
    fn locate_fallback() {
        let ctx = value! {
            Title: "Child",
            Fallback: { SiteName: "Example", Title: "Parent" },
        };
        assert_eq!(locate(&ctx, "SiteName", &[]), Value::from("Example"));
        assert_eq!(locate(&ctx, "Title", &[]), Value::from("Child"));
        assert_eq!(locate(&ctx, "Missing", &[]), Value::None);
    }

    #[test]
    fn locate_fallback_keeps_zero_values() {
        let ctx = value! {
            Title: "",
            Count: 0,
            Hidden: false,
            Parent: None,
            Fallback: { Title: "Parent", Count: 5, Hidden: true, Parent: "Root" },
        };
        assert_eq!(locate(&ctx, "Title", &[]), Value::from(""));
        assert_eq!(locate(&ctx, "Count", &[]), Value::from(0));
        assert_eq!(locate(&ctx, "Hidden", &[]), Value::from(false));
        assert_eq!(locate(&ctx, "Parent", &[]), Value::from("Root"));
    }

    #[test]
    fn locate_object_delegates() {
        struct Greeter;

        impl Object for Greeter {
            fn get(&self, name: &str, args: &[Value]) -> Value {
                match (name, args) {
                    ("Greet", [Value::String(who)]) => Value::from(format!("Hello {who}")),
                    _ => Value::None,
                }
            }
        }

        let ctx = Value::from(Arc::new(Greeter));
        assert_eq!(
            locate(&ctx, "Greet", &[Value::from("World")]),
            Value::from("Hello World")
        );
        assert_eq!(locate(&ctx, "Other", &[]), Value::None);
    }
}
