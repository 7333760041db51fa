use std::cmp::Ordering;
use std::fmt;

use crate::types::chunk::CompareOp;
use crate::Value;

impl Value {
    /// Interprets the value as a condition.
    ///
    /// Returns `None` if the value has no truth value, i.e. a function.
    pub(crate) fn as_bool(&self) -> Option<bool> {
        match self {
            Value::None => Some(false),
            Value::Bool(b) => Some(*b),
            Value::Integer(n) => Some(*n != 0),
            Value::Float(n) => Some(*n != 0.0),
            Value::String(s) => Some(!s.is_empty()),
            Value::List(list) => Some(!list.is_empty()),
            Value::Map(map) => Some(!map.is_empty()),
            Value::Record(_) | Value::Object(_) => Some(true),
            Value::Func(_) => None,
        }
    }
}

/// Compares two values.
///
/// Two integers or two floats compare numerically, anything else compares
/// the rendered text, so `"10" < "9"`.
pub fn compare(op: CompareOp, lhs: &Value, rhs: &Value) -> bool {
    let ord = match (lhs, rhs) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        _ => Some(lhs.to_string().cmp(&rhs.to_string())),
    };
    match op {
        CompareOp::Equal => ord == Some(Ordering::Equal),
        CompareOp::NotEqual => ord != Some(Ordering::Equal),
        CompareOp::Less => ord == Some(Ordering::Less),
        CompareOp::LessEqual => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
        CompareOp::Greater => ord == Some(Ordering::Greater),
        CompareOp::GreaterEqual => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
    }
}

/// Formats the value the way it is rendered into a template.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::List(list) => {
                f.write_str("[")?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => fmt_entries(f, map.iter().map(|(k, v)| (k.as_str(), v))),
            Value::Record(record) => fmt_entries(f, record.fields()),
            Value::Object(_) => f.write_str("[object]"),
            Value::Func(_) => f.write_str("[function]"),
        }
    }
}

fn fmt_entries<'a, I>(f: &mut fmt::Formatter<'_>, entries: I) -> fmt::Result
where
    I: Iterator<Item = (&'a str, &'a Value)>,
{
    f.write_str("{")?;
    for (i, (key, value)) in entries.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{key}: {value}")?;
    }
    f.write_str("}")
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{value, Func, Record};

    #[test]
    fn value_as_bool() {
        assert_eq!(Value::None.as_bool(), Some(false));
        assert_eq!(Value::from(0).as_bool(), Some(false));
        assert_eq!(Value::from(0.5).as_bool(), Some(true));
        assert_eq!(Value::from("").as_bool(), Some(false));
        assert_eq!(Value::from("x").as_bool(), Some(true));
        assert_eq!(Value::from(Vec::<i32>::new()).as_bool(), Some(false));
        assert_eq!(Value::from(Record::new("Page")).as_bool(), Some(true));
        assert_eq!(Value::from(Func::new(|_| Value::None)).as_bool(), None);
    }

    #[test]
    fn value_compare_numeric_and_text() {
        assert!(compare(CompareOp::Less, &Value::from(1), &Value::from(2)));
        assert!(compare(CompareOp::Less, &Value::from(9), &Value::from(10)));
        assert!(compare(CompareOp::Less, &Value::from("10"), &Value::from("9")));
        assert!(compare(CompareOp::Equal, &Value::from(1), &Value::from("1")));
        assert!(compare(CompareOp::GreaterEqual, &Value::from(2.5), &Value::from(2.5)));
        assert!(compare(CompareOp::NotEqual, &Value::from(f64::NAN), &Value::from(f64::NAN)));
    }

    #[test]
    fn value_display() {
        let value = value! {
            Items: [1, "two", true],
            Empty: (),
        };
        assert_eq!(value.to_string(), "{Empty: , Items: [1, two, true]}");
        let record = Record::new("Page").field("Title", "Home").field("ID", 1);
        assert_eq!(Value::from(record).to_string(), "{Title: Home, ID: 1}");
    }
}
