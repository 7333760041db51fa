/// Builds a [`Value`][crate::Value] for use as a render context.
///
/// Invoked with named entries, the outer braces of the root map can be left
/// off. Each entry is `Name: value` where the value is one of
///
/// - `None`,
/// - a nested map `{ Name: value, ... }`,
/// - a list `[value, ...]`,
/// - a record `TypeName { Name: value, ... }`, which becomes a
///   [`Record`][crate::Record] with the fields in the order given,
/// - any other expression that converts into a `Value`.
///
/// # Examples
///
/// ```
/// use ssviewer::{value, Value};
///
/// let ctx = value! {
///     Title: "Home",
///     Menu: [
///         Page { Title: "About", ID: 2 },
///         Page { Title: "Contact", ID: 3 },
///     ],
///     Parent: None,
/// };
///
/// match ctx {
///     Value::Map(map) => match &map["Menu"] {
///         Value::List(pages) => assert_eq!(pages.len(), 2),
///         other => panic!("{other:?}"),
///     },
///     other => panic!("{other:?}"),
/// }
/// ```
#[macro_export]
macro_rules! value {
    // Entries of a map or record, collected as `(String, Value)` pairs.
    (@fields [$($done:expr,)*]) => {
        [$($done,)*]
    };
    (@fields [$($done:expr,)*] $key:ident : None $(, $($rest:tt)*)?) => {
        $crate::value!(@fields [$($done,)* $crate::value!(@pair $key $crate::Value::None),] $($($rest)*)?)
    };
    (@fields [$($done:expr,)*] $key:ident : [$($list:tt)*] $(, $($rest:tt)*)?) => {
        $crate::value!(@fields [$($done,)* $crate::value!(@pair $key $crate::value!([$($list)*])),] $($($rest)*)?)
    };
    (@fields [$($done:expr,)*] $key:ident : {$($map:tt)*} $(, $($rest:tt)*)?) => {
        $crate::value!(@fields [$($done,)* $crate::value!(@pair $key $crate::value!({$($map)*})),] $($($rest)*)?)
    };
    (@fields [$($done:expr,)*] $key:ident : $name:ident {$($body:tt)*} $(, $($rest:tt)*)?) => {
        $crate::value!(@fields [$($done,)* $crate::value!(@pair $key $crate::value!($name {$($body)*})),] $($($rest)*)?)
    };
    (@fields [$($done:expr,)*] $key:ident : $value:expr $(, $($rest:tt)*)?) => {
        $crate::value!(@fields [$($done,)* $crate::value!(@pair $key $crate::Value::from($value)),] $($($rest)*)?)
    };
    (@pair $key:ident $value:expr) => {
        (::std::string::String::from(stringify!($key)), $value)
    };

    // Elements of a list.
    (@items [$($done:expr,)*]) => {
        ::std::vec![$($done,)*]
    };
    (@items [$($done:expr,)*] None $(, $($rest:tt)*)?) => {
        $crate::value!(@items [$($done,)* $crate::Value::None,] $($($rest)*)?)
    };
    (@items [$($done:expr,)*] [$($list:tt)*] $(, $($rest:tt)*)?) => {
        $crate::value!(@items [$($done,)* $crate::value!([$($list)*]),] $($($rest)*)?)
    };
    (@items [$($done:expr,)*] {$($map:tt)*} $(, $($rest:tt)*)?) => {
        $crate::value!(@items [$($done,)* $crate::value!({$($map)*}),] $($($rest)*)?)
    };
    (@items [$($done:expr,)*] $name:ident {$($body:tt)*} $(, $($rest:tt)*)?) => {
        $crate::value!(@items [$($done,)* $crate::value!($name {$($body)*}),] $($($rest)*)?)
    };
    (@items [$($done:expr,)*] $item:expr $(, $($rest:tt)*)?) => {
        $crate::value!(@items [$($done,)* $crate::Value::from($item),] $($($rest)*)?)
    };

    () => {
        $crate::Value::Map($crate::Map::new())
    };
    (None) => {
        $crate::Value::None
    };
    ([]) => {
        $crate::Value::List($crate::List::new())
    };
    ([$($tt:tt)+]) => {
        $crate::Value::List($crate::value!(@items [] $($tt)+))
    };
    ({}) => {
        $crate::Value::Map($crate::Map::new())
    };
    ({$($tt:tt)+}) => {{
        let mut map = $crate::Map::new();
        map.extend($crate::value!(@fields [] $($tt)+));
        $crate::Value::Map(map)
    }};
    ($name:ident {}) => {
        $crate::Value::from($crate::Record::new(stringify!($name)))
    };
    ($name:ident {$($tt:tt)+}) => {{
        let mut record = $crate::Record::new(stringify!($name));
        record.extend($crate::value!(@fields [] $($tt)+));
        $crate::Value::from(record)
    }};
    ($key:ident : $($tt:tt)*) => {
        $crate::value!({ $key : $($tt)* })
    };
    ($other:expr) => {
        $crate::Value::from($other)
    };
}
