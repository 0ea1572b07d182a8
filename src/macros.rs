/// Builds a [`Value`](crate::Value) from a JSON-like literal.
///
/// Keys must be string literals. Negative numbers and other multi-token
/// expressions need parentheses when they appear as array elements or
/// table values.
///
/// ```rust
/// use serde_tomlet::{toml, Value};
///
/// let value = toml!({
///     "title": "example",
///     "ratio": (-0.3),
///     "ports": [8000, 8001],
///     "owner": { "active": true }
/// });
/// assert_eq!(value.pointer(&["owner", "active"]), Some(&Value::Boolean(true)));
/// ```
#[macro_export]
macro_rules! toml {
    (true) => {
        $crate::Value::Boolean(true)
    };

    (false) => {
        $crate::Value::Boolean(false)
    };

    ([]) => {
        $crate::Value::Array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![$($crate::toml!($elem)),*])
    };

    ({}) => {
        $crate::Value::Table($crate::Table::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut table = $crate::Table::new();
        $(
            table.insert($key.to_string(), $crate::toml!($value));
        )*
        $crate::Value::Table(table)
    }};

    ($s:expr) => {
        $crate::Value::from($s)
    };
}

#[cfg(test)]
mod tests {
    use crate::{Table, Value};

    #[test]
    fn test_toml_macro_primitives() {
        assert_eq!(toml!(true), Value::Boolean(true));
        assert_eq!(toml!(false), Value::Boolean(false));
        assert_eq!(toml!(42), Value::Integer(42));
        assert_eq!(toml!(3.5), Value::Float(3.5));
        assert_eq!(toml!((-2)), Value::Integer(-2));
        assert_eq!(toml!("hello"), Value::String("hello".to_string()));
    }

    #[test]
    fn test_toml_macro_arrays() {
        assert_eq!(toml!([]), Value::Array(vec![]));
        assert_eq!(
            toml!([[1, 2], [], [true]]),
            Value::Array(vec![
                Value::Array(vec![Value::Integer(1), Value::Integer(2)]),
                Value::Array(vec![]),
                Value::Array(vec![Value::Boolean(true)]),
            ])
        );
    }

    #[test]
    fn test_toml_macro_tables_keep_order() {
        assert_eq!(toml!({}), Value::Table(Table::new()));

        let Value::Table(table) = toml!({
            "name": "Alice",
            "age": 30,
            "b.c": { "e": 5 }
        }) else {
            panic!("Expected table");
        };
        let keys: Vec<_> = table.keys().cloned().collect();
        assert_eq!(keys, vec!["name", "age", "b.c"]);
        assert_eq!(table.get("age"), Some(&Value::Integer(30)));
    }
}
