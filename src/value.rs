//! Conversions from the crate's types into template [`Value`]s. Page data is
//! always a plain [`Value::Object`]; dates are carried as RFC 3339 strings
//! and formatted by the theme's date functions ([`crate::theme`]).

use crate::entry::Entry;
use gtmpl_value::Value;
use std::collections::HashMap;

impl From<&Entry> for Value {
    fn from(e: &Entry) -> Value {
        object(vec![
            ("title", (&e.title).into()),
            ("link", Value::String(e.link.to_string())),
            ("path", Value::String(e.output_path().to_string_lossy().into_owned())),
            ("date", Value::String(e.date.to_rfc3339())),
            ("year", Value::String(e.year())),
            ("month", Value::String(e.month_number())),
            ("month_name", Value::String(e.month_name())),
            (
                "tags",
                Value::Array(e.tags.iter().map(|t| t.into()).collect()),
            ),
            ("body", (&e.body).into()),
        ])
    }
}

/// Converts a list of entry references into a [`Value::Array`], preserving
/// order.
pub fn entries(entries: &[&Entry]) -> Value {
    Value::Array(entries.iter().map(|&e| Value::from(e)).collect())
}

/// Builds a [`Value::Object`] from `(field, value)` pairs.
pub fn object(fields: Vec<(&str, Value)>) -> Value {
    let m: HashMap<String, Value> = fields
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect();
    Value::Object(m)
}

/// Converts a count into a [`Value::Number`].
pub fn count(n: usize) -> Value {
    Value::from(n as i64)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entry::test::entry;

    fn field<'a>(value: &'a Value, field: &str) -> Option<&'a Value> {
        match value {
            Value::Object(m) => m.get(field),
            _ => None,
        }
    }

    #[test]
    fn test_entry_value_fields() {
        let e = entry("Hello", "2020-01-05T10:30:00Z", &["go", "blog"]);
        let v = Value::from(&e);
        assert_eq!(field(&v, "title"), Some(&Value::from("Hello")));
        assert_eq!(
            field(&v, "date"),
            Some(&Value::from("2020-01-05T10:30:00+00:00"))
        );
        assert_eq!(field(&v, "month"), Some(&Value::from("01")));
        assert_eq!(field(&v, "path"), Some(&Value::from("hello.html")));
        match field(&v, "tags") {
            Some(Value::Array(tags)) => assert_eq!(tags.len(), 2),
            other => panic!("unexpected tags value: {:?}", other),
        }
    }
}
