//! Source text for scripts
//!
//! A script is constructed from any value; non-text values are stored as
//! their JavaScript string conversion.

use crate::value::number_to_string;
use serde_json::Value;
use std::fmt;

/// Text of a script, coerced from whatever the caller supplied
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SourceText(String);

impl SourceText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SourceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceText {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SourceText {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&String> for SourceText {
    fn from(s: &String) -> Self {
        Self(s.clone())
    }
}

impl From<bool> for SourceText {
    fn from(b: bool) -> Self {
        Self(b.to_string())
    }
}

impl From<f64> for SourceText {
    fn from(n: f64) -> Self {
        Self(number_to_string(n))
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for SourceText {
                fn from(n: $ty) -> Self {
                    Self(n.to_string())
                }
            }
        )*
    };
}

impl_from_integer!(i32, i64, u32, u64, usize);

impl From<&Value> for SourceText {
    fn from(value: &Value) -> Self {
        Self(coerce_json(value))
    }
}

impl From<Value> for SourceText {
    fn from(value: Value) -> Self {
        Self::from(&value)
    }
}

/// JavaScript `String(value)` for JSON-shaped values
fn coerce_json(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(u)) => u.to_string(),
            _ => number_to_string(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => s.clone(),
        // Array.prototype.toString joins elements, with null as empty
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => coerce_json(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}
