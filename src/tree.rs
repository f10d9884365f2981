//! Type tags and value helpers for the JSON trees being compared.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// The JSON type of a value, as used to select a comparison strategy.
///
/// Integers and non-integral numbers are distinct tags so that rules can
/// single out one or the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl JsonType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonType::Null,
            Value::Bool(_) => JsonType::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => JsonType::Integer,
            Value::Number(_) => JsonType::Number,
            Value::String(_) => JsonType::String,
            Value::Array(_) => JsonType::Array,
            Value::Object(_) => JsonType::Object,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            JsonType::Null => "null",
            JsonType::Boolean => "boolean",
            JsonType::Integer => "integer",
            JsonType::Number => "number",
            JsonType::String => "string",
            JsonType::Array => "array",
            JsonType::Object => "object",
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, JsonType::Array | JsonType::Object)
    }
}

impl std::fmt::Display for JsonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Type tag of an optional value; `None` means the key is absent.
pub fn type_of(value: Option<&Value>) -> Option<JsonType> {
    value.map(JsonType::of)
}

/// Checks if two values are semantically equal (ignores key ordering, `1 == 1.0`).
pub fn semantic_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::Object(a), Value::Object(b)) => {
            if a.len() != b.len() {
                return false;
            }
            a.iter()
                .all(|(key, value)| b.get(key).is_some_and(|v| semantic_equals(value, v)))
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b.iter())
                    .all(|(item_a, item_b)| semantic_equals(item_a, item_b))
        }
        _ => false,
    }
}

/// Exact numeric equality. Two integers compare without going through
/// `f64`; as soon as one side is fractional both are compared as `f64`.
pub fn numbers_equal(a: &Number, b: &Number) -> bool {
    match (as_integer(a), as_integer(b)) {
        (Some(x), Some(y)) => x == y,
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
    }
}

fn as_integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

/// Compact single-line JSON, the form every value takes in rendered output.
pub fn to_compact(value: &Value) -> String {
    value.to_string()
}

/// Text substituted into combination templates: strings without quotes,
/// everything else as compact JSON.
pub fn to_template_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => to_compact(other),
    }
}
