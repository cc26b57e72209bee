//! Empty-value stripping
//!
//! `null`, `""`, `[]` and `{}` are treated as "not provided" and removed,
//! recursively. `false` and `0` are real values and survive. Removal is
//! post-order, so a container that only held empty values disappears too,
//! which makes the operation idempotent.

use serde_json::Value;

/// Whether `value` counts as absent.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Strip empty values. Returns `None` when `value` itself ends up empty.
pub fn remove_empty_values(value: Value) -> Option<Value> {
    let cleaned = match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter_map(|(k, v)| remove_empty_values(v).map(|v| (k, v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter_map(remove_empty_values)
                .collect(),
        ),
        other => other,
    };
    (!is_empty_value(&cleaned)).then_some(cleaned)
}
