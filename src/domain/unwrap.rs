//! Unwrapping of nested wrapper objects in SDK payloads
//!
//! Move values arrive wrapped in single-field envelopes: `{"value": x}`,
//! `{"inner": x}` and the option encoding `{"vec": []}` / `{"vec": [x]}`.
//! Stored data keeps the envelopes; readers unwrap at the point of use.

use serde_json::{Map, Value};

const WRAPPER_KEYS: &[&str] = &["value", "inner"];

/// Recursively strip wrapper envelopes.
pub fn unwrap_value(value: &Value) -> Value {
    match value {
        Value::Object(map) if map.len() == 1 => {
            if let Some((key, inner)) = map.iter().next() {
                if WRAPPER_KEYS.contains(&key.as_str()) {
                    return unwrap_value(inner);
                }
                if key == "vec" {
                    if let Value::Array(items) = inner {
                        match items.as_slice() {
                            [] => return Value::Null,
                            [single] => return unwrap_value(single),
                            _ => {}
                        }
                    }
                }
            }
            Value::Object(unwrap_fields(map))
        }
        Value::Object(map) => Value::Object(unwrap_fields(map)),
        Value::Array(items) => Value::Array(items.iter().map(unwrap_value).collect()),
        other => other.clone(),
    }
}

fn unwrap_fields(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(k, v)| (k.clone(), unwrap_value(v)))
        .collect()
}

/// Read an unsigned integer that may be encoded as a JSON number or a
/// decimal string.
pub fn value_as_u128(value: &Value) -> Option<u128> {
    match unwrap_value(value) {
        Value::Number(n) => n.as_u64().map(u128::from),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn value_as_u64(value: &Value) -> Option<u64> {
    value_as_u128(value).and_then(|n| u64::try_from(n).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_nested_envelopes() {
        let raw = json!({"coin": {"value": {"inner": "42"}}});
        assert_eq!(unwrap_value(&raw), json!({"coin": "42"}));
    }

    #[test]
    fn option_encoding() {
        assert_eq!(unwrap_value(&json!({"vec": []})), Value::Null);
        assert_eq!(unwrap_value(&json!({"vec": [{"value": 7}]})), json!(7));
        assert_eq!(unwrap_value(&json!({"vec": [1, 2]})), json!({"vec": [1, 2]}));
    }

    #[test]
    fn plain_objects_and_arrays_keep_shape() {
        let raw = json!({"a": 1, "b": [{"inner": true}, "x"]});
        assert_eq!(unwrap_value(&raw), json!({"a": 1, "b": [true, "x"]}));
    }

    #[test]
    fn numbers_from_strings_or_numbers() {
        assert_eq!(value_as_u128(&json!("1000000")), Some(1_000_000));
        assert_eq!(value_as_u128(&json!({"value": 5})), Some(5));
        assert_eq!(value_as_u64(&json!("nope")), None);
    }
}
