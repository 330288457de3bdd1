//! Semantic equality of schema bodies
//!
//! JSON and Avro schemas are parsed and compared structurally, so key order
//! and formatting do not matter. Protobuf schemas are opaque text and compare
//! equal only when identical after trimming.

use serde_json::Value;

use crate::schema::SchemaType;

/// Decide whether two schema bodies of the same type are semantically equal
///
/// A body that fails to parse as JSON is an error, never "not equal".
pub fn schemas_equal(
    left: &str,
    right: &str,
    schema_type: SchemaType,
) -> Result<bool, serde_json::Error> {
    if schema_type.is_structured() {
        let left: Value = serde_json::from_str(left)?;
        let right: Value = serde_json::from_str(right)?;
        return Ok(values_equal(&left, &right));
    }

    Ok(left.trim() == right.trim())
}

/// Deep equality where numbers compare by value (`1` equals `1.0`)
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => match (a.as_u64(), b.as_u64()) {
                (Some(a), Some(b)) => a == b,
                _ => a.as_f64() == b.as_f64(),
            },
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => left == right,
    }
}
