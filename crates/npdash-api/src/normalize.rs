//! Precision-safe JSON normalization
//!
//! Tunnel ids are 64-bit integers and agent payloads are passed through
//! uninterpreted, so either can carry integers a double-precision consumer
//! (any JS dashboard frontend) would silently round. Values outside the safe
//! range are rendered as decimal strings instead.

use serde_json::Value;

/// Largest integer a 64-bit float can represent exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;
pub const MIN_SAFE_INTEGER: i64 = -MAX_SAFE_INTEGER;

/// Recursively rewrite integers outside the safe range as decimal strings.
///
/// Total over any JSON value; floats, bools, strings, and nulls pass through
/// untouched, as do integers that fit. Idempotent: a normalized value
/// normalizes to itself.
pub fn normalize_precision(value: Value) -> Value {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                if !(MIN_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&i) {
                    return Value::String(i.to_string());
                }
            } else if let Some(u) = n.as_u64() {
                if u > MAX_SAFE_INTEGER as u64 {
                    return Value::String(u.to_string());
                }
            }
            Value::Number(n)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_precision).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, normalize_precision(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Normalize a single id.
pub fn normalize_id(id: i64) -> Value {
    normalize_precision(Value::from(id))
}
