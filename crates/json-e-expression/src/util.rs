//! Value helpers shared by the interpreter and the builtins.

use crate::value::Value;
use serde_json::Number;

/// Truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Function(_) => true,
    }
}

/// Structural equality. Object key order is irrelevant, callables compare by
/// identity and values of different types are never equal.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, va)| b.get(k).is_some_and(|vb| deep_equal(va, vb)))
        }
        (Value::Function(a), Value::Function(b)) => a == b,
        _ => false,
    }
}

pub fn is_integer(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0
}

/// Largest integer magnitude an f64 represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

pub fn number_to_json(n: f64) -> serde_json::Value {
    if is_integer(n) && n.abs() <= MAX_SAFE_INTEGER {
        return serde_json::Value::Number(Number::from(n as i64));
    }
    match Number::from_f64(n) {
        Some(num) => serde_json::Value::Number(num),
        None => serde_json::Value::Null,
    }
}

/// Renders a number the way it would appear in JSON text, without a
/// trailing `.0` for integral values.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if is_integer(n) && n.abs() <= MAX_SAFE_INTEGER {
        return (n as i64).to_string();
    }
    n.to_string()
}

/// Resolves a possibly negative index against `len`, clamping below at 0.
pub fn resolve_index(index: i64, len: usize) -> usize {
    if index < 0 {
        (len as i64 + index).max(0) as usize
    } else {
        index as usize
    }
}

/// Half-open `[start, end)` range for a slice, clamped to `0..=len` and
/// collapsed to empty when `start > end`.
pub fn slice_bounds(start: i64, end: Option<i64>, len: usize) -> (usize, usize) {
    let end = end.map_or(len, |e| resolve_index(e, len)).min(len);
    let start = resolve_index(start, len).min(end);
    (start, end)
}

/// Text used when a value is spliced into a string (`join`, `str`).
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
