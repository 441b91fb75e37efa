//! Path resolution and lenient scalar coercion over caller documents.
//!
//! Documents are arbitrary nested JSON objects and are never mutated.
//! Lookups degrade to a default the instant a path segment is absent or
//! the current value is not an object; numeric coercion never fails and
//! defaults to zero so that schema drift cannot abort an audit run.

use serde_json::Value;

/// Resolve a dotted path (`"a.b.c"`) against a nested object.
///
/// Returns `None` as soon as a segment is missing or the current value
/// is not an object.
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Best-effort numeric reading of a scalar.
///
/// Accepts numbers, booleans, and trimmed numeric strings. Returns
/// `None` for everything else; callers decide the default.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Lenient coercion used for canonical amount fields: never fails,
/// defaults when the value is missing or unreadable.
pub fn lenient_number(value: Option<&Value>, default: f64) -> f64 {
    value.and_then(coerce_number).unwrap_or(default)
}

/// Strip every non-digit character from the value's string form.
pub fn stripped(value: &Value) -> String {
    value_to_string(value)
        .chars()
        .filter(char::is_ascii_digit)
        .collect()
}

/// String form used by text helpers and message templating.
///
/// Null renders empty, strings render bare, everything else renders as
/// compact JSON.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        // Render through f64 Display so whole floats read as integers
        // in templated messages (85000.0 renders as "85000").
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => f.to_string(),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Wrap an f64 as a JSON number; NaN and infinities become null.
pub fn number_value(n: f64) -> Value {
    serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
}

/// Whether a value counts as missing: null or a blank string.
pub fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
