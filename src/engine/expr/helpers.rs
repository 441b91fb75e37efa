//! Fixed helper table for condition expressions.
//!
//! These are the only capabilities a condition may invoke: pure
//! document lookups, tolerance arithmetic, identifier-format checks,
//! and a handful of scalar builtins. No attribute access, no I/O.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::engine::document::{
    coerce_number, get_path, is_missing, lenient_number, number_value, stripped,
    value_to_string,
};
use crate::engine::env::Environment;

use super::ExprError;

static SSN_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}-?\d{2}-?\d{4}$").expect("valid SSN regex"));

static EIN_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}-?\d{7}$").expect("valid EIN regex"));

/// Dispatch a helper call by name. Unknown names are an evaluation
/// fault, which the caller treats as "rule did not match".
pub fn call(name: &str, args: &[Value], env: &Environment) -> Result<Value, ExprError> {
    match name {
        "get" => {
            let path = str_arg(name, args, 0)?;
            let default = args.get(1).cloned().unwrap_or(Value::Null);
            Ok(get_path(env.document(), &path).cloned().unwrap_or(default))
        }
        "exists" => {
            let path = str_arg(name, args, 0)?;
            let present = get_path(env.document(), &path)
                .is_some_and(|value| !is_missing(value));
            Ok(Value::Bool(present))
        }
        "get_amount" => {
            let field = str_arg(name, args, 0)?;
            let default = match args.get(1) {
                Some(value) => num(name, value)?,
                None => 0.0,
            };
            let amounts = env.get("amounts").cloned().unwrap_or(Value::Null);
            Ok(number_value(lenient_number(
                get_path(&amounts, &field),
                default,
            )))
        }
        "missing" => {
            let value = arg(name, args, 0)?;
            Ok(Value::Bool(is_missing(value)))
        }
        "pct_diff" => {
            let a = num(name, arg(name, args, 0)?)?;
            let b = num(name, arg(name, args, 1)?)?;
            let diff = if b == 0.0 { 0.0 } else { (a - b).abs() / b.abs() };
            Ok(number_value(diff))
        }
        "within_tolerance" => {
            let actual = num(name, arg(name, args, 0)?)?;
            let expected = num(name, arg(name, args, 1)?)?;
            let tolerance = num(name, arg(name, args, 2)?)?;
            Ok(Value::Bool((actual - expected).abs() <= tolerance))
        }
        "is_valid_ssn" => Ok(Value::Bool(is_valid_ssn(arg(name, args, 0)?))),
        "is_valid_ein" => Ok(Value::Bool(is_valid_ein(arg(name, args, 0)?))),
        "re_match" => {
            let pattern = str_arg(name, args, 0)?;
            let value = value_to_string(arg(name, args, 1)?);
            Ok(Value::Bool(re_match(&pattern, value.trim())?))
        }
        "as_number" => {
            let default = match args.get(1) {
                Some(value) => num(name, value)?,
                None => 0.0,
            };
            Ok(number_value(lenient_number(Some(arg(name, args, 0)?), default)))
        }
        "stripped" => Ok(Value::String(stripped(arg(name, args, 0)?))),
        "abs" => Ok(number_value(num(name, arg(name, args, 0)?)?.abs())),
        "round" => {
            let n = num(name, arg(name, args, 0)?)?;
            let digits = match args.get(1) {
                Some(value) => num(name, value)? as i32,
                None => 0,
            };
            let scale = 10f64.powi(digits);
            Ok(number_value((n * scale).round() / scale))
        }
        "min" => fold_numbers(name, args, f64::min),
        "max" => fold_numbers(name, args, f64::max),
        "sum" => {
            let items = arg(name, args, 0)?
                .as_array()
                .ok_or_else(|| type_error(name, "expected an array"))?;
            let mut total = 0.0;
            for item in items {
                total += num(name, item)?;
            }
            Ok(number_value(total))
        }
        "len" => {
            let length = match arg(name, args, 0)? {
                Value::String(s) => s.chars().count(),
                Value::Array(items) => items.len(),
                Value::Object(map) => map.len(),
                _ => return Err(type_error(name, "expected a string, array, or object")),
            };
            Ok(Value::Number(length.into()))
        }
        _ => Err(ExprError::UnknownFunction(name.to_string())),
    }
}

/// SSN format check plus a placeholder denylist: all-zero area, group,
/// or serial, and the unassigned 666/9xx areas.
pub fn is_valid_ssn(value: &Value) -> bool {
    let text = value_to_string(value);
    if !SSN_FORMAT.is_match(text.trim()) {
        return false;
    }
    let digits = stripped(value);
    let (area, group, serial) = (&digits[..3], &digits[3..5], &digits[5..]);
    if area == "000" || area == "666" || area.starts_with('9') {
        return false;
    }
    group != "00" && serial != "0000"
}

/// EIN format check plus a placeholder denylist: the unused 00 prefix
/// and all-identical digits.
pub fn is_valid_ein(value: &Value) -> bool {
    let text = value_to_string(value);
    if !EIN_FORMAT.is_match(text.trim()) {
        return false;
    }
    let digits = stripped(value);
    if digits.starts_with("00") {
        return false;
    }
    let first = digits.chars().next();
    !digits.chars().all(|c| Some(c) == first)
}

/// Anchored-at-start match, compiled per call. Rule-authored patterns
/// are small and evaluation cost is bounded by rule count.
fn re_match(pattern: &str, value: &str) -> Result<bool, ExprError> {
    let regex = Regex::new(pattern)
        .map_err(|e| ExprError::Type(format!("invalid pattern in re_match: {e}")))?;
    Ok(regex.find(value).is_some_and(|m| m.start() == 0))
}

fn fold_numbers(
    name: &str,
    args: &[Value],
    op: fn(f64, f64) -> f64,
) -> Result<Value, ExprError> {
    if args.is_empty() {
        return Err(ExprError::Arity {
            function: name.to_string(),
            got: 0,
        });
    }
    let mut acc = num(name, &args[0])?;
    for value in &args[1..] {
        acc = op(acc, num(name, value)?);
    }
    Ok(number_value(acc))
}

fn arg<'a>(name: &str, args: &'a [Value], index: usize) -> Result<&'a Value, ExprError> {
    args.get(index).ok_or_else(|| ExprError::Arity {
        function: name.to_string(),
        got: args.len(),
    })
}

fn str_arg(name: &str, args: &[Value], index: usize) -> Result<String, ExprError> {
    match arg(name, args, index)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(type_error(
            name,
            &format!("expected a string argument, got {other}"),
        )),
    }
}

fn num(name: &str, value: &Value) -> Result<f64, ExprError> {
    coerce_number(value).ok_or_else(|| type_error(name, &format!("expected a number, got {value}")))
}

fn type_error(name: &str, detail: &str) -> ExprError {
    ExprError::Type(format!("{name}: {detail}"))
}
