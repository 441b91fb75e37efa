//! Sandboxed interpreter for parsed rule conditions.
//!
//! Conditions run against environment bindings only. Every fault —
//! unknown name, type mismatch, division producing a non-finite value —
//! surfaces as an `ExprError` that the rule boundary converts to
//! "no match". One malformed rule can never abort an audit run.

use serde_json::Value;

use crate::engine::document::number_value;
use crate::engine::env::Environment;

use super::ast::{BinaryOp, Expr};
use super::helpers;
use super::parser::parse;
use super::ExprError;

/// Evaluate a condition source string, fail-closed.
///
/// Any lex, parse, or evaluation fault yields `false` and a debug log;
/// it never propagates to the caller.
pub fn evaluate_condition(source: &str, env: &Environment) -> bool {
    match checked_condition(source, env) {
        Ok(matched) => matched,
        Err(fault) => {
            tracing::debug!(condition = source, %fault, "condition fault, treating as no match");
            false
        }
    }
}

/// Evaluate a condition and surface faults, for tests and tooling.
pub fn checked_condition(source: &str, env: &Environment) -> Result<bool, ExprError> {
    let expr = parse(source)?;
    Ok(truthy(&evaluate(&expr, env)?))
}

/// Evaluate a parsed expression to a value.
pub fn evaluate(expr: &Expr, env: &Environment) -> Result<Value, ExprError> {
    match expr {
        Expr::Number(n) => Ok(number_value(*n)),
        Expr::Str(s) => Ok(Value::String(s.clone())),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Null => Ok(Value::Null),
        Expr::Ident(name) => lookup(name, env),
        Expr::Not(inner) => Ok(Value::Bool(!truthy(&evaluate(inner, env)?))),
        Expr::Neg(inner) => {
            let value = evaluate(inner, env)?;
            let n = numeric(&value)?;
            Ok(number_value(-n))
        }
        Expr::Binary(op, left, right) => binary(*op, left, right, env),
        Expr::Call(name, args) => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(evaluate(arg, env)?);
            }
            helpers::call(name, &values, env)
        }
    }
}

/// Truthiness: null and empty containers are false, numbers compare
/// against zero, strings against empty.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn lookup(name: &str, env: &Environment) -> Result<Value, ExprError> {
    if name.contains('.') {
        // Dotted paths are total: any miss resolves to null.
        return Ok(env.resolve_path(name).cloned().unwrap_or(Value::Null));
    }
    env.get(name)
        .cloned()
        .ok_or_else(|| ExprError::UnknownIdentifier(name.to_string()))
}

fn binary(op: BinaryOp, left: &Expr, right: &Expr, env: &Environment) -> Result<Value, ExprError> {
    match op {
        // Short-circuit and value-returning, so `taxpayer_ssn or ''`
        // substitutes a default the way rule authors expect.
        BinaryOp::And => {
            let lhs = evaluate(left, env)?;
            if truthy(&lhs) {
                evaluate(right, env)
            } else {
                Ok(lhs)
            }
        }
        BinaryOp::Or => {
            let lhs = evaluate(left, env)?;
            if truthy(&lhs) {
                Ok(lhs)
            } else {
                evaluate(right, env)
            }
        }
        BinaryOp::Eq => Ok(Value::Bool(loose_eq(
            &evaluate(left, env)?,
            &evaluate(right, env)?,
        ))),
        BinaryOp::Ne => Ok(Value::Bool(!loose_eq(
            &evaluate(left, env)?,
            &evaluate(right, env)?,
        ))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let lhs = evaluate(left, env)?;
            let rhs = evaluate(right, env)?;
            let ordering = compare(&lhs, &rhs)?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }
        BinaryOp::Add => {
            let lhs = evaluate(left, env)?;
            let rhs = evaluate(right, env)?;
            if let (Value::String(a), Value::String(b)) = (&lhs, &rhs) {
                return Ok(Value::String(format!("{a}{b}")));
            }
            finite(numeric(&lhs)? + numeric(&rhs)?)
        }
        BinaryOp::Sub => {
            finite(numeric(&evaluate(left, env)?)? - numeric(&evaluate(right, env)?)?)
        }
        BinaryOp::Mul => {
            finite(numeric(&evaluate(left, env)?)? * numeric(&evaluate(right, env)?)?)
        }
        BinaryOp::Div => {
            finite(numeric(&evaluate(left, env)?)? / numeric(&evaluate(right, env)?)?)
        }
    }
}

/// Equality is numeric when both sides read as numbers, structural
/// otherwise. Mismatched types compare unequal rather than faulting.
fn loose_eq(left: &Value, right: &Value) -> bool {
    if let (Some(a), Some(b)) = (strict_number(left), strict_number(right)) {
        return a == b;
    }
    left == right
}

/// Ordering requires both sides numeric, or both sides strings.
fn compare(left: &Value, right: &Value) -> Result<std::cmp::Ordering, ExprError> {
    if let (Some(a), Some(b)) = (strict_number(left), strict_number(right)) {
        return a
            .partial_cmp(&b)
            .ok_or_else(|| ExprError::Type("incomparable numbers".to_string()));
    }
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return Ok(a.cmp(b));
    }
    Err(ExprError::Type(format!(
        "cannot order {left} against {right}"
    )))
}

/// Numbers and booleans only; strings do not silently become numbers
/// inside expressions (rule authors call `as_number` for that).
fn strict_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn numeric(value: &Value) -> Result<f64, ExprError> {
    strict_number(value)
        .ok_or_else(|| ExprError::Type(format!("expected a number, got {value}")))
}

fn finite(n: f64) -> Result<Value, ExprError> {
    if n.is_finite() {
        Ok(number_value(n))
    } else {
        Err(ExprError::Type("non-finite arithmetic result".to_string()))
    }
}
