//! Restricted condition-expression grammar for declarative rules.
//!
//! Conditions are parsed into a small AST and interpreted against the
//! evaluation environment. There is no residual code-execution surface:
//! identifiers resolve against environment bindings, and the only
//! callables are the fixed helper table.

mod ast;
mod eval;
mod helpers;
mod parser;
mod token;

pub use ast::{BinaryOp, Expr};
pub use eval::{checked_condition, evaluate, evaluate_condition, truthy};
pub use helpers::{is_valid_ein, is_valid_ssn};
pub use parser::parse;

use thiserror::Error;

/// Fault inside one rule's condition. Recovered at the rule boundary:
/// the rule is treated as non-matching and siblings keep evaluating.
#[derive(Debug, Error)]
pub enum ExprError {
    #[error("lex error: {0}")]
    Lex(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("{function}: wrong number of arguments ({got})")]
    Arity { function: String, got: usize },

    #[error("type error: {0}")]
    Type(String),
}
