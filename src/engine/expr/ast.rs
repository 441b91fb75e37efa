//! Parsed form of a rule condition.

/// Binary operators, lowest to highest precedence handled by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Short-circuit, value-returning `or`
    Or,
    /// Short-circuit, value-returning `and`
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
}

/// A condition expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    /// Environment binding, possibly a dotted path.
    Ident(String),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// Call into the fixed helper table.
    Call(String, Vec<Expr>),
}
