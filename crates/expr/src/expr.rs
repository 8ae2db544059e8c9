//! Expression AST for computed fields and accumulator inputs.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use rill_core::DocValue;

/// A per-document expression.
///
/// Expressions are evaluated against a single document and produce either a
/// value or "missing" (`None`).
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A constant value.
    Literal(DocValue),
    /// A dotted field path into the document.
    Field(String),
    /// Numeric sum of all operands.
    Add(Vec<Expr>),
    /// Numeric difference of two operands.
    Subtract(Box<Expr>, Box<Expr>),
    /// Numeric product of all operands.
    Multiply(Vec<Expr>),
    /// Numeric quotient; division by zero is missing.
    Divide(Box<Expr>, Box<Expr>),
    /// String concatenation of all operands.
    Concat(Vec<Expr>),
    /// Lowercased string operand.
    ToLower(Box<Expr>),
    /// Uppercased string operand.
    ToUpper(Box<Expr>),
    /// First operand if present and non-null, else the second.
    IfNull(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Shorthand for a field-path expression.
    pub fn field(path: impl Into<String>) -> Self {
        Expr::Field(path.into())
    }

    /// Shorthand for a literal expression.
    pub fn literal(value: impl Into<DocValue>) -> Self {
        Expr::Literal(value.into())
    }
}
