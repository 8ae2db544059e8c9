//! The evaluator collaborator boundary and its default implementation.

use crate::expr::Expr;
use crate::predicate::{CmpOp, Predicate};
use alloc::string::String;
use core::cmp::Ordering;
use rill_core::DocValue;

/// Per-document expression evaluation, pluggable at engine construction.
///
/// Implementations must be pure with respect to the document: the same
/// (expression, document) pair always yields the same result. `None` means
/// "missing", never an error.
pub trait Evaluator {
    /// Evaluates an expression against a document.
    fn evaluate(&self, expr: &Expr, doc: &DocValue) -> Option<DocValue>;

    /// Tests a predicate against a document.
    fn matches(&self, pred: &Predicate, doc: &DocValue) -> bool;
}

/// The default tree-walking evaluator.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultEvaluator;

impl Evaluator for DefaultEvaluator {
    fn evaluate(&self, expr: &Expr, doc: &DocValue) -> Option<DocValue> {
        match expr {
            Expr::Literal(v) => Some(v.clone()),
            Expr::Field(path) => doc.path(path).cloned(),
            Expr::Add(operands) => {
                let mut sum = 0.0;
                for op in operands {
                    sum += self.evaluate(op, doc)?.as_f64()?;
                }
                Some(DocValue::Number(sum))
            }
            Expr::Subtract(a, b) => {
                let a = self.evaluate(a, doc)?.as_f64()?;
                let b = self.evaluate(b, doc)?.as_f64()?;
                Some(DocValue::Number(a - b))
            }
            Expr::Multiply(operands) => {
                let mut product = 1.0;
                for op in operands {
                    product *= self.evaluate(op, doc)?.as_f64()?;
                }
                Some(DocValue::Number(product))
            }
            Expr::Divide(a, b) => {
                let a = self.evaluate(a, doc)?.as_f64()?;
                let b = self.evaluate(b, doc)?.as_f64()?;
                if b == 0.0 {
                    // Degrades to missing rather than aborting the batch.
                    None
                } else {
                    Some(DocValue::Number(a / b))
                }
            }
            Expr::Concat(operands) => {
                let mut out = String::new();
                for op in operands {
                    let v = self.evaluate(op, doc)?;
                    out.push_str(v.as_str()?);
                }
                Some(DocValue::String(out))
            }
            Expr::ToLower(inner) => {
                let v = self.evaluate(inner, doc)?;
                Some(DocValue::String(v.as_str()?.to_lowercase()))
            }
            Expr::ToUpper(inner) => {
                let v = self.evaluate(inner, doc)?;
                Some(DocValue::String(v.as_str()?.to_uppercase()))
            }
            Expr::IfNull(primary, fallback) => match self.evaluate(primary, doc) {
                Some(v) if !v.is_null() => Some(v),
                _ => self.evaluate(fallback, doc),
            },
        }
    }

    fn matches(&self, pred: &Predicate, doc: &DocValue) -> bool {
        match pred {
            Predicate::Cmp { path, op, value } => compare_field(doc.path(path), *op, value),
            Predicate::Exists { path, expected } => doc.path(path).is_some() == *expected,
            Predicate::In { path, values } => match doc.path(path) {
                Some(actual) => values.iter().any(|v| v == actual),
                None => false,
            },
            Predicate::And(preds) => preds.iter().all(|p| self.matches(p, doc)),
            Predicate::Or(preds) => preds.iter().any(|p| self.matches(p, doc)),
            Predicate::Not(inner) => !self.matches(inner, doc),
        }
    }
}

/// Comparison table: same-variant comparisons only, except that a missing
/// field satisfies `Ne` (absence is observably "not equal").
fn compare_field(actual: Option<&DocValue>, op: CmpOp, expected: &DocValue) -> bool {
    let actual = match actual {
        Some(v) => v,
        None => return op == CmpOp::Ne,
    };
    match op {
        CmpOp::Eq => actual == expected,
        CmpOp::Ne => actual != expected,
        CmpOp::Lt | CmpOp::Lte | CmpOp::Gt | CmpOp::Gte => {
            if !same_variant(actual, expected) {
                return false;
            }
            let ord = actual.cmp(expected);
            match op {
                CmpOp::Lt => ord == Ordering::Less,
                CmpOp::Lte => ord != Ordering::Greater,
                CmpOp::Gt => ord == Ordering::Greater,
                CmpOp::Gte => ord != Ordering::Less,
                _ => false,
            }
        }
    }
}

fn same_variant(a: &DocValue, b: &DocValue) -> bool {
    matches!(
        (a, b),
        (DocValue::Null, DocValue::Null)
            | (DocValue::Bool(_), DocValue::Bool(_))
            | (DocValue::Number(_), DocValue::Number(_))
            | (DocValue::String(_), DocValue::String(_))
            | (DocValue::Array(_), DocValue::Array(_))
            | (DocValue::Object(_), DocValue::Object(_))
    )
}
