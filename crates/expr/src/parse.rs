//! Parsing expression and predicate specs out of document values.
//!
//! Stage specs arrive as plain `DocValue` trees (the declarative pipeline
//! format). Expressions are `"$dotted.path"` strings, literal scalars, or
//! single-key operator objects; predicates are field/operator comparison
//! maps with `and` / `or` / `not` combinators.
//!
//! Errors carry a message only; the pipeline compiler attaches the stage
//! index.

use crate::expr::Expr;
use crate::predicate::{CmpOp, Predicate};
use alloc::boxed::Box;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use rill_core::DocValue;

/// Parses an expression spec.
pub fn parse_expr(spec: &DocValue) -> Result<Expr, String> {
    match spec {
        DocValue::String(s) if s.starts_with('$') => Ok(Expr::Field(s[1..].to_string())),
        DocValue::Object(obj) if obj.len() == 1 => {
            let (op, arg) = match obj.iter().next() {
                Some(entry) => entry,
                None => return Ok(Expr::Literal(spec.clone())),
            };
            parse_expr_op(op, arg)
        }
        other => Ok(Expr::Literal(other.clone())),
    }
}

fn parse_expr_op(op: &str, arg: &DocValue) -> Result<Expr, String> {
    match op {
        "add" => Ok(Expr::Add(parse_expr_list(op, arg)?)),
        "multiply" => Ok(Expr::Multiply(parse_expr_list(op, arg)?)),
        "concat" => Ok(Expr::Concat(parse_expr_list(op, arg)?)),
        "subtract" => {
            let (a, b) = parse_expr_pair(op, arg)?;
            Ok(Expr::Subtract(Box::new(a), Box::new(b)))
        }
        "divide" => {
            let (a, b) = parse_expr_pair(op, arg)?;
            Ok(Expr::Divide(Box::new(a), Box::new(b)))
        }
        "ifNull" => {
            let (a, b) = parse_expr_pair(op, arg)?;
            Ok(Expr::IfNull(Box::new(a), Box::new(b)))
        }
        "toLower" => Ok(Expr::ToLower(Box::new(parse_expr(arg)?))),
        "toUpper" => Ok(Expr::ToUpper(Box::new(parse_expr(arg)?))),
        // A single-key object that is not an operator is a literal document.
        _ => Ok(Expr::Literal(single_key_object(op, arg))),
    }
}

fn parse_expr_list(op: &str, arg: &DocValue) -> Result<Vec<Expr>, String> {
    let arr = arg
        .as_array()
        .ok_or_else(|| format!("'{}' expects an array of expressions", op))?;
    arr.iter().map(parse_expr).collect()
}

fn parse_expr_pair(op: &str, arg: &DocValue) -> Result<(Expr, Expr), String> {
    let arr = arg
        .as_array()
        .ok_or_else(|| format!("'{}' expects a two-element array", op))?;
    if arr.len() != 2 {
        return Err(format!("'{}' expects exactly two operands", op));
    }
    Ok((parse_expr(&arr[0])?, parse_expr(&arr[1])?))
}

fn single_key_object(key: &str, value: &DocValue) -> DocValue {
    let mut obj = rill_core::DocObject::new();
    obj.insert(key, value.clone());
    DocValue::Object(obj)
}

/// Parses a predicate spec (the value of a `filter` stage).
pub fn parse_predicate(spec: &DocValue) -> Result<Predicate, String> {
    let obj = spec
        .as_object()
        .ok_or_else(|| "filter spec must be an object".to_string())?;

    let mut clauses = Vec::new();
    for (key, value) in obj.iter() {
        match key {
            "and" => clauses.push(Predicate::And(parse_predicate_list(key, value)?)),
            "or" => clauses.push(Predicate::Or(parse_predicate_list(key, value)?)),
            "not" => clauses.push(Predicate::Not(Box::new(parse_predicate(value)?))),
            path => clauses.push(parse_field_clause(path, value)?),
        }
    }
    Ok(match clauses.len() {
        1 => clauses.pop().unwrap_or(Predicate::And(Vec::new())),
        _ => Predicate::And(clauses),
    })
}

fn parse_predicate_list(op: &str, arg: &DocValue) -> Result<Vec<Predicate>, String> {
    let arr = arg
        .as_array()
        .ok_or_else(|| format!("'{}' expects an array of predicates", op))?;
    arr.iter().map(parse_predicate).collect()
}

/// A field clause is either a bare value (equality) or an operator map like
/// `{"gt": 5, "lt": 10}` whose entries are conjoined.
fn parse_field_clause(path: &str, value: &DocValue) -> Result<Predicate, String> {
    let ops = match value.as_object() {
        Some(obj) if obj.keys().any(is_cmp_operator) => obj,
        _ => return Ok(Predicate::eq(path, value.clone())),
    };

    let mut clauses = Vec::new();
    for (op, arg) in ops.iter() {
        let clause = match op {
            "eq" => Predicate::cmp(path, CmpOp::Eq, arg.clone()),
            "ne" => Predicate::cmp(path, CmpOp::Ne, arg.clone()),
            "lt" => Predicate::cmp(path, CmpOp::Lt, arg.clone()),
            "lte" => Predicate::cmp(path, CmpOp::Lte, arg.clone()),
            "gt" => Predicate::cmp(path, CmpOp::Gt, arg.clone()),
            "gte" => Predicate::cmp(path, CmpOp::Gte, arg.clone()),
            "in" => {
                let values = arg
                    .as_array()
                    .ok_or_else(|| "'in' expects an array".to_string())?;
                Predicate::In {
                    path: path.to_string(),
                    values: values.clone(),
                }
            }
            "exists" => {
                let expected = arg
                    .as_bool()
                    .ok_or_else(|| "'exists' expects a boolean".to_string())?;
                Predicate::Exists {
                    path: path.to_string(),
                    expected,
                }
            }
            other => return Err(format!("unknown comparison operator '{}'", other)),
        };
        clauses.push(clause);
    }
    Ok(match clauses.len() {
        1 => clauses.pop().unwrap_or(Predicate::And(Vec::new())),
        _ => Predicate::And(clauses),
    })
}

fn is_cmp_operator(key: &str) -> bool {
    matches!(
        key,
        "eq" | "ne" | "lt" | "lte" | "gt" | "gte" | "in" | "exists"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{DefaultEvaluator, Evaluator};
    use alloc::vec;
    use rill_core::DocObject;

    fn obj(entries: &[(&str, DocValue)]) -> DocValue {
        let mut o = DocObject::new();
        for (k, v) in entries {
            o.insert(*k, v.clone());
        }
        DocValue::Object(o)
    }

    #[test]
    fn test_parse_field_expr() {
        assert_eq!(
            parse_expr(&DocValue::from("$a.b")),
            Ok(Expr::Field("a.b".into()))
        );
    }

    #[test]
    fn test_parse_literal_expr() {
        assert_eq!(parse_expr(&DocValue::from(5)), Ok(Expr::literal(5)));
        assert_eq!(parse_expr(&DocValue::from("x")), Ok(Expr::literal("x")));
    }

    #[test]
    fn test_parse_operator_expr() {
        let spec = obj(&[(
            "add",
            DocValue::Array(vec![DocValue::from("$a"), DocValue::from(1)]),
        )]);
        let expr = parse_expr(&spec).unwrap();
        assert_eq!(expr, Expr::Add(vec![Expr::field("a"), Expr::literal(1)]));
    }

    #[test]
    fn test_parse_bad_operand_count() {
        let spec = obj(&[("divide", DocValue::Array(vec![DocValue::from(1)]))]);
        assert!(parse_expr(&spec).is_err());
    }

    #[test]
    fn test_parse_equality_predicate() {
        let spec = obj(&[("a", DocValue::from(5))]);
        let pred = parse_predicate(&spec).unwrap();
        assert_eq!(pred, Predicate::eq("a", 5));
    }

    #[test]
    fn test_parse_range_predicate() {
        let spec = obj(&[(
            "age",
            obj(&[("gte", DocValue::from(18)), ("lt", DocValue::from(65))]),
        )]);
        let pred = parse_predicate(&spec).unwrap();

        let e = DefaultEvaluator;
        assert!(e.matches(&pred, &obj(&[("age", DocValue::from(30))])));
        assert!(!e.matches(&pred, &obj(&[("age", DocValue::from(70))])));
        assert!(!e.matches(&pred, &obj(&[("age", DocValue::from(10))])));
    }

    #[test]
    fn test_parse_combinators() {
        let spec = obj(&[(
            "or",
            DocValue::Array(vec![
                obj(&[("a", DocValue::from(1))]),
                obj(&[("b", DocValue::from(2))]),
            ]),
        )]);
        let pred = parse_predicate(&spec).unwrap();

        let e = DefaultEvaluator;
        assert!(e.matches(&pred, &obj(&[("b", DocValue::from(2))])));
        assert!(!e.matches(&pred, &obj(&[("b", DocValue::from(3))])));
    }

    #[test]
    fn test_parse_object_equality_without_operators() {
        // An object value with no comparison operators is a structural match.
        let spec = obj(&[("point", obj(&[("x", DocValue::from(1))]))]);
        let pred = parse_predicate(&spec).unwrap();
        assert_eq!(pred, Predicate::eq("point", obj(&[("x", DocValue::from(1))])));
    }

    #[test]
    fn test_parse_unknown_cmp_operator_mixed() {
        // Mixing a known operator with an unknown one is malformed.
        let spec = obj(&[(
            "a",
            obj(&[("gt", DocValue::from(1)), ("regex", DocValue::from("x"))]),
        )]);
        assert!(parse_predicate(&spec).is_err());
    }
}
