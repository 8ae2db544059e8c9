//! Rill Expr - per-document expression and predicate evaluation.
//!
//! This crate is the engine's expression-evaluator collaborator. The IVM
//! core only depends on the [`Evaluator`] trait, so an accelerated or
//! vectorized implementation can be swapped in without touching any engine
//! contract.
//!
//! Evaluation never raises: an unresolved field path or a type-mismatched
//! operator yields `None`, the engine-wide "missing" sentinel, and only the
//! affected field of the affected document degrades.

#![no_std]

extern crate alloc;

pub mod eval;
pub mod expr;
pub mod parse;
pub mod predicate;

pub use eval::{DefaultEvaluator, Evaluator};
pub use expr::Expr;
pub use parse::{parse_expr, parse_predicate};
pub use predicate::{CmpOp, Predicate};
