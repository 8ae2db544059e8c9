//! Predicate AST for filter stages.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use rill_core::DocValue;

/// Comparison operator applied to a field path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

/// A boolean predicate over a single document.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// Compares the value at `path` against a constant.
    ///
    /// A missing field matches only `Ne`; ordered comparisons require both
    /// sides to be of the same variant (numbers with numbers, strings with
    /// strings).
    Cmp {
        path: String,
        op: CmpOp,
        value: DocValue,
    },
    /// Matches when the field's presence equals `expected`.
    Exists { path: String, expected: bool },
    /// Membership in a constant set of values.
    In { path: String, values: Vec<DocValue> },
    /// All sub-predicates hold. An empty conjunction is always true.
    And(Vec<Predicate>),
    /// Any sub-predicate holds. An empty disjunction is always false.
    Or(Vec<Predicate>),
    /// The sub-predicate does not hold.
    Not(Box<Predicate>),
}

impl Predicate {
    /// Shorthand for an equality comparison.
    pub fn eq(path: impl Into<String>, value: impl Into<DocValue>) -> Self {
        Predicate::Cmp {
            path: path.into(),
            op: CmpOp::Eq,
            value: value.into(),
        }
    }

    /// Shorthand for a comparison with an explicit operator.
    pub fn cmp(path: impl Into<String>, op: CmpOp, value: impl Into<DocValue>) -> Self {
        Predicate::Cmp {
            path: path.into(),
            op,
            value: value.into(),
        }
    }
}
