//! Error types for the rill view engine.
//!
//! The only user-visible failure in the engine is attach-time pipeline
//! rejection; runtime anomalies (evaluation failures, unknown removals)
//! degrade silently per the delta-propagation contract.

use alloc::string::String;
use core::fmt;

/// Result type alias for pipeline compilation.
pub type CompileResult<T> = core::result::Result<T, CompileError>;

/// Attach-time rejection of a pipeline specification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileError {
    /// The stage operator name is not recognized at all.
    UnknownOperator { stage: usize, name: String },
    /// The operator is recognized but cannot be maintained incrementally
    /// (e.g. cross-collection joins). Callers may route the whole pipeline
    /// to a from-scratch evaluator on this signal.
    Unsupported { stage: usize, name: String },
    /// The stage spec value is structurally invalid.
    Malformed { stage: usize, message: String },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UnknownOperator { stage, name } => {
                write!(f, "stage {}: unknown operator '{}'", stage, name)
            }
            CompileError::Unsupported { stage, name } => {
                write!(
                    f,
                    "stage {}: operator '{}' is not representable incrementally",
                    stage, name
                )
            }
            CompileError::Malformed { stage, message } => {
                write!(f, "stage {}: malformed spec: {}", stage, message)
            }
        }
    }
}

impl CompileError {
    /// Creates an unknown-operator error.
    pub fn unknown_operator(stage: usize, name: impl Into<String>) -> Self {
        CompileError::UnknownOperator {
            stage,
            name: name.into(),
        }
    }

    /// Creates an unsupported-operator error.
    pub fn unsupported(stage: usize, name: impl Into<String>) -> Self {
        CompileError::Unsupported {
            stage,
            name: name.into(),
        }
    }

    /// Creates a malformed-spec error.
    pub fn malformed(stage: usize, message: impl Into<String>) -> Self {
        CompileError::Malformed {
            stage,
            message: message.into(),
        }
    }
}
