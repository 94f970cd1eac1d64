//! Error types for the evaluation engine and visualization adapter.
//!
//! These are structural input-validation failures: unlike snippet
//! execution errors they indicate a contract violation by the caller, so
//! they propagate as typed `Err` values rather than being folded into a
//! result payload.

use thiserror::Error;

/// Failures raised by [`evaluate`](crate::evaluate) and
/// [`TaskKind::from_str`](crate::TaskKind).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("invalid task kind: {0:?} (expected \"regression\" or \"classification\")")]
    InvalidTaskKind(String),

    #[error("length mismatch: ground truth has {expected} values, predictions have {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("empty input: both sequences must hold at least one value")]
    EmptyInput,
}

/// Failure raised by the visualization adapter for unknown chart kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartError {
    #[error("unsupported chart kind: {0:?}")]
    UnsupportedKind(String),
}
