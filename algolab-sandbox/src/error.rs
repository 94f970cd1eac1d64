//! Snippet-level error type shared by the lexer, parser, and interpreter.
//!
//! A [`SnippetError`] never escapes the executor: every failure is folded
//! into the `error` field of an `ExecutionResult`, so `execute` itself is
//! total.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a snippet failure, named the way the learner sees it
/// in the result payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnippetErrorKind {
    /// The source could not be tokenized or parsed.
    Syntax,
    /// An unbound name was referenced.
    Name,
    /// An operation was applied to operands of the wrong type.
    Type,
    /// An argument had the right type but an unusable value.
    Value,
    /// An array index was out of range.
    Index,
    /// Division or modulo by zero.
    DivisionByZero,
    /// The interpreter step budget was exhausted.
    OutOfFuel,
    /// The captured stdout cap was exceeded.
    OutputLimit,
    /// The run was cancelled by the wall-clock deadline.
    Cancelled,
}

impl SnippetErrorKind {
    /// Class name reported in the result payload.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Syntax => "SyntaxError",
            Self::Name => "NameError",
            Self::Type => "TypeError",
            Self::Value => "ValueError",
            Self::Index => "IndexError",
            Self::DivisionByZero => "DivisionByZero",
            Self::OutOfFuel => "OutOfFuel",
            Self::OutputLimit => "OutputLimitExceeded",
            Self::Cancelled => "Timeout",
        }
    }
}

/// An error raised while lexing, parsing, or interpreting a snippet.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{}: {}", .kind.as_str(), .message)]
pub struct SnippetError {
    pub kind: SnippetErrorKind,
    pub message: String,
    /// 1-based source line, when known.
    pub line: Option<u32>,
}

impl SnippetError {
    pub fn new(kind: SnippetErrorKind, message: impl Into<String>, line: Option<u32>) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
        }
    }

    pub fn syntax(message: impl Into<String>, line: u32) -> Self {
        Self::new(SnippetErrorKind::Syntax, message, Some(line))
    }

    pub fn name(message: impl Into<String>, line: u32) -> Self {
        Self::new(SnippetErrorKind::Name, message, Some(line))
    }

    pub fn type_error(message: impl Into<String>, line: u32) -> Self {
        Self::new(SnippetErrorKind::Type, message, Some(line))
    }

    pub fn value(message: impl Into<String>, line: u32) -> Self {
        Self::new(SnippetErrorKind::Value, message, Some(line))
    }

    pub fn index(message: impl Into<String>, line: u32) -> Self {
        Self::new(SnippetErrorKind::Index, message, Some(line))
    }

    pub fn division_by_zero(message: impl Into<String>, line: u32) -> Self {
        Self::new(SnippetErrorKind::DivisionByZero, message, Some(line))
    }

    pub fn out_of_fuel(line: u32) -> Self {
        Self::new(
            SnippetErrorKind::OutOfFuel,
            "interpreter step budget exhausted",
            Some(line),
        )
    }

    pub fn output_limit(line: u32) -> Self {
        Self::new(
            SnippetErrorKind::OutputLimit,
            "captured output exceeded the limit",
            Some(line),
        )
    }

    pub fn cancelled(line: u32) -> Self {
        Self::new(
            SnippetErrorKind::Cancelled,
            "execution cancelled by the time limit",
            Some(line),
        )
    }
}
