//! Interpreter Errors
//!
//! The interpreter carries a single sticky error slot. Native procedures
//! signal by setting the slot (through `Interp::set_error*`) and returning
//! `None`; the evaluator checks the slot, not the return value, and
//! suppresses all further parsing until the host consumes the error or a
//! `try` command clears it.

use thiserror::Error;

/// What went wrong. `Default` covers script-raised (`error msg`) and other
/// unclassified failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Default,
    /// The parser hit end of input inside braces, brackets or quotes.
    Unbalanced,
    RecursionExceeded,
    DivisionByZero,
    ExpressionSyntax,
    UnknownCommand,
    Interrupted,
}

/// The sticky error record: kind, byte offset into the code being parsed
/// when it was raised, and a human-readable message.
///
/// Errors raised without a position (expression failures, `error msg`,
/// native helpers) start out unanchored; the evaluator anchors them at the
/// start offset of the failing command before they surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct LilError {
    pub kind: ErrorKind,
    pub position: usize,
    pub message: String,
    pub(crate) needs_anchor: bool,
}

impl LilError {
    pub(crate) fn at(kind: ErrorKind, position: usize, message: String) -> Self {
        Self {
            kind,
            position,
            message,
            needs_anchor: false,
        }
    }

    pub(crate) fn unanchored(kind: ErrorKind, message: String) -> Self {
        Self {
            kind,
            position: 0,
            message,
            needs_anchor: true,
        }
    }
}
