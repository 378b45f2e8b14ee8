//! Error types for parsing and evaluation.

use thiserror::Error;

/// A parse failure: one message plus the byte offset it refers to.
///
/// All malformed input surfaces as this one type: illegal characters,
/// missing operands, out-of-sequence or unterminated multi-symbol operators,
/// leftover unreduced tokens. Internal invariant violations surface the same
/// way, with the message prefix `internal error:`. Message texts are
/// lowercase and stable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset}")]
pub struct ParseError {
    pub message: String,
    /// Byte offset into the input.
    pub offset: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        ParseError {
            message: message.into(),
            offset,
        }
    }
}

/// An evaluation failure.
///
/// Raised only by [`Expression::evaluate`](crate::Expression::evaluate);
/// parsing never evaluates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// A [`Constant`](crate::Expression::Constant) was reached with no
    /// resolver supplied.
    #[error("no resolver for variable '{identifier}'")]
    NoResolver { identifier: String },
}

// ── Tests ─────────────────────────────────────────────────────────────────────
