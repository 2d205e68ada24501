//! Error types for parsing and evaluating expressions.

use thiserror::Error;

/// A syntax error with the byte offset where it was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
	/// Human-readable description of the problem.
	pub message: String,
	/// Byte offset in the input.
	pub position: usize,
}

impl ParseError {
	pub(crate) fn new(message: impl Into<String>, position: usize) -> Self {
		Self {
			message: message.into(),
			position,
		}
	}
}

/// Errors returned by [`crate::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
	/// Input was empty or whitespace only.
	#[error("empty expression")]
	Empty,

	/// Input could not be parsed.
	#[error(transparent)]
	Parse(#[from] ParseError),

	/// The reciprocal of zero was requested.
	#[error("division by zero")]
	DivisionByZero,

	/// The result overflowed or is undefined (NaN).
	#[error("result is not a finite number")]
	NotFinite,
}

/// Result type for expression operations.
pub type Result<T> = std::result::Result<T, EvalError>;
