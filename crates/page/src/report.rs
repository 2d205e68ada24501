use thiserror::Error;

/// Why an evaluation produced no value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalFailure<E> {
	/// The evaluator returned an error (malformed input, division by zero...).
	#[error("{0}")]
	Rejected(E),

	/// The evaluator panicked; carries the panic message.
	#[error("evaluation panicked: {0}")]
	Panicked(String),

	/// The blocking task was cancelled, which only happens while the runtime
	/// shuts down.
	#[error("evaluation was cancelled")]
	Cancelled,
}

/// Result of one evaluation, delivered to the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalReport<O, E> {
	/// Evaluation sequence number, starting at 1 and increasing by one per
	/// evaluation.
	pub seq: u64,
	/// The text that was evaluated.
	pub expr: String,
	pub outcome: Result<O, EvalFailure<E>>,
}

impl<O, E> EvalReport<O, E> {
	pub fn is_ok(&self) -> bool {
		self.outcome.is_ok()
	}
}
