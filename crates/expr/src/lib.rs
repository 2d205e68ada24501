//! Calculator expression engine.
//!
//! Parses infix arithmetic into a [`Node`] tree with exact rational literals,
//! simplifies it with [`Node::deep_reduce`] and approximates the rest as an
//! `f64`. Results remember the base their literals were written in, so
//! `0xff + 1` displays as `0x100`.

mod error;
mod format;
mod lexer;
mod node;
mod parser;

pub use error::{EvalError, ParseError, Result};
pub use format::format_number;
pub use node::{ConstKind, Evaluation, FuncKind, Node, VarOpKind};
pub use parser::{MAX_DEPTH, parse};

/// Fractional digits used by the `Display` impls.
pub const DEFAULT_PRECISION: usize = 12;

/// Parses, simplifies and evaluates `input`.
pub fn evaluate(input: &str) -> Result<Evaluation> {
	if input.trim().is_empty() {
		return Err(EvalError::Empty);
	}
	let eval = parse(input)?.deep_reduce().eval()?;
	if !eval.val.is_finite() {
		return Err(EvalError::NotFinite);
	}
	Ok(eval)
}
