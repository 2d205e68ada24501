//! # Parser
//!
//! Recursive-descent parser from tokens to [`Node`] trees.
//!
//! ```text
//! sum     = product (("+" | "-") product)*
//! product = unary (("*" | "/") unary)*
//! unary   = ("-" | "+") unary | power
//! power   = atom ("^" unary)?
//! atom    = number | constant | function arg | "(" sum ")"
//! arg     = power
//! ```
//!
//! `^` is right-associative and binds tighter than a leading minus, so
//! `-2^2` is `-(2^2)` while `2^-1` is `2^(-1)`.
//!
//! Signs, exponents, parentheses and function arguments each nest one level;
//! input nested deeper than [`MAX_DEPTH`] is rejected instead of recursing.

use crate::error::ParseError;
use crate::lexer::{Token, TokenKind, tokenize};
use crate::node::{ConstKind, FuncKind, Node};


/// Deepest nesting the parser accepts.
pub const MAX_DEPTH: usize = 256;

/// Parses `input` into an expression tree.
pub fn parse(input: &str) -> Result<Node, ParseError> {
	let tokens = tokenize(input)?;
	let mut parser = Parser {
		tokens: &tokens,
		pos: 0,
		end: input.len(),
		depth: 0,
	};
	let node = parser.sum()?;
	if let Some(tok) = parser.peek() {
		return Err(ParseError::new(format!("unexpected {}", describe(&tok.kind)), tok.pos));
	}
	Ok(node)
}

struct Parser<'a> {
	tokens: &'a [Token],
	pos: usize,
	/// Input length, reported as the position of end-of-input errors.
	end: usize,
	depth: usize,
}

impl<'a> Parser<'a> {
	fn peek(&self) -> Option<&'a Token> {
		self.tokens.get(self.pos)
	}

	fn next(&mut self) -> Option<&'a Token> {
		let tok = self.tokens.get(self.pos)?;
		self.pos += 1;
		Some(tok)
	}

	/// Consumes the next token if it has the given kind.
	fn eat(&mut self, kind: &TokenKind) -> bool {
		if self.peek().is_some_and(|t| &t.kind == kind) {
			self.pos += 1;
			true
		} else {
			false
		}
	}

	/// Runs `parse` one nesting level deeper. `pos` locates the error.
	fn nested(&mut self, pos: usize, parse: impl FnOnce(&mut Self) -> Result<Node, ParseError>) -> Result<Node, ParseError> {
		if self.depth >= MAX_DEPTH {
			return Err(ParseError::new("expression nested too deeply", pos));
		}
		self.depth += 1;
		let node = parse(self);
		self.depth -= 1;
		node
	}

	fn sum(&mut self) -> Result<Node, ParseError> {
		let mut node = self.product()?;
		loop {
			if self.eat(&TokenKind::Plus) {
				node = Node::add(node, self.product()?);
			} else if self.eat(&TokenKind::Minus) {
				node = Node::sub(node, self.product()?);
			} else {
				return Ok(node);
			}
		}
	}

	fn product(&mut self) -> Result<Node, ParseError> {
		let mut node = self.unary()?;
		loop {
			if self.eat(&TokenKind::Star) {
				node = Node::mul(node, self.unary()?);
			} else if self.eat(&TokenKind::Slash) {
				node = Node::div(node, self.unary()?);
			} else {
				return Ok(node);
			}
		}
	}

	fn unary(&mut self) -> Result<Node, ParseError> {
		match self.peek() {
			Some(tok) if tok.kind == TokenKind::Minus => {
				self.pos += 1;
				self.nested(tok.pos, Self::unary).map(Node::opposite)
			}
			Some(tok) if tok.kind == TokenKind::Plus => {
				self.pos += 1;
				self.nested(tok.pos, Self::unary)
			}
			_ => self.power(),
		}
	}

	fn power(&mut self) -> Result<Node, ParseError> {
		let base = self.atom()?;
		match self.peek() {
			Some(tok) if tok.kind == TokenKind::Caret => {
				self.pos += 1;
				let exponent = self.nested(tok.pos, Self::unary)?;
				Ok(Node::Exp(Box::new(base), Box::new(exponent)))
			}
			_ => Ok(base),
		}
	}

	fn atom(&mut self) -> Result<Node, ParseError> {
		let Some(tok) = self.next() else {
			return Err(ParseError::new("unexpected end of input", self.end));
		};
		match &tok.kind {
			TokenKind::Num { val, base } => Ok(Node::Num {
				val: val.clone(),
				input_base: Some(*base),
			}),
			TokenKind::Ident(name) => {
				if let Some(kind) = ConstKind::from_name(name) {
					return Ok(Node::Const(kind));
				}
				if let Some(func) = FuncKind::from_name(name) {
					let arg = self.nested(tok.pos, Self::power)?;
					return Ok(Node::Func(func, Box::new(arg)));
				}
				Err(ParseError::new(format!("unknown identifier '{name}'"), tok.pos))
			}
			TokenKind::LParen => {
				let inner = self.nested(tok.pos, Self::sum)?;
				match self.next() {
					Some(Token { kind: TokenKind::RParen, .. }) => Ok(inner),
					Some(other) => Err(ParseError::new(format!("expected ')', found {}", describe(&other.kind)), other.pos)),
					None => Err(ParseError::new("expected ')', found end of input", self.end)),
				}
			}
			other => Err(ParseError::new(format!("unexpected {}", describe(other)), tok.pos)),
		}
	}
}

fn describe(kind: &TokenKind) -> String {
	match kind {
		TokenKind::Num { .. } => "number".to_string(),
		TokenKind::Ident(name) => format!("identifier '{name}'"),
		TokenKind::Plus => "'+'".to_string(),
		TokenKind::Minus => "'-'".to_string(),
		TokenKind::Star => "'*'".to_string(),
		TokenKind::Slash => "'/'".to_string(),
		TokenKind::Caret => "'^'".to_string(),
		TokenKind::LParen => "'('".to_string(),
		TokenKind::RParen => "')'".to_string(),
	}
}
