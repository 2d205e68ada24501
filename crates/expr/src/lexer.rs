//! Tokenizer for calculator expressions.

use num_bigint::BigInt;
use num_rational::BigRational;

use crate::error::ParseError;

/// Largest accepted magnitude of a decimal exponent, after shifting out the
/// fraction digits.
const MAX_EXPONENT: i64 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
	/// Exact numeric literal and the base it was written in.
	Num { val: BigRational, base: u32 },
	Ident(String),
	Plus,
	Minus,
	Star,
	Slash,
	Caret,
	LParen,
	RParen,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
	pub kind: TokenKind,
	/// Byte offset of the first character.
	pub pos: usize,
}

/// Splits `input` into tokens, skipping whitespace.
pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
	let bytes = input.as_bytes();
	let mut tokens = Vec::new();
	let mut pos = 0;

	while pos < bytes.len() {
		let ch = bytes[pos];
		let start = pos;
		let kind = match ch {
			b' ' | b'\t' | b'\r' | b'\n' => {
				pos += 1;
				continue;
			}
			b'+' => TokenKind::Plus,
			b'-' => TokenKind::Minus,
			b'*' => TokenKind::Star,
			b'/' => TokenKind::Slash,
			b'^' => TokenKind::Caret,
			b'(' => TokenKind::LParen,
			b')' => TokenKind::RParen,
			b'0'..=b'9' | b'.' => {
				let (kind, end) = lex_number(input, pos)?;
				tokens.push(Token { kind, pos: start });
				pos = end;
				continue;
			}
			c if c.is_ascii_alphabetic() || c == b'_' => {
				let end = scan(bytes, pos, |c| c.is_ascii_alphanumeric() || c == b'_');
				tokens.push(Token {
					kind: TokenKind::Ident(input[pos..end].to_ascii_lowercase()),
					pos: start,
				});
				pos = end;
				continue;
			}
			_ => {
				let found = input[pos..].chars().next().unwrap_or('?');
				return Err(ParseError::new(format!("unexpected character '{found}'"), pos));
			}
		};
		tokens.push(Token { kind, pos: start });
		pos += 1;
	}

	Ok(tokens)
}

fn scan(bytes: &[u8], mut pos: usize, pred: impl Fn(u8) -> bool) -> usize {
	while pos < bytes.len() && pred(bytes[pos]) {
		pos += 1;
	}
	pos
}

fn lex_number(input: &str, start: usize) -> Result<(TokenKind, usize), ParseError> {
	let bytes = input.as_bytes();

	if bytes[start] == b'0'
		&& let Some(base) = bytes.get(start + 1).and_then(|b| radix_prefix(*b))
	{
		let digits_start = start + 2;
		let end = scan(bytes, digits_start, |c| c.is_ascii_alphanumeric());
		let digits = &input[digits_start..end];
		if digits.is_empty() {
			return Err(ParseError::new("missing digits after base prefix", digits_start));
		}
		let val = BigInt::parse_bytes(digits.as_bytes(), base)
			.ok_or_else(|| ParseError::new(format!("invalid base-{base} literal '{digits}'"), digits_start))?;
		return Ok((
			TokenKind::Num {
				val: BigRational::from_integer(val),
				base,
			},
			end,
		));
	}

	let int_end = scan(bytes, start, |c| c.is_ascii_digit());
	let mut end = int_end;
	let mut frac = "";
	if bytes.get(end) == Some(&b'.') {
		end = scan(bytes, end + 1, |c| c.is_ascii_digit());
		frac = &input[int_end + 1..end];
	}
	let mantissa = format!("{}{frac}", &input[start..int_end]);
	if mantissa.is_empty() {
		return Err(ParseError::new(format!("invalid number '{}'", &input[start..end]), start));
	}

	// An `e` only starts an exponent when digits follow; otherwise it is the
	// constant and the number ends here.
	let mut exponent: i64 = 0;
	if matches!(bytes.get(end), Some(b'e' | b'E')) {
		let mut exp = end + 1;
		if matches!(bytes.get(exp), Some(b'+' | b'-')) {
			exp += 1;
		}
		if bytes.get(exp).is_some_and(u8::is_ascii_digit) {
			let exp_end = scan(bytes, exp, |c| c.is_ascii_digit());
			exponent = input[end + 1..exp_end]
				.parse()
				.ok()
				.filter(|e: &i64| e.abs() <= MAX_EXPONENT)
				.ok_or_else(|| ParseError::new("exponent out of range", end + 1))?;
			end = exp_end;
		}
	}

	let digits = BigInt::parse_bytes(mantissa.as_bytes(), 10).ok_or_else(|| ParseError::new(format!("invalid number '{}'", &input[start..end]), start))?;
	let shift = exponent - frac.len() as i64;
	if shift.abs() > MAX_EXPONENT {
		return Err(ParseError::new("exponent out of range", start));
	}
	let scale = BigInt::from(10u32).pow(shift.unsigned_abs() as u32);
	let val = if shift >= 0 {
		BigRational::from_integer(digits * scale)
	} else {
		BigRational::new(digits, scale)
	};
	Ok((TokenKind::Num { val, base: 10 }, end))
}

fn radix_prefix(b: u8) -> Option<u32> {
	match b {
		b'x' | b'X' => Some(16),
		b'o' | b'O' => Some(8),
		b'b' | b'B' => Some(2),
		_ => None,
	}
}
