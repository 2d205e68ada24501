//! Number formatting.

use std::fmt;

use crate::node::Evaluation;

/// Largest magnitude at which every integer is exactly representable in `f64`.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Formats `val`, using `base` for integers written in binary, octal or hex.
///
/// Everything else is decimal, rounded to `precision` fractional digits with
/// trailing zeros trimmed. Very large or very small magnitudes use scientific
/// notation.
pub fn format_number(val: f64, base: Option<u32>, precision: usize) -> String {
	if let Some(base @ (2 | 8 | 16)) = base
		&& val.fract() == 0.0
		&& val.abs() < MAX_EXACT_INT
	{
		let sign = if val < 0.0 { "-" } else { "" };
		let abs = val.abs() as u64;
		return match base {
			2 => format!("{sign}0b{abs:b}"),
			8 => format!("{sign}0o{abs:o}"),
			_ => format!("{sign}0x{abs:x}"),
		};
	}

	let abs = val.abs();
	if abs != 0.0 && (abs >= 1e15 || abs < 1e-9) {
		return format!("{val:e}");
	}

	let mut out = format!("{val:.precision$}");
	if out.contains('.') {
		let trimmed = out.trim_end_matches('0').trim_end_matches('.').len();
		out.truncate(trimmed);
	}
	if out == "-0" {
		out.remove(0);
	}
	out
}

impl Evaluation {
	/// Formats the value with an explicit decimal precision.
	pub fn format(&self, precision: usize) -> String {
		format_number(self.val, self.display_base, precision)
	}
}

impl fmt::Display for Evaluation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.format(crate::DEFAULT_PRECISION))
	}
}
