use std::f64::consts::{E, PI, TAU};
use std::fmt::{self, Display, Write};

use indexmap::IndexMap;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::error::{EvalError, Result};

/// A mathematical constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstKind {
	Pi,
	Tau,
	E,
}

impl ConstKind {
	pub fn value(self) -> f64 {
		match self {
			Self::Pi => PI,
			Self::Tau => TAU,
			Self::E => E,
		}
	}

	pub fn from_name(name: &str) -> Option<Self> {
		match name {
			"pi" => Some(Self::Pi),
			"tau" => Some(Self::Tau),
			"e" => Some(Self::E),
			_ => None,
		}
	}
}

/// An operator over any number of children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarOpKind {
	Add,
	Mul,
}

impl VarOpKind {
	pub fn identity(self) -> f64 {
		match self {
			Self::Add => 0.0,
			Self::Mul => 1.0,
		}
	}

	pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
		match self {
			Self::Add => lhs + rhs,
			Self::Mul => lhs * rhs,
		}
	}

	fn exact_identity(self) -> BigRational {
		match self {
			Self::Add => BigRational::zero(),
			Self::Mul => BigRational::one(),
		}
	}

	fn apply_exact(self, lhs: BigRational, rhs: BigRational) -> BigRational {
		match self {
			Self::Add => lhs + rhs,
			Self::Mul => lhs * rhs,
		}
	}

	/// Splits a reduced child into the part that repeats and how often it
	/// does: `3 * x` is `x` three times in a sum, `x^3` is `x` three times in
	/// a product.
	fn split_count(self, child: Node) -> (Node, Node) {
		match (self, child) {
			(
				Self::Add,
				Node::VarOp {
					kind: Self::Mul,
					mut children,
				},
			) => match children.iter().position(|c| matches!(c, Node::Num { .. })) {
				Some(i) if children.len() >= 2 => {
					let count = children.remove(i);
					let rest = if children.len() == 1 {
						children.swap_remove(0)
					} else {
						Node::VarOp {
							kind: Self::Mul,
							children,
						}
					};
					(rest, count)
				}
				_ => (
					Node::VarOp {
						kind: Self::Mul,
						children,
					},
					Node::one(),
				),
			},
			// Merging exponents is only sound for a base that is neither zero
			// nor undefined.
			(Self::Mul, Node::Exp(base, exp)) if base.finite_value().is_some_and(|v| v != 0.0) => (*base, *exp),
			(_, child) => (child, Node::one()),
		}
	}

	/// Rebuilds `count` repetitions of `child`.
	fn compress(self, child: Node, count: Node) -> Node {
		match self {
			Self::Add => match child {
				Node::VarOp {
					kind: Self::Mul,
					mut children,
				} => {
					children.insert(0, count);
					Node::VarOp {
						kind: Self::Mul,
						children,
					}
				}
				child => Node::VarOp {
					kind: Self::Mul,
					children: vec![count, child],
				},
			},
			Self::Mul => Node::Exp(Box::new(child), Box::new(count)),
		}
	}

	fn symbol(self) -> char {
		match self {
			Self::Add => '+',
			Self::Mul => '*',
		}
	}
}

/// Built-in single-argument functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuncKind {
	Sin,
	Cos,
	Tan,
}

impl FuncKind {
	pub fn from_name(name: &str) -> Option<Self> {
		match name {
			"sin" => Some(Self::Sin),
			"cos" => Some(Self::Cos),
			"tan" => Some(Self::Tan),
			_ => None,
		}
	}

	fn name(self) -> &'static str {
		match self {
			Self::Sin => "sin",
			Self::Cos => "cos",
			Self::Tan => "tan",
		}
	}

	fn apply(self, x: f64) -> f64 {
		match self {
			Self::Sin => x.sin(),
			Self::Cos => x.cos(),
			Self::Tan => x.tan(),
		}
	}

	/// Exact value at `k * pi`. `k` must be an integer.
	fn at_pi_multiple(self, k: &BigRational) -> i64 {
		let odd = !(k / BigRational::from_integer(BigInt::from(2))).is_integer();
		match self {
			Self::Sin | Self::Tan => 0,
			Self::Cos if odd => -1,
			Self::Cos => 1,
		}
	}
}

/// A node of the expression tree.
///
/// Subtraction and division have no node of their own: `a - b` is
/// `a + (-1 * b)` and `a / b` is `a * (1/b)`. Literals are exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
	Const(ConstKind),
	Num {
		val: BigRational,
		/// Base the literal was written in, if it came from user input.
		input_base: Option<u32>,
	},
	Inverse(Box<Node>),
	VarOp {
		kind: VarOpKind,
		children: Vec<Node>,
	},
	Exp(Box<Node>, Box<Node>),
	Func(FuncKind, Box<Node>),
}

/// Approximate value of a node plus the base it prefers to be shown in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
	pub val: f64,
	pub display_base: Option<u32>,
}

impl Node {
	pub fn num(val: BigRational) -> Node {
		Node::Num { val, input_base: None }
	}

	pub fn integer(val: i64) -> Node {
		Node::num(BigRational::from_integer(BigInt::from(val)))
	}

	pub fn zero() -> Node {
		Node::integer(0)
	}

	pub fn one() -> Node {
		Node::integer(1)
	}

	pub fn minus_one() -> Node {
		Node::integer(-1)
	}

	pub fn add(a: Node, b: Node) -> Node {
		Node::op(VarOpKind::Add, a, b)
	}

	pub fn sub(a: Node, b: Node) -> Node {
		Node::add(a, Node::opposite(b))
	}

	pub fn mul(a: Node, b: Node) -> Node {
		Node::op(VarOpKind::Mul, a, b)
	}

	pub fn div(a: Node, b: Node) -> Node {
		Node::mul(a, Node::Inverse(Box::new(b)))
	}

	/// Negation. Literals are folded; anything else becomes `-1 * inner`.
	pub fn opposite(inner: Node) -> Node {
		match inner {
			Node::Num { val, input_base } => Node::Num { val: -val, input_base },
			other => Node::mul(Node::minus_one(), other),
		}
	}

	/// Appends to a left operand of the same kind, so chains like
	/// `1 + 2 + 3` stay one level deep.
	fn op(kind: VarOpKind, a: Node, b: Node) -> Node {
		match a {
			Node::VarOp { kind: inner, mut children } if inner == kind => {
				children.push(b);
				Node::VarOp { kind, children }
			}
			a => Node::VarOp { kind, children: vec![a, b] },
		}
	}

	/// Approximates the node value.
	pub fn eval(&self) -> Result<Evaluation> {
		match self {
			Node::Const(kind) => Ok(Evaluation {
				val: kind.value(),
				display_base: None,
			}),
			Node::Num { val, input_base } => Ok(Evaluation {
				val: val.to_f64().unwrap_or(f64::NAN),
				display_base: *input_base,
			}),
			Node::Inverse(inner) => {
				let inner = inner.eval()?;
				if inner.val == 0.0 {
					return Err(EvalError::DivisionByZero);
				}
				Ok(Evaluation {
					val: 1.0 / inner.val,
					..inner
				})
			}
			Node::VarOp { kind, children } => {
				let mut val = kind.identity();
				let mut display_base = None;
				for child in children {
					let child = child.eval()?;
					val = kind.apply(val, child.val);
					display_base = result_base(display_base, child.display_base);
				}
				Ok(Evaluation { val, display_base })
			}
			Node::Exp(a, b) => {
				let a = a.eval()?;
				let b = b.eval()?;
				if a.val == 0.0 && b.val < 0.0 {
					return Err(EvalError::DivisionByZero);
				}
				Ok(Evaluation {
					val: a.val.powf(b.val),
					display_base: result_base(a.display_base, b.display_base),
				})
			}
			Node::Func(func, inner) => {
				if let Some(k) = inner.pi_multiplier() {
					return Ok(Evaluation {
						val: func.at_pi_multiple(&k) as f64,
						display_base: None,
					});
				}
				let inner = inner.eval()?;
				Ok(Evaluation {
					val: func.apply(inner.val),
					..inner
				})
			}
		}
	}

	/// Simplifies the tree without changing its value.
	///
	/// - nested sums and products are flattened;
	/// - literals are folded exactly (`1/3 * 3` is `1`);
	/// - repeated terms merge (`pi + pi` is `2 * pi`, `pi * pi` is `pi^2`);
	/// - `1^k` and `k^0` become `1`;
	/// - `sin`, `cos` and `tan` at integer multiples of pi become literals.
	///
	/// Nothing that would fail to evaluate is folded away, so a division by
	/// zero still reports as one after reduction.
	pub fn deep_reduce(self) -> Node {
		match self {
			Node::VarOp { kind, children } => reduce_var_op(kind, children),
			Node::Exp(a, b) => {
				let (a, b) = (a.deep_reduce(), b.deep_reduce());
				match (&a, &b) {
					(Node::Num { val, .. }, _) if val.is_one() && b.finite_value().is_some() => Node::one(),
					(_, Node::Num { val, .. }) if val.is_zero() && a.finite_value().is_some() => Node::one(),
					_ => Node::Exp(Box::new(a), Box::new(b)),
				}
			}
			Node::Inverse(inner) => match inner.deep_reduce() {
				Node::Num { val, input_base } if !val.is_zero() => Node::Num {
					val: val.recip(),
					input_base,
				},
				inner => Node::Inverse(Box::new(inner)),
			},
			Node::Func(func, inner) => {
				let inner = inner.deep_reduce();
				match inner.pi_multiplier() {
					Some(k) => Node::integer(func.at_pi_multiple(&k)),
					None => Node::Func(func, Box::new(inner)),
				}
			}
			node => node,
		}
	}

	/// The value when it evaluates to a finite number.
	fn finite_value(&self) -> Option<f64> {
		self.eval().ok().map(|e| e.val).filter(|v| v.is_finite())
	}

	/// Returns `k` when the node is exactly `k * pi` for an integer `k`.
	fn pi_multiplier(&self) -> Option<BigRational> {
		match self {
			Node::Const(ConstKind::Pi) => Some(BigRational::one()),
			Node::Const(ConstKind::Tau) => Some(BigRational::from_integer(BigInt::from(2))),
			Node::Num { val, .. } if val.is_zero() => Some(BigRational::zero()),
			Node::VarOp {
				kind: VarOpKind::Mul,
				children,
			} => {
				let mut multiplier = BigRational::one();
				let mut has_pi = false;
				for child in children {
					if let Node::Num { val, .. } = child {
						if !val.is_integer() {
							return None;
						}
						multiplier *= val;
					} else {
						let m = child.pi_multiplier()?;
						if m.is_zero() {
							return Some(m);
						}
						// pi^2 has no integer multiplier
						if has_pi {
							return None;
						}
						multiplier *= m;
						has_pi = true;
					}
				}
				has_pi.then_some(multiplier)
			}
			_ => None,
		}
	}
}

fn reduce_var_op(kind: VarOpKind, children: Vec<Node>) -> Node {
	// Reducing a child can yield another node of the same kind, so flatten
	// on both sides.
	let reduced = flatten(children, kind).into_iter().map(Node::deep_reduce).collect();
	let children = collapse_numbers(flatten(reduced, kind), kind);

	let mut counts: IndexMap<Node, Vec<Node>> = IndexMap::new();
	for child in children {
		let (child, count) = kind.split_count(child);
		counts.entry(child).or_default().push(count);
	}

	let mut compressed = Vec::with_capacity(counts.len());
	for (child, counts) in counts {
		let mut counts = collapse_numbers(counts, VarOpKind::Add);
		if counts.len() > 1 {
			compressed.push(kind.compress(
				child,
				Node::VarOp {
					kind: VarOpKind::Add,
					children: counts,
				},
			));
			continue;
		}
		match counts.pop() {
			Some(Node::Num { val, .. }) if val.is_one() => compressed.push(child),
			// `0 * x` in a sum and `x^0` in a product are identities.
			Some(Node::Num { val, .. }) if val.is_zero() && child.finite_value().is_some() => {}
			Some(count) => compressed.push(kind.compress(child, count)),
			None => {}
		}
	}

	// Drop an identity literal next to other terms.
	if compressed.len() > 1 {
		compressed.retain(|c| !matches!(c, Node::Num { val, .. } if *val == kind.exact_identity()));
	}

	match compressed.len() {
		0 => Node::num(kind.exact_identity()),
		1 => compressed.swap_remove(0),
		_ => Node::VarOp {
			kind,
			children: compressed,
		},
	}
}

/// Turns `add(add(1, add(2)), 3)` into `[1, 2, 3]`, keeping order.
fn flatten(children: Vec<Node>, kind: VarOpKind) -> Vec<Node> {
	let mut flat = Vec::with_capacity(children.len());
	let mut stack: Vec<Node> = children.into_iter().rev().collect();
	while let Some(node) = stack.pop() {
		match node {
			Node::VarOp { kind: inner, children } if inner == kind => stack.extend(children.into_iter().rev()),
			other => flat.push(other),
		}
	}
	flat
}

/// Folds every literal child into one. The folded literal leads a product
/// and trails a sum.
fn collapse_numbers(nodes: Vec<Node>, kind: VarOpKind) -> Vec<Node> {
	let mut rest = Vec::with_capacity(nodes.len());
	let mut folded: Option<(BigRational, Option<u32>)> = None;
	for node in nodes {
		match node {
			Node::Num { val, input_base } => {
				folded = Some(match folded.take() {
					Some((acc, base)) => (kind.apply_exact(acc, val), result_base(base, input_base)),
					None => (val, input_base),
				});
			}
			other => rest.push(other),
		}
	}
	if let Some((val, input_base)) = folded {
		let num = Node::Num { val, input_base };
		match kind {
			VarOpKind::Mul => rest.insert(0, num),
			VarOpKind::Add => rest.push(num),
		}
	}
	rest
}

/// Picks the display base for a binary operation, preferring the more
/// interesting base of the two operands.
fn result_base(a: Option<u32>, b: Option<u32>) -> Option<u32> {
	match (a, b) {
		(Some(val), None) | (None, Some(val)) => Some(val),
		(Some(10), Some(other)) | (Some(other), Some(10)) => Some(other),
		(Some(2), _) | (_, Some(2)) => Some(2),
		(Some(a), Some(_)) => Some(a),
		(None, None) => None,
	}
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum Priority {
	Add,
	Mul,
	Exp,
	Value,
}

fn priority(node: &Node) -> Priority {
	match node {
		// shown with a sign or a fraction bar
		Node::Num { val, .. } if val.is_negative() || !val.is_integer() => Priority::Mul,
		Node::Const(_) | Node::Num { .. } | Node::Func(..) => Priority::Value,
		Node::Inverse(_) => Priority::Mul,
		Node::VarOp { kind: VarOpKind::Add, .. } => Priority::Add,
		Node::VarOp { kind: VarOpKind::Mul, .. } => Priority::Mul,
		Node::Exp(..) => Priority::Exp,
	}
}

fn write_with_paren(f: &mut fmt::Formatter<'_>, node: &Node, outer: Priority, right_assoc: bool) -> fmt::Result {
	let needs_paren = if right_assoc {
		priority(node) <= outer
	} else {
		priority(node) < outer
	};
	if needs_paren {
		f.write_char('(')?;
	}
	node.fmt(f)?;
	if needs_paren {
		f.write_char(')')?;
	}
	Ok(())
}

/// Integers in their input base, everything else as `numer/denom`.
fn write_number(f: &mut fmt::Formatter<'_>, val: &BigRational, base: Option<u32>) -> fmt::Result {
	if !val.is_integer() {
		return write!(f, "{}/{}", val.numer(), val.denom());
	}
	let int = val.to_integer();
	let sign = if int.is_negative() { "-" } else { "" };
	let abs = int.abs();
	match base {
		Some(16) => write!(f, "{sign}0x{}", abs.to_str_radix(16)),
		Some(8) => write!(f, "{sign}0o{}", abs.to_str_radix(8)),
		Some(2) => write!(f, "{sign}0b{}", abs.to_str_radix(2)),
		_ => write!(f, "{sign}{abs}"),
	}
}

impl Display for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Node::Const(ConstKind::Pi) => f.write_str("pi"),
			Node::Const(ConstKind::Tau) => f.write_str("tau"),
			Node::Const(ConstKind::E) => f.write_str("e"),
			Node::Num { val, input_base } => write_number(f, val, *input_base),
			Node::Inverse(inner) => {
				f.write_str("1/")?;
				write_with_paren(f, inner, Priority::Value, false)
			}
			Node::VarOp { kind, children } => {
				for (i, child) in children.iter().enumerate() {
					if i > 0 {
						if *kind == VarOpKind::Mul
							&& let Node::Inverse(divisor) = child
						{
							f.write_str(" / ")?;
							write_with_paren(f, divisor, Priority::Value, false)?;
							continue;
						}
						write!(f, " {} ", kind.symbol())?;
					}
					write_with_paren(f, child, priority(self), false)?;
				}
				Ok(())
			}
			Node::Exp(a, b) => {
				write_with_paren(f, a, Priority::Exp, true)?;
				f.write_char('^')?;
				write_with_paren(f, b, Priority::Exp, true)
			}
			Node::Func(func, inner) => {
				write!(f, "{}(", func.name())?;
				inner.fmt(f)?;
				f.write_char(')')
			}
		}
	}
}
