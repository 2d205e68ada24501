/// Turns expression text into a value.
///
/// Called on the blocking pool, one call at a time per page. Implementations
/// may be slow but should not block on the UI.
pub trait Evaluate: Send + Sync + 'static {
	type Output: Send + 'static;
	type Error: Send + 'static;

	fn evaluate(&self, expr: &str) -> Result<Self::Output, Self::Error>;
}

impl<F, O, E> Evaluate for F
where
	F: Fn(&str) -> Result<O, E> + Send + Sync + 'static,
	O: Send + 'static,
	E: Send + 'static,
{
	type Output = O;
	type Error = E;

	fn evaluate(&self, expr: &str) -> Result<O, E> {
		self(expr)
	}
}
