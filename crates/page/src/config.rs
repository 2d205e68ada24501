use std::time::Duration;

/// Default quiet period between the last edit and its evaluation.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Tuning for a [`crate::DebouncedEvaluator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageConfig {
	/// How long input must stay unchanged before it is evaluated.
	pub debounce: Duration,
}

impl Default for PageConfig {
	fn default() -> Self {
		Self { debounce: DEFAULT_DEBOUNCE }
	}
}

impl PageConfig {
	pub fn with_debounce(debounce: Duration) -> Self {
		Self { debounce }
	}
}
