/// Observable state of a page, published after every transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageStatus {
	/// A debounce timer is armed.
	pub debouncing: bool,
	/// An evaluation is running.
	pub in_flight: bool,
	/// Text is waiting in the pending slot behind the running evaluation.
	pub queued: bool,
	/// Evaluations started so far.
	pub started: u64,
	/// Evaluations finished (successfully or not) so far.
	pub completed: u64,
	/// Queued texts overwritten by newer text before they were evaluated.
	pub coalesced: u64,
}

impl PageStatus {
	/// Nothing armed, running or queued.
	pub fn is_idle(&self) -> bool {
		!self.debouncing && !self.in_flight && !self.queued
	}
}
