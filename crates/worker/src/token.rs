use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

/// Monotonic id source. The first id handed out is 1.
#[derive(Debug, Default, Clone)]
pub struct GenerationClock {
	next: Arc<AtomicU64>,
}

impl GenerationClock {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the next generation id.
	pub fn next(&self) -> u64 {
		self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
	}
}

/// Cancellation token bound to one generation id.
///
/// Debounce timers hold one of these: rearming cancels the old token and the
/// generation id lets a fire that raced the cancellation recognize itself as
/// stale.
#[derive(Debug, Clone)]
pub struct GenerationToken {
	generation: u64,
	cancel: CancellationToken,
}

impl GenerationToken {
	pub const fn generation(&self) -> u64 {
		self.generation
	}

	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Resolves when this token or its scope is cancelled.
	pub async fn cancelled(&self) {
		self.cancel.cancelled().await;
	}
}

/// Issues generation tokens under one root that can be closed at once.
///
/// Every token is a child of the root, so [`GenerationScope::close`] cancels
/// all outstanding tokens. A closed scope issues nothing.
#[derive(Debug, Default)]
pub struct GenerationScope {
	root: CancellationToken,
	clock: GenerationClock,
}

impl GenerationScope {
	pub fn new() -> Self {
		Self::default()
	}

	/// Issues a token for the next generation, or `None` once closed.
	pub fn issue(&self) -> Option<GenerationToken> {
		if self.root.is_cancelled() {
			return None;
		}
		Some(GenerationToken {
			generation: self.clock.next(),
			cancel: self.root.child_token(),
		})
	}

	/// Cancels every issued token and stops issuing new ones.
	pub fn close(&self) {
		self.root.cancel();
	}

	pub fn is_closed(&self) -> bool {
		self.root.is_cancelled()
	}
}
