/// Outcome of offering a value to a [`PendingSlot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOffer<T> {
	/// The slot was idle: the value is handed straight back and the slot is
	/// now in flight. The caller must start work on it and later call
	/// [`PendingSlot::complete`].
	Start(T),
	/// Work is in flight; the value was queued into an empty slot.
	Queued,
	/// Work is in flight; the value overwrote an older queued value.
	Replaced,
}

/// Capacity-1 coalescing queue with a single-flight marker.
///
/// Holds at most one pending value (last write wins) plus a flag recording
/// whether a consumer is currently working. Offer and completion are each a
/// single transition, so a caller holding this behind one lock gets
/// "start if idle, else queue" and "drain next, else go idle" atomically.
///
/// The slot does no locking of its own.
#[derive(Debug)]
pub struct PendingSlot<T> {
	pending: Option<T>,
	in_flight: bool,
}

impl<T> Default for PendingSlot<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> PendingSlot<T> {
	pub const fn new() -> Self {
		Self {
			pending: None,
			in_flight: false,
		}
	}

	/// Offers a value. Starts it when idle, otherwise coalesces it into the
	/// pending position.
	pub fn offer(&mut self, value: T) -> SlotOffer<T> {
		if !self.in_flight {
			debug_assert!(self.pending.is_none(), "idle slot holding a pending value");
			self.in_flight = true;
			return SlotOffer::Start(value);
		}
		match self.pending.replace(value) {
			Some(_) => SlotOffer::Replaced,
			None => SlotOffer::Queued,
		}
	}

	/// Marks the in-flight work finished.
	///
	/// Returns the queued value when one is waiting, in which case the slot
	/// stays in flight for it. Otherwise the slot goes idle.
	pub fn complete(&mut self) -> Option<T> {
		if !self.in_flight {
			tracing::error!("worker.slot.complete_while_idle");
			debug_assert!(self.in_flight, "PendingSlot::complete called with nothing in flight");
		}
		match self.pending.take() {
			Some(next) => {
				self.in_flight = true;
				Some(next)
			}
			None => {
				self.in_flight = false;
				None
			}
		}
	}

	/// Drops any queued value without touching the in-flight marker.
	pub fn clear(&mut self) -> Option<T> {
		self.pending.take()
	}

	pub fn is_in_flight(&self) -> bool {
		self.in_flight
	}

	pub fn is_queued(&self) -> bool {
		self.pending.is_some()
	}
}
