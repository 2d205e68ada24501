//! The debounce timer, pending slot and evaluation continuation.
//!
//! # State
//!
//! All mutable state lives in one [`PageState`] behind one lock: the armed
//! debounce generation with the text it will submit, and the
//! [`PendingSlot`] holding the in-flight marker plus at most one queued
//! expression. The lock is held only for single transitions and never across
//! an await or an evaluation.
//!
//! # Transitions
//!
//! - edit: cancel the armed generation, arm a new one with the new text.
//! - timer fire: ignored unless its generation is still armed. Otherwise the
//!   text is offered to the slot, which either starts it (idle) or queues it,
//!   replacing any older queued text.
//! - evaluation done: send the report, then complete the slot. A queued
//!   expression is dispatched right away; otherwise the page goes idle.
//!
//! Reports are sent before the slot is completed, so report order is
//! evaluation order.

use std::sync::Arc;

use parking_lot::Mutex;
use reckon_worker::{GenerationClock, GenerationScope, GenerationToken, PendingSlot, SlotOffer, TaskClass, join_error_panic_message, spawn, spawn_blocking};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::{EvalFailure, EvalReport, Evaluate, PageConfig, PageStatus};

#[cfg(test)]
mod tests;

/// Receiving end of a page's report channel.
pub type ReportReceiver<E> = mpsc::UnboundedReceiver<EvalReport<<E as Evaluate>::Output, <E as Evaluate>::Error>>;

type ReportSender<E> = mpsc::UnboundedSender<EvalReport<<E as Evaluate>::Output, <E as Evaluate>::Error>>;

/// Coalesces input edits into debounced, single-flight evaluations.
///
/// Dropping the handle cancels any armed timer and queued text. A running
/// evaluation still finishes and reports.
pub struct DebouncedEvaluator<E: Evaluate> {
	inner: Arc<Inner<E>>,
}

struct Inner<E: Evaluate> {
	evaluator: E,
	config: PageConfig,
	state: Mutex<PageState>,
	/// Debounce timer tokens; closed on shutdown.
	timers: GenerationScope,
	sequence: GenerationClock,
	reports: ReportSender<E>,
	status: watch::Sender<PageStatus>,
}

#[derive(Default)]
struct PageState {
	armed: Option<Armed>,
	slot: PendingSlot<String>,
}

/// The one pending debounce timer and the text it will submit.
struct Armed {
	token: GenerationToken,
	text: String,
}

impl<E: Evaluate> DebouncedEvaluator<E> {
	/// Creates a page and the channel its reports are delivered on.
	pub fn new(evaluator: E, config: PageConfig) -> (Self, ReportReceiver<E>) {
		let (reports, rx) = mpsc::unbounded_channel();
		let (status, _) = watch::channel(PageStatus::default());
		let inner = Inner {
			evaluator,
			config,
			state: Mutex::new(PageState::default()),
			timers: GenerationScope::new(),
			sequence: GenerationClock::new(),
			reports,
			status,
		};
		(Self { inner: Arc::new(inner) }, rx)
	}

	/// Handles one edit of the input text.
	///
	/// Rearms the debounce timer; never evaluates synchronously and never
	/// blocks. Edits after [`Self::shutdown`] are ignored.
	pub fn on_input_changed(&self, text: impl Into<String>) {
		let text = text.into();
		let deadline = Instant::now() + self.inner.config.debounce;

		let token = {
			let mut state = self.inner.state.lock();
			let Some(token) = self.inner.timers.issue() else {
				trace!("page.input.after_shutdown");
				return;
			};
			if let Some(prev) = state.armed.replace(Armed { token: token.clone(), text }) {
				prev.token.cancel();
			}
			self.inner.status.send_modify(|s| s.debouncing = true);
			token
		};

		let generation = token.generation();
		trace!(generation, "page.debounce.armed");
		let inner = Arc::clone(&self.inner);
		spawn(TaskClass::Interactive, async move {
			tokio::select! {
				() = token.cancelled() => trace!(generation, "page.debounce.cancelled"),
				() = tokio::time::sleep_until(deadline) => inner.on_debounce_elapsed(generation),
			}
		});
	}

	/// Cancels the armed timer and drops queued text.
	///
	/// A running evaluation still completes and reports. Later edits are
	/// ignored.
	pub fn shutdown(&self) {
		self.inner.shutdown();
	}

	/// Returns the current status snapshot.
	pub fn status(&self) -> PageStatus {
		*self.inner.status.borrow()
	}

	/// Subscribes to status changes.
	pub fn subscribe(&self) -> watch::Receiver<PageStatus> {
		self.inner.status.subscribe()
	}

	/// Resolves once nothing is armed, running or queued.
	///
	/// Every report for work submitted before the call has been sent by then.
	pub async fn wait_idle(&self) {
		let mut rx = self.inner.status.subscribe();
		let _ = rx.wait_for(PageStatus::is_idle).await;
	}
}

impl<E: Evaluate> Drop for DebouncedEvaluator<E> {
	fn drop(&mut self) {
		self.inner.shutdown();
	}
}

impl<E: Evaluate> Inner<E> {
	fn on_debounce_elapsed(self: &Arc<Self>, generation: u64) {
		let start = {
			let mut state = self.state.lock();
			if state.armed.as_ref().map(|a| a.token.generation()) != Some(generation) {
				trace!(generation, "page.debounce.stale");
				return;
			}
			let Some(Armed { text, .. }) = state.armed.take() else {
				return;
			};
			let offer = state.slot.offer(text);
			let queued = state.slot.is_queued();
			let replaced = matches!(offer, SlotOffer::Replaced);
			self.status.send_modify(|s| {
				s.debouncing = false;
				s.in_flight = true;
				s.queued = queued;
				if replaced {
					s.coalesced += 1;
				}
			});
			match offer {
				SlotOffer::Start(expr) => Some(expr),
				SlotOffer::Queued => {
					trace!(generation, "page.slot.queued");
					None
				}
				SlotOffer::Replaced => {
					debug!(generation, "page.slot.coalesced");
					None
				}
			}
		};

		if let Some(expr) = start {
			self.dispatch(expr);
		}
	}

	/// Starts one evaluation. The caller must own the slot's in-flight marker.
	fn dispatch(self: &Arc<Self>, expr: String) {
		let seq = self.sequence.next();
		self.status.send_modify(|s| s.started += 1);
		debug!(seq, expr = %expr, "page.eval.start");

		let inner = Arc::clone(self);
		spawn(TaskClass::Interactive, async move {
			let worker = Arc::clone(&inner);
			let input = expr.clone();
			let joined = spawn_blocking(TaskClass::CpuBlocking, move || worker.evaluator.evaluate(&input)).await;

			let outcome = match joined {
				Ok(Ok(value)) => Ok(value),
				Ok(Err(err)) => Err(EvalFailure::Rejected(err)),
				Err(err) if err.is_panic() => {
					let msg = join_error_panic_message(err).unwrap_or_else(|| "non-string panic payload".to_string());
					warn!(seq, panic = %msg, "page.eval.panicked");
					Err(EvalFailure::Panicked(msg))
				}
				Err(_) => {
					tracing::error!(seq, "page.eval.cancelled");
					Err(EvalFailure::Cancelled)
				}
			};

			inner.finish(EvalReport { seq, expr, outcome });
		});
	}

	/// Delivers a report, then drains the slot or goes idle.
	fn finish(self: &Arc<Self>, report: EvalReport<E::Output, E::Error>) {
		let seq = report.seq;
		let ok = report.is_ok();
		if self.reports.send(report).is_err() {
			warn!(seq, "page.report.receiver_closed");
		}

		let next = {
			let mut state = self.state.lock();
			let next = state.slot.complete();
			let in_flight = state.slot.is_in_flight();
			self.status.send_modify(|s| {
				s.completed += 1;
				s.in_flight = in_flight;
				s.queued = false;
			});
			next
		};
		debug!(seq, ok, drained = next.is_some(), "page.eval.done");

		if let Some(expr) = next {
			self.dispatch(expr);
		}
	}

	fn shutdown(&self) {
		let mut state = self.state.lock();
		self.timers.close();
		let dropped_timer = state.armed.take().is_some();
		let dropped_queued = state.slot.clear().is_some();
		self.status.send_modify(|s| {
			s.debouncing = false;
			s.queued = false;
		});
		debug!(dropped_timer, dropped_queued, "page.shutdown");
	}
}
