use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::advance;

use super::*;

const DEBOUNCE: Duration = Duration::from_millis(200);

/// Records every evaluated expression and the peak number of concurrent calls.
#[derive(Default)]
struct Recorder {
	seen: parking_lot::Mutex<Vec<String>>,
	active: AtomicUsize,
	peak: AtomicUsize,
}

impl Recorder {
	fn seen(&self) -> Vec<String> {
		self.seen.lock().clone()
	}
}

#[derive(Clone, Default)]
struct RecordingEval(Arc<Recorder>);

impl Evaluate for RecordingEval {
	type Output = usize;
	type Error = String;

	fn evaluate(&self, expr: &str) -> Result<usize, String> {
		let now = self.0.active.fetch_add(1, Ordering::SeqCst) + 1;
		self.0.peak.fetch_max(now, Ordering::SeqCst);
		self.0.seen.lock().push(expr.to_string());
		self.0.active.fetch_sub(1, Ordering::SeqCst);
		if expr.is_empty() { Err("empty".to_string()) } else { Ok(expr.len()) }
	}
}

/// Evaluator that announces each call and then blocks until released.
struct Gated {
	started: mpsc::UnboundedSender<String>,
	release: parking_lot::Mutex<std::sync::mpsc::Receiver<()>>,
}

impl Evaluate for Gated {
	type Output = String;
	type Error = String;

	fn evaluate(&self, expr: &str) -> Result<String, String> {
		let _ = self.started.send(expr.to_string());
		let _ = self.release.lock().recv();
		Ok(expr.to_uppercase())
	}
}

fn gated() -> (Gated, mpsc::UnboundedReceiver<String>, std::sync::mpsc::Sender<()>) {
	let (started, started_rx) = mpsc::unbounded_channel();
	let (release_tx, release) = std::sync::mpsc::channel();
	let eval = Gated {
		started,
		release: parking_lot::Mutex::new(release),
	};
	(eval, started_rx, release_tx)
}

/// Edits `text` and advances the clock until its timer has fired.
async fn submit<E: Evaluate>(page: &DebouncedEvaluator<E>, text: &str) {
	page.on_input_changed(text);
	advance(DEBOUNCE).await;
	let mut status = page.subscribe();
	let _ = status.wait_for(|s| !s.debouncing).await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn rapid_edits_evaluate_only_the_last() {
	let recorder = RecordingEval::default();
	let (page, mut reports) = DebouncedEvaluator::new(recorder.clone(), PageConfig::with_debounce(DEBOUNCE));

	page.on_input_changed("1");
	advance(Duration::from_millis(50)).await;
	page.on_input_changed("1+");
	advance(Duration::from_millis(50)).await;
	page.on_input_changed("1+2");

	let report = reports.recv().await.expect("one report");
	assert_eq!(report.expr, "1+2");
	assert_eq!(report.seq, 1);
	assert_eq!(report.outcome, Ok(3));

	page.wait_idle().await;
	tokio::time::sleep(DEBOUNCE * 5).await;
	assert_eq!(reports.try_recv().unwrap_err(), TryRecvError::Empty);
	assert_eq!(recorder.0.seen(), vec!["1+2"]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn nothing_evaluates_before_the_delay() {
	let recorder = RecordingEval::default();
	let (page, mut reports) = DebouncedEvaluator::new(recorder.clone(), PageConfig::with_debounce(DEBOUNCE));

	page.on_input_changed("42");
	assert!(page.status().debouncing);
	advance(DEBOUNCE - Duration::from_millis(1)).await;
	tokio::task::yield_now().await;
	assert_eq!(reports.try_recv().unwrap_err(), TryRecvError::Empty);
	assert!(recorder.0.seen().is_empty());

	let report = reports.recv().await.expect("report after delay");
	assert_eq!(report.expr, "42");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn edits_during_flight_queue_and_coalesce() {
	let (eval, mut started, release) = gated();
	let (page, mut reports) = DebouncedEvaluator::new(eval, PageConfig::with_debounce(DEBOUNCE));

	page.on_input_changed("a");
	assert_eq!(started.recv().await.as_deref(), Some("a"));

	submit(&page, "b").await;
	assert!(page.status().queued);
	submit(&page, "c").await;
	submit(&page, "d").await;
	let status = page.status();
	assert!(status.in_flight && status.queued);
	assert_eq!(status.coalesced, 2);
	assert_eq!(status.started, 1);

	release.send(()).unwrap();
	release.send(()).unwrap();

	let first = reports.recv().await.unwrap();
	assert_eq!((first.seq, first.expr.as_str()), (1, "a"));
	let second = reports.recv().await.unwrap();
	assert_eq!((second.seq, second.expr.as_str()), (2, "d"));
	assert_eq!(second.outcome, Ok("D".to_string()));

	page.wait_idle().await;
	assert_eq!(started.try_recv().ok(), Some("d".to_string()));
	assert_eq!(started.try_recv().unwrap_err(), TryRecvError::Empty);
	assert_eq!(page.status().completed, 2);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn same_text_twice_evaluates_twice() {
	let recorder = RecordingEval::default();
	let (page, mut reports) = DebouncedEvaluator::new(recorder.clone(), PageConfig::with_debounce(DEBOUNCE));

	page.on_input_changed("7*6");
	let first = reports.recv().await.unwrap();
	page.on_input_changed("7*6");
	let second = reports.recv().await.unwrap();

	assert_eq!(first.outcome, second.outcome);
	assert_eq!((first.seq, second.seq), (1, 2));
	assert_eq!(recorder.0.seen(), vec!["7*6", "7*6"]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn rejected_evaluation_does_not_block_later_edits() {
	let recorder = RecordingEval::default();
	let (page, mut reports) = DebouncedEvaluator::new(recorder, PageConfig::with_debounce(DEBOUNCE));

	page.on_input_changed("");
	let failed = reports.recv().await.unwrap();
	assert_eq!(failed.outcome, Err(EvalFailure::Rejected("empty".to_string())));

	page.on_input_changed("ok");
	let next = reports.recv().await.unwrap();
	assert_eq!(next.outcome, Ok(2));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn panicking_evaluator_is_reported_and_recovered() {
	let eval = |expr: &str| -> Result<usize, String> {
		if expr == "boom" {
			panic!("evaluator exploded");
		}
		Ok(expr.len())
	};
	let (page, mut reports) = DebouncedEvaluator::new(eval, PageConfig::with_debounce(DEBOUNCE));

	page.on_input_changed("boom");
	let report = reports.recv().await.unwrap();
	match report.outcome {
		Err(EvalFailure::Panicked(msg)) => assert!(msg.contains("evaluator exploded"), "{msg}"),
		other => panic!("expected panic report, got {other:?}"),
	}

	page.on_input_changed("fine");
	assert_eq!(reports.recv().await.unwrap().outcome, Ok(4));
	page.wait_idle().await;
	assert!(page.status().is_idle());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn shutdown_cancels_armed_timer_and_ignores_later_edits() {
	let recorder = RecordingEval::default();
	let (page, mut reports) = DebouncedEvaluator::new(recorder.clone(), PageConfig::with_debounce(DEBOUNCE));

	page.on_input_changed("1");
	page.shutdown();
	assert!(page.status().is_idle());

	page.on_input_changed("2");
	assert!(!page.status().debouncing);

	tokio::time::sleep(DEBOUNCE * 5).await;
	assert_eq!(reports.try_recv().unwrap_err(), TryRecvError::Empty);
	assert!(recorder.0.seen().is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn shutdown_drops_queued_text_but_finishes_flight() {
	let (eval, mut started, release) = gated();
	let (page, mut reports) = DebouncedEvaluator::new(eval, PageConfig::with_debounce(DEBOUNCE));

	page.on_input_changed("first");
	assert_eq!(started.recv().await.as_deref(), Some("first"));
	submit(&page, "second").await;
	assert!(page.status().queued);

	page.shutdown();
	release.send(()).unwrap();

	let report = reports.recv().await.unwrap();
	assert_eq!(report.expr, "first");
	page.wait_idle().await;
	assert_eq!(reports.try_recv().unwrap_err(), TryRecvError::Empty);
	assert_eq!(page.status().completed, 1);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn closed_receiver_does_not_stall_the_page() {
	let recorder = RecordingEval::default();
	let (page, reports) = DebouncedEvaluator::new(recorder.clone(), PageConfig::with_debounce(DEBOUNCE));
	drop(reports);

	page.on_input_changed("x");
	page.wait_idle().await;
	page.on_input_changed("yy");
	page.wait_idle().await;

	assert_eq!(recorder.0.seen(), vec!["x", "yy"]);
	assert_eq!(recorder.0.peak.load(Ordering::SeqCst), 1);
}
