//! Ordering and single-flight properties over random edit timings.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use proptest::prelude::*;
use reckon_page::{DebouncedEvaluator, EvalReport, Evaluate, PageConfig};

/// Sleeps for the number of milliseconds in the expression suffix and tracks
/// how many calls overlap.
#[derive(Default)]
struct Tracker {
	active: AtomicUsize,
	peak: AtomicUsize,
	order: Mutex<Vec<usize>>,
}

#[derive(Clone, Default)]
struct SlowEval(Arc<Tracker>);

impl Evaluate for SlowEval {
	type Output = usize;
	type Error = String;

	fn evaluate(&self, expr: &str) -> Result<usize, String> {
		let (index, cost) = expr.split_once(':').ok_or_else(|| format!("bad edit {expr}"))?;
		let index: usize = index.parse().map_err(|_| format!("bad index {index}"))?;
		let cost: u64 = cost.parse().map_err(|_| format!("bad cost {cost}"))?;

		let now = self.0.active.fetch_add(1, Ordering::SeqCst) + 1;
		self.0.peak.fetch_max(now, Ordering::SeqCst);
		std::thread::sleep(Duration::from_millis(cost));
		self.0.order.lock().push(index);

		self.0.active.fetch_sub(1, Ordering::SeqCst);
		Ok(index)
	}
}

/// One edit: gap before it and simulated evaluation cost, in milliseconds.
fn arb_edits() -> impl Strategy<Value = Vec<(u64, u64)>> {
	prop::collection::vec((0u64..12, 0u64..8), 1..16)
}

fn run(edits: &[(u64, u64)], debounce: Duration) -> (Arc<Tracker>, Vec<EvalReport<usize, String>>) {
	let rt = tokio::runtime::Builder::new_multi_thread()
		.worker_threads(2)
		.enable_all()
		.build()
		.expect("runtime");

	rt.block_on(async {
		let eval = SlowEval::default();
		let tracker = Arc::clone(&eval.0);
		let (page, mut rx) = DebouncedEvaluator::new(eval, PageConfig::with_debounce(debounce));

		for (index, (gap, cost)) in edits.iter().enumerate() {
			tokio::time::sleep(Duration::from_millis(*gap)).await;
			page.on_input_changed(format!("{index}:{cost}"));
		}
		page.wait_idle().await;

		let mut reports = Vec::new();
		while let Ok(report) = rx.try_recv() {
			reports.push(report);
		}
		(tracker, reports)
	})
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(24))]

	/// Evaluations never overlap, run in edit order, and the last edit is
	/// always the last thing evaluated.
	#[test]
	fn single_flight_and_latest_wins(edits in arb_edits()) {
		let (tracker, reports) = run(&edits, Duration::from_millis(5));

		prop_assert_eq!(tracker.peak.load(Ordering::SeqCst), 1);

		let order = tracker.order.lock().clone();
		prop_assert!(order.windows(2).all(|w| w[0] < w[1]), "out of order: {:?}", order);
		prop_assert_eq!(order.last().copied(), Some(edits.len() - 1));

		prop_assert_eq!(reports.len(), order.len());
		for (i, report) in reports.iter().enumerate() {
			prop_assert_eq!(report.seq, i as u64 + 1);
		}
	}

	/// Edits that all land inside the debounce window evaluate exactly once.
	#[test]
	fn bursts_inside_the_window_evaluate_once(gaps in prop::collection::vec(0u64..40, 1..10)) {
		let edits: Vec<(u64, u64)> = gaps.iter().map(|gap| (*gap, 0)).collect();
		let rt = tokio::runtime::Builder::new_current_thread()
			.enable_all()
			.start_paused(true)
			.build()
			.expect("runtime");

		let (tracker, reports) = rt.block_on(async {
			let eval = SlowEval::default();
			let tracker = Arc::clone(&eval.0);
			let (page, mut rx) = DebouncedEvaluator::new(eval, PageConfig::with_debounce(Duration::from_millis(200)));
			for (index, (gap, cost)) in edits.iter().enumerate() {
				tokio::time::advance(Duration::from_millis(*gap)).await;
				page.on_input_changed(format!("{index}:{cost}"));
			}
			page.wait_idle().await;
			let mut reports = Vec::new();
			while let Ok(report) = rx.try_recv() {
				reports.push(report);
			}
			(tracker, reports)
		});

		prop_assert_eq!(reports.len(), 1);
		prop_assert_eq!(&reports[0].outcome, &Ok(edits.len() - 1));
		prop_assert_eq!(tracker.order.lock().clone(), vec![edits.len() - 1]);
	}
}
