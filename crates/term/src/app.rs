//! Drives a page from stdin and prints its reports.

use std::io::Write;

use anyhow::Context;
use reckon_expr::{EvalError, Evaluation};
use reckon_page::{DebouncedEvaluator, EvalReport, PageConfig};
use reckon_worker::TaskClass;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::{InputMode, Settings};

/// Renders one report as an output line.
pub fn render(report: &EvalReport<Evaluation, EvalError>, precision: usize) -> String {
	match &report.outcome {
		Ok(value) => format!("{} = {}", report.expr, value.format(precision)),
		Err(err) => format!("{}: error: {err}", report.expr),
	}
}

/// Evaluates one expression directly, without the page.
pub fn eval_once(expr: &str, precision: usize) -> anyhow::Result<()> {
	let value = reckon_expr::evaluate(expr).with_context(|| format!("cannot evaluate '{expr}'"))?;
	println!("{}", value.format(precision));
	Ok(())
}

/// Feeds stdin lines to a page until end of input, printing every report.
///
/// Returns the number of failed evaluations.
pub async fn run(settings: Settings) -> anyhow::Result<usize> {
	let (page, mut reports) = DebouncedEvaluator::new(reckon_expr::evaluate, PageConfig::with_debounce(settings.debounce));
	tracing::debug!(debounce_ms = settings.debounce.as_millis() as u64, mode = ?settings.mode, "reckon.start");

	let precision = settings.precision;
	let printer = reckon_worker::spawn(TaskClass::Background, async move {
		let mut failures = 0usize;
		let mut stdout = std::io::stdout();
		while let Some(report) = reports.recv().await {
			if !report.is_ok() {
				failures += 1;
			}
			if writeln!(stdout, "{}", render(&report, precision)).is_err() {
				break;
			}
			let _ = stdout.flush();
		}
		failures
	});

	let mut lines = BufReader::new(tokio::io::stdin()).lines();
	while let Some(line) = lines.next_line().await.context("reading stdin")? {
		match settings.mode {
			InputMode::Lines => page.on_input_changed(line),
			InputMode::Each => {
				page.on_input_changed(line);
				page.wait_idle().await;
			}
			InputMode::Typing { keystroke } => {
				for (end, ch) in line.char_indices() {
					page.on_input_changed(&line[..end + ch.len_utf8()]);
					tokio::time::sleep(keystroke).await;
				}
				page.wait_idle().await;
			}
		}
	}

	page.wait_idle().await;
	let status = page.status();
	tracing::debug!(started = status.started, coalesced = status.coalesced, "reckon.done");
	drop(page);

	let failures = printer.await.context("report printer task failed")?;
	Ok(failures)
}

#[cfg(test)]
mod tests {
	use reckon_page::EvalFailure;

	use super::*;

	#[test]
	fn renders_values_and_errors() {
		let ok = EvalReport {
			seq: 1,
			expr: "1/3".to_string(),
			outcome: reckon_expr::evaluate("1/3").map_err(EvalFailure::Rejected),
		};
		assert_eq!(render(&ok, 4), "1/3 = 0.3333");

		let err = EvalReport {
			seq: 2,
			expr: "5/0".to_string(),
			outcome: reckon_expr::evaluate("5/0").map_err(EvalFailure::Rejected),
		};
		assert_eq!(render(&err, 4), "5/0: error: division by zero");

		let panicked: EvalReport<Evaluation, EvalError> = EvalReport {
			seq: 3,
			expr: "x".to_string(),
			outcome: Err(EvalFailure::Panicked("boom".to_string())),
		};
		assert_eq!(render(&panicked, 4), "x: error: evaluation panicked: boom");
	}

	#[test]
	fn eval_once_reports_errors() {
		assert!(eval_once("2+2", 12).is_ok());
		let err = eval_once("2+", 12).unwrap_err();
		assert_eq!(err.to_string(), "cannot evaluate '2+'");
	}
}
