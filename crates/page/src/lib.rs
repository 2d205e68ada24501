//! Debounced single-flight evaluation for a calculator input box.
//!
//! [`DebouncedEvaluator`] sits between a UI that reports every edit and an
//! [`Evaluate`] implementation that may take a while. Edits rearm a debounce
//! timer; when it fires, the latest text goes into a one-element pending slot
//! and is evaluated on the blocking pool. At most one evaluation runs at a
//! time. Text that arrives while one is running waits in the slot, and newer
//! text replaces it, so the last edit is always evaluated and intermediate
//! ones may be skipped.
//!
//! Results arrive in evaluation order on the report channel returned by
//! [`DebouncedEvaluator::new`].

mod config;
mod evaluate;
mod page;
mod report;
mod status;

pub use config::{DEFAULT_DEBOUNCE, PageConfig};
pub use evaluate::Evaluate;
pub use page::{DebouncedEvaluator, ReportReceiver};
pub use report::{EvalFailure, EvalReport};
pub use status::PageStatus;

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use reckon_expr as _;
