/// Execution classes used for worker scheduling and observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Latency-sensitive work on the input path (debounce timers, dispatch).
	Interactive,
	/// Background async work that nothing is waiting on directly.
	Background,
	/// CPU-bound work executed on the blocking pool (expression evaluation).
	CpuBlocking,
}

impl TaskClass {
	/// Stable name used as the `worker_class` tracing field.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Interactive => "interactive",
			Self::Background => "background",
			Self::CpuBlocking => "cpu_blocking",
		}
	}

	/// Returns `true` for classes that must run on the blocking pool.
	pub const fn is_blocking(self) -> bool {
		matches!(self, Self::CpuBlocking)
	}
}
