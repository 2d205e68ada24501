use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "reckon")]
#[command(about = "A calculator that evaluates as you type")]
#[command(version)]
/// Command-line arguments.
///
/// Without `--eval`, every line read from stdin is treated as an edit of the
/// input box. Lines arriving faster than the debounce delay coalesce, so only
/// the latest one is evaluated unless `--each` or `--typing` is given.
pub struct Cli {
	/// Evaluate one expression, print the result and exit
	#[arg(long, short = 'e', value_name = "EXPR")]
	pub eval: Option<String>,

	/// Configuration file (defaults to <config dir>/reckon/reckon.toml)
	#[arg(long, short = 'c', value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Quiet period before an edit is evaluated, in milliseconds
	#[arg(long, value_name = "MS")]
	pub debounce_ms: Option<u64>,

	/// Wait for each line's result before reading the next one
	#[arg(long, conflicts_with = "typing")]
	pub each: bool,

	/// Replay each line one character at a time, as if typed
	#[arg(long)]
	pub typing: bool,

	/// Delay between simulated keystrokes, in milliseconds
	#[arg(long, value_name = "MS", requires = "typing")]
	pub keystroke_ms: Option<u64>,

	/// Fractional digits shown for decimal results
	#[arg(long, value_name = "N")]
	pub precision: Option<usize>,

	/// Verbose logging
	#[arg(long, short)]
	pub verbose: bool,
}
