use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;

/// Overrides the log filter (`EnvFilter` syntax).
pub const LOG_ENV: &str = "RECKON_LOG";

/// Redirects logs to `<dir>/reckon.<pid>.log` instead of stderr.
pub const LOG_DIR_ENV: &str = "RECKON_LOG_DIR";

fn filter(verbose: bool) -> EnvFilter {
	EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("reckon=debug,reckon_page=debug,reckon_worker=debug,info")
		} else {
			EnvFilter::new("warn")
		}
	})
}

/// Installs the global tracing subscriber.
///
/// Results go to stdout, so logs always go to stderr or a file.
pub fn setup_tracing(verbose: bool) {
	if let Some(log_dir) = std::env::var_os(LOG_DIR_ENV).map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("reckon.{}.log", std::process::id()));

		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(std::sync::Mutex::new(file))
				.with_ansi(false)
				.with_span_events(FmtSpan::CLOSE)
				.with_target(true);

			tracing_subscriber::registry().with(filter(verbose)).with(file_layer).init();

			tracing::info!(path = ?log_path, "tracing initialized");
			return;
		}
	}

	tracing_subscriber::fmt().with_env_filter(filter(verbose)).with_writer(std::io::stderr).init();
}
