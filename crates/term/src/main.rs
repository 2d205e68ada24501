//! `reckon`: a terminal front end for the debounced calculator page.

mod app;
mod cli;
mod config;
mod logging;

use clap::Parser;
use cli::Cli;
use config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	logging::setup_tracing(cli.verbose);

	let config = config::load(cli.config.as_deref())?;
	let settings = Settings::resolve(&cli, &config)?;

	if let Some(expr) = cli.eval.as_deref() {
		return app::eval_once(expr, settings.precision);
	}

	let failures = app::run(settings).await?;
	if failures > 0 {
		tracing::info!(failures, "reckon.finished_with_errors");
	}
	Ok(())
}
