//! TOML configuration and its merge with command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::cli::Cli;

/// File name looked up under the platform config directory.
pub const CONFIG_FILE: &str = "reckon.toml";

/// Highest precision that still carries information for an `f64`.
pub const MAX_PRECISION: usize = 17;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Error parsing TOML or an unknown key.
	#[error("invalid config {path}: {error}")]
	Parse {
		path: PathBuf,
		error: toml::de::Error,
	},

	/// A value is out of range.
	#[error("invalid config value: {0}")]
	Invalid(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub page: PageSection,
	pub typing: TypingSection,
	pub display: DisplaySection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageSection {
	pub debounce_ms: u64,
}

impl Default for PageSection {
	fn default() -> Self {
		Self {
			debounce_ms: reckon_page::DEFAULT_DEBOUNCE.as_millis() as u64,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypingSection {
	pub keystroke_ms: u64,
}

impl Default for TypingSection {
	fn default() -> Self {
		Self { keystroke_ms: 40 }
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplaySection {
	pub precision: usize,
}

impl Default for DisplaySection {
	fn default() -> Self {
		Self {
			precision: reckon_expr::DEFAULT_PRECISION,
		}
	}
}

impl Config {
	/// Parses configuration text. `path` is only used in error messages.
	pub fn parse(text: &str, path: &Path) -> Result<Self> {
		let config: Config = toml::from_str(text).map_err(|error| ConfigError::Parse {
			path: path.to_path_buf(),
			error,
		})?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<()> {
		if self.display.precision > MAX_PRECISION {
			return Err(ConfigError::Invalid(format!(
				"display.precision must be at most {MAX_PRECISION}, got {}",
				self.display.precision
			)));
		}
		Ok(())
	}
}

/// Default configuration path, if the platform has a config directory.
pub fn default_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("reckon").join(CONFIG_FILE))
}

/// Loads configuration.
///
/// An explicit path must exist. The default path is optional: when it is
/// missing, defaults are used.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
	let (path, required) = match explicit {
		Some(path) => (path.to_path_buf(), true),
		None => match default_path() {
			Some(path) => (path, false),
			None => return Ok(Config::default()),
		},
	};

	match std::fs::read_to_string(&path) {
		Ok(text) => {
			tracing::debug!(path = %path.display(), "config.loaded");
			Config::parse(&text, &path)
		}
		Err(error) if !required && error.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
		Err(error) => Err(ConfigError::Io { path, error }),
	}
}

/// How stdin lines are fed to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
	/// Each line is one edit; bursts coalesce.
	Lines,
	/// Each line is one edit and its result is awaited before the next.
	Each,
	/// Each line is typed out one character per keystroke.
	Typing { keystroke: Duration },
}

/// Effective settings after applying CLI overrides to the file config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
	pub debounce: Duration,
	pub precision: usize,
	pub mode: InputMode,
}

impl Settings {
	pub fn resolve(cli: &Cli, config: &Config) -> Result<Self> {
		let precision = cli.precision.unwrap_or(config.display.precision);
		if precision > MAX_PRECISION {
			return Err(ConfigError::Invalid(format!("precision must be at most {MAX_PRECISION}, got {precision}")));
		}

		let mode = if cli.typing {
			InputMode::Typing {
				keystroke: Duration::from_millis(cli.keystroke_ms.unwrap_or(config.typing.keystroke_ms)),
			}
		} else if cli.each {
			InputMode::Each
		} else {
			InputMode::Lines
		};

		Ok(Self {
			debounce: Duration::from_millis(cli.debounce_ms.unwrap_or(config.page.debounce_ms)),
			precision,
			mode,
		})
	}
}

#[cfg(test)]
mod tests {
	use clap::Parser;
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn empty_file_is_all_defaults() {
		let config = Config::parse("", Path::new("reckon.toml")).unwrap();
		assert_eq!(config, Config::default());
		assert_eq!(config.page.debounce_ms, 200);
		assert_eq!(config.typing.keystroke_ms, 40);
		assert_eq!(config.display.precision, 12);
	}

	#[test]
	fn sections_override_defaults() {
		let text = r#"
			[page]
			debounce_ms = 75

			[display]
			precision = 4
		"#;
		let config = Config::parse(text, Path::new("reckon.toml")).unwrap();
		assert_eq!(config.page.debounce_ms, 75);
		assert_eq!(config.display.precision, 4);
		assert_eq!(config.typing, TypingSection::default());
	}

	#[test]
	fn unknown_keys_are_rejected() {
		let err = Config::parse("[page]\ndebounce = 10\n", Path::new("x.toml")).unwrap_err();
		assert!(matches!(err, ConfigError::Parse { .. }), "{err}");
		assert!(err.to_string().starts_with("invalid config x.toml"));
	}

	#[test]
	fn precision_is_bounded() {
		let err = Config::parse("[display]\nprecision = 40\n", Path::new("x.toml")).unwrap_err();
		assert!(matches!(err, ConfigError::Invalid(_)));
	}

	#[test]
	fn explicit_missing_file_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		let err = load(Some(&dir.path().join("nope.toml"))).unwrap_err();
		assert!(matches!(err, ConfigError::Io { .. }));
	}

	#[test]
	fn explicit_file_is_loaded() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join(CONFIG_FILE);
		std::fs::write(&path, "[typing]\nkeystroke_ms = 5\n").unwrap();
		assert_eq!(load(Some(&path)).unwrap().typing.keystroke_ms, 5);
	}

	#[test]
	fn cli_flags_win_over_file() {
		let config = Config::parse("[page]\ndebounce_ms = 75\n[typing]\nkeystroke_ms = 9\n", Path::new("x.toml")).unwrap();

		let cli = Cli::try_parse_from(["reckon", "--debounce-ms", "10", "--typing"]).unwrap();
		let settings = Settings::resolve(&cli, &config).unwrap();
		assert_eq!(settings.debounce, Duration::from_millis(10));
		assert_eq!(
			settings.mode,
			InputMode::Typing {
				keystroke: Duration::from_millis(9)
			}
		);

		let cli = Cli::try_parse_from(["reckon", "--each", "--precision", "3"]).unwrap();
		let settings = Settings::resolve(&cli, &config).unwrap();
		assert_eq!(settings.debounce, Duration::from_millis(75));
		assert_eq!(settings.mode, InputMode::Each);
		assert_eq!(settings.precision, 3);
	}

	#[test]
	fn conflicting_modes_are_rejected_by_clap() {
		assert!(Cli::try_parse_from(["reckon", "--each", "--typing"]).is_err());
		assert!(Cli::try_parse_from(["reckon", "--keystroke-ms", "5"]).is_err());
	}
}
