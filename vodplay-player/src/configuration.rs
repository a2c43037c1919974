use serde::Deserialize;
use std::fs::read_to_string;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Configuration {
	pub log_filters: String,
	pub watch_history: WatchHistoryConfiguration,
	#[serde(default)]
	pub playback: PlaybackConfiguration,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct WatchHistoryConfiguration {
	/// Everything up to and including the `/api` prefix, e.g. `http://localhost:8080/api`.
	pub base_url: Url,
	#[serde(default)]
	pub token: Option<String>,
	#[serde(with = "humantime_serde", default = "default_lookup_timeout")]
	pub lookup_timeout: Duration,
	#[serde(with = "humantime_serde", default = "default_report_timeout")]
	pub report_timeout: Duration,
}

fn default_lookup_timeout() -> Duration {
	Duration::from_secs(5)
}

fn default_report_timeout() -> Duration {
	Duration::from_secs(5)
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlaybackConfiguration {
	#[serde(with = "humantime_serde")]
	pub sampling_period: Duration,
	#[serde(with = "humantime_serde")]
	pub resume_threshold: Duration,
	#[serde(with = "humantime_serde")]
	pub report_epsilon: Duration,
	#[serde(with = "humantime_serde")]
	pub controls_hide_delay: Duration,
	#[serde(with = "humantime_serde")]
	pub skip_step: Duration,
}

impl Default for PlaybackConfiguration {
	fn default() -> Self {
		Self {
			sampling_period: Duration::from_secs(5),
			resume_threshold: Duration::from_secs(30),
			report_epsilon: Duration::from_secs(1),
			controls_hide_delay: Duration::from_secs(3),
			skip_step: Duration::from_secs(10),
		}
	}
}

impl Configuration {
	pub fn from_file(path: impl AsRef<Path>) -> Result<Configuration, ConfigurationError> {
		let text = read_to_string(path)?;

		Configuration::try_from(text.as_str())
	}
}

impl TryFrom<&str> for Configuration {
	type Error = ConfigurationError;

	fn try_from(text: &str) -> Result<Self, Self::Error> {
		let configuration: Configuration = toml::from_str(text)?;
		if configuration.playback.sampling_period.is_zero() {
			return Err(ConfigurationError::ZeroDuration("playback.sampling_period"));
		}

		Ok(configuration)
	}
}

#[derive(Error, Debug)]
pub enum ConfigurationError {
	#[error("Failed to deserialize with error: {0}")]
	DeserializationError(#[from] toml::de::Error),
	#[error("IO operation failed: {0}")]
	IoError(#[from] std::io::Error),
	#[error("'{0}' must be longer than zero.")]
	ZeroDuration(&'static str),
}
