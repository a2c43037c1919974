use crate::configuration::ConfigurationError;
use crate::playback::error::PlaybackError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VodplayError {
	#[error("Failed to load configuration: {0}")]
	Configuration(#[from] ConfigurationError),
	#[error("Invalid watch history url: {0}")]
	WatchHistoryUrl(#[from] url::ParseError),
	#[error("Playback failed: {0}")]
	Playback(#[from] PlaybackError),
	#[error("Playback session crashed: {0}")]
	Session(#[from] tokio::task::JoinError),
}
