use crate::configuration::Configuration;
use crate::resume::http::HttpWatchHistory;
use crate::resume::watch_history::WatchHistory;
use crate::utils::time_source::TimeSource;
use std::sync::Arc;

#[derive(Clone)]
pub struct PlayerContext {
	pub configuration: Configuration,
	pub time_source: TimeSource,
	pub watch_history: Arc<dyn WatchHistory>,
}

impl PlayerContext {
	/// Talks to the watch history backend configured in `configuration`.
	pub fn new(configuration: Configuration, time_source: TimeSource) -> Result<PlayerContext, url::ParseError> {
		let watch_history = HttpWatchHistory::new(
			&configuration.watch_history.base_url,
			configuration.watch_history.token.clone(),
		)?;

		Ok(Self::with_watch_history(configuration, time_source, Arc::new(watch_history)))
	}

	pub fn with_watch_history(
		configuration: Configuration,
		time_source: TimeSource,
		watch_history: Arc<dyn WatchHistory>,
	) -> PlayerContext {
		Self {
			configuration,
			time_source,
			watch_history,
		}
	}
}

impl std::fmt::Debug for PlayerContext {
	fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		formatter
			.debug_struct("PlayerContext")
			.field("configuration", &self.configuration)
			.field("time_source", &self.time_source)
			.finish_non_exhaustive()
	}
}
