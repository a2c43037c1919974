use crate::types::{ContentId, UserId};
use async_trait::async_trait;
use chrono::Duration;
use static_assertions::assert_obj_safe;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WatchHistoryError {
	#[error("Watch history lookup unavailable: {reason}")]
	LookupUnavailable { reason: String },
	#[error("Failed to report watch position: {reason}")]
	ReportFailed { reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionReport {
	pub position: Duration,
	/// Set only by the report made when the media played to its end.
	pub completed: bool,
}

/// Remote store of per user and content playback positions.
#[async_trait]
pub trait WatchHistory: Send + Sync {
	/// The saved position, `None` if the user never watched this content.
	async fn position(&self, user: UserId, content: ContentId) -> Result<Option<Duration>, WatchHistoryError>;

	async fn report(&self, user: UserId, content: ContentId, report: PositionReport)
	-> Result<(), WatchHistoryError>;
}

assert_obj_safe!(WatchHistory);
