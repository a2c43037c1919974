use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Display, From, Into, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

#[derive(Clone, Copy, Debug, Display, From, Into, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(i64);

/// Converts a configured [`std::time::Duration`] into a media position, saturating at the largest representable one.
pub fn position_from_std(duration: std::time::Duration) -> chrono::Duration {
	let milliseconds = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
	chrono::Duration::milliseconds(milliseconds)
}
