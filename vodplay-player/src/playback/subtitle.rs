use derive_more::{Display, From};

#[derive(Clone, Debug, Display, From, PartialEq, Eq, Hash)]
#[from(forward)]
pub struct SubtitleTrackId(String);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubtitleTrack {
	pub id: SubtitleTrackId,
	pub label: String,
	pub language: Option<String>,
}
