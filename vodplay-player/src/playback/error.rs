use crate::playback::subtitle::SubtitleTrackId;
use crate::playback::surface::SurfaceError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
	#[error("Failed to load media: {reason}")]
	MediaLoad { reason: String },
	#[error("Invalid parameter: {0}")]
	InvalidParameter(#[from] InvalidParameter),
	#[error("No media is active.")]
	Inactive,
	#[error("Media surface rejected the command: {0}")]
	SurfaceRejected(#[from] SurfaceError),
	#[error("Playback session has already been closed.")]
	SessionClosed,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidParameter {
	#[error("Playback rate {0} is not supported.")]
	UnsupportedPlaybackRate(f64),
	#[error("Can't seek before the duration of the media is known.")]
	DurationUnknown,
	#[error("Subtitle track '{0}' is not offered by the media.")]
	UnknownSubtitleTrack(SubtitleTrackId),
	#[error("There is no resume decision pending.")]
	NoPendingResumeDecision,
}
