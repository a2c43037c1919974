use crate::playback::error::PlaybackError;
use crate::playback::rate::PlaybackRate;
use crate::playback::subtitle::SubtitleTrackId;
use crate::playback::volume::Volume;
use crate::resume::coordinator::ResumeDecision;
use chrono::Duration;
use tokio::sync::oneshot;

pub type Responder<Output> = oneshot::Sender<Result<Output, PlaybackError>>;

/// Requests from a [`super::handle::SessionHandle`] to its runner.
#[derive(Debug)]
pub enum SessionCommand {
	Play {
		respond_to: Responder<()>,
	},
	Pause {
		respond_to: Responder<()>,
	},
	Seek {
		position: Duration,
		respond_to: Responder<Duration>,
	},
	Skip {
		delta: Duration,
		respond_to: Responder<Duration>,
	},
	SetVolume {
		fraction: f64,
		respond_to: Responder<Volume>,
	},
	ToggleMute {
		respond_to: Responder<bool>,
	},
	SetPlaybackRate {
		multiplier: f64,
		respond_to: Responder<PlaybackRate>,
	},
	SelectSubtitle {
		track: Option<SubtitleTrackId>,
		respond_to: Responder<()>,
	},
	ResolveResume {
		decision: ResumeDecision,
		respond_to: Responder<Duration>,
	},
	RequestFullscreen,
	ExitFullscreen,
	PointerMoved,
	PointerLeft,
	Close,
}
