//! Seams to the environment that actually decodes and displays media.
//!
//! Commands only request a change. What really happened is reported back as [`PlayerEvent`]s on the event stream
//! the caller passes into the session, and those events are the only thing that changes the play state.
//!
//! [`PlayerEvent`]: crate::playback::state::PlayerEvent

use crate::playback::rate::PlaybackRate;
use crate::playback::subtitle::SubtitleTrackId;
use crate::playback::volume::Volume;
use chrono::Duration;
use static_assertions::assert_obj_safe;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct SurfaceError(pub String);

pub trait MediaSurface: Send {
	fn load(&mut self, media_source: &Url) -> Result<(), SurfaceError>;
	fn play(&mut self) -> Result<(), SurfaceError>;
	fn pause(&mut self) -> Result<(), SurfaceError>;
	fn seek(&mut self, position: Duration) -> Result<(), SurfaceError>;
	fn set_volume(&mut self, volume: Volume);
	fn set_muted(&mut self, muted: bool);
	fn set_playback_rate(&mut self, rate: PlaybackRate);
	/// Shows exactly the given track, hiding every other one. `None` hides all of them.
	fn select_text_track(&mut self, track: Option<&SubtitleTrackId>) -> Result<(), SurfaceError>;
	/// Stops decoding and lets go of the media source.
	fn release(&mut self);
}

/// Fullscreen capability of the host environment.
///
/// Hosts may refuse or silently ignore requests. Whether fullscreen is actually active is only ever learned from
/// `PlayerEvent::FullscreenChanged` notifications.
pub trait FullscreenEnvironment: Send {
	fn request_fullscreen(&mut self) -> Result<(), SurfaceError>;
	fn exit_fullscreen(&mut self) -> Result<(), SurfaceError>;
}

assert_obj_safe!(MediaSurface);
assert_obj_safe!(FullscreenEnvironment);

impl<Surface: MediaSurface + ?Sized> MediaSurface for Box<Surface> {
	fn load(&mut self, media_source: &Url) -> Result<(), SurfaceError> {
		(**self).load(media_source)
	}

	fn play(&mut self) -> Result<(), SurfaceError> {
		(**self).play()
	}

	fn pause(&mut self) -> Result<(), SurfaceError> {
		(**self).pause()
	}

	fn seek(&mut self, position: Duration) -> Result<(), SurfaceError> {
		(**self).seek(position)
	}

	fn set_volume(&mut self, volume: Volume) {
		(**self).set_volume(volume);
	}

	fn set_muted(&mut self, muted: bool) {
		(**self).set_muted(muted);
	}

	fn set_playback_rate(&mut self, rate: PlaybackRate) {
		(**self).set_playback_rate(rate);
	}

	fn select_text_track(&mut self, track: Option<&SubtitleTrackId>) -> Result<(), SurfaceError> {
		(**self).select_text_track(track)
	}

	fn release(&mut self) {
		(**self).release();
	}
}

impl<Environment: FullscreenEnvironment + ?Sized> FullscreenEnvironment for Box<Environment> {
	fn request_fullscreen(&mut self) -> Result<(), SurfaceError> {
		(**self).request_fullscreen()
	}

	fn exit_fullscreen(&mut self) -> Result<(), SurfaceError> {
		(**self).exit_fullscreen()
	}
}
