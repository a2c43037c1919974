use crate::playback::controls::ControlsVisibility;
use crate::playback::error::{InvalidParameter, PlaybackError};
use crate::playback::rate::PlaybackRate;
use crate::playback::state::{PlayState, PlaybackSession, PlayerEvent, Transition};
use crate::playback::subtitle::SubtitleTrackId;
use crate::playback::surface::{FullscreenEnvironment, MediaSurface};
use crate::playback::volume::Volume;
use chrono::Duration;
use tracing::{debug, warn};
use url::Url;

/// Drives one media surface through a single playback session.
///
/// The controller owns its surface until [`PlaybackController::release`], so a surface can never be bound to two
/// controllers at once.
pub struct PlaybackController<Surface, Environment> {
	surface: Surface,
	environment: Environment,
	session: PlaybackSession,
	controls: ControlsVisibility,
	play_requested: bool,
}

impl<Surface, Environment> std::fmt::Debug for PlaybackController<Surface, Environment> {
	fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		formatter
			.debug_struct("PlaybackController")
			.field("session", &self.session)
			.field("controls", &self.controls)
			.field("play_requested", &self.play_requested)
			.finish_non_exhaustive()
	}
}

impl<Surface: MediaSurface, Environment: FullscreenEnvironment> PlaybackController<Surface, Environment> {
	pub fn new(media_source: Url, surface: Surface, environment: Environment) -> Self {
		Self {
			surface,
			environment,
			session: PlaybackSession::new(media_source),
			controls: ControlsVisibility::default(),
			play_requested: false,
		}
	}

	/// Starts loading the media source. With `autoplay`, playback is requested once [`Self::take_play_request`] is
	/// honored by the caller.
	pub fn load(&mut self, autoplay: bool) -> Result<(), PlaybackError> {
		if self.session.play_state != PlayState::Idle {
			return Ok(());
		}

		self.play_requested = autoplay;
		self.session.play_state = PlayState::Loading;
		if let Err(error) = self.surface.load(&self.session.media_source) {
			let reason = error.to_string();
			self.session.apply(PlayerEvent::Error(reason.clone()));
			return Err(PlaybackError::MediaLoad { reason });
		}

		debug!(media_source = %self.session.media_source, autoplay, "Loading media.");
		Ok(())
	}

	pub fn handle_event(&mut self, event: PlayerEvent) -> Transition {
		let transition = self.session.apply(event);
		if transition.changed() {
			debug!(from = ?transition.from, to = ?transition.to, "Play state changed.");
		}
		transition
	}

	pub fn play(&mut self) -> Result<(), PlaybackError> {
		match self.session.play_state {
			PlayState::Playing => Ok(()),
			PlayState::Loading => {
				self.play_requested = true;
				Ok(())
			}
			PlayState::Paused | PlayState::Ended => self.surface.play().map_err(PlaybackError::from),
			PlayState::Idle | PlayState::Failed => Err(PlaybackError::Inactive),
		}
	}

	pub fn pause(&mut self) -> Result<(), PlaybackError> {
		match self.session.play_state {
			PlayState::Playing => self.surface.pause().map_err(PlaybackError::from),
			PlayState::Loading => {
				self.play_requested = false;
				Ok(())
			}
			PlayState::Paused | PlayState::Ended => Ok(()),
			PlayState::Idle | PlayState::Failed => Err(PlaybackError::Inactive),
		}
	}

	/// Consumes a pending play request that was made before the media could play.
	pub fn take_play_request(&mut self) -> bool {
		std::mem::take(&mut self.play_requested)
	}

	/// Seeks to `position` clamped into the media. Returns the position that was actually requested.
	pub fn seek(&mut self, position: Duration) -> Result<Duration, PlaybackError> {
		self.ensure_active()?;
		if self.session.duration.is_none() {
			return Err(InvalidParameter::DurationUnknown.into());
		}

		let target = self.session.clamp_to_media(position);
		self.surface.seek(target)?;
		// the surface confirms with its next time update, until then the requested position is the best guess
		self.session.current_time = target;
		Ok(target)
	}

	pub fn skip(&mut self, delta: Duration) -> Result<Duration, PlaybackError> {
		let target = self.session.current_time.checked_add(&delta).unwrap_or(if delta < Duration::zero() {
			Duration::MIN
		} else {
			Duration::MAX
		});
		self.seek(target)
	}

	/// A nonzero volume unmutes. Zero leaves the mute state alone.
	pub fn set_volume(&mut self, fraction: f64) -> Result<Volume, PlaybackError> {
		self.ensure_not_idle()?;
		let volume = Volume::new(fraction);
		self.session.volume = volume;
		self.surface.set_volume(volume);
		if !volume.is_silent() && self.session.muted {
			self.session.muted = false;
			self.surface.set_muted(false);
		}
		Ok(volume)
	}

	pub fn toggle_mute(&mut self) -> Result<bool, PlaybackError> {
		self.ensure_not_idle()?;
		self.session.muted = !self.session.muted;
		self.surface.set_muted(self.session.muted);
		Ok(self.session.muted)
	}

	pub fn set_playback_rate(&mut self, multiplier: f64) -> Result<PlaybackRate, PlaybackError> {
		self.ensure_not_idle()?;
		let rate = PlaybackRate::try_from(multiplier)?;
		self.session.playback_rate = rate;
		self.surface.set_playback_rate(rate);
		Ok(rate)
	}

	pub fn select_subtitle(&mut self, track: Option<SubtitleTrackId>) -> Result<(), PlaybackError> {
		self.ensure_active()?;
		if let Some(id) = &track {
			if !self.session.subtitle_tracks.iter().any(|offered| &offered.id == id) {
				return Err(InvalidParameter::UnknownSubtitleTrack(id.clone()).into());
			}
		}

		self.surface.select_text_track(track.as_ref())?;
		self.session.active_subtitle = track;
		Ok(())
	}

	/// Best effort. The fullscreen flag only follows the environment's notifications.
	pub fn request_fullscreen(&mut self) {
		if let Err(error) = self.environment.request_fullscreen() {
			warn!(%error, "Environment refused to enter fullscreen.");
		}
	}

	/// Best effort, see [`Self::request_fullscreen`].
	pub fn exit_fullscreen(&mut self) {
		if let Err(error) = self.environment.exit_fullscreen() {
			warn!(%error, "Environment refused to leave fullscreen.");
		}
	}

	pub fn controls(&mut self) -> &mut ControlsVisibility {
		&mut self.controls
	}

	pub fn controls_visible(&self) -> bool {
		self.controls.visible()
	}

	pub fn session(&self) -> &PlaybackSession {
		&self.session
	}

	/// Tears the session down and hands the surface and environment back.
	pub fn release(mut self) -> (Surface, Environment) {
		self.surface.release();
		self.session.play_state = PlayState::Idle;
		debug!(media_source = %self.session.media_source, "Released media surface.");
		(self.surface, self.environment)
	}

	fn ensure_not_idle(&self) -> Result<(), PlaybackError> {
		match self.session.play_state {
			PlayState::Idle | PlayState::Failed => Err(PlaybackError::Inactive),
			_ => Ok(()),
		}
	}

	fn ensure_active(&self) -> Result<(), PlaybackError> {
		match self.session.play_state {
			PlayState::Idle | PlayState::Failed => Err(PlaybackError::Inactive),
			PlayState::Loading => Err(InvalidParameter::DurationUnknown.into()),
			_ => Ok(()),
		}
	}
}
