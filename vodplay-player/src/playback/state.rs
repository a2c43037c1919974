use crate::playback::rate::PlaybackRate;
use crate::playback::subtitle::{SubtitleTrack, SubtitleTrackId};
use crate::playback::volume::Volume;
use chrono::Duration;
use url::Url;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlayState {
	/// No media bound, either before loading or after teardown.
	#[default]
	Idle,
	/// Waiting for the surface to report metadata.
	Loading,
	Playing,
	Paused,
	Ended,
	/// The surface reported an error. Terminal until teardown.
	Failed,
}

/// Everything the media surface and the fullscreen environment report back.
#[derive(Clone, Debug, PartialEq)]
pub enum PlayerEvent {
	MetadataReady {
		duration: Duration,
		subtitle_tracks: Vec<SubtitleTrack>,
	},
	TimeUpdate(Duration),
	Play,
	Pause,
	Ended,
	Error(String),
	FullscreenChanged(bool),
}

impl PlayState {
	/// Whether `current_time` carries a real position in this state.
	pub fn has_position(self) -> bool {
		matches!(self, PlayState::Playing | PlayState::Paused | PlayState::Ended)
	}

	#[must_use]
	pub fn on_event(self, event: &PlayerEvent) -> PlayState {
		use PlayState::*;
		match (self, event) {
			(Loading, PlayerEvent::MetadataReady { .. }) => Paused,
			(Paused | Ended, PlayerEvent::Play) => Playing,
			(Playing, PlayerEvent::Pause) => Paused,
			(Playing | Paused, PlayerEvent::Ended) => Ended,
			(Loading | Playing | Paused | Ended, PlayerEvent::Error(_)) => Failed,
			(state, _) => state,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
	pub from: PlayState,
	pub to: PlayState,
}

impl Transition {
	pub fn changed(self) -> bool {
		self.from != self.to
	}

	pub fn entered(self, state: PlayState) -> bool {
		self.changed() && self.to == state
	}
}

/// State of one viewing session against a single media source.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackSession {
	pub(crate) media_source: Url,
	pub(crate) current_time: Duration,
	pub(crate) duration: Option<Duration>,
	pub(crate) play_state: PlayState,
	pub(crate) volume: Volume,
	pub(crate) muted: bool,
	pub(crate) playback_rate: PlaybackRate,
	pub(crate) fullscreen: bool,
	pub(crate) subtitle_tracks: Vec<SubtitleTrack>,
	pub(crate) active_subtitle: Option<SubtitleTrackId>,
	pub(crate) failure: Option<String>,
	/// The surface started playing on its own before metadata arrived.
	pub(crate) playing_while_loading: bool,
}

impl PlaybackSession {
	pub fn new(media_source: Url) -> Self {
		Self {
			media_source,
			current_time: Duration::zero(),
			duration: None,
			play_state: PlayState::Idle,
			volume: Volume::FULL,
			muted: false,
			playback_rate: PlaybackRate::default(),
			fullscreen: false,
			subtitle_tracks: Vec::new(),
			active_subtitle: None,
			failure: None,
			playing_while_loading: false,
		}
	}

	/// Applies one surface or environment event and reports the resulting state change.
	pub fn apply(&mut self, event: PlayerEvent) -> Transition {
		let from = self.play_state;
		let to = match (from, &event) {
			(PlayState::Loading, PlayerEvent::MetadataReady { .. }) if self.playing_while_loading => PlayState::Playing,
			_ => from.on_event(&event),
		};

		match event {
			PlayerEvent::Play if from == PlayState::Loading => {
				self.playing_while_loading = true;
			}
			PlayerEvent::Pause if from == PlayState::Loading => {
				self.playing_while_loading = false;
			}
			PlayerEvent::MetadataReady {
				duration,
				subtitle_tracks,
			} if from == PlayState::Loading => {
				self.duration = Some(duration.max(Duration::zero()));
				self.subtitle_tracks = subtitle_tracks;
				self.current_time = Duration::zero();
				self.playing_while_loading = false;
			}
			PlayerEvent::TimeUpdate(time) if to.has_position() => {
				self.current_time = self.clamp_to_media(time);
			}
			PlayerEvent::Ended if to == PlayState::Ended => {
				if let Some(duration) = self.duration {
					self.current_time = duration;
				}
			}
			PlayerEvent::Error(reason) if to == PlayState::Failed => {
				self.failure = Some(reason);
			}
			PlayerEvent::FullscreenChanged(fullscreen) => {
				self.fullscreen = fullscreen;
			}
			_ => {}
		}

		self.play_state = to;
		Transition { from, to }
	}

	/// Clamps a position into `[0, duration]`, or to zero while the duration is unknown.
	pub fn clamp_to_media(&self, position: Duration) -> Duration {
		let upper_bound = self.duration.unwrap_or_else(Duration::zero);
		position.max(Duration::zero()).min(upper_bound)
	}

	pub fn media_source(&self) -> &Url {
		&self.media_source
	}

	pub fn current_time(&self) -> Duration {
		self.current_time
	}

	pub fn duration(&self) -> Option<Duration> {
		self.duration
	}

	pub fn play_state(&self) -> PlayState {
		self.play_state
	}

	pub fn volume(&self) -> Volume {
		self.volume
	}

	pub fn muted(&self) -> bool {
		self.muted
	}

	pub fn playback_rate(&self) -> PlaybackRate {
		self.playback_rate
	}

	pub fn fullscreen(&self) -> bool {
		self.fullscreen
	}

	pub fn subtitle_tracks(&self) -> &[SubtitleTrack] {
		&self.subtitle_tracks
	}

	pub fn active_subtitle(&self) -> Option<&SubtitleTrackId> {
		self.active_subtitle.as_ref()
	}

	/// Reason of the surface error that ended playback, if any.
	pub fn failure(&self) -> Option<&str> {
		self.failure.as_deref()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn loading_session() -> PlaybackSession {
		let mut session = PlaybackSession::new(Url::parse("https://cdn.example.com/movie.mp4").unwrap());
		session.play_state = PlayState::Loading;
		session
	}

	fn metadata_ready(seconds: i64) -> PlayerEvent {
		PlayerEvent::MetadataReady {
			duration: Duration::seconds(seconds),
			subtitle_tracks: Vec::new(),
		}
	}

	#[test]
	fn metadata_should_move_loading_to_paused() {
		let mut session = loading_session();

		let transition = session.apply(metadata_ready(3600));

		assert_eq!(
			Transition {
				from: PlayState::Loading,
				to: PlayState::Paused
			},
			transition
		);
		assert_eq!(Some(Duration::seconds(3600)), session.duration());
	}

	#[test]
	fn time_updates_before_metadata_should_be_ignored() {
		let mut session = loading_session();

		session.apply(PlayerEvent::TimeUpdate(Duration::seconds(12)));

		assert_eq!(Duration::zero(), session.current_time());
		assert_eq!(PlayState::Loading, session.play_state());
	}

	#[test]
	fn time_updates_should_be_clamped_to_the_media() {
		let mut session = loading_session();
		session.apply(metadata_ready(42));

		session.apply(PlayerEvent::TimeUpdate(Duration::seconds(1337)));
		assert_eq!(Duration::seconds(42), session.current_time());

		session.apply(PlayerEvent::TimeUpdate(Duration::seconds(-1)));
		assert_eq!(Duration::zero(), session.current_time());
	}

	#[test]
	fn surface_play_and_pause_should_toggle_the_state() {
		let mut session = loading_session();
		session.apply(metadata_ready(42));

		assert!(session.apply(PlayerEvent::Play).entered(PlayState::Playing));
		assert!(session.apply(PlayerEvent::Pause).entered(PlayState::Paused));
		assert!(!session.apply(PlayerEvent::Pause).changed());
	}

	#[test]
	fn play_while_loading_should_take_effect_with_the_metadata() {
		let mut session = loading_session();

		assert!(!session.apply(PlayerEvent::Play).changed());
		assert_eq!(PlayState::Loading, session.play_state());

		assert_eq!(
			Transition {
				from: PlayState::Loading,
				to: PlayState::Playing
			},
			session.apply(metadata_ready(42))
		);
	}

	#[test]
	fn pause_while_loading_should_cancel_an_earlier_play() {
		let mut session = loading_session();
		session.apply(PlayerEvent::Play);
		session.apply(PlayerEvent::Pause);

		assert!(session.apply(metadata_ready(42)).entered(PlayState::Paused));
	}

	#[test]
	fn ended_should_jump_to_the_end_of_the_media() {
		let mut session = loading_session();
		session.apply(metadata_ready(3600));
		session.apply(PlayerEvent::Play);
		session.apply(PlayerEvent::TimeUpdate(Duration::seconds(3595)));

		let transition = session.apply(PlayerEvent::Ended);

		assert!(transition.entered(PlayState::Ended));
		assert_eq!(Duration::seconds(3600), session.current_time());
	}

	#[test]
	fn play_after_ended_should_replay() {
		let mut session = loading_session();
		session.apply(metadata_ready(10));
		session.apply(PlayerEvent::Play);
		session.apply(PlayerEvent::Ended);

		assert!(session.apply(PlayerEvent::Play).entered(PlayState::Playing));
	}

	#[test]
	fn errors_should_fail_the_session() {
		let mut session = loading_session();

		let transition = session.apply(PlayerEvent::Error("404 Not Found".to_string()));

		assert!(transition.entered(PlayState::Failed));
		assert_eq!(Some("404 Not Found"), session.failure());
		assert!(!session.apply(PlayerEvent::Play).changed());
	}

	#[test]
	fn fullscreen_should_follow_notifications_in_any_state() {
		let mut session = loading_session();

		session.apply(PlayerEvent::FullscreenChanged(true));
		assert!(session.fullscreen());

		session.apply(PlayerEvent::FullscreenChanged(false));
		assert!(!session.fullscreen());
	}

	#[test]
	fn idle_sessions_should_ignore_surface_events() {
		let mut session = PlaybackSession::new(Url::parse("https://cdn.example.com/movie.mp4").unwrap());

		for event in [metadata_ready(42), PlayerEvent::Play, PlayerEvent::Ended, PlayerEvent::Error("late".into())] {
			assert!(!session.apply(event).changed());
		}
		assert_eq!(None, session.duration());
	}
}
