//! One playback of one piece of content by one user.
//!
//! [`open_session`] binds a surface to a new [`PlaybackController`], starts the saved position lookup and returns a
//! [`SessionHandle`] for the UI together with the [`SessionRunner`] that has to be polled (usually spawned) for the
//! session to make progress. The runner owns all session state, everything else talks to it through the handle.

use crate::configuration::Configuration;
use crate::context::PlayerContext;
use crate::playback::controller::PlaybackController;
use crate::playback::error::PlaybackError;
use crate::playback::rate::PlaybackRate;
use crate::playback::state::{PlayState, PlayerEvent};
use crate::playback::subtitle::{SubtitleTrack, SubtitleTrackId};
use crate::playback::surface::{FullscreenEnvironment, MediaSurface};
use crate::playback::volume::Volume;
use crate::resume::coordinator::{ResumeCoordinator, ResumeSettings, ResumeState};
use crate::session::handle::SessionHandle;
use crate::session::runner::SessionRunner;
use crate::types::{ContentId, UserId, position_from_std};
use chrono::Duration;
use futures_util::Stream;
use tokio::sync::{mpsc, watch};
use typed_builder::TypedBuilder;
use url::Url;

pub mod command;
pub mod handle;
pub mod runner;

#[derive(Clone, Debug, TypedBuilder)]
pub struct SessionParameters {
	pub user: UserId,
	pub content: ContentId,
	pub media_source: Url,
	/// Start playing as soon as the saved position has been applied.
	#[builder(default)]
	pub autoplay: bool,
}

/// Timing of a session, taken from [`crate::configuration::PlaybackConfiguration`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionSettings {
	pub sampling_period: std::time::Duration,
	pub lookup_timeout: std::time::Duration,
	pub report_timeout: std::time::Duration,
	pub controls_hide_delay: std::time::Duration,
	pub skip_step: Duration,
	pub resume: ResumeSettings,
}

impl From<&Configuration> for SessionSettings {
	fn from(configuration: &Configuration) -> Self {
		let playback = &configuration.playback;
		Self {
			sampling_period: playback.sampling_period,
			lookup_timeout: configuration.watch_history.lookup_timeout,
			report_timeout: configuration.watch_history.report_timeout,
			controls_hide_delay: playback.controls_hide_delay,
			skip_step: position_from_std(playback.skip_step),
			resume: ResumeSettings {
				threshold: position_from_std(playback.resume_threshold),
				epsilon: position_from_std(playback.report_epsilon),
			},
		}
	}
}

/// Everything a UI needs to render the player.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
	pub play_state: PlayState,
	pub current_time: Duration,
	pub duration: Option<Duration>,
	pub volume: Volume,
	pub muted: bool,
	pub playback_rate: PlaybackRate,
	pub fullscreen: bool,
	pub subtitle_tracks: Vec<SubtitleTrack>,
	pub active_subtitle: Option<SubtitleTrackId>,
	pub controls_visible: bool,
	pub resume: ResumeState,
	/// Whether the starting position has been decided. Positions are only reported afterwards.
	pub reconciled: bool,
}

impl Default for SessionSnapshot {
	fn default() -> Self {
		Self {
			play_state: PlayState::Idle,
			current_time: Duration::zero(),
			duration: None,
			volume: Volume::default(),
			muted: false,
			playback_rate: PlaybackRate::default(),
			fullscreen: false,
			subtitle_tracks: Vec::new(),
			active_subtitle: None,
			controls_visible: true,
			resume: ResumeState::default(),
			reconciled: false,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionNotification {
	/// The user made meaningful progress earlier. Answer with [`SessionHandle::resolve_resume`].
	ResumePrompt { saved_position: Duration },
	/// The starting position has been applied.
	Reconciled { start_position: Duration },
	PlaybackFailed(PlaybackError),
	Ended,
}

/// Opens a session on `surface`. `events` has to deliver everything the surface and `environment` report.
///
/// The surface and environment are handed back when the runner completes.
pub fn open_session<Surface, Environment, Events>(
	context: &PlayerContext,
	parameters: SessionParameters,
	surface: Surface,
	environment: Environment,
	events: Events,
) -> (SessionHandle, SessionRunner<Surface, Environment, Events>)
where
	Surface: MediaSurface,
	Environment: FullscreenEnvironment,
	Events: Stream<Item = PlayerEvent> + Unpin,
{
	let settings = SessionSettings::from(&context.configuration);
	let (command_sender, command_receiver) = mpsc::unbounded_channel();
	let (notification_sender, notification_receiver) = mpsc::unbounded_channel();
	let (snapshot_sender, snapshot_receiver) = watch::channel(SessionSnapshot::default());

	let controller = PlaybackController::new(parameters.media_source.clone(), surface, environment);
	let handle = SessionHandle::new(
		command_sender,
		notification_receiver,
		snapshot_receiver,
		settings.skip_step,
	);
	let runner = SessionRunner::builder()
		.user(parameters.user)
		.content(parameters.content)
		.autoplay(parameters.autoplay)
		.settings(settings)
		.controller(controller)
		.coordinator(ResumeCoordinator::new(settings.resume))
		.events(events)
		.commands(command_receiver)
		.notifications(notification_sender)
		.snapshots(snapshot_sender)
		.watch_history(context.watch_history.clone())
		.time_source(context.time_source.clone())
		.build();
	(handle, runner)
}
