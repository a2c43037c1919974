use crate::playback::controller::PlaybackController;
use crate::playback::error::PlaybackError;
use crate::playback::state::{PlayState, PlayerEvent};
use crate::playback::surface::{FullscreenEnvironment, MediaSurface};
use crate::resume::coordinator::{ResumeAction, ResumeCoordinator};
use crate::resume::watch_history::{PositionReport, WatchHistory, WatchHistoryError};
use crate::session::command::{Responder, SessionCommand};
use crate::session::{SessionNotification, SessionSettings, SessionSnapshot};
use crate::types::{ContentId, UserId};
use crate::utils::time_source::{Interval, TimeSource};
use chrono::Duration;
use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, Stream, StreamExt};
use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use typed_builder::TypedBuilder;

type LookupFuture = BoxFuture<'static, Result<Option<Duration>, WatchHistoryError>>;
type ReportFuture = BoxFuture<'static, (PositionReport, Result<(), WatchHistoryError>)>;

/// Drives one session: surface events, UI commands, the saved position lookup, reports and timers.
#[derive(TypedBuilder)]
pub struct SessionRunner<Surface, Environment, Events> {
	user: UserId,
	content: ContentId,
	autoplay: bool,
	settings: SessionSettings,
	controller: PlaybackController<Surface, Environment>,
	coordinator: ResumeCoordinator,
	events: Events,
	commands: mpsc::UnboundedReceiver<SessionCommand>,
	notifications: mpsc::UnboundedSender<SessionNotification>,
	snapshots: watch::Sender<SessionSnapshot>,
	watch_history: Arc<dyn WatchHistory>,
	time_source: TimeSource,
	/// Play was requested while the user still had to decide where to start.
	#[builder(default, setter(skip))]
	deferred_play: bool,
}

/// Work the session is waiting for besides commands and events.
struct Pending {
	lookup: Option<LookupFuture>,
	reports: FuturesUnordered<ReportFuture>,
	/// Final report waiting for the reports in flight, so it can't be overtaken by an older position.
	final_report: Option<PositionReport>,
	sampling: Option<Interval>,
	controls_timer: Option<BoxFuture<'static, ()>>,
}

impl<Surface, Environment, Events> SessionRunner<Surface, Environment, Events>
where
	Surface: MediaSurface,
	Environment: FullscreenEnvironment,
	Events: Stream<Item = PlayerEvent> + Unpin,
{
	/// Runs until the session is closed, its handle is dropped or the surface stops sending events. Returns the
	/// released surface and environment.
	pub async fn run(mut self) -> (Surface, Environment) {
		info!(
			user = %self.user,
			content = %self.content,
			media_source = %self.controller.session().media_source(),
			"Opening playback session."
		);

		let mut pending = Pending {
			lookup: Some(self.lookup()),
			reports: FuturesUnordered::new(),
			final_report: None,
			sampling: None,
			controls_timer: None,
		};
		if let Err(error) = self.controller.load(self.autoplay) {
			self.fail(error, &mut pending);
		}
		self.publish();

		loop {
			tokio::select! {
				biased;
				command = self.commands.recv() => {
					let Some(command) = command else {
						break;
					};
					if self.handle_command(command, &mut pending).is_break() {
						break;
					}
				}
				event = self.events.next() => {
					let Some(event) = event else {
						info!("Media surface stopped sending events.");
						break;
					};
					self.handle_event(event, &mut pending);
				}
				lookup = when_some(pending.lookup.as_mut()) => {
					pending.lookup = None;
					if let Some(action) = self.coordinator.lookup_resolved(lookup) {
						self.apply_resume_action(action, &mut pending);
					}
				}
				Some((report, result)) = pending.reports.next() => {
					self.report_completed(report, result);
					self.send_final_report_when_idle(&mut pending);
				}
				() = tick(pending.sampling.as_mut()) => self.sample(&mut pending),
				() = when_some(pending.controls_timer.as_mut()) => {
					pending.controls_timer = None;
					let play_state = self.controller.session().play_state();
					self.controller.controls().idle_elapsed(play_state);
				}
			}
			self.publish();
		}

		self.teardown(pending).await
	}

	fn handle_command(&mut self, command: SessionCommand, pending: &mut Pending) -> ControlFlow<()> {
		use SessionCommand::*;
		match command {
			Play { respond_to } => {
				let result = self.play();
				self.respond(respond_to, result);
			}
			Pause { respond_to } => {
				self.deferred_play = false;
				let result = self.controller.pause();
				self.respond(respond_to, result);
			}
			Seek { position, respond_to } => {
				let result = self.controller.seek(position);
				self.respond(respond_to, result);
			}
			Skip { delta, respond_to } => {
				let result = self.controller.skip(delta);
				self.respond(respond_to, result);
			}
			SetVolume { fraction, respond_to } => {
				let result = self.controller.set_volume(fraction);
				self.respond(respond_to, result);
			}
			ToggleMute { respond_to } => {
				let result = self.controller.toggle_mute();
				self.respond(respond_to, result);
			}
			SetPlaybackRate { multiplier, respond_to } => {
				let result = self.controller.set_playback_rate(multiplier);
				self.respond(respond_to, result);
			}
			SelectSubtitle { track, respond_to } => {
				let result = self.controller.select_subtitle(track);
				self.respond(respond_to, result);
			}
			ResolveResume { decision, respond_to } => {
				let result = match self.coordinator.resolve(decision) {
					Ok(position) => Ok(self.start_from(position, pending)),
					Err(error) => Err(error.into()),
				};
				self.respond(respond_to, result);
			}
			RequestFullscreen => self.controller.request_fullscreen(),
			ExitFullscreen => self.controller.exit_fullscreen(),
			PointerMoved => {
				let play_state = self.controller.session().play_state();
				if self.controller.controls().pointer_moved(play_state) {
					pending.controls_timer = Some(self.hide_controls_later());
				}
			}
			PointerLeft => {
				let play_state = self.controller.session().play_state();
				self.controller.controls().pointer_left(play_state);
				pending.controls_timer = None;
			}
			Close => return ControlFlow::Break(()),
		}
		ControlFlow::Continue(())
	}

	fn play(&mut self) -> Result<(), PlaybackError> {
		let play_state = self.controller.session().play_state();
		if play_state == PlayState::Paused && !self.coordinator.is_reconciled() {
			debug!("Deferring playback until the starting position is decided.");
			self.deferred_play = true;
			return Ok(());
		}
		self.controller.play()
	}

	fn handle_event(&mut self, event: PlayerEvent, pending: &mut Pending) {
		let metadata_duration = match &event {
			PlayerEvent::MetadataReady { duration, .. } => Some(*duration),
			_ => None,
		};
		let failure = match &event {
			PlayerEvent::Error(reason) => Some(reason.clone()),
			_ => None,
		};

		let transition = self.controller.handle_event(event);

		if let Some(duration) = metadata_duration.filter(|_| transition.from == PlayState::Loading) {
			if let Some(action) = self.coordinator.metadata_ready(duration) {
				self.apply_resume_action(action, pending);
			}
		}
		if transition.entered(PlayState::Playing) {
			self.coordinator.playback_started();
		}
		if transition.entered(PlayState::Ended) {
			let position = self.controller.session().current_time();
			if let Some(report) = self.coordinator.final_report(position, true) {
				pending.final_report = Some(report);
				self.send_final_report_when_idle(pending);
			}
			info!(user = %self.user, content = %self.content, "Playback ended.");
			self.notify(SessionNotification::Ended);
		}
		if transition.entered(PlayState::Failed) {
			let reason = failure.unwrap_or_default();
			self.fail(PlaybackError::MediaLoad { reason }, pending);
		}
		if transition.changed() {
			pending.controls_timer = if self.controller.controls().state_changed(transition.to) {
				Some(self.hide_controls_later())
			} else {
				None
			};
		}
	}

	fn apply_resume_action(&mut self, action: ResumeAction, pending: &mut Pending) {
		match action {
			ResumeAction::Seek(position) => {
				self.start_from(position, pending);
			}
			ResumeAction::Prompt { saved_position } => {
				info!(
					saved_seconds = saved_position.num_seconds(),
					"Asking whether to resume from the saved position."
				);
				self.notify(SessionNotification::ResumePrompt { saved_position });
			}
		}
	}

	/// Applies the reconciled starting position, starts sampling and honors play requests that had to wait.
	fn start_from(&mut self, position: Duration, pending: &mut Pending) -> Duration {
		let current_time = self.controller.session().current_time();
		let start_position = if position == current_time {
			position
		} else {
			match self.controller.seek(position) {
				Ok(target) => target,
				Err(error) => {
					warn!(%error, "Failed to seek to the starting position.");
					current_time
				}
			}
		};

		let period = self.settings.sampling_period;
		pending.sampling = Some(self.time_source.interval_at("sampling", period, period));
		info!(
			user = %self.user,
			content = %self.content,
			start_seconds = start_position.num_seconds(),
			"Starting position reconciled."
		);
		self.notify(SessionNotification::Reconciled { start_position });

		let play_requested = self.controller.take_play_request();
		let play_deferred = std::mem::take(&mut self.deferred_play);
		if play_requested || play_deferred {
			if let Err(error) = self.controller.play() {
				warn!(%error, "Failed to start playback.");
			}
		}
		start_position
	}

	fn sample(&mut self, pending: &mut Pending) {
		if pending.final_report.is_some() {
			return;
		}
		let session = self.controller.session();
		if let Some(report) = self.coordinator.sample(session.current_time(), session.play_state()) {
			pending.reports.push(self.report(report));
		}
	}

	fn fail(&mut self, error: PlaybackError, pending: &mut Pending) {
		error!(user = %self.user, content = %self.content, %error, "Playback failed.");
		pending.sampling = None;
		self.notify(SessionNotification::PlaybackFailed(error));
	}

	fn lookup(&self) -> LookupFuture {
		let watch_history = self.watch_history.clone();
		let (user, content) = (self.user, self.content);
		let lookup = self.time_source.timeout("lookup", self.settings.lookup_timeout, async move {
			watch_history.position(user, content).await
		});

		async move {
			lookup.await.unwrap_or_else(|elapsed| {
				Err(WatchHistoryError::LookupUnavailable {
					reason: elapsed.to_string(),
				})
			})
		}
		.boxed()
	}

	fn report(&self, report: PositionReport) -> ReportFuture {
		let watch_history = self.watch_history.clone();
		let (user, content) = (self.user, self.content);
		let request = self.time_source.timeout("report", self.settings.report_timeout, async move {
			watch_history.report(user, content, report).await
		});

		async move {
			let result = request.await.unwrap_or_else(|elapsed| {
				Err(WatchHistoryError::ReportFailed {
					reason: elapsed.to_string(),
				})
			});
			(report, result)
		}
		.boxed()
	}

	fn send_final_report_when_idle(&self, pending: &mut Pending) {
		if pending.reports.is_empty() {
			if let Some(report) = pending.final_report.take() {
				pending.reports.push(self.report(report));
			}
		}
	}

	fn report_completed(&mut self, report: PositionReport, result: Result<(), WatchHistoryError>) {
		let position_seconds = report.position.num_seconds();
		match result {
			Ok(()) => {
				debug!(position_seconds, completed = report.completed, "Reported watch position.");
				self.coordinator.report_succeeded(report);
			}
			Err(error) => warn!(%error, position_seconds, "Dropping watch position report."),
		}
	}

	fn hide_controls_later(&self) -> BoxFuture<'static, ()> {
		self.time_source
			.sleep("controls", self.settings.controls_hide_delay)
			.boxed()
	}

	async fn teardown(mut self, mut pending: Pending) -> (Surface, Environment) {
		pending.sampling = None;
		pending.controls_timer = None;
		pending.lookup = None;

		while let Some((report, result)) = pending.reports.next().await {
			self.report_completed(report, result);
		}
		if let Some(report) = pending.final_report.take() {
			let (report, result) = self.report(report).await;
			self.report_completed(report, result);
		}

		let current_time = self.controller.session().current_time();
		if let Some(report) = self.coordinator.final_report(current_time, false) {
			let (report, result) = self.report(report).await;
			self.report_completed(report, result);
		}

		let (surface, environment) = self.controller.release();
		self.snapshots
			.send_modify(|snapshot| snapshot.play_state = PlayState::Idle);
		info!(user = %self.user, content = %self.content, "Closed playback session.");
		(surface, environment)
	}

	fn respond<Output>(&self, respond_to: Responder<Output>, result: Result<Output, PlaybackError>) {
		self.publish();
		// the requester may have stopped waiting
		let _ = respond_to.send(result);
	}

	fn notify(&self, notification: SessionNotification) {
		let _ = self.notifications.send(notification);
	}

	fn publish(&self) {
		let session = self.controller.session();
		let snapshot = SessionSnapshot {
			play_state: session.play_state(),
			current_time: session.current_time(),
			duration: session.duration(),
			volume: session.volume(),
			muted: session.muted(),
			playback_rate: session.playback_rate(),
			fullscreen: session.fullscreen(),
			subtitle_tracks: session.subtitle_tracks().to_vec(),
			active_subtitle: session.active_subtitle().cloned(),
			controls_visible: self.controller.controls_visible(),
			resume: *self.coordinator.state(),
			reconciled: self.coordinator.is_reconciled(),
		};

		self.snapshots.send_if_modified(|current| {
			if *current == snapshot {
				false
			} else {
				*current = snapshot;
				true
			}
		});
	}
}

async fn when_some<PendingFuture: Future + Unpin>(future: Option<&mut PendingFuture>) -> PendingFuture::Output {
	match future {
		Some(future) => future.await,
		None => std::future::pending().await,
	}
}

async fn tick(interval: Option<&mut Interval>) {
	match interval {
		Some(interval) => interval.tick().await,
		None => std::future::pending().await,
	}
}
