use crate::playback::error::PlaybackError;
use crate::playback::rate::PlaybackRate;
use crate::playback::subtitle::SubtitleTrackId;
use crate::playback::volume::Volume;
use crate::resume::coordinator::ResumeDecision;
use crate::session::command::{Responder, SessionCommand};
use crate::session::{SessionNotification, SessionSnapshot};
use chrono::Duration;
use tokio::sync::{mpsc, oneshot, watch};

/// The UI side of a session. Dropping it closes the session.
#[derive(Debug)]
pub struct SessionHandle {
	commands: mpsc::UnboundedSender<SessionCommand>,
	notifications: mpsc::UnboundedReceiver<SessionNotification>,
	snapshots: watch::Receiver<SessionSnapshot>,
	skip_step: Duration,
}

impl SessionHandle {
	pub(super) fn new(
		commands: mpsc::UnboundedSender<SessionCommand>,
		notifications: mpsc::UnboundedReceiver<SessionNotification>,
		snapshots: watch::Receiver<SessionSnapshot>,
		skip_step: Duration,
	) -> Self {
		Self {
			commands,
			notifications,
			snapshots,
			skip_step,
		}
	}

	pub async fn play(&self) -> Result<(), PlaybackError> {
		self.request(|respond_to| SessionCommand::Play { respond_to }).await
	}

	pub async fn pause(&self) -> Result<(), PlaybackError> {
		self.request(|respond_to| SessionCommand::Pause { respond_to }).await
	}

	/// Returns the position that was requested from the surface after clamping.
	pub async fn seek(&self, position: Duration) -> Result<Duration, PlaybackError> {
		self.request(|respond_to| SessionCommand::Seek { position, respond_to })
			.await
	}

	pub async fn skip(&self, delta: Duration) -> Result<Duration, PlaybackError> {
		self.request(|respond_to| SessionCommand::Skip { delta, respond_to })
			.await
	}

	pub async fn skip_forward(&self) -> Result<Duration, PlaybackError> {
		self.skip(self.skip_step).await
	}

	pub async fn skip_backward(&self) -> Result<Duration, PlaybackError> {
		self.skip(-self.skip_step).await
	}

	pub async fn set_volume(&self, fraction: f64) -> Result<Volume, PlaybackError> {
		self.request(|respond_to| SessionCommand::SetVolume { fraction, respond_to })
			.await
	}

	/// Returns whether the session is muted now.
	pub async fn toggle_mute(&self) -> Result<bool, PlaybackError> {
		self.request(|respond_to| SessionCommand::ToggleMute { respond_to }).await
	}

	pub async fn set_playback_rate(&self, multiplier: f64) -> Result<PlaybackRate, PlaybackError> {
		self.request(|respond_to| SessionCommand::SetPlaybackRate { multiplier, respond_to })
			.await
	}

	pub async fn select_subtitle(&self, track: Option<SubtitleTrackId>) -> Result<(), PlaybackError> {
		self.request(|respond_to| SessionCommand::SelectSubtitle { track, respond_to })
			.await
	}

	/// Answers a [`SessionNotification::ResumePrompt`]. Returns the starting position.
	pub async fn resolve_resume(&self, decision: ResumeDecision) -> Result<Duration, PlaybackError> {
		self.request(|respond_to| SessionCommand::ResolveResume { decision, respond_to })
			.await
	}

	pub fn request_fullscreen(&self) -> Result<(), PlaybackError> {
		self.send(SessionCommand::RequestFullscreen)
	}

	pub fn exit_fullscreen(&self) -> Result<(), PlaybackError> {
		self.send(SessionCommand::ExitFullscreen)
	}

	pub fn pointer_moved(&self) -> Result<(), PlaybackError> {
		self.send(SessionCommand::PointerMoved)
	}

	pub fn pointer_left(&self) -> Result<(), PlaybackError> {
		self.send(SessionCommand::PointerLeft)
	}

	/// Starts the teardown. Closing an already closed session does nothing.
	pub fn close(&self) {
		let _ = self.commands.send(SessionCommand::Close);
	}

	pub fn snapshot(&self) -> SessionSnapshot {
		self.snapshots.borrow().clone()
	}

	pub fn snapshots(&self) -> watch::Receiver<SessionSnapshot> {
		self.snapshots.clone()
	}

	/// `None` once the session has ended.
	pub async fn next_notification(&mut self) -> Option<SessionNotification> {
		self.notifications.recv().await
	}

	fn send(&self, command: SessionCommand) -> Result<(), PlaybackError> {
		self.commands.send(command).map_err(|_| PlaybackError::SessionClosed)
	}

	async fn request<Output>(
		&self,
		command: impl FnOnce(Responder<Output>) -> SessionCommand,
	) -> Result<Output, PlaybackError> {
		let (respond_to, response) = oneshot::channel();
		self.send(command(respond_to))?;
		response.await.unwrap_or(Err(PlaybackError::SessionClosed))
	}
}
