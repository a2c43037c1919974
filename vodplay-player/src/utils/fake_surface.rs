use crate::playback::rate::PlaybackRate;
use crate::playback::subtitle::SubtitleTrackId;
use crate::playback::surface::{FullscreenEnvironment, MediaSurface, SurfaceError};
use crate::playback::volume::Volume;
use chrono::Duration;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use url::Url;

#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceCommand {
	Load(Url),
	Play,
	Pause,
	Seek(Duration),
	SetVolume(Volume),
	SetMuted(bool),
	SetPlaybackRate(PlaybackRate),
	SelectTextTrack(Option<SubtitleTrackId>),
	Release,
	RequestFullscreen,
	ExitFullscreen,
}

/// Records every command. Clones share their record, so a test can keep one while the controller owns another.
#[derive(Clone, Debug, Default)]
pub struct FakeSurface {
	commands: Arc<Mutex<Vec<SurfaceCommand>>>,
	rejecting: Arc<AtomicBool>,
}

impl FakeSurface {
	pub fn rejecting() -> Self {
		let surface = Self::default();
		surface.reject_commands();
		surface
	}

	pub fn reject_commands(&self) {
		self.rejecting.store(true, Ordering::SeqCst);
	}

	pub fn commands(&self) -> Vec<SurfaceCommand> {
		self.commands.lock().clone()
	}

	pub fn seeks(&self) -> Vec<Duration> {
		self.commands()
			.into_iter()
			.filter_map(|command| match command {
				SurfaceCommand::Seek(position) => Some(position),
				_ => None,
			})
			.collect()
	}

	fn record(&self, command: SurfaceCommand) {
		self.commands.lock().push(command);
	}

	fn record_fallible(&self, command: SurfaceCommand) -> Result<(), SurfaceError> {
		if self.rejecting.load(Ordering::SeqCst) {
			return Err(SurfaceError(format!("Rejected {command:?}")));
		}
		self.record(command);
		Ok(())
	}
}

impl MediaSurface for FakeSurface {
	fn load(&mut self, media_source: &Url) -> Result<(), SurfaceError> {
		self.record_fallible(SurfaceCommand::Load(media_source.clone()))
	}

	fn play(&mut self) -> Result<(), SurfaceError> {
		self.record_fallible(SurfaceCommand::Play)
	}

	fn pause(&mut self) -> Result<(), SurfaceError> {
		self.record_fallible(SurfaceCommand::Pause)
	}

	fn seek(&mut self, position: Duration) -> Result<(), SurfaceError> {
		self.record_fallible(SurfaceCommand::Seek(position))
	}

	fn set_volume(&mut self, volume: Volume) {
		self.record(SurfaceCommand::SetVolume(volume));
	}

	fn set_muted(&mut self, muted: bool) {
		self.record(SurfaceCommand::SetMuted(muted));
	}

	fn set_playback_rate(&mut self, rate: PlaybackRate) {
		self.record(SurfaceCommand::SetPlaybackRate(rate));
	}

	fn select_text_track(&mut self, track: Option<&SubtitleTrackId>) -> Result<(), SurfaceError> {
		self.record_fallible(SurfaceCommand::SelectTextTrack(track.cloned()))
	}

	fn release(&mut self) {
		self.record(SurfaceCommand::Release);
	}
}

#[derive(Clone, Debug, Default)]
pub struct FakeEnvironment {
	inner: FakeSurface,
}

impl FakeEnvironment {
	pub fn reject_commands(&self) {
		self.inner.reject_commands();
	}

	pub fn commands(&self) -> Vec<SurfaceCommand> {
		self.inner.commands()
	}
}

impl FullscreenEnvironment for FakeEnvironment {
	fn request_fullscreen(&mut self) -> Result<(), SurfaceError> {
		self.inner.record_fallible(SurfaceCommand::RequestFullscreen)
	}

	fn exit_fullscreen(&mut self) -> Result<(), SurfaceError> {
		self.inner.record_fallible(SurfaceCommand::ExitFullscreen)
	}
}
