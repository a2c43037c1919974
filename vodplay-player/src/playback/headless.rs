//! Media surface without any media behind it.
//!
//! Playback is simulated by moving the position forward on a timer, which is enough to drive a whole session from
//! the command line against a real watch history backend.

use crate::playback::rate::PlaybackRate;
use crate::playback::state::PlayerEvent;
use crate::playback::subtitle::{SubtitleTrack, SubtitleTrackId};
use crate::playback::surface::{FullscreenEnvironment, MediaSurface, SurfaceError};
use crate::playback::volume::Volume;
use crate::types::position_from_std;
use crate::utils::time_source::TimeSource;
use chrono::Duration;
use futures_channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace};
use url::Url;

/// Everything needed to run a session on simulated media. `driver` has to be polled for the position to move.
pub struct HeadlessMedia {
	pub surface: HeadlessSurface,
	pub environment: HeadlessEnvironment,
	pub driver: HeadlessDriver,
	pub events: UnboundedReceiver<PlayerEvent>,
}

impl HeadlessMedia {
	/// Simulates media of `duration` whose position is updated every `tick_period`.
	pub fn new(duration: Duration, tick_period: std::time::Duration, time_source: TimeSource) -> Self {
		let (sender, events) = unbounded();
		let simulation = Arc::new(Mutex::new(Simulation {
			duration,
			position: Duration::zero(),
			playing: false,
			rate: PlaybackRate::default(),
			loaded: false,
			released: false,
		}));

		Self {
			surface: HeadlessSurface {
				simulation: simulation.clone(),
				events: sender.clone(),
			},
			environment: HeadlessEnvironment {
				events: sender.clone(),
				fullscreen: false,
			},
			driver: HeadlessDriver {
				simulation,
				events: sender,
				time_source,
				tick_period,
			},
			events,
		}
	}
}

#[derive(Debug)]
struct Simulation {
	duration: Duration,
	position: Duration,
	playing: bool,
	rate: PlaybackRate,
	loaded: bool,
	released: bool,
}

#[derive(Debug)]
pub struct HeadlessSurface {
	simulation: Arc<Mutex<Simulation>>,
	events: UnboundedSender<PlayerEvent>,
}

impl HeadlessSurface {
	fn emit(&self, event: PlayerEvent) {
		// nobody listening anymore means the session is gone
		let _ = self.events.unbounded_send(event);
	}

	fn loaded(&self) -> Result<parking_lot::MutexGuard<'_, Simulation>, SurfaceError> {
		let simulation = self.simulation.lock();
		if simulation.loaded && !simulation.released {
			Ok(simulation)
		} else {
			Err(SurfaceError("No media loaded.".to_string()))
		}
	}
}

impl MediaSurface for HeadlessSurface {
	fn load(&mut self, media_source: &Url) -> Result<(), SurfaceError> {
		let duration = {
			let mut simulation = self.simulation.lock();
			if simulation.released {
				return Err(SurfaceError("Surface has been released.".to_string()));
			}
			simulation.loaded = true;
			simulation.duration
		};

		debug!(%media_source, "Simulating media.");
		self.emit(PlayerEvent::MetadataReady {
			duration,
			subtitle_tracks: vec![SubtitleTrack {
				id: SubtitleTrackId::from("en"),
				label: "English".to_string(),
				language: Some("en".to_string()),
			}],
		});
		Ok(())
	}

	fn play(&mut self) -> Result<(), SurfaceError> {
		{
			let mut simulation = self.loaded()?;
			if simulation.position >= simulation.duration {
				simulation.position = Duration::zero();
			}
			simulation.playing = true;
		}
		self.emit(PlayerEvent::Play);
		Ok(())
	}

	fn pause(&mut self) -> Result<(), SurfaceError> {
		self.loaded()?.playing = false;
		self.emit(PlayerEvent::Pause);
		Ok(())
	}

	fn seek(&mut self, position: Duration) -> Result<(), SurfaceError> {
		let position = {
			let mut simulation = self.loaded()?;
			simulation.position = position.clamp(Duration::zero(), simulation.duration);
			simulation.position
		};
		self.emit(PlayerEvent::TimeUpdate(position));
		Ok(())
	}

	fn set_volume(&mut self, volume: Volume) {
		trace!(volume = volume.fraction(), "Volume changed.");
	}

	fn set_muted(&mut self, muted: bool) {
		trace!(muted, "Mute changed.");
	}

	fn set_playback_rate(&mut self, rate: PlaybackRate) {
		self.simulation.lock().rate = rate;
	}

	fn select_text_track(&mut self, track: Option<&SubtitleTrackId>) -> Result<(), SurfaceError> {
		drop(self.loaded()?);
		trace!(?track, "Subtitle track changed.");
		Ok(())
	}

	fn release(&mut self) {
		let mut simulation = self.simulation.lock();
		simulation.playing = false;
		simulation.released = true;
	}
}

/// Grants every fullscreen request immediately.
#[derive(Debug)]
pub struct HeadlessEnvironment {
	events: UnboundedSender<PlayerEvent>,
	fullscreen: bool,
}

impl HeadlessEnvironment {
	fn switch(&mut self, fullscreen: bool) {
		if self.fullscreen != fullscreen {
			self.fullscreen = fullscreen;
			let _ = self.events.unbounded_send(PlayerEvent::FullscreenChanged(fullscreen));
		}
	}
}

impl FullscreenEnvironment for HeadlessEnvironment {
	fn request_fullscreen(&mut self) -> Result<(), SurfaceError> {
		self.switch(true);
		Ok(())
	}

	fn exit_fullscreen(&mut self) -> Result<(), SurfaceError> {
		self.switch(false);
		Ok(())
	}
}

pub struct HeadlessDriver {
	simulation: Arc<Mutex<Simulation>>,
	events: UnboundedSender<PlayerEvent>,
	time_source: TimeSource,
	tick_period: std::time::Duration,
}

impl HeadlessDriver {
	/// Moves the position while playing until the surface is released.
	pub async fn run(self) {
		let mut interval = self
			.time_source
			.interval_at("headless", self.tick_period, self.tick_period);
		let step = position_from_std(self.tick_period);

		loop {
			interval.tick().await;

			let event = {
				let mut simulation = self.simulation.lock();
				if simulation.released {
					break;
				}
				if !simulation.playing {
					continue;
				}

				let rate = simulation.rate;
				simulation.position += scaled(step, rate);
				if simulation.position >= simulation.duration {
					simulation.position = simulation.duration;
					simulation.playing = false;
					PlayerEvent::Ended
				} else {
					PlayerEvent::TimeUpdate(simulation.position)
				}
			};

			if self.events.unbounded_send(event).is_err() {
				break;
			}
		}
		debug!("Stopped simulating media.");
	}
}

// positions are far below the range where f64 loses millisecond precision
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn scaled(step: Duration, rate: PlaybackRate) -> Duration {
	Duration::milliseconds((step.num_milliseconds() as f64 * rate.multiplier()).round() as i64)
}
