use crate::playback::error::InvalidParameter;
use crate::playback::state::PlayState;
use crate::resume::watch_history::{PositionReport, WatchHistoryError};
use chrono::Duration;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResumeSettings {
	/// Saved positions below this resume silently, everything else asks the user first.
	pub threshold: Duration,
	/// Samples closer than this to the last reported position are not reported again.
	pub epsilon: Duration,
}

impl Default for ResumeSettings {
	fn default() -> Self {
		Self {
			threshold: Duration::seconds(30),
			epsilon: Duration::seconds(1),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResumeDecision {
	Resume,
	Restart,
}

/// What the session has to do next to reconcile playback with the saved position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResumeAction {
	Seek(Duration),
	Prompt { saved_position: Duration },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResumeState {
	pub saved_position: Duration,
	pub pending_confirmation: bool,
	pub last_reported_position: Option<Duration>,
}

impl Default for ResumeState {
	fn default() -> Self {
		Self {
			saved_position: Duration::zero(),
			pending_confirmation: false,
			last_reported_position: None,
		}
	}
}

/// Reconciles a freshly opened session with the saved position and decides which positions get reported.
#[derive(Debug)]
pub struct ResumeCoordinator {
	settings: ResumeSettings,
	state: ResumeState,
	lookup_resolved: bool,
	media_duration: Option<Duration>,
	reconciled: bool,
	final_reported: bool,
}

impl ResumeCoordinator {
	pub fn new(settings: ResumeSettings) -> Self {
		Self {
			settings,
			state: ResumeState::default(),
			lookup_resolved: false,
			media_duration: None,
			reconciled: false,
			final_reported: false,
		}
	}

	/// Lookup failures count as "nothing saved".
	#[must_use]
	pub fn lookup_resolved(&mut self, lookup: Result<Option<Duration>, WatchHistoryError>) -> Option<ResumeAction> {
		if self.lookup_resolved {
			return None;
		}
		self.lookup_resolved = true;

		self.state.saved_position = match lookup {
			Ok(Some(position)) => position.max(Duration::zero()),
			Ok(None) => Duration::zero(),
			Err(error) => {
				warn!(%error, "Starting from the beginning, saved position is unavailable.");
				Duration::zero()
			}
		};
		self.reconcile()
	}

	#[must_use]
	pub fn metadata_ready(&mut self, duration: Duration) -> Option<ResumeAction> {
		if self.media_duration.is_some() {
			return None;
		}
		self.media_duration = Some(duration);
		self.reconcile()
	}

	fn reconcile(&mut self) -> Option<ResumeAction> {
		if !self.lookup_resolved || self.media_duration.is_none() || self.reconciled || self.state.pending_confirmation
		{
			return None;
		}

		let saved_position = self.state.saved_position;
		if saved_position < self.settings.threshold {
			debug!(saved_seconds = saved_position.num_seconds(), "Resuming silently.");
			self.reconciled = true;
			Some(ResumeAction::Seek(saved_position))
		} else {
			self.state.pending_confirmation = true;
			Some(ResumeAction::Prompt { saved_position })
		}
	}

	/// Applies the user's answer to the resume prompt and returns the position to seek to.
	pub fn resolve(&mut self, decision: ResumeDecision) -> Result<Duration, InvalidParameter> {
		if !self.state.pending_confirmation {
			return Err(InvalidParameter::NoPendingResumeDecision);
		}

		self.state.pending_confirmation = false;
		self.reconciled = true;
		debug!(?decision, "Resume decision resolved.");
		Ok(match decision {
			ResumeDecision::Resume => self.state.saved_position,
			ResumeDecision::Restart => Duration::zero(),
		})
	}

	/// Whether the resume seek has been decided. Nothing is reported before that.
	pub fn is_reconciled(&self) -> bool {
		self.reconciled
	}

	pub fn state(&self) -> &ResumeState {
		&self.state
	}

	/// Periodic sample. Only reported while playing and when it moved away from the last reported position.
	pub fn sample(&self, position: Duration, play_state: PlayState) -> Option<PositionReport> {
		if !self.reconciled || play_state != PlayState::Playing {
			return None;
		}

		if let Some(last_reported) = self.state.last_reported_position {
			let distance = (position - last_reported).num_milliseconds().abs();
			if distance <= self.settings.epsilon.num_milliseconds() {
				return None;
			}
		}

		Some(PositionReport {
			position,
			completed: false,
		})
	}

	pub fn report_succeeded(&mut self, report: PositionReport) {
		self.state.last_reported_position = Some(report.position);
	}

	/// Replaying after the end re-arms the final report.
	pub fn playback_started(&mut self) {
		self.final_reported = false;
	}

	/// The unconditional report at the end of the media or at teardown. At most once until playback starts again.
	pub fn final_report(&mut self, position: Duration, completed: bool) -> Option<PositionReport> {
		if !self.reconciled || self.final_reported {
			return None;
		}

		self.final_reported = true;
		Some(PositionReport { position, completed })
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn coordinator() -> ResumeCoordinator {
		ResumeCoordinator::new(ResumeSettings::default())
	}

	fn reconciled_coordinator() -> ResumeCoordinator {
		let mut coordinator = coordinator();
		let _ = coordinator.lookup_resolved(Ok(None));
		let _ = coordinator.metadata_ready(Duration::seconds(3600));
		assert!(coordinator.is_reconciled());
		coordinator
	}

	#[test]
	fn small_saved_positions_should_be_resumed_silently() {
		let mut coordinator = coordinator();

		assert_eq!(None, coordinator.lookup_resolved(Ok(Some(Duration::seconds(5)))));
		let action = coordinator.metadata_ready(Duration::seconds(3600));

		assert_eq!(Some(ResumeAction::Seek(Duration::seconds(5))), action);
		assert!(!coordinator.state().pending_confirmation);
		assert!(coordinator.is_reconciled());
	}

	#[test]
	fn reconciliation_should_wait_for_the_lookup() {
		let mut coordinator = coordinator();

		assert_eq!(None, coordinator.metadata_ready(Duration::seconds(3600)));
		let action = coordinator.lookup_resolved(Ok(Some(Duration::seconds(5))));

		assert_eq!(Some(ResumeAction::Seek(Duration::seconds(5))), action);
	}

	#[test]
	fn missing_positions_should_start_from_the_beginning() {
		let mut coordinator = coordinator();
		let _ = coordinator.lookup_resolved(Ok(None));

		assert_eq!(
			Some(ResumeAction::Seek(Duration::zero())),
			coordinator.metadata_ready(Duration::seconds(60))
		);
	}

	#[test]
	fn failed_lookups_should_start_from_the_beginning() {
		let mut coordinator = coordinator();
		let _ = coordinator.lookup_resolved(Err(WatchHistoryError::LookupUnavailable {
			reason: "connection refused".to_string(),
		}));

		assert_eq!(
			Some(ResumeAction::Seek(Duration::zero())),
			coordinator.metadata_ready(Duration::seconds(60))
		);
	}

	#[test]
	fn meaningful_progress_should_ask_the_user() {
		let mut coordinator = coordinator();
		let _ = coordinator.lookup_resolved(Ok(Some(Duration::seconds(600))));

		let action = coordinator.metadata_ready(Duration::seconds(3600));

		assert_eq!(
			Some(ResumeAction::Prompt {
				saved_position: Duration::seconds(600)
			}),
			action
		);
		assert!(coordinator.state().pending_confirmation);
		assert!(!coordinator.is_reconciled());
	}

	#[test]
	fn the_threshold_itself_should_ask_the_user() {
		let mut coordinator = coordinator();
		let _ = coordinator.lookup_resolved(Ok(Some(Duration::seconds(30))));

		assert!(matches!(
			coordinator.metadata_ready(Duration::seconds(3600)),
			Some(ResumeAction::Prompt { .. })
		));
	}

	#[test]
	fn resume_should_seek_to_the_saved_position() {
		let mut coordinator = coordinator();
		let _ = coordinator.lookup_resolved(Ok(Some(Duration::seconds(600))));
		let _ = coordinator.metadata_ready(Duration::seconds(3600));

		assert_eq!(Ok(Duration::seconds(600)), coordinator.resolve(ResumeDecision::Resume));
		assert!(coordinator.is_reconciled());
		assert!(!coordinator.state().pending_confirmation);
	}

	#[test]
	fn restart_should_seek_to_the_beginning() {
		let mut coordinator = coordinator();
		let _ = coordinator.lookup_resolved(Ok(Some(Duration::seconds(600))));
		let _ = coordinator.metadata_ready(Duration::seconds(3600));

		assert_eq!(Ok(Duration::zero()), coordinator.resolve(ResumeDecision::Restart));
	}

	#[test]
	fn decisions_should_only_be_accepted_once() {
		let mut coordinator = coordinator();
		let _ = coordinator.lookup_resolved(Ok(Some(Duration::seconds(600))));
		let _ = coordinator.metadata_ready(Duration::seconds(3600));
		coordinator.resolve(ResumeDecision::Resume).expect("Failed to resolve");

		assert_eq!(
			Err(InvalidParameter::NoPendingResumeDecision),
			coordinator.resolve(ResumeDecision::Restart)
		);
	}

	#[test]
	fn reconciliation_should_happen_only_once() {
		let mut coordinator = reconciled_coordinator();

		assert_eq!(None, coordinator.lookup_resolved(Ok(Some(Duration::seconds(5)))));
		assert_eq!(None, coordinator.metadata_ready(Duration::seconds(10)));
	}

	#[test]
	fn nothing_should_be_sampled_before_reconciliation() {
		let mut coordinator = coordinator();
		let _ = coordinator.lookup_resolved(Ok(Some(Duration::seconds(600))));
		let _ = coordinator.metadata_ready(Duration::seconds(3600));

		assert_eq!(None, coordinator.sample(Duration::zero(), PlayState::Playing));
		assert_eq!(None, coordinator.final_report(Duration::zero(), false));
	}

	#[test]
	fn samples_should_only_be_taken_while_playing() {
		let coordinator = reconciled_coordinator();

		assert_eq!(None, coordinator.sample(Duration::seconds(5), PlayState::Paused));
		assert!(coordinator.sample(Duration::seconds(5), PlayState::Playing).is_some());
	}

	#[test]
	fn jitter_around_the_last_report_should_not_be_reported() {
		let mut coordinator = reconciled_coordinator();
		let report = coordinator
			.sample(Duration::seconds(5), PlayState::Playing)
			.expect("Missing report");
		coordinator.report_succeeded(report);

		assert_eq!(None, coordinator.sample(Duration::milliseconds(5400), PlayState::Playing));
		assert!(coordinator.sample(Duration::seconds(10), PlayState::Playing).is_some());
	}

	#[test]
	fn failed_reports_should_be_retried_by_the_next_sample() {
		let coordinator = reconciled_coordinator();
		let _ = coordinator.sample(Duration::seconds(5), PlayState::Playing);

		assert_eq!(None, coordinator.state().last_reported_position);
		assert!(coordinator.sample(Duration::milliseconds(5200), PlayState::Playing).is_some());
	}

	#[test]
	fn the_final_report_should_be_made_exactly_once() {
		let mut coordinator = reconciled_coordinator();

		assert_eq!(
			Some(PositionReport {
				position: Duration::seconds(3600),
				completed: true
			}),
			coordinator.final_report(Duration::seconds(3600), true)
		);
		assert_eq!(None, coordinator.final_report(Duration::seconds(3600), false));
	}

	#[test]
	fn replaying_should_rearm_the_final_report() {
		let mut coordinator = reconciled_coordinator();
		let _ = coordinator.final_report(Duration::seconds(3600), true);

		coordinator.playback_started();

		assert!(coordinator.final_report(Duration::seconds(20), false).is_some());
	}
}
