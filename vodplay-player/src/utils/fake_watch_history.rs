use crate::resume::watch_history::{PositionReport, WatchHistory, WatchHistoryError};
use crate::types::{ContentId, UserId};
use async_trait::async_trait;
use chrono::Duration;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Notify, OwnedRwLockWriteGuard, RwLock};

#[derive(Clone, Debug)]
enum Lookup {
	Answer(Result<Option<Duration>, WatchHistoryError>),
	Hang,
}

/// Answers lookups with a fixed result and records every report. Clones share their record.
#[derive(Clone, Debug)]
pub struct FakeWatchHistory {
	lookup: Lookup,
	reports: Arc<Mutex<Vec<PositionReport>>>,
	reported: Arc<Notify>,
	rejecting_reports: Arc<AtomicBool>,
	held_reports: Arc<RwLock<()>>,
}

impl Default for FakeWatchHistory {
	fn default() -> Self {
		Self::with_lookup(Lookup::Answer(Ok(None)))
	}
}

impl FakeWatchHistory {
	fn with_lookup(lookup: Lookup) -> Self {
		Self {
			lookup,
			reports: Default::default(),
			reported: Default::default(),
			rejecting_reports: Default::default(),
			held_reports: Default::default(),
		}
	}

	pub fn with_saved_position(position: Duration) -> Self {
		Self::with_lookup(Lookup::Answer(Ok(Some(position))))
	}

	pub fn unavailable() -> Self {
		Self::with_lookup(Lookup::Answer(Err(WatchHistoryError::LookupUnavailable {
			reason: "backend down".to_string(),
		})))
	}

	/// Lookups never complete.
	pub fn hanging() -> Self {
		Self::with_lookup(Lookup::Hang)
	}

	pub fn reject_reports(&self) {
		self.rejecting_reports.store(true, Ordering::SeqCst);
	}

	/// Reports are recorded but don't complete until the returned guard is dropped.
	pub fn hold_reports(&self) -> OwnedRwLockWriteGuard<()> {
		self.held_reports
			.clone()
			.try_write_owned()
			.expect("Reports are already being held")
	}

	pub fn reports(&self) -> Vec<PositionReport> {
		self.reports.lock().clone()
	}

	pub fn reported_positions(&self) -> Vec<Duration> {
		self.reports().into_iter().map(|report| report.position).collect()
	}

	/// Waits until at least `count` reports were attempted, rejected ones included.
	pub async fn wait_for_reports(&self, count: usize) -> Vec<PositionReport> {
		loop {
			let reported = self.reported.notified();
			{
				let reports = self.reports.lock();
				if reports.len() >= count {
					return reports.clone();
				}
			}
			reported.await;
		}
	}
}

#[async_trait]
impl WatchHistory for FakeWatchHistory {
	async fn position(&self, _user: UserId, _content: ContentId) -> Result<Option<Duration>, WatchHistoryError> {
		match &self.lookup {
			Lookup::Answer(answer) => answer.clone(),
			Lookup::Hang => std::future::pending().await,
		}
	}

	async fn report(&self, _user: UserId, _content: ContentId, report: PositionReport) -> Result<(), WatchHistoryError> {
		self.reports.lock().push(report);
		self.reported.notify_waiters();
		let _released = self.held_reports.read().await;

		if self.rejecting_reports.load(Ordering::SeqCst) {
			Err(WatchHistoryError::ReportFailed {
				reason: "rejected".to_string(),
			})
		} else {
			Ok(())
		}
	}
}
