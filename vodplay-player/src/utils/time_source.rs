//! Injectable timers.
//!
//! Every timer the player uses is created through a [`TimeSource`]. In production it hands out tokio timers. In
//! test mode every timer belongs to a named manual clock that only moves when a test calls
//! [`TimeSource::advance_time`], which makes sampling and auto-hide behavior deterministic.

use futures_util::Stream;
use pin_project::pin_project;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::{Notify, broadcast};
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

#[derive(Clone, Default)]
pub struct TimeSource {
	manual_clocks: Option<Arc<ManualClocks>>,
}

impl std::fmt::Debug for TimeSource {
	fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mode = if self.manual_clocks.is_some() { "manual" } else { "tokio" };
		formatter.debug_struct("TimeSource").field("mode", &mode).finish()
	}
}

/// Returned when a timer created by [`TimeSource::timeout`] ran out before its future completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Timer '{0}' elapsed.")]
pub struct Elapsed(pub &'static str);

#[derive(Default)]
struct ManualClocks {
	clocks: parking_lot::Mutex<BTreeMap<&'static str, Arc<ManualClock>>>,
}

struct ManualClock {
	time_deltas: broadcast::Sender<Duration>,
	requested: Notify,
}

impl Default for ManualClock {
	fn default() -> Self {
		Self {
			time_deltas: broadcast::channel(64).0,
			requested: Notify::new(),
		}
	}
}

impl ManualClocks {
	fn clock(&self, name: &'static str) -> Arc<ManualClock> {
		self.clocks.lock().entry(name).or_default().clone()
	}

	fn subscribe(&self, name: &'static str) -> BroadcastStream<Duration> {
		let clock = self.clock(name);
		let receiver = clock.time_deltas.subscribe();
		clock.requested.notify_one();
		BroadcastStream::new(receiver)
	}
}

impl TimeSource {
	/// A time source whose timers only advance through [`TimeSource::advance_time`].
	pub fn test() -> Self {
		Self {
			manual_clocks: Some(Default::default()),
		}
	}

	/// Ticks first after `start`, then every `period`. Missed ticks are delayed, not bursted.
	pub fn interval_at(&self, name: &'static str, start: Duration, period: Duration) -> Interval {
		match &self.manual_clocks {
			None => {
				let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + start, period);
				interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
				Interval::Tokio(interval)
			}
			Some(clocks) => Interval::Manual(ManualInterval {
				elapsed: Duration::ZERO,
				next_deadline: start,
				period,
				time_deltas: clocks.subscribe(name),
			}),
		}
	}

	pub fn timeout<ValueFuture: Future>(
		&self,
		name: &'static str,
		duration: Duration,
		future: ValueFuture,
	) -> Timeout<ValueFuture> {
		match &self.manual_clocks {
			None => Timeout::Tokio {
				name,
				timeout: tokio::time::timeout(duration, future),
			},
			Some(clocks) => Timeout::Manual(ManualTimeout {
				name,
				future,
				elapsed: Duration::ZERO,
				deadline: duration,
				time_deltas: clocks.subscribe(name),
			}),
		}
	}

	/// Completes once `duration` has passed on the timer called `name`.
	pub fn sleep(&self, name: &'static str, duration: Duration) -> impl Future<Output = ()> + Send + 'static {
		let timeout = self.timeout(name, duration, std::future::pending::<()>());
		async move {
			let _ = timeout.await;
		}
	}

	/// Moves every timer called `name` forward. Timers created afterwards start counting from zero.
	///
	/// # Panics
	/// Outside of test mode.
	pub fn advance_time(&self, name: &'static str, by_duration: Duration) {
		let clocks = self
			.manual_clocks
			.as_ref()
			.expect("Time can only be advanced on a test time source.");
		// nobody listening is fine, the time simply passes unobserved
		let _ = clocks.clock(name).time_deltas.send(by_duration);
	}

	/// Waits until a timer called `name` has been created. Returns immediately if one was created since the last
	/// call, and always immediately outside of test mode.
	pub async fn wait_for_time_request(&self, name: &'static str) {
		if let Some(clocks) = &self.manual_clocks {
			let clock = clocks.clock(name);
			clock.requested.notified().await;
		}
	}
}

#[derive(Debug)]
pub enum Interval {
	Tokio(tokio::time::Interval),
	Manual(ManualInterval),
}

impl Interval {
	pub async fn tick(&mut self) {
		match self {
			Interval::Tokio(interval) => {
				interval.tick().await;
			}
			Interval::Manual(interval) => {
				std::future::poll_fn(|context| Pin::new(&mut *interval).poll_next(context)).await;
			}
		}
	}
}

#[pin_project]
#[derive(Debug)]
pub struct ManualInterval {
	elapsed: Duration,
	next_deadline: Duration,
	period: Duration,
	#[pin]
	time_deltas: BroadcastStream<Duration>,
}

impl Stream for ManualInterval {
	type Item = ();

	fn poll_next(self: Pin<&mut Self>, context: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		let mut this = self.project();
		loop {
			if *this.elapsed >= *this.next_deadline {
				*this.next_deadline += *this.period;
				return Poll::Ready(Some(()));
			}

			match this.time_deltas.as_mut().poll_next(context) {
				Poll::Ready(Some(Ok(delta))) => *this.elapsed += delta,
				Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
					tracing::warn!(skipped, "Manual interval lagged behind its clock.");
				}
				// the clock lives as long as the time source, so this never ends on its own
				Poll::Ready(None) | Poll::Pending => return Poll::Pending,
			}
		}
	}
}

#[pin_project(project = ProjectedTimeout)]
pub enum Timeout<ValueFuture> {
	Tokio {
		name: &'static str,
		#[pin]
		timeout: tokio::time::Timeout<ValueFuture>,
	},
	Manual(#[pin] ManualTimeout<ValueFuture>),
}

impl<ValueFuture: Future> Future for Timeout<ValueFuture> {
	type Output = Result<ValueFuture::Output, Elapsed>;

	fn poll(self: Pin<&mut Self>, context: &mut Context<'_>) -> Poll<Self::Output> {
		match self.project() {
			ProjectedTimeout::Tokio { name, timeout } => match timeout.poll(context) {
				Poll::Ready(Ok(output)) => Poll::Ready(Ok(output)),
				Poll::Ready(Err(_)) => Poll::Ready(Err(Elapsed(*name))),
				Poll::Pending => Poll::Pending,
			},
			ProjectedTimeout::Manual(timeout) => timeout.poll(context),
		}
	}
}

#[pin_project]
pub struct ManualTimeout<ValueFuture> {
	name: &'static str,
	#[pin]
	future: ValueFuture,
	elapsed: Duration,
	deadline: Duration,
	#[pin]
	time_deltas: BroadcastStream<Duration>,
}

impl<ValueFuture: Future> Future for ManualTimeout<ValueFuture> {
	type Output = Result<ValueFuture::Output, Elapsed>;

	fn poll(self: Pin<&mut Self>, context: &mut Context<'_>) -> Poll<Self::Output> {
		let mut this = self.project();
		loop {
			match this.time_deltas.as_mut().poll_next(context) {
				Poll::Ready(Some(Ok(delta))) => *this.elapsed += delta,
				Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(_)))) => {}
				Poll::Ready(None) | Poll::Pending => break,
			}
		}

		if *this.elapsed >= *this.deadline {
			return Poll::Ready(Err(Elapsed(*this.name)));
		}

		this.future.poll(context).map(Ok)
	}
}
