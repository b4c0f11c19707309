//! Single-flight refresh coordination for requests rejected with `401 Unauthorized`.
//!
//! The first eligible failure to reach an idle coordinator becomes the *leader*: it flips the
//! state to [`RefreshPhase::Refreshing`] and performs the one refresh call. Every failure that
//! arrives while the refresh is in flight is parked in a FIFO queue behind a completion channel.
//! Once the refresh settles the leader drains the queue:
//!
//! - on success the new pair is stored first, the leader dispatches its own replay, then wakes
//!   every parked caller in arrival order and each of them replays its own request;
//! - on failure the session is cleared exactly once and every caller receives the failure its own
//!   request produced.
//!
//! Parked callers only learn *how* the refresh settled; their replays run on their own futures, so
//! dropping the leader after the pair is stored never costs a waiter its retry.
//!
//! The state lock is a synchronous mutex that is never held across an `.await`. If the leader's
//! future is dropped mid-refresh, the coordinator returns to idle and parked callers resolve with
//! their own original failures; the stored session is left untouched.

// crates.io
use futures::{channel::oneshot, future};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{RefreshError, RequestError, ResponseFailure},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	refresh::{RefreshInvoker, RefreshMetrics},
	store::TokenStore,
	transport::{ApiRequest, ApiResponse},
};

type Completion = oneshot::Sender<Settlement>;

/// Observable phase of the coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshPhase {
	/// No refresh is in flight.
	Idle,
	/// A refresh call is in flight and new eligible failures are being parked.
	Refreshing,
}

#[derive(Debug)]
enum RefreshState {
	Idle,
	Refreshing { waiters: VecDeque<Completion> },
}

/// How the in-flight refresh ended, as delivered to a parked request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Settlement {
	Refreshed,
	Failed,
}

enum Role {
	Lead(TokenSecret),
	Wait(oneshot::Receiver<Settlement>),
	Unrefreshable,
}

/// Collapses concurrent authentication failures into one refresh and replays the affected
/// requests once it settles.
pub struct RefreshCoordinator {
	store: Arc<dyn TokenStore>,
	invoker: Arc<dyn RefreshInvoker>,
	state: Mutex<RefreshState>,
	metrics: Arc<RefreshMetrics>,
}
impl RefreshCoordinator {
	/// Creates an idle coordinator over the shared store and refresh invoker.
	pub fn new(store: Arc<dyn TokenStore>, invoker: Arc<dyn RefreshInvoker>) -> Self {
		Self {
			store,
			invoker,
			state: Mutex::new(RefreshState::Idle),
			metrics: Default::default(),
		}
	}

	/// Current phase.
	pub fn phase(&self) -> RefreshPhase {
		match &*self.state.lock() {
			RefreshState::Idle => RefreshPhase::Idle,
			RefreshState::Refreshing { .. } => RefreshPhase::Refreshing,
		}
	}

	/// Number of requests parked behind the in-flight refresh.
	pub fn waiting(&self) -> usize {
		match &*self.state.lock() {
			RefreshState::Idle => 0,
			RefreshState::Refreshing { waiters } => waiters.len(),
		}
	}

	/// Refresh counters shared with the owning client.
	pub fn metrics(&self) -> Arc<RefreshMetrics> {
		self.metrics.clone()
	}

	/// Recovers a refresh-eligible failure.
	///
	/// `failure` must already be marked as retried (see
	/// [`FailureClassifier::classify`](crate::intercept::FailureClassifier::classify)). `replay`
	/// re-executes a request through the authenticated pipeline; it is invoked at most once per
	/// request and its result is returned to that request's caller verbatim.
	///
	/// Resolves with the replayed response after a successful refresh, or with
	/// [`RequestError::Status`] carrying the caller's own failure when the session cannot be
	/// renewed.
	pub async fn recover<F, Fut>(
		&self,
		failure: ResponseFailure,
		replay: F,
	) -> Result<ApiResponse, RequestError>
	where
		F: Fn(ApiRequest) -> Fut,
		Fut: Future<Output = Result<ApiResponse, RequestError>>,
	{
		match self.enter() {
			Role::Lead(refresh_token) => self.lead(failure, refresh_token, replay).await,
			Role::Wait(receiver) => {
				obs_event!(debug, url = %failure.request.url, "Refresh in flight; parking request.");

				match receiver.await {
					Ok(Settlement::Refreshed) => replay(failure.request).await,
					// A canceled channel means the leader vanished before the refresh settled.
					Ok(Settlement::Failed) | Err(oneshot::Canceled) => Err(failure.into()),
				}
			},
			Role::Unrefreshable => {
				obs_event!(
					debug,
					url = %failure.request.url,
					"No refresh token is stored; ending the session."
				);

				self.store.clear_tokens();
				self.metrics.record_failure();
				obs::record_flow_outcome(FlowKind::Refresh, FlowOutcome::Failure);

				Err(failure.into())
			},
		}
	}

	fn enter(&self) -> Role {
		let mut state = self.state.lock();

		match &mut *state {
			RefreshState::Refreshing { waiters } => {
				let (completion, receiver) = oneshot::channel();

				waiters.push_back(completion);
				self.metrics.record_queued();

				Role::Wait(receiver)
			},
			RefreshState::Idle => match self.store.refresh_token() {
				Some(refresh_token) => {
					*state = RefreshState::Refreshing { waiters: VecDeque::new() };

					Role::Lead(refresh_token)
				},
				None => Role::Unrefreshable,
			},
		}
	}

	/// Returns to idle and hands back every parked request.
	fn settle(&self) -> VecDeque<Completion> {
		match std::mem::replace(&mut *self.state.lock(), RefreshState::Idle) {
			RefreshState::Idle => VecDeque::new(),
			RefreshState::Refreshing { waiters } => waiters,
		}
	}

	async fn lead<F, Fut>(
		&self,
		failure: ResponseFailure,
		refresh_token: TokenSecret,
		replay: F,
	) -> Result<ApiResponse, RequestError>
	where
		F: Fn(ApiRequest) -> Fut,
		Fut: Future<Output = Result<ApiResponse, RequestError>>,
	{
		const KIND: FlowKind = FlowKind::Refresh;

		let mut in_flight = InFlight { coordinator: self, settled: false };
		let span = FlowSpan::new(KIND, "recover").with_request(&failure.request);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.metrics.record_attempt();

		obs_event!(debug, url = %failure.request.url, "Refreshing session.");

		let minted = span
			.instrument(async {
				let grant = self.invoker.refresh(&refresh_token).await?;

				Ok::<_, RefreshError>(grant.into_pair(Some(&refresh_token))?)
			})
			.await;

		obs::record_flow_result(KIND, &minted);

		match minted {
			Ok(pair) => {
				self.store.set_tokens(pair);
				self.metrics.record_success();

				let waiters = self.settle();

				in_flight.settled = true;
				self.metrics.record_replays(waiters.len() + 1);

				obs_event!(debug, parked = waiters.len(), "Session refreshed; replaying requests.");

				// `join` polls the trigger's replay before the parked callers are woken, so the
				// trigger is dispatched first.
				let (result, ()) = future::join(replay(failure.request), async move {
					for completion in waiters {
						// A caller that stopped waiting has nothing left to replay.
						let _ = completion.send(Settlement::Refreshed);
					}
				})
				.await;

				result
			},
			Err(e) => {
				obs_event!(warn, error = %e, "Session refresh failed; clearing tokens.");

				#[cfg(not(feature = "tracing"))]
				let _ = e;

				self.store.clear_tokens();
				self.metrics.record_failure();

				let waiters = self.settle();

				in_flight.settled = true;

				for completion in waiters {
					let _ = completion.send(Settlement::Failed);
				}

				Err(failure.into())
			},
		}
	}
}
impl Debug for RefreshCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshCoordinator")
			.field("phase", &self.phase())
			.field("waiting", &self.waiting())
			.field("metrics", &self.metrics)
			.finish()
	}
}

/// Returns the coordinator to idle if the leader is dropped before the refresh settles.
struct InFlight<'a> {
	coordinator: &'a RefreshCoordinator,
	settled: bool,
}
impl Drop for InFlight<'_> {
	fn drop(&mut self) {
		if self.settled {
			return;
		}

		let orphaned = self.coordinator.settle();

		obs_event!(
			warn,
			orphaned = orphaned.len(),
			"Refresh abandoned before settling; releasing parked requests."
		);

		// Dropping the senders resolves each waiter with its own failure.
		drop(orphaned);
	}
}
