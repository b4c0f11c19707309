//! Session-aware HTTP client facade.
//!
//! [`SessionClient`] runs every request through the same pipeline:
//!
//! 1. the [`RequestAugmenter`] stamps the current access token;
//! 2. the [`HttpTransport`] sends it and non-`2xx` responses become [`RequestError::Status`];
//! 3. the [`FailureClassifier`] decides whether the failure is a first `401`;
//! 4. eligible failures are handed to the [`RefreshCoordinator`], which refreshes once and replays
//!    the request through steps 1 and 2 with the new token.

// crates.io
use http::Method;
// self
use crate::{
	_prelude::*,
	auth::TokenPair,
	config::SessionConfig,
	coordinator::RefreshCoordinator,
	error::{ConfigError, RequestError, ResponseFailure, TransportError},
	intercept::{Classification, FailureClassifier, RequestAugmenter},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	refresh::{RefreshInvoker, RefreshMetrics},
	store::TokenStore,
	transport::{ApiRequest, ApiResponse, HttpTransport},
};
#[cfg(feature = "reqwest")] use crate::{refresh::HttpRefreshInvoker, transport::ReqwestTransport};

/// HTTP client that keeps a bearer session alive across access-token expiry.
///
/// The client is cheap to share behind an [`Arc`]; all state lives in the injected store and the
/// owned coordinator.
pub struct SessionClient {
	config: SessionConfig,
	transport: Arc<dyn HttpTransport>,
	store: Arc<dyn TokenStore>,
	augmenter: RequestAugmenter,
	classifier: FailureClassifier,
	coordinator: RefreshCoordinator,
}
impl SessionClient {
	/// Assembles a client from explicit collaborators.
	pub fn new(
		config: SessionConfig,
		transport: Arc<dyn HttpTransport>,
		store: Arc<dyn TokenStore>,
		invoker: Arc<dyn RefreshInvoker>,
	) -> Result<Self> {
		config.validate().map_err(ConfigError::from)?;

		Ok(Self {
			augmenter: RequestAugmenter::new(store.clone()),
			classifier: FailureClassifier,
			coordinator: RefreshCoordinator::new(store.clone(), invoker),
			config,
			transport,
			store,
		})
	}

	/// Builds a reqwest-backed client whose refresh calls target the configured refresh path.
	#[cfg(feature = "reqwest")]
	pub fn from_config(
		config: SessionConfig,
		store: Arc<dyn TokenStore>,
	) -> Result<Self> {
		config.validate().map_err(ConfigError::from)?;

		let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::from_config(&config)?);
		let invoker = Arc::new(HttpRefreshInvoker::from_config(&config, transport.clone())?);

		Self::new(config, transport, store, invoker)
	}

	/// Configuration the client was built with.
	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	/// Token store backing the session.
	pub fn store(&self) -> &Arc<dyn TokenStore> {
		&self.store
	}

	/// Refresh coordinator, mainly for diagnostics.
	pub fn coordinator(&self) -> &RefreshCoordinator {
		&self.coordinator
	}

	/// Refresh counters.
	pub fn refresh_metrics(&self) -> Arc<RefreshMetrics> {
		self.coordinator.metrics()
	}

	/// Builds a request for a path relative to the configured base URL.
	pub fn request(&self, method: Method, path: &str) -> Result<ApiRequest, ConfigError> {
		Ok(ApiRequest::new(method, self.config.endpoint(path)?))
	}

	/// Sends a request, transparently recovering from an expired access token.
	///
	/// A first `401` triggers (or joins) a single refresh and the request is replayed once with
	/// the new token. Every other failure, including a `401` on the replay, is returned as is.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, RequestError> {
		const KIND: FlowKind = FlowKind::Request;

		let span = FlowSpan::new(KIND, "send").with_request(&request);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let error = match self.execute(request).await {
					Ok(response) => return Ok(response),
					Err(e) => e,
				};

				match self.classifier.classify(error) {
					Classification::Terminal(e) => Err(e),
					Classification::Refresh(failure) =>
						self.coordinator.recover(failure, |request| self.replay(request)).await,
				}
			})
			.await;

		obs::record_flow_result(KIND, &result);

		result
	}

	/// Sends a request once, stamped with the current token, without any recovery.
	pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, RequestError> {
		let request = self.augmenter.augment(request);
		let response = self.transport.send(request.clone()).await?;

		if response.is_success() {
			Ok(response)
		} else {
			Err(ResponseFailure::new(request, response).into())
		}
	}

	/// Stores a freshly established session (after login or registration).
	pub fn establish(&self, pair: TokenPair) {
		self.store.set_tokens(pair);
	}

	/// Extracts a session from a login or registration response body and stores it.
	pub fn establish_from_body(&self, body: &[u8]) -> Result<TokenPair> {
		let grant = self
			.config
			.token_fields
			.extract_from_slice(body)
			.map_err(|source| Error::MalformedResponse { source })?;
		let pair = grant.into_pair(None)?;

		self.store.set_tokens(pair.clone());

		Ok(pair)
	}

	/// Ends the session.
	///
	/// The logout endpoint is called with the current token on a best-effort basis; the local
	/// session is cleared whatever the outcome, which is returned for inspection.
	pub async fn logout(&self) -> Result<(), RequestError> {
		let outcome = match self.config.logout_url() {
			Ok(url) => self.execute(ApiRequest::post(url)).await.map(|_| ()),
			Err(e) => Err(TransportError::invalid_request(e).into()),
		};

		self.store.clear_tokens();

		obs_event!(debug, remote_ok = outcome.is_ok(), "Session cleared.");

		outcome
	}

	async fn replay(&self, request: ApiRequest) -> Result<ApiResponse, RequestError> {
		const KIND: FlowKind = FlowKind::Replay;

		let span = FlowSpan::new(KIND, "replay").with_request(&request);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.execute(request)).await;

		obs::record_flow_result(KIND, &result);

		result
	}
}
impl Debug for SessionClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionClient")
			.field("config", &self.config)
			.field("coordinator", &self.coordinator)
			.finish()
	}
}
