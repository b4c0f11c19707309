//! Scripted collaborators shared by the integration tests.

#![allow(dead_code)]

// std
use std::{
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use tokio::sync::Notify;
// self
use session_broker::{
	auth::{TokenGrant, TokenPair, TokenSecret},
	client::SessionClient,
	config::SessionConfig,
	error::{RefreshError, TransportError},
	http::{HeaderValue, StatusCode},
	refresh::{RefreshFuture, RefreshInvoker},
	store::MemoryTokenStore,
	transport::{ApiRequest, ApiResponse, HttpTransport, TransportFuture},
	url::Url,
};

/// Backend double: accepts exactly one bearer token and echoes the request path as the body.
///
/// Rejected requests receive `401` with the path as payload, which lets tests tell apart the
/// failure each caller got back.
pub struct ScriptedTransport {
	accepted: HeaderValue,
	calls: AtomicUsize,
	dispatched: Mutex<Vec<String>>,
}
impl ScriptedTransport {
	pub fn accepting(token: &str) -> Arc<Self> {
		let accepted = HeaderValue::from_str(&format!("Bearer {token}"))
			.expect("Fixture token should be a valid header value.");

		Arc::new(Self { accepted, calls: AtomicUsize::new(0), dispatched: Mutex::new(Vec::new()) })
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	/// Paths in the order they reached the transport.
	pub fn dispatched(&self) -> Vec<String> {
		self.dispatched.lock().expect("Dispatch log should not be poisoned.").clone()
	}
}
impl HttpTransport for ScriptedTransport {
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.dispatched
			.lock()
			.expect("Dispatch log should not be poisoned.")
			.push(request.url.path().to_owned());

		let status = if request.authorization() == Some(&self.accepted) {
			StatusCode::OK
		} else {
			StatusCode::UNAUTHORIZED
		};
		let response = ApiResponse::new(status, request.url.path().as_bytes().to_vec());

		Box::pin(async move { Ok::<_, TransportError>(response) })
	}
}

/// Refresh double that counts calls and optionally blocks until the test opens its gate.
pub struct GatedInvoker {
	minted: Option<&'static str>,
	gate: Option<Notify>,
	calls: AtomicUsize,
}
impl GatedInvoker {
	/// Mints `access` immediately.
	pub fn minting(access: &'static str) -> Arc<Self> {
		Arc::new(Self { minted: Some(access), gate: None, calls: AtomicUsize::new(0) })
	}

	/// Mints `access` once [`GatedInvoker::open`] is called.
	pub fn gated(access: &'static str) -> Arc<Self> {
		Arc::new(Self { minted: Some(access), gate: Some(Notify::new()), calls: AtomicUsize::new(0) })
	}

	/// Rejects the refresh token once [`GatedInvoker::open`] is called.
	pub fn gated_rejection() -> Arc<Self> {
		Arc::new(Self { minted: None, gate: Some(Notify::new()), calls: AtomicUsize::new(0) })
	}

	pub fn open(&self) {
		if let Some(gate) = &self.gate {
			gate.notify_one();
		}
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl RefreshInvoker for GatedInvoker {
	fn refresh<'a>(&'a self, _: &'a TokenSecret) -> RefreshFuture<'a> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async move {
			if let Some(gate) = &self.gate {
				gate.notified().await;
			}

			match self.minted {
				Some(access) => Ok(TokenGrant::new(access, Some("R2".into()))),
				None => Err(RefreshError::Rejected { status: 401 }),
			}
		})
	}
}

pub fn config() -> SessionConfig {
	SessionConfig::builder(Url::parse("https://refil.com").expect("Fixture URL should parse."))
		.build()
		.expect("Fixture config should be valid.")
}

/// Store seeded with `T1`/`R1`.
pub fn expired_session() -> Arc<MemoryTokenStore> {
	Arc::new(MemoryTokenStore::with_tokens(
		TokenPair::new("T1").expect("Fixture should be valid.").with_refresh_token("R1"),
	))
}

pub fn client(
	store: Arc<MemoryTokenStore>,
	transport: Arc<ScriptedTransport>,
	invoker: Arc<GatedInvoker>,
) -> Arc<SessionClient> {
	Arc::new(
		SessionClient::new(config(), transport, store, invoker)
			.expect("Fixture client should build."),
	)
}

/// Polls until `n` requests are parked behind the in-flight refresh.
pub async fn wait_for_parked(client: &SessionClient, n: usize) {
	tokio::time::timeout(Duration::from_secs(5), async {
		while client.coordinator().waiting() < n {
			tokio::time::sleep(Duration::from_millis(1)).await;
		}
	})
	.await
	.expect("Requests should park behind the refresh in time.");
}
