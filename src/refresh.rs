//! Refresh invocation contract and the HTTP-backed default implementation.
//!
//! A [`RefreshInvoker`] turns a refresh token into freshly minted token material. It performs
//! exactly one network call per invocation and never retries; the coordinator treats every
//! failure (rejection, malformed body, timeout) as the end of the session.

mod metrics;

pub use self::metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{TokenFieldStrategy, TokenGrant, TokenSecret},
	config::SessionConfig,
	error::{ConfigError, RefreshError},
	transport::{ApiRequest, HttpTransport},
};

/// Boxed future returned by [`RefreshInvoker::refresh`].
pub type RefreshFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TokenGrant, RefreshError>> + 'a + Send>>;

/// Mints a new token pair from a refresh token.
pub trait RefreshInvoker
where
	Self: Send + Sync,
{
	/// Performs a single refresh call.
	///
	/// A successful grant without a usable access token is still treated as a failed refresh
	/// by the coordinator.
	fn refresh<'a>(&'a self, refresh_token: &'a TokenSecret) -> RefreshFuture<'a>;
}

#[derive(Serialize)]
struct RefreshBody<'a> {
	token: &'a str,
}

/// Calls the backend refresh endpoint with `{"token": <refresh token>}`.
///
/// The request goes straight to the transport, bypassing the session interception hooks, so a
/// rejected refresh can never recurse into another refresh.
#[derive(Clone)]
pub struct HttpRefreshInvoker {
	transport: Arc<dyn HttpTransport>,
	url: Url,
	fields: TokenFieldStrategy,
}
impl HttpRefreshInvoker {
	/// Creates an invoker targeting an explicit endpoint.
	pub fn new(transport: Arc<dyn HttpTransport>, url: Url, fields: TokenFieldStrategy) -> Self {
		Self { transport, url, fields }
	}

	/// Creates an invoker from the session configuration.
	pub fn from_config(
		config: &SessionConfig,
		transport: Arc<dyn HttpTransport>,
	) -> Result<Self, ConfigError> {
		Ok(Self::new(transport, config.refresh_url()?, config.token_fields.clone()))
	}

	/// Endpoint this invoker calls.
	pub fn url(&self) -> &Url {
		&self.url
	}
}
impl RefreshInvoker for HttpRefreshInvoker {
	fn refresh<'a>(&'a self, refresh_token: &'a TokenSecret) -> RefreshFuture<'a> {
		Box::pin(async move {
			let request = ApiRequest::post(self.url.clone())
				.with_json(&RefreshBody { token: refresh_token.expose() })
				.map_err(|source| RefreshError::Malformed { source })?;
			let response = self.transport.send(request).await?;

			if !response.is_success() {
				return Err(RefreshError::Rejected { status: response.status.as_u16() });
			}

			self.fields
				.extract_from_slice(&response.body)
				.map_err(|source| RefreshError::Malformed { source })
		})
	}
}
impl Debug for HttpRefreshInvoker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpRefreshInvoker")
			.field("url", &self.url)
			.field("fields", &self.fields)
			.finish()
	}
}
