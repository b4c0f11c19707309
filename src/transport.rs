//! Transport primitives: replayable request/response values and the HTTP transport contract.
//!
//! The session client never talks to an HTTP stack directly. It hands [`ApiRequest`] values to
//! an [`HttpTransport`] and receives [`ApiResponse`] values back, whatever their status. Status
//! interpretation (success vs. failure, `401` handling) happens above this layer, which keeps
//! custom transports trivial to write and lets tests script responses without sockets.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use http::{
	HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
	header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, error::TransportError};
#[cfg(feature = "reqwest")] use crate::{config::SessionConfig, error::ConfigError};

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing a single request.
///
/// Implementations must return every response the backend produces, including `4xx`/`5xx`
/// statuses, and only fail with [`TransportError`] when no response was received at all
/// (connection failures, timeouts, TLS errors). Timeouts are the transport's responsibility.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes the request and resolves with the raw response.
	fn send(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// Replayable description of an outgoing call.
///
/// Requests are plain owned values so a request rejected with `401` can be resubmitted
/// unchanged apart from its `Authorization` header. Each request carries a one-way "retried"
/// marker; once set, a further authentication failure is reported to the caller instead of
/// triggering another refresh.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute request URL.
	pub url: Url,
	/// Request headers.
	pub headers: HeaderMap,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
	retried: bool,
}
impl ApiRequest {
	/// Creates a request with no headers or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: HeaderMap::new(), body: None, retried: false }
	}

	/// Shorthand for a `GET` request.
	pub fn get(url: Url) -> Self {
		Self::new(Method::GET, url)
	}

	/// Shorthand for a `POST` request.
	pub fn post(url: Url) -> Self {
		Self::new(Method::POST, url)
	}

	/// Sets (replacing) a header.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Sets a raw body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Serializes `payload` as the JSON body and sets the content type.
	pub fn with_json<T>(mut self, payload: &T) -> Result<Self, serde_json::Error>
	where
		T: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_vec(payload)?);
		self.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		Ok(self)
	}

	/// Current `Authorization` header, if one is attached.
	pub fn authorization(&self) -> Option<&HeaderValue> {
		self.headers.get(AUTHORIZATION)
	}

	/// Whether this request has already been replayed after an authentication failure.
	pub fn is_retried(&self) -> bool {
		self.retried
	}

	/// Sets the retried marker, returning `true` only on the first call.
	pub(crate) fn mark_retried(&mut self) -> bool {
		!std::mem::replace(&mut self.retried, true)
	}
}

/// Response produced by an [`HttpTransport`], regardless of status.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Fully buffered response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a response with no headers.
	pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: HeaderMap::new(), body: body.into() }
	}

	/// Sets (replacing) a header.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Whether the status is in the `2xx` range.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Deserializes the body as JSON.
	pub fn json<T>(&self) -> Result<T, serde_json::Error>
	where
		T: DeserializeOwned,
	{
		serde_json::from_slice(&self.body)
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client honoring the configured request timeout.
	pub fn from_config(config: &SessionConfig) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().timeout(config.request_timeout).build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let ApiRequest { method, url, headers, body, .. } = request;
			let mut builder = self.0.request(method, url).headers(headers);

			if let Some(body) = body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await?.to_vec();

			Ok(ApiResponse { status, headers, body })
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url() -> Url {
		Url::parse("https://api.example.com/api/v1/orders").expect("Fixture URL should parse.")
	}

	#[test]
	fn retried_marker_is_one_way() {
		let mut request = ApiRequest::get(url());

		assert!(!request.is_retried());
		assert!(request.mark_retried());
		assert!(request.is_retried());
		assert!(!request.mark_retried());
		assert!(request.clone().is_retried());
	}

	#[test]
	fn json_body_sets_content_type() {
		let request = ApiRequest::post(url())
			.with_json(&serde_json::json!({ "token": "refresh-1" }))
			.expect("JSON payload should serialize.");

		assert_eq!(
			request.headers.get(CONTENT_TYPE),
			Some(&HeaderValue::from_static("application/json"))
		);
		assert_eq!(request.body.as_deref(), Some(br#"{"token":"refresh-1"}"#.as_slice()));
	}

	#[test]
	fn response_helpers_decode_bodies() {
		let response = ApiResponse::new(StatusCode::OK, br#"{"id":7}"#.to_vec());
		let value: serde_json::Value = response.json().expect("Fixture body should parse.");

		assert!(response.is_success());
		assert_eq!(value["id"], 7);
		assert_eq!(response.text(), r#"{"id":7}"#);
		assert!(!ApiResponse::new(StatusCode::UNAUTHORIZED, Vec::new()).is_success());
	}
}
