//! Session-level error types shared across the transport, store, refresh, and client layers.

// self
use crate::{
	_prelude::*,
	auth::TokenPairError,
	config::SessionConfigError,
	transport::{ApiRequest, ApiResponse},
};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by setup and lifecycle APIs.
///
/// Per-request failures use [`RequestError`] instead so callers can inspect the response that
/// the backend produced.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token material could not form a valid session.
	#[error(transparent)]
	Token(#[from] TokenPairError),

	/// A login or registration response body is not valid JSON.
	#[error("Session response body is not valid JSON.")]
	MalformedResponse {
		/// Underlying parsing failure.
		#[source]
		source: serde_json::Error,
	},
}

/// Configuration and validation failures raised while assembling a session client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Session configuration failed validation.
	#[error(transparent)]
	Session(#[from] SessionConfigError),
	/// A request URL could not be derived from the configured base URL.
	#[error("Path `{path}` cannot be joined onto the base URL.")]
	InvalidPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, request encoding).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the backend.")]
	Io(#[from] std::io::Error),
	/// The request could not be encoded for the wire.
	#[error("Request could not be encoded for the transport.")]
	InvalidRequest {
		/// Encoding failure.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a request encoding failure.
	pub fn invalid_request(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::InvalidRequest { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_builder() {
			Self::invalid_request(e)
		} else {
			Self::network(e)
		}
	}
}

/// A non-success HTTP response paired with the request that produced it.
///
/// The failure owns the original request so it can be replayed after a token refresh, and the
/// original response so callers always observe the failure their own request produced.
#[derive(Clone, Debug)]
pub struct ResponseFailure {
	/// Request that was sent.
	pub request: ApiRequest,
	/// Response returned by the backend.
	pub response: ApiResponse,
}
impl ResponseFailure {
	/// Pairs a request with its failed response.
	pub fn new(request: ApiRequest, response: ApiResponse) -> Self {
		Self { request, response }
	}

	/// HTTP status of the failed response.
	pub fn status(&self) -> http::StatusCode {
		self.response.status
	}

	/// Whether the backend rejected the request as unauthenticated.
	pub fn is_unauthorized(&self) -> bool {
		self.response.status == http::StatusCode::UNAUTHORIZED
	}
}
impl Display for ResponseFailure {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{} {} failed with status {}.", self.request.method, self.request.url, self.status())
	}
}

/// Failure surfaced to the caller of a single request.
#[derive(Debug, ThisError)]
pub enum RequestError {
	/// The backend answered with a non-success status.
	#[error("{0}")]
	Status(ResponseFailure),
	/// The request never produced a response.
	#[error(transparent)]
	Transport(#[from] TransportError),
}
impl RequestError {
	/// Returns the failed response, when the backend produced one.
	pub fn failure(&self) -> Option<&ResponseFailure> {
		match self {
			Self::Status(failure) => Some(failure),
			Self::Transport(_) => None,
		}
	}

	/// Whether this is an authentication failure (`401 Unauthorized`).
	pub fn is_unauthorized(&self) -> bool {
		self.failure().is_some_and(ResponseFailure::is_unauthorized)
	}
}
impl From<ResponseFailure> for RequestError {
	fn from(failure: ResponseFailure) -> Self {
		Self::Status(failure)
	}
}

/// Failures produced while minting a new token pair.
///
/// These never reach request callers; the coordinator logs and counts them, then rejects every
/// pending request with its own original failure.
#[derive(Debug, ThisError)]
pub enum RefreshError {
	/// The refresh endpoint rejected the refresh token.
	#[error("Refresh endpoint rejected the refresh token with status {status}.")]
	Rejected {
		/// HTTP status returned by the refresh endpoint.
		status: u16,
	},
	/// The refresh endpoint returned a body that is not a JSON object.
	#[error("Refresh endpoint returned malformed JSON.")]
	Malformed {
		/// Parsing failure.
		#[source]
		source: serde_json::Error,
	},
	/// The refresh call never produced a response.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The minted tokens cannot form a valid session.
	#[error(transparent)]
	Invalid(#[from] TokenPairError),
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn failure(status: u16) -> ResponseFailure {
		let request = ApiRequest::get(
			Url::parse("https://api.example.com/api/v1/orders").expect("Fixture URL should parse."),
		);
		let response = ApiResponse::new(
			http::StatusCode::from_u16(status).expect("Fixture status should be valid."),
			b"{}".to_vec(),
		);

		ResponseFailure::new(request, response)
	}

	#[test]
	fn request_error_detects_unauthorized_statuses() {
		assert!(RequestError::from(failure(401)).is_unauthorized());
		assert!(!RequestError::from(failure(403)).is_unauthorized());
		assert!(!RequestError::from(failure(500)).is_unauthorized());

		let transport = RequestError::from(TransportError::Io(std::io::Error::other("reset")));

		assert!(!transport.is_unauthorized());
		assert!(transport.failure().is_none());
	}

	#[test]
	fn response_failure_display_names_the_request() {
		let rendered = failure(401).to_string();

		assert_eq!(
			rendered,
			"GET https://api.example.com/api/v1/orders failed with status 401 Unauthorized."
		);
	}
}
