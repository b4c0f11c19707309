//! Session client configuration and its validating builder.

// self
use crate::{_prelude::*, auth::TokenFieldStrategy, error::ConfigError};

/// Errors raised while constructing or validating a [`SessionConfig`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum SessionConfigError {
	/// Base URL must use HTTP(S).
	#[error("The base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// URL that failed validation.
		url: String,
	},
	/// Plain HTTP is only accepted for loopback hosts.
	#[error("The base URL must use HTTPS outside loopback hosts: {url}.")]
	InsecureBaseUrl {
		/// URL that failed validation.
		url: String,
	},
	/// Endpoint paths are joined onto the base URL and must be absolute.
	#[error("The {endpoint} path must start with `/`: {path}.")]
	InvalidEndpointPath {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Path that failed validation.
		path: String,
	},
	/// A zero timeout would fail every request immediately.
	#[error("Request timeout must be greater than zero.")]
	ZeroTimeout,
	/// Token extraction needs at least one access-token key.
	#[error("Token field strategy must list at least one access token key.")]
	NoAccessTokenKeys,
	/// Token extraction root must be a JSON pointer.
	#[error("Token field root must be empty or a JSON pointer starting with `/`: {root}.")]
	InvalidTokenRoot {
		/// Root that failed validation.
		root: String,
	},
}

/// Settings shared by the session client, its transport, and the HTTP refresh invoker.
///
/// The struct is serde-friendly so applications can embed it in their own config files; values
/// loaded that way should still pass through [`SessionConfig::validate`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
	/// Backend origin every request path is joined onto.
	pub base_url: Url,
	/// Path of the token refresh endpoint.
	pub refresh_path: String,
	/// Path of the logout endpoint.
	pub logout_path: String,
	/// Per-request timeout enforced by the transport.
	pub request_timeout: Duration,
	/// How minted tokens are located inside JSON responses.
	pub token_fields: TokenFieldStrategy,
}
impl SessionConfig {
	/// Default refresh endpoint path.
	pub const DEFAULT_REFRESH_PATH: &'static str = "/api/v1/auth/refresh";
	/// Default logout endpoint path.
	pub const DEFAULT_LOGOUT_PATH: &'static str = "/api/v1/auth/logout";
	/// Default per-request timeout.
	pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

	/// Returns a builder seeded with defaults for the provided origin.
	pub fn builder(base_url: Url) -> SessionConfigBuilder {
		SessionConfigBuilder::new(base_url)
	}

	/// Validates a configuration assembled outside the builder.
	pub fn validate(&self) -> Result<(), SessionConfigError> {
		validate_base_url(&self.base_url)?;
		validate_path("refresh", &self.refresh_path)?;
		validate_path("logout", &self.logout_path)?;

		if self.request_timeout.is_zero() {
			return Err(SessionConfigError::ZeroTimeout);
		}
		if self.token_fields.access_keys.iter().all(|key| key.is_empty()) {
			return Err(SessionConfigError::NoAccessTokenKeys);
		}
		if !self.token_fields.root.is_empty() && !self.token_fields.root.starts_with('/') {
			return Err(SessionConfigError::InvalidTokenRoot {
				root: self.token_fields.root.clone(),
			});
		}

		Ok(())
	}

	/// Resolves an endpoint path against the base URL.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		self.base_url
			.join(path)
			.map_err(|source| ConfigError::InvalidPath { path: path.to_owned(), source })
	}

	/// Absolute URL of the refresh endpoint.
	pub fn refresh_url(&self) -> Result<Url, ConfigError> {
		self.endpoint(&self.refresh_path)
	}

	/// Absolute URL of the logout endpoint.
	pub fn logout_url(&self) -> Result<Url, ConfigError> {
		self.endpoint(&self.logout_path)
	}
}

/// Builder for [`SessionConfig`] values.
#[derive(Debug)]
pub struct SessionConfigBuilder {
	/// Backend origin.
	pub base_url: Url,
	/// Refresh endpoint path.
	pub refresh_path: String,
	/// Logout endpoint path.
	pub logout_path: String,
	/// Per-request timeout.
	pub request_timeout: Duration,
	/// Token extraction strategy.
	pub token_fields: TokenFieldStrategy,
}
impl SessionConfigBuilder {
	/// Creates a new builder seeded with the provided origin.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			refresh_path: SessionConfig::DEFAULT_REFRESH_PATH.into(),
			logout_path: SessionConfig::DEFAULT_LOGOUT_PATH.into(),
			request_timeout: SessionConfig::DEFAULT_TIMEOUT,
			token_fields: TokenFieldStrategy::default(),
		}
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Overrides the logout endpoint path.
	pub fn logout_path(mut self, path: impl Into<String>) -> Self {
		self.logout_path = path.into();

		self
	}

	/// Overrides the per-request timeout.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Overrides the token extraction strategy.
	pub fn token_fields(mut self, strategy: TokenFieldStrategy) -> Self {
		self.token_fields = strategy;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<SessionConfig, SessionConfigError> {
		let config = SessionConfig {
			base_url: self.base_url,
			refresh_path: self.refresh_path,
			logout_path: self.logout_path,
			request_timeout: self.request_timeout,
			token_fields: self.token_fields,
		};

		config.validate()?;

		Ok(config)
	}
}

fn validate_base_url(url: &Url) -> Result<(), SessionConfigError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		"http" => Err(SessionConfigError::InsecureBaseUrl { url: url.to_string() }),
		_ => Err(SessionConfigError::UnsupportedScheme { url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(addr)) => addr.is_loopback(),
		Some(url::Host::Ipv6(addr)) => addr.is_loopback(),
		None => false,
	}
}

fn validate_path(endpoint: &'static str, path: &str) -> Result<(), SessionConfigError> {
	if path.starts_with('/') && !path.starts_with("//") {
		Ok(())
	} else {
		Err(SessionConfigError::InvalidEndpointPath { endpoint, path: path.to_owned() })
	}
}
