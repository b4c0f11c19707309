//! Configurable extraction of token pairs from backend JSON responses.
//!
//! Login, registration, and refresh endpoints do not agree on a single field name for the minted
//! access token (`accessToken`, `token`, and `access_token` all appear in the wild), so the
//! lookup is driven by ordered candidate key lists instead of a fixed schema.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::token::{
		pair::{TokenPair, TokenPairError},
		secret::TokenSecret,
	},
};

/// Token material minted by a login or refresh call, before validation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenGrant {
	/// Newly minted access token, if the response carried a usable one.
	pub access_token: Option<TokenSecret>,
	/// Newly minted refresh token, if the response carried one.
	pub refresh_token: Option<TokenSecret>,
}
impl TokenGrant {
	/// Creates a grant carrying both secrets.
	pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
		Self {
			access_token: TokenSecret::non_blank(access_token),
			refresh_token: refresh_token.and_then(TokenSecret::non_blank),
		}
	}

	/// Converts the grant into a [`TokenPair`], carrying `fallback_refresh` forward when the
	/// grant did not rotate the refresh token.
	pub fn into_pair(
		self,
		fallback_refresh: Option<&TokenSecret>,
	) -> Result<TokenPair, TokenPairError> {
		let access_token = self
			.access_token
			.filter(|secret| !secret.is_blank())
			.ok_or(TokenPairError::MissingAccessToken)?;
		let refresh_token = self.refresh_token.or_else(|| fallback_refresh.cloned());

		Ok(TokenPair { access_token, refresh_token, issued_at: OffsetDateTime::now_utc() })
	}
}

/// Ordered key lists used to locate tokens inside a JSON response body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenFieldStrategy {
	/// JSON pointer to the object that holds the token fields (`""` means the document root).
	pub root: String,
	/// Candidate keys for the access token, tried in order.
	pub access_keys: Vec<String>,
	/// Candidate keys for the refresh token, tried in order.
	pub refresh_keys: Vec<String>,
}
impl TokenFieldStrategy {
	/// Replaces the JSON pointer of the object holding the token fields.
	pub fn with_root(mut self, pointer: impl Into<String>) -> Self {
		self.root = pointer.into();

		self
	}

	/// Replaces the access-token candidate keys.
	pub fn with_access_keys<I, S>(mut self, keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.access_keys = keys.into_iter().map(Into::into).collect();

		self
	}

	/// Replaces the refresh-token candidate keys.
	pub fn with_refresh_keys<I, S>(mut self, keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.refresh_keys = keys.into_iter().map(Into::into).collect();

		self
	}

	/// Reads a grant out of a parsed JSON document.
	///
	/// The first candidate key holding a non-blank string wins; anything else (missing keys,
	/// numbers, nulls, a missing root object) yields `None` for that secret.
	pub fn extract(&self, document: &Value) -> TokenGrant {
		let Some(object) = document.pointer(&self.root).and_then(Value::as_object) else {
			return TokenGrant::default();
		};
		let pick = |keys: &[String]| {
			keys.iter()
				.filter_map(|key| object.get(key).and_then(Value::as_str))
				.find_map(TokenSecret::non_blank)
		};

		TokenGrant { access_token: pick(&self.access_keys), refresh_token: pick(&self.refresh_keys) }
	}

	/// Parses a response body and reads a grant out of it.
	pub fn extract_from_slice(&self, body: &[u8]) -> Result<TokenGrant, serde_json::Error> {
		let document = serde_json::from_slice::<Value>(body)?;

		Ok(self.extract(&document))
	}
}
impl Default for TokenFieldStrategy {
	fn default() -> Self {
		Self {
			root: String::new(),
			access_keys: vec!["accessToken".into(), "token".into(), "access_token".into()],
			refresh_keys: vec!["refreshToken".into(), "refresh_token".into()],
		}
	}
}
