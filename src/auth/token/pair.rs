//! Access/refresh token pair held by a session.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Errors produced while assembling a [`TokenPair`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenPairError {
	/// Issued when no usable access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
}

/// The credentials of one authenticated session.
///
/// A pair is only constructed with a non-blank access token. The refresh token is optional;
/// access-only sessions cannot be refreshed silently and end at the first `401`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
	/// Access token secret sent as the bearer credential.
	pub access_token: TokenSecret,
	/// Refresh token secret, if the backend issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Instant the pair was minted locally.
	pub issued_at: OffsetDateTime,
}
impl TokenPair {
	/// Creates an access-only pair.
	pub fn new(access_token: impl Into<String>) -> Result<Self, TokenPairError> {
		let access_token =
			TokenSecret::non_blank(access_token).ok_or(TokenPairError::MissingAccessToken)?;

		Ok(Self { access_token, refresh_token: None, issued_at: OffsetDateTime::now_utc() })
	}

	/// Attaches a refresh token; blank values leave the pair access-only.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
		self.refresh_token = TokenSecret::non_blank(refresh_token);

		self
	}

	/// Overrides the local mint instant.
	pub fn with_issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = instant;

		self
	}

	/// Returns `true` when the session can be refreshed without user interaction.
	pub fn is_refreshable(&self) -> bool {
		self.refresh_token.is_some()
	}
}
