//! Storage contract and built-in implementations for the session token pair.

pub mod file;
pub mod memory;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

// self
use crate::{
	_prelude::*,
	auth::{TokenPair, TokenSecret},
};

/// Holder of the current session credentials.
///
/// Reads are synchronous and must not block on I/O, because the request augmenter calls them for
/// every outgoing request. Writes always replace or clear the whole pair so a refresh completing
/// concurrently with a logout can never leave a half-updated session behind.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Returns the full pair, if a session is established.
	fn tokens(&self) -> Option<TokenPair>;

	/// Replaces the stored pair wholesale.
	fn set_tokens(&self, pair: TokenPair);

	/// Drops the stored pair.
	fn clear_tokens(&self);

	/// Returns the current access token, if any.
	fn access_token(&self) -> Option<TokenSecret> {
		self.tokens().map(|pair| pair.access_token)
	}

	/// Returns the current refresh token, if any.
	fn refresh_token(&self) -> Option<TokenSecret> {
		self.tokens().and_then(|pair| pair.refresh_token)
	}
}

/// Error type produced by [`TokenStore`] backends while loading or persisting state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
