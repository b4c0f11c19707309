//! Thread-safe in-memory [`TokenStore`] implementation for apps, local development, and tests.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{_prelude::*, auth::TokenPair, store::TokenStore};

/// Process-local token holder.
///
/// Besides the pair itself the store counts writes and clears, which lets callers and tests
/// observe how often a session was rotated or torn down.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
	pair: RwLock<Option<TokenPair>>,
	writes: AtomicU64,
	clears: AtomicU64,
}
impl MemoryTokenStore {
	/// Creates a store seeded with an established session.
	pub fn with_tokens(pair: TokenPair) -> Self {
		Self { pair: RwLock::new(Some(pair)), ..Default::default() }
	}

	/// Number of [`TokenStore::set_tokens`] calls observed.
	pub fn writes(&self) -> u64 {
		self.writes.load(Ordering::Relaxed)
	}

	/// Number of [`TokenStore::clear_tokens`] calls observed.
	pub fn clears(&self) -> u64 {
		self.clears.load(Ordering::Relaxed)
	}
}
impl TokenStore for MemoryTokenStore {
	fn tokens(&self) -> Option<TokenPair> {
		self.pair.read().clone()
	}

	fn set_tokens(&self, pair: TokenPair) {
		*self.pair.write() = Some(pair);

		self.writes.fetch_add(1, Ordering::Relaxed);
	}

	fn clear_tokens(&self) {
		self.pair.write().take();

		self.clears.fetch_add(1, Ordering::Relaxed);
	}
}
