//! Outgoing-request hook that attaches the current access token.

// crates.io
use http::{HeaderValue, header::AUTHORIZATION};
// self
use crate::{_prelude::*, auth::TokenSecret, store::TokenStore, transport::ApiRequest};

/// Request types the augmenter knows how to stamp.
///
/// Implementations must *replace* any existing `Authorization` header so stamping the same
/// request twice yields one header with the latest value.
pub trait BearerTarget
where
	Self: Sized,
{
	/// Sets the `Authorization` header to `value`.
	fn set_authorization(self, value: HeaderValue) -> Self;
}
impl BearerTarget for ApiRequest {
	fn set_authorization(mut self, value: HeaderValue) -> Self {
		self.headers.insert(AUTHORIZATION, value);

		self
	}
}
impl<B> BearerTarget for http::Request<B> {
	fn set_authorization(mut self, value: HeaderValue) -> Self {
		self.headers_mut().insert(AUTHORIZATION, value);

		self
	}
}

/// Stamps outgoing requests with `Authorization: Bearer <access token>`.
///
/// The token is read from the store at the moment each request is stamped, so a replay issued
/// after a refresh always carries the freshly stored token. A missing token leaves the request
/// untouched and it travels unauthenticated.
#[derive(Clone)]
pub struct RequestAugmenter {
	store: Arc<dyn TokenStore>,
}
impl RequestAugmenter {
	/// Creates an augmenter reading from `store`.
	pub fn new(store: Arc<dyn TokenStore>) -> Self {
		Self { store }
	}

	/// Attaches the current access token, if any.
	pub fn augment<R>(&self, request: R) -> R
	where
		R: BearerTarget,
	{
		match self.store.access_token().as_ref().and_then(bearer_value) {
			Some(value) => request.set_authorization(value),
			None => request,
		}
	}
}
impl Debug for RequestAugmenter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("RequestAugmenter(..)")
	}
}

fn bearer_value(secret: &TokenSecret) -> Option<HeaderValue> {
	match HeaderValue::from_str(&secret.bearer()) {
		Ok(mut value) => {
			value.set_sensitive(true);

			Some(value)
		},
		Err(_) => {
			obs_event!(warn, "Access token cannot be encoded as a header value; sending unauthenticated.");

			None
		},
	}
}
