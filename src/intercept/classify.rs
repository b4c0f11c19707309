//! Response-failure hook that decides which failures may be recovered by a token refresh.

// crates.io
use http::StatusCode;
// self
use crate::error::{RequestError, ResponseFailure};

/// Verdict of the [`FailureClassifier`].
#[derive(Debug)]
pub enum Classification {
	/// The failure is a first `401` for its request; the request is now marked as retried and
	/// should be handed to the refresh coordinator.
	Refresh(ResponseFailure),
	/// The failure must be surfaced to the caller unchanged.
	Terminal(RequestError),
}

/// Separates recoverable authentication failures from everything else.
///
/// A failure is refresh-eligible only when the backend answered `401 Unauthorized` and the
/// request has not been replayed before. Marking happens here, once, so a request that fails
/// authentication again after its replay is terminal and can never loop.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailureClassifier;
impl FailureClassifier {
	/// Status that signals an expired or invalid session.
	pub const SESSION_EXPIRED: StatusCode = StatusCode::UNAUTHORIZED;

	/// Returns `true` if `failure` could be recovered by a refresh, without marking it.
	pub fn is_eligible(&self, failure: &ResponseFailure) -> bool {
		failure.status() == Self::SESSION_EXPIRED && !failure.request.is_retried()
	}

	/// Classifies a request error, marking eligible requests as retried.
	pub fn classify(&self, error: RequestError) -> Classification {
		match error {
			RequestError::Status(mut failure) if self.is_eligible(&failure) => {
				failure.request.mark_retried();

				Classification::Refresh(failure)
			},
			other => Classification::Terminal(other),
		}
	}
}
