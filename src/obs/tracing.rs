// self
use crate::{_prelude::*, obs::FlowKind, transport::ApiRequest};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Span covering one session flow (a request, a refresh, or a replay).
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	///
	/// Request fields start empty and are filled by [`FlowSpan::with_request`].
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"session_broker.flow",
				flow = kind.as_str(),
				stage,
				method = tracing::field::Empty,
				path = tracing::field::Empty,
				retried = tracing::field::Empty,
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Tags the span with the request it covers.
	///
	/// Only the method, the URL path, and the retry marker are recorded. Query strings and headers
	/// never reach the span.
	pub fn with_request(self, request: &ApiRequest) -> Self {
		#[cfg(feature = "tracing")]
		{
			self.span.record("method", request.method.as_str());
			self.span.record("path", request.url.path());
			self.span.record("retried", request.is_retried());
		}
		#[cfg(not(feature = "tracing"))]
		let _ = request;

		self
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}
