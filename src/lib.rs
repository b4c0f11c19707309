//! Bearer-session coordinator for HTTP clients: stamps outgoing requests with the current access
//! token, collapses concurrent `401 Unauthorized` failures into a single token refresh, and replays
//! every suspended request once the refresh settles.
//!
//! The moving parts are small and injectable:
//!
//! - [`store::TokenStore`] owns the access/refresh pair.
//! - [`refresh::RefreshInvoker`] mints a new pair from a refresh token.
//! - [`intercept::RequestAugmenter`] and [`intercept::FailureClassifier`] are the two interception
//!   hooks.
//! - [`coordinator::RefreshCoordinator`] runs the single-flight state machine.
//! - [`client::SessionClient`] wires all of the above around a [`transport::HttpTransport`].

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

// Emits a `tracing` event when the feature is enabled; expands to nothing otherwise.
macro_rules! obs_event {
	($level:ident, $($arg:tt)+) => {
		#[cfg(feature = "tracing")]
		tracing::$level!($($arg)+);
	};
}

pub mod auth;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod intercept;
pub mod obs;
pub mod refresh;
pub mod store;
pub mod transport;

mod _prelude {
	pub use std::{
		collections::VecDeque,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use http;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
