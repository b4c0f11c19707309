//! Token value types owned by a [`TokenStore`](crate::store::TokenStore).

pub mod extract;
pub mod pair;
pub mod secret;
