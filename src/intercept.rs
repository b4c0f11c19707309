//! Interception hooks run around every request: bearer stamping on the way out and
//! authentication-failure classification on the way back.

pub mod augment;
pub mod classify;

pub use augment::*;
pub use classify::*;
