//! Session token models: redacted secrets, access/refresh pairs, and response extraction.

pub mod token;

pub use token::{extract::*, pair::*, secret::*};
