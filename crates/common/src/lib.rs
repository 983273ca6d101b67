//! Common types for the campus-stay client crates

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
