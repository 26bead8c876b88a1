//! Common types for the playlist export workspace

mod error;
mod fs;
mod secret;

pub use error::{Error, Result};
pub use fs::write_atomic;
pub use secret::Secret;
