//! Common types and utilities.

/// Jobserver error type.
pub use crate::error::Error;

/// Jobserver result type.
pub type Result<T> = core::result::Result<T, Error>;
