//! Common types and utilities.

/// Logging error type.
pub use crate::error::Error;

/// Logging result type.
pub type Result<T> = core::result::Result<T, Error>;
