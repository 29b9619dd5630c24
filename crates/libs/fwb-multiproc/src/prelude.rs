//! Common types and utilities.

/// Multiplexer error type.
pub use crate::error::Error;

/// Multiplexer result type.
pub type Result<T> = core::result::Result<T, Error>;
