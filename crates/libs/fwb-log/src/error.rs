//! Logging error types.

/// Logging errors.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A classification rule pattern failed to compile.
    #[error(transparent)]
    Pattern(#[from] regex::Error),
}
