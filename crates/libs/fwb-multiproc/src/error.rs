//! Multiplexer error types.

/// Multiplexer errors.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An output reader thread could not be joined.
    #[error("failed to join an output reader thread")]
    ReaderJoin,
}
