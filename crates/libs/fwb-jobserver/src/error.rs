//! Jobserver error types.

use std::io;

/// Jobserver errors.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Requested concurrency capacity is not usable.
    #[error("invalid job capacity {0}: must be at least 1")]
    InvalidCapacity(usize),

    /// A slot was requested after teardown began.
    #[error("jobserver is shutting down")]
    Shutdown,

    /// A job command with no program was submitted.
    #[error("cannot run an empty command")]
    EmptyCommand,

    /// The subprocess could not be started.
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        /// The command that failed to start.
        command: String,
        /// Underlying spawn failure.
        source: io::Error,
    },

    /// Waiting on a spawned subprocess failed.
    #[error("failed to wait for process: {0}")]
    Wait(#[source] io::Error),

    /// Reading a token from the parent jobserver pipe failed.
    #[error("failed to read a job token from the parent jobserver: {0}")]
    TokenRead(#[source] io::Error),

    /// `MAKEFLAGS` advertised a jobserver we cannot parse.
    #[error("malformed jobserver spec in MAKEFLAGS: {0}")]
    BadMakeflags(String),
}
