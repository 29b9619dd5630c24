//! Job concurrency broker for the FWB build orchestrator.
//!
//! Hands out job slots so that an arbitrary number of logical build steps
//! never exceed a configured concurrency limit. Two broker modes share one
//! interface:
//!
//! - [`JobServer`]: standalone broker backed by an in-process counting
//!   semaphore of the configured capacity.
//! - [`GNUMakeJobClient`]: client of a parent GNU Make jobserver reached
//!   through descriptors inherited via `MAKEFLAGS`, reading one token per
//!   acquired job and writing it back on release.
//!
//! Acquired slots are represented by [`JobHandle`] capabilities that return
//! their slot exactly once, and [`JobClient::run`] couples slot acquisition
//! to subprocess lifetime: the slot is released when the spawned process
//! has been fully waited on.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use fwb_jobserver::{JobClient, JobServer};
//! use fwb_log::{LogLevel, MemorySink};
//!
//! # fn main() -> fwb_jobserver::prelude::Result<()> {
//! let sink = Arc::new(MemorySink::new(LogLevel::Debug));
//! let server = JobServer::new(Some(4), sink)?;
//!
//! let mut proc = server.run(&["ninja".into(), "-C".into(), "build".into()], Path::new("."))?;
//! let status = proc.wait()?;
//! assert!(status.success());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod gnu;
pub mod handle;
pub mod prelude;
pub mod server;

pub use client::{JobClient, ProcessHandle};
pub use gnu::GNUMakeJobClient;
pub use handle::JobHandle;
pub use server::JobServer;
