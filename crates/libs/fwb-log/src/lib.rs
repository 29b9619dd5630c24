//! Log severity model, sinks, and output classification for the FWB
//! build orchestrator.
//!
//! Build output never goes through ambient global state: every component
//! that emits records receives a shared [`LogSink`] at construction time,
//! so each run owns its logging context and tests can capture output in
//! isolation.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use fwb_log::{Classifier, LogLevel, LogRecord, LogSink, MemorySink};
//!
//! let sink = Arc::new(MemorySink::new(LogLevel::Info));
//! let classifier = Classifier::default();
//!
//! let line = "[1/42] Compiling power.c";
//! let level = classifier.classify(line);
//! sink.emit(LogRecord::new(level, format!("[demo:ro]{line}")));
//!
//! assert_eq!(sink.records().len(), 1);
//! ```

pub mod classify;
pub mod error;
pub mod prelude;
pub mod record;
pub mod sink;

pub use classify::{Classifier, OutputRule};
pub use record::{LogLevel, LogRecord};
pub use sink::{LogSink, MemorySink, TracingSink};
