//! Output multiplexing for concurrently running build jobs.
//!
//! Every captured subprocess stream is drained by a dedicated background
//! reader that classifies each line and emits it under the owning job's
//! `[<job-id>]` prefix. The [`Multiplexer`] tracks the live readers and
//! exposes [`Multiplexer::wait_for_log_end`], a drain barrier that blocks
//! until every registered reader has terminated and flushed.
//!
//! Process exit is not enough to guarantee all buffered output has been
//! logged: a reader may still be mid-flight when the child is reaped.
//! The barrier decouples "process finished" from "output fully drained",
//! which is what makes race-free assertions on captured output possible.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use fwb_log::{LogLevel, MemorySink};
//! use fwb_multiproc::Multiplexer;
//!
//! let sink = Arc::new(MemorySink::new(LogLevel::Debug));
//! let multiproc = Multiplexer::new(sink.clone());
//!
//! multiproc.log_output("[1/2] Compiling main.c\n".as_bytes(), "out:ro");
//! multiproc.wait_for_log_end().unwrap();
//!
//! assert_eq!(sink.messages(), vec!["[out:ro][1/2] Compiling main.c"]);
//! ```

pub mod error;
pub mod prelude;
mod reader;

use std::io::Read;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use fwb_log::{Classifier, LogLevel, LogSink};

use crate::prelude::*;
use crate::reader::{LineSeverity, read_stream};

/// Owner of the live output readers and the shared log sink.
///
/// The live-set is the only state shared between the readers and the
/// barrier; it is guarded by a mutex and emptied by
/// [`wait_for_log_end`](Self::wait_for_log_end).
pub struct Multiplexer {
    sink: Arc<dyn LogSink>,
    classifier: Arc<Classifier>,
    live: Mutex<Vec<JoinHandle<()>>>,
}

impl Multiplexer {
    /// Create a multiplexer with the default output classifier.
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self::with_classifier(sink, Classifier::default())
    }

    /// Create a multiplexer with a custom classification rule table.
    pub fn with_classifier(sink: Arc<dyn LogSink>, classifier: Classifier) -> Self {
        Self {
            sink,
            classifier: Arc::new(classifier),
            live: Mutex::new(Vec::new()),
        }
    }

    /// The shared sink all readers emit into.
    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.sink
    }

    /// Start a classified reader for a job's output stream.
    ///
    /// Each line is classified by the rule table and emitted as
    /// `[<job_id>]<line>`. The reader registers in the live-set before it
    /// starts and signals termination by exiting its thread.
    pub fn log_output<R>(&self, stream: R, job_id: impl Into<String>)
    where
        R: Read + Send + 'static,
    {
        self.start_reader(
            stream,
            job_id.into(),
            LineSeverity::Classified(Arc::clone(&self.classifier)),
        );
    }

    /// Start a reader that tags every line with one fixed severity.
    ///
    /// Used for stderr streams, whose lines surface as errors regardless
    /// of content.
    pub fn log_output_at<R>(&self, stream: R, job_id: impl Into<String>, level: LogLevel)
    where
        R: Read + Send + 'static,
    {
        self.start_reader(stream, job_id.into(), LineSeverity::Fixed(level));
    }

    fn start_reader<R>(&self, stream: R, job_id: String, severity: LineSeverity)
    where
        R: Read + Send + 'static,
    {
        let sink = Arc::clone(&self.sink);
        let handle = thread::spawn(move || read_stream(stream, job_id, severity, sink));
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }

    /// Drain barrier: block until every registered reader has terminated.
    ///
    /// Takes a snapshot of the live-set, joins it, and loops until the
    /// set stays empty, so readers registered while the wait is in
    /// progress are included in the same wait. Returns immediately when
    /// no readers are live; safe to call repeatedly.
    pub fn wait_for_log_end(&self) -> Result<()> {
        loop {
            let batch = std::mem::take(
                &mut *self.live.lock().unwrap_or_else(PoisonError::into_inner),
            );
            if batch.is_empty() {
                return Ok(());
            }
            for reader in batch {
                reader.join().map_err(|_| Error::ReaderJoin)?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::time::Duration;

    use fwb_log::MemorySink;
    use ntest::timeout;

    use super::*;

    fn capture(threshold: LogLevel) -> Arc<MemorySink> {
        Arc::new(MemorySink::new(threshold))
    }

    /// Reader that yields some bytes, then fails.
    struct BrokenStream {
        data: io::Cursor<Vec<u8>>,
    }

    impl Read for BrokenStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf) {
                Ok(0) => Err(io::Error::other("device wandered off")),
                other => other,
            }
        }
    }

    /// Reader that trickles its bytes out slowly.
    struct SlowStream {
        data: Vec<u8>,
        pos: usize,
    }

    impl Read for SlowStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pos >= self.data.len() {
                return Ok(0);
            }
            std::thread::sleep(Duration::from_millis(5));
            buf[0] = self.data[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    #[test]
    #[timeout(5000)]
    fn lines_keep_their_order_within_a_job() {
        let sink = capture(LogLevel::Debug);
        let multiproc = Multiplexer::new(sink.clone());

        multiproc.log_output("first\nsecond\nthird\n".as_bytes(), "t:ro");
        multiproc.wait_for_log_end().unwrap();

        assert_eq!(
            sink.messages(),
            vec!["[t:ro]first", "[t:ro]second", "[t:ro]third"]
        );
    }

    #[test]
    #[timeout(5000)]
    fn trailing_terminator_is_the_only_trimming() {
        let sink = capture(LogLevel::Debug);
        let multiproc = Multiplexer::new(sink.clone());

        multiproc.log_output("  indented \r\nno newline at eof".as_bytes(), "t:ro");
        multiproc.wait_for_log_end().unwrap();

        assert_eq!(
            sink.messages(),
            vec!["[t:ro]  indented ", "[t:ro]no newline at eof"]
        );
    }

    #[test]
    #[timeout(5000)]
    fn classification_follows_the_rule_table() {
        let sink = capture(LogLevel::Debug);
        let multiproc = Multiplexer::new(sink.clone());

        multiproc.log_output(
            "[1/3] Compiling a.c\nsome chatter\nsrc/a.c:1:1: error: nope\n".as_bytes(),
            "t:ro",
        );
        multiproc.wait_for_log_end().unwrap();

        let levels: Vec<LogLevel> = sink.records().into_iter().map(|r| r.level).collect();
        assert_eq!(levels, vec![LogLevel::Info, LogLevel::Debug, LogLevel::Error]);
    }

    #[test]
    #[timeout(5000)]
    fn fixed_severity_readers_skip_classification() {
        let sink = capture(LogLevel::Error);
        let multiproc = Multiplexer::new(sink.clone());

        multiproc.log_output_at("warning: odd\n".as_bytes(), "t:ro", LogLevel::Error);
        multiproc.wait_for_log_end().unwrap();

        assert_eq!(sink.messages(), vec!["[t:ro]warning: odd"]);
    }

    #[test]
    #[timeout(5000)]
    fn empty_live_set_returns_immediately_and_repeatedly() {
        let sink = capture(LogLevel::Debug);
        let multiproc = Multiplexer::new(sink.clone());

        multiproc.wait_for_log_end().unwrap();
        multiproc.wait_for_log_end().unwrap();

        multiproc.log_output("only line\n".as_bytes(), "t:ro");
        multiproc.wait_for_log_end().unwrap();
        multiproc.wait_for_log_end().unwrap();

        // A second barrier call must not duplicate records.
        assert_eq!(sink.messages(), vec!["[t:ro]only line"]);
    }

    #[test]
    #[timeout(5000)]
    fn read_failure_logs_an_error_and_still_terminates() {
        let sink = capture(LogLevel::Debug);
        let multiproc = Multiplexer::new(sink.clone());

        multiproc.log_output(
            BrokenStream {
                data: io::Cursor::new(b"partial\n".to_vec()),
            },
            "t:rw",
        );
        multiproc.wait_for_log_end().unwrap();

        let messages = sink.messages();
        assert_eq!(messages[0], "[t:rw]partial");
        assert!(messages[1].starts_with("[t:rw]output read failed:"));
        let errors: Vec<_> = sink
            .records()
            .into_iter()
            .filter(|r| r.level == LogLevel::Error)
            .collect();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    #[timeout(10000)]
    fn barrier_waits_for_every_registered_reader() {
        let sink = capture(LogLevel::Debug);
        let multiproc = Multiplexer::new(sink.clone());

        multiproc.log_output(
            SlowStream {
                data: b"slow one\n".to_vec(),
                pos: 0,
            },
            "t:ro",
        );
        multiproc.log_output("fast one\n".as_bytes(), "t:rw");
        multiproc.wait_for_log_end().unwrap();

        let messages = sink.messages();
        assert!(messages.contains(&"[t:ro]slow one".to_string()));
        assert!(messages.contains(&"[t:rw]fast one".to_string()));
    }
}
