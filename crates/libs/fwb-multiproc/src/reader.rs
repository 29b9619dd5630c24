//! Per-stream output reader.

use std::io::{BufRead, BufReader, Read};
use std::sync::Arc;

use fwb_log::{Classifier, LogLevel, LogRecord, LogSink};

/// How a reader assigns severity to the lines of its stream.
pub(crate) enum LineSeverity {
    /// Run every line through the classifier (stdout streams).
    Classified(Arc<Classifier>),
    /// Tag every line with one fixed level (stderr streams).
    Fixed(LogLevel),
}

/// Consume `stream` until end-of-data, emitting one record per line.
///
/// Lines are decoded lossily, stripped of the trailing line terminator
/// only, and prefixed with the owning job's identity. A read failure is
/// reported as an error record and then terminates the reader normally,
/// so the drain barrier can never hang on a broken stream.
pub(crate) fn read_stream<R: Read>(
    stream: R,
    job_id: String,
    severity: LineSeverity,
    sink: Arc<dyn LogSink>,
) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                let line = text.strip_suffix('\n').unwrap_or(&text);
                let line = line.strip_suffix('\r').unwrap_or(line);
                let level = match &severity {
                    LineSeverity::Classified(classifier) => classifier.classify(line),
                    LineSeverity::Fixed(level) => *level,
                };
                sink.emit(LogRecord::with_job(
                    job_id.clone(),
                    level,
                    format!("[{job_id}]{line}"),
                ));
            }
            Err(err) => {
                sink.emit(LogRecord::with_job(
                    job_id.clone(),
                    LogLevel::Error,
                    format!("[{job_id}]output read failed: {err}"),
                ));
                break;
            }
        }
    }
}
