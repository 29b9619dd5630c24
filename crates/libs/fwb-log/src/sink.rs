//! Record sinks with threshold-based severity routing.

use std::sync::Mutex;

use tracing::{debug, error, info};

use crate::record::{LogLevel, LogRecord};

/// Destination for log records.
///
/// A sink owns its verbosity threshold. `ERROR` records surface at every
/// threshold, `INFO` records at `Info` and more verbose, and everything
/// else only at `Debug` or more verbose. Implementations must keep the
/// records of one job in the order they were emitted.
pub trait LogSink: Send + Sync {
    /// The most verbose level this sink accepts.
    fn threshold(&self) -> LogLevel;

    /// Store or forward a record. Called only for visible records.
    fn log(&self, record: LogRecord);

    /// Emit a record, dropping it when it is above the threshold.
    fn emit(&self, record: LogRecord) {
        if record.level <= self.threshold() {
            self.log(record);
        }
    }
}

/// In-memory capture sink.
///
/// Used by tests to assert on exactly what a run emitted, and by callers
/// that want to dump a run's output after the fact. One instance per run;
/// never shared across runs.
#[derive(Debug)]
pub struct MemorySink {
    threshold: LogLevel,
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    /// Create an empty sink accepting records up to `threshold`.
    pub fn new(threshold: LogLevel) -> Self {
        Self {
            threshold,
            records: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of every captured record, in emission order.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of the captured message texts, in emission order.
    pub fn messages(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.message).collect()
    }
}

impl LogSink for MemorySink {
    fn threshold(&self) -> LogLevel {
        self.threshold
    }

    fn log(&self, record: LogRecord) {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(record);
    }
}

/// Sink that forwards records to the `tracing` machinery.
///
/// The console subscriber configured in `main` decides final rendering;
/// this sink still applies the run's own threshold first so severity
/// routing stays consistent with captured runs.
#[derive(Debug)]
pub struct TracingSink {
    threshold: LogLevel,
}

impl TracingSink {
    pub fn new(threshold: LogLevel) -> Self {
        Self { threshold }
    }
}

impl LogSink for TracingSink {
    fn threshold(&self) -> LogLevel {
        self.threshold
    }

    fn log(&self, record: LogRecord) {
        match record.level {
            LogLevel::Error => error!("{}", record.message),
            LogLevel::Info => info!("{}", record.message),
            LogLevel::Debug => debug!("{}", record.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit_sample(sink: &MemorySink) {
        sink.emit(LogRecord::new(LogLevel::Error, "e"));
        sink.emit(LogRecord::new(LogLevel::Info, "i"));
        sink.emit(LogRecord::new(LogLevel::Debug, "d"));
    }

    #[test]
    fn threshold_drops_more_verbose_records() {
        let sink = MemorySink::new(LogLevel::Info);
        emit_sample(&sink);
        assert_eq!(sink.messages(), vec!["e", "i"]);
    }

    #[test]
    fn filtering_is_monotonic() {
        let mut seen = Vec::new();
        for threshold in [LogLevel::Error, LogLevel::Info, LogLevel::Debug] {
            let sink = MemorySink::new(threshold);
            emit_sample(&sink);
            seen.push(sink.messages());
        }
        // Each more verbose threshold captures a superset of the previous.
        assert!(seen[1].iter().filter(|m| seen[0].contains(m)).count() == seen[0].len());
        assert!(seen[2].iter().filter(|m| seen[1].contains(m)).count() == seen[1].len());
    }

    #[test]
    fn records_keep_emission_order() {
        let sink = MemorySink::new(LogLevel::Debug);
        emit_sample(&sink);
        assert_eq!(sink.messages(), vec!["e", "i", "d"]);
    }
}
