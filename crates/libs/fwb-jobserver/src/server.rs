//! Standalone job broker backed by an in-process counting semaphore.

use std::path::Path;
use std::process::Child;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;

use fwb_log::LogSink;

use crate::client::{JobClient, spawn_command};
use crate::handle::{JobHandle, Release};
use crate::prelude::*;

/// Slot pool shared between the server and its outstanding handles.
#[derive(Debug)]
pub(crate) struct Slots {
    state: Mutex<SlotState>,
    cond: Condvar,
}

#[derive(Debug)]
struct SlotState {
    available: usize,
    shutdown: bool,
}

impl Slots {
    fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(SlotState {
                available: capacity,
                shutdown: false,
            }),
            cond: Condvar::new(),
        }
    }

    fn acquire(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if state.shutdown {
                return Err(Error::Shutdown);
            }
            if state.available > 0 {
                state.available -= 1;
                return Ok(());
            }
            state = self
                .cond
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub(crate) fn release(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.available += 1;
        self.cond.notify_one();
    }

    fn available(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .available
    }

    fn shutdown(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.shutdown = true;
        self.cond.notify_all();
    }
}

/// Standalone job concurrency broker.
///
/// Issues up to `capacity` concurrent job slots from an in-process
/// counting semaphore. Created once per orchestrator run. When the tool
/// itself runs under a parent GNU Make jobserver, use
/// [`GNUMakeJobClient`](crate::GNUMakeJobClient) instead so the parent's
/// pool stays authoritative.
pub struct JobServer {
    capacity: usize,
    slots: Arc<Slots>,
    sink: Arc<dyn LogSink>,
}

impl JobServer {
    /// Create a broker with the given capacity.
    ///
    /// `None` defaults to the machine's available parallelism. A capacity
    /// of zero fails with [`Error::InvalidCapacity`].
    pub fn new(jobs: Option<usize>, sink: Arc<dyn LogSink>) -> Result<Self> {
        let capacity = match jobs {
            Some(0) => return Err(Error::InvalidCapacity(0)),
            Some(n) => n,
            None => thread::available_parallelism().map(usize::from).unwrap_or(1),
        };
        Ok(Self {
            capacity,
            slots: Arc::new(Slots::new(capacity)),
            sink,
        })
    }

    /// The configured maximum number of concurrent jobs.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The current number of free slots.
    pub fn available(&self) -> usize {
        self.slots.available()
    }

    /// Begin teardown: blocked and future [`get_job`](JobClient::get_job)
    /// callers fail with [`Error::Shutdown`] instead of waiting.
    pub fn shutdown(&self) {
        self.slots.shutdown();
    }
}

impl JobClient for JobServer {
    fn get_job(&self) -> Result<JobHandle> {
        self.slots.acquire()?;
        Ok(JobHandle::new(Release::Slot(Arc::clone(&self.slots))))
    }

    fn popen(&self, cmd: &[String], cwd: &Path) -> Result<Child> {
        spawn_command(cmd, cwd, &self.env(), &*self.sink)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use fwb_log::{LogLevel, MemorySink};
    use ntest::timeout;

    use super::*;

    fn sink() -> Arc<MemorySink> {
        Arc::new(MemorySink::new(LogLevel::Debug))
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            JobServer::new(Some(0), sink()),
            Err(Error::InvalidCapacity(0))
        ));
    }

    #[test]
    #[timeout(10000)]
    fn concurrency_never_exceeds_capacity() {
        let server = Arc::new(JobServer::new(Some(2), sink()).unwrap());
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let server = Arc::clone(&server);
                let current = Arc::clone(&current);
                let peak = Arc::clone(&peak);
                thread::spawn(move || {
                    let job = server.get_job().unwrap();
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(10));
                    current.fetch_sub(1, Ordering::SeqCst);
                    job.release();
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(server.available(), 2);
    }

    #[test]
    #[timeout(5000)]
    fn shutdown_wakes_blocked_callers() {
        let server = Arc::new(JobServer::new(Some(1), sink()).unwrap());
        let held = server.get_job().unwrap();

        let blocked = {
            let server = Arc::clone(&server);
            thread::spawn(move || server.get_job())
        };
        // Give the waiter time to block on the empty pool.
        thread::sleep(Duration::from_millis(50));
        server.shutdown();

        assert!(matches!(blocked.join().unwrap(), Err(Error::Shutdown)));
        drop(held);
        assert!(matches!(server.get_job(), Err(Error::Shutdown)));
    }

    #[test]
    #[timeout(5000)]
    fn launch_failure_releases_the_slot() {
        let server = JobServer::new(Some(1), sink()).unwrap();
        let result = server.run(
            &["/nonexistent/fwb-no-such-binary".into()],
            Path::new("/tmp"),
        );
        assert!(matches!(result, Err(Error::Launch { .. })));
        assert_eq!(server.available(), 1);
    }

    #[test]
    #[timeout(5000)]
    fn slot_returns_after_process_is_reaped() {
        let capture = sink();
        let server = JobServer::new(Some(1), Arc::clone(&capture) as Arc<dyn LogSink>).unwrap();

        let mut proc = server
            .run(&["echo".into(), "hello".into()], Path::new("/tmp"))
            .unwrap();
        assert_eq!(server.available(), 0);

        let status = proc.wait().unwrap();
        assert!(status.success());
        assert_eq!(server.available(), 1);
        assert!(capture.messages().contains(&"Running echo hello".to_string()));
    }

    #[test]
    fn empty_command_is_rejected() {
        let server = JobServer::new(Some(1), sink()).unwrap();
        assert!(matches!(
            server.run(&[], Path::new("/tmp")),
            Err(Error::EmptyCommand)
        ));
        assert_eq!(server.available(), 1);
    }
}
