//! The broker interface and slot-gated subprocess launch.

use std::path::Path;
use std::process::{Child, ChildStderr, ChildStdout, Command, ExitStatus, Stdio};

use fwb_log::{LogLevel, LogRecord, LogSink};

use crate::handle::JobHandle;
use crate::prelude::*;

/// The job concurrency broker interface.
///
/// Implemented by the standalone [`JobServer`](crate::JobServer), by
/// [`GNUMakeJobClient`](crate::GNUMakeJobClient) when a parent jobserver is
/// inherited, and by test substitutes that redirect commands.
pub trait JobClient: Send + Sync {
    /// Claim one job slot, blocking until a slot is free.
    ///
    /// Fails with [`Error::Shutdown`] once teardown began rather than
    /// blocking forever. No ordering is promised among concurrent callers
    /// beyond eventual fairness.
    fn get_job(&self) -> Result<JobHandle>;

    /// Spawn a subprocess with captured output, without claiming a slot.
    ///
    /// The broker's [`env`](Self::env) is injected so nested build tools
    /// can join the same token pool. The command is logged as
    /// `Running <command>` at debug severity through the shared sink.
    fn popen(&self, cmd: &[String], cwd: &Path) -> Result<Child>;

    /// Environment advertising this broker to child processes.
    fn env(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Claim a slot, spawn `cmd`, and tie the slot to the process lifetime.
    ///
    /// The slot is released when the returned [`ProcessHandle`] is waited
    /// on (or dropped). A spawn failure releases the slot immediately and
    /// surfaces as [`Error::Launch`].
    fn run(&self, cmd: &[String], cwd: &Path) -> Result<ProcessHandle> {
        let job = self.get_job()?;
        // The job handle is dropped, and the slot returned, if popen fails.
        let child = self.popen(cmd, cwd)?;
        Ok(ProcessHandle::new(child, job, cmd.join(" ")))
    }
}

/// A spawned subprocess together with the job slot it occupies.
///
/// State per build: the slot is claimed before spawn and held until the
/// process has been fully reaped, so concurrency accounting covers the
/// whole process lifetime.
#[derive(Debug)]
pub struct ProcessHandle {
    child: Child,
    job: Option<JobHandle>,
    command: String,
}

impl ProcessHandle {
    pub(crate) fn new(child: Child, job: JobHandle, command: String) -> Self {
        Self {
            child,
            job: Some(job),
            command,
        }
    }

    /// The command line this process was started with.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Take the captured stdout stream, once.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Take the captured stderr stream, once.
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    /// Wait for the process to exit and release its job slot.
    ///
    /// The slot is returned even when waiting fails, so a broken child
    /// can never leak concurrency capacity.
    pub fn wait(&mut self) -> Result<ExitStatus> {
        let status = self.child.wait();
        self.job.take();
        status.map_err(Error::Wait)
    }
}

/// Spawn `cmd` in `cwd` with piped stdout/stderr and the broker environment.
pub(crate) fn spawn_command(
    cmd: &[String],
    cwd: &Path,
    env: &[(String, String)],
    sink: &dyn LogSink,
) -> Result<Child> {
    let (program, args) = cmd.split_first().ok_or(Error::EmptyCommand)?;

    sink.emit(LogRecord::new(
        LogLevel::Debug,
        format!("Running {}", cmd.join(" ")),
    ));

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in env {
        command.env(key, value);
    }
    command.spawn().map_err(|source| Error::Launch {
        command: cmd.join(" "),
        source,
    })
}
