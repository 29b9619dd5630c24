//! The parallel build loop.
//!
//! Drives every build the project yields through the job broker:
//!
//! 1. Derives the per-build working directory `<output_dir>/build-<name>`
//! 2. Announces the build command at info severity
//! 3. On a per-build worker, claims a job slot, launches the command, and
//!    registers its output streams with the multiplexer
//! 4. Awaits every worker and aggregates per-build failures
//! 5. Invokes the packer once all builds are done
//!
//! Slot acquisition blocks each build's own worker, never the launch
//! loop; since slots are only released at process-reap time, a launch
//! loop that blocked on acquisition could never make progress past an
//! exhausted pool. Per-build failures are fail-soft: siblings already in
//! flight run to completion and the failures are aggregated into one
//! error.
//!
//! Draining the multiplexed output is a separate concern from build
//! completion; callers that need "all output visible" call
//! [`Multiplexer::wait_for_log_end`] after [`Orchestrator::build`]
//! returns.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use fwb_config::{Build, Project};
use fwb_jobserver::JobClient;
use fwb_log::{LogLevel, LogRecord};
use fwb_multiproc::Multiplexer;

use crate::prelude::*;

/// Result of one orchestrator run where every build succeeded.
#[derive(Debug)]
pub struct BuildOutcome {
    /// Names of the builds performed.
    pub succeeded: Vec<String>,
    /// Artifacts collected by the packer.
    pub artifacts: Vec<PathBuf>,
}

/// One in-flight build and the worker awaiting it.
struct BuildWorker {
    name: String,
    job_id: String,
    worker: JoinHandle<fwb_jobserver::prelude::Result<ExitStatus>>,
}

/// Top-level build coordinator.
pub struct Orchestrator {
    jobserver: Arc<dyn JobClient>,
    multiproc: Arc<Multiplexer>,
    project: Arc<dyn Project>,
}

impl Orchestrator {
    pub fn new(
        jobserver: Arc<dyn JobClient>,
        multiproc: Arc<Multiplexer>,
        project: Arc<dyn Project>,
    ) -> Self {
        Self {
            jobserver,
            multiproc,
            project,
        }
    }

    /// Build every image the project yields, bounded by the job broker.
    ///
    /// Returns [`Error::BuildFailed`] naming every build that failed to
    /// launch or exited non-zero; packing failures fail the overall
    /// result even when all builds succeeded.
    pub fn build(&self, output_dir: &Path) -> Result<BuildOutcome> {
        fs::create_dir_all(output_dir)?;

        let mut workers = Vec::new();
        let mut build_dirs = HashMap::new();
        for build in self.project.iter_builds() {
            let build_dir = output_dir.join(format!("build-{}", build.name));
            fs::create_dir_all(&build_dir)?;
            build_dirs.insert(build.name.clone(), build_dir.clone());
            workers.push(self.launch(build, build_dir, output_dir));
        }

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for BuildWorker {
            name,
            job_id,
            worker,
        } in workers
        {
            let failure = match worker.join() {
                Ok(Ok(status)) if status.success() => {
                    succeeded.push(name);
                    continue;
                }
                Ok(Ok(status)) => format!("exited with {status}"),
                Ok(Err(err)) => err.to_string(),
                Err(_) => String::from("build worker panicked"),
            };
            self.multiproc.sink().emit(LogRecord::with_job(
                job_id.clone(),
                LogLevel::Error,
                format!("[{job_id}]Build failed: {failure}"),
            ));
            failed.push(name);
        }
        if !failed.is_empty() {
            return Err(Error::BuildFailed(failed));
        }

        let artifacts = self
            .project
            .packer()
            .pack_firmware(output_dir, &build_dirs)?;
        Ok(BuildOutcome {
            succeeded,
            artifacts,
        })
    }

    /// Announce one build and start its worker.
    fn launch(&self, build: Build, build_dir: PathBuf, output_dir: &Path) -> BuildWorker {
        let job_id = format!("{}:{}", output_dir.display(), build.name);
        let cmd = build.command(&build_dir);
        // Announced before the worker starts, so a job's own output can
        // never precede its announcement.
        self.multiproc.sink().emit(LogRecord::new(
            LogLevel::Info,
            format!("Building {job_id}: {}", cmd.join(" ")),
        ));

        let jobserver = Arc::clone(&self.jobserver);
        let multiproc = Arc::clone(&self.multiproc);
        let cwd = output_dir.to_path_buf();
        let reader_id = job_id.clone();
        let worker = thread::spawn(move || {
            let mut proc = jobserver.run(&cmd, &cwd)?;
            if let Some(stdout) = proc.take_stdout() {
                multiproc.log_output(stdout, reader_id.clone());
            }
            if let Some(stderr) = proc.take_stderr() {
                multiproc.log_output_at(stderr, reader_id, LogLevel::Error);
            }
            proc.wait()
        });

        BuildWorker {
            name: build.name,
            job_id,
            worker,
        }
    }
}
