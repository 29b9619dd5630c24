//! Command handlers for the FWB orchestrator.

use std::path::PathBuf;
use std::sync::Arc;

use fwb_config::{FirmwareProject, FwbConfig};
use fwb_jobserver::{GNUMakeJobClient, JobClient, JobServer};
use fwb_log::{LogLevel, LogSink, TracingSink};
use fwb_multiproc::Multiplexer;
use tracing::info;

use crate::orchestrator::Orchestrator;
use crate::prelude::*;

/// Handles the parse command to display configuration information.
pub fn handle_parse(config: &FwbConfig) -> Result<()> {
    println!("Configuration parsed successfully");
    println!("Project: {}", config.name);
    println!("Build tool: {:?}", config.ninja);
    println!("Number of images: {}", config.images.len());

    for (idx, image) in config.images.iter().enumerate() {
        println!("\nImage {}: {}", idx + 1, image.name);
        println!("  Build args: {:?}", image.build_args);
        println!("  Artifacts: {:?}", image.artifacts);
    }

    Ok(())
}

/// Handles the build command: run every image build, then drain output.
pub fn handle_build(
    config: FwbConfig,
    jobs: Option<usize>,
    threshold: LogLevel,
    output_dir: PathBuf,
) -> Result<()> {
    let sink: Arc<dyn LogSink> = Arc::new(TracingSink::new(threshold));

    // Join a parent jobserver when one is inherited; otherwise broker
    // our own slots.
    let jobserver: Arc<dyn JobClient> = match GNUMakeJobClient::from_environ(Arc::clone(&sink))? {
        Some(client) => Arc::new(client),
        None => Arc::new(JobServer::new(jobs, Arc::clone(&sink))?),
    };

    let multiproc = Arc::new(Multiplexer::new(Arc::clone(&sink)));
    let project = Arc::new(FirmwareProject::new(config));
    let orchestrator = Orchestrator::new(jobserver, Arc::clone(&multiproc), project);

    let result = orchestrator.build(&output_dir);
    // Build completion and output draining are separate concerns; drain
    // before reporting either way so no output is lost.
    multiproc.wait_for_log_end()?;

    let outcome = result?;
    info!(
        "{} image(s) built in {:?}",
        outcome.succeeded.len(),
        output_dir
    );
    for artifact in &outcome.artifacts {
        info!("packed {artifact:?}");
    }
    Ok(())
}
