//! FWB orchestrator entry point.
//!
//! Initializes logging, parses command line arguments, loads the project
//! configuration, and dispatches to the command handlers.
//!
//! ```bash
//! # Build every image with at most 4 concurrent jobs
//! fwb --config project.toml -j4 build --output-dir out
//!
//! # Validate and display the configuration
//! fwb --config project.toml parse
//! ```

use clap::Parser;
use fwb_config::{FwbConfig, FwbUserConfig};
use fwb_log::LogLevel;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fwb::cli::{Cli, Commands};
use fwb::commands::{handle_build, handle_parse};
use fwb::prelude::*;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fwb=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = FwbConfig::from_user_config(FwbUserConfig::from_file(&cli.config)?)?;

    let threshold = if cli.quiet {
        LogLevel::Error
    } else if cli.verbose == 0 {
        LogLevel::Info
    } else {
        LogLevel::Debug
    };

    match cli.command {
        Commands::Build { output_dir } => handle_build(config, cli.jobs, threshold, output_dir),
        Commands::Parse => handle_parse(&config),
    }
}
