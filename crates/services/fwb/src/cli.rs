//! Command-line interface for the FWB orchestrator.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line interface for the FWB orchestrator.
#[derive(Parser)]
#[command(name = "fwb")]
#[command(about = "FWB - Build every firmware image of a project in parallel")]
pub struct Cli {
    /// Path to the project configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Maximum number of concurrent jobs (defaults to available CPUs)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Show raw build output, not just progress (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only show errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for the FWB orchestrator.
#[derive(Subcommand)]
pub enum Commands {
    /// Build every image in the project
    Build {
        /// Directory receiving per-image build trees and packed artifacts
        #[arg(short, long)]
        output_dir: PathBuf,
    },
    /// Parse and display the project configuration
    Parse,
}
