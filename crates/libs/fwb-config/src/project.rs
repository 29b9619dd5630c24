//! Build enumeration: the `Project` capability.

use std::path::{Path, PathBuf};

use crate::fwb_config::FwbConfig;
use crate::packer::{ArtifactPacker, Packer};

/// One logical unit of work: a single image build.
///
/// Produced by a project's build iterator and consumed exactly once by
/// the orchestrator, which derives the working directory and final
/// command line from it.
#[derive(Debug, Clone)]
pub struct Build {
    /// Build name; the build directory is `build-<name>`.
    pub name: String,
    /// Build tool executing this image's build.
    pub program: PathBuf,
    /// Extra arguments appended to the build command.
    pub build_args: Vec<String>,
}

impl Build {
    /// The full command line for this build, rooted in `build_dir`.
    pub fn command(&self, build_dir: &Path) -> Vec<String> {
        let mut cmd = vec![
            self.program.display().to_string(),
            String::from("-C"),
            build_dir.display().to_string(),
        ];
        cmd.extend(self.build_args.iter().cloned());
        cmd
    }
}

/// Capability to enumerate the builds of one orchestrator run.
///
/// The sequence is finite and consumed once per run; it is not
/// restartable.
pub trait Project: Send + Sync {
    /// Yield every build this project wants performed.
    fn iter_builds(&self) -> Box<dyn Iterator<Item = Build> + Send + '_>;

    /// The packer invoked after all builds succeed.
    fn packer(&self) -> &dyn Packer;
}

/// Project backed by a parsed configuration file: one build per image.
pub struct FirmwareProject {
    config: FwbConfig,
    packer: ArtifactPacker,
}

impl FirmwareProject {
    pub fn new(config: FwbConfig) -> Self {
        let packer = ArtifactPacker::new(&config);
        Self { config, packer }
    }

    pub fn config(&self) -> &FwbConfig {
        &self.config
    }
}

impl Project for FirmwareProject {
    fn iter_builds(&self) -> Box<dyn Iterator<Item = Build> + Send + '_> {
        Box::new(self.config.images.iter().map(|image| Build {
            name: image.name.clone(),
            program: self.config.ninja.clone(),
            build_args: image.build_args.clone(),
        }))
    }

    fn packer(&self) -> &dyn Packer {
        &self.packer
    }
}
