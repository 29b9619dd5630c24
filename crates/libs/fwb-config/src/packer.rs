//! Firmware packing: the `Packer` capability.
//!
//! Packing runs once, after every build has succeeded, and collects each
//! image's declared artifacts out of its build directory. Packaging
//! *formats* are out of scope; a packer only gathers files.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::fwb_config::FwbConfig;
use crate::prelude::*;

/// Capability to collect build artifacts after a successful run.
pub trait Packer: Send + Sync {
    /// Gather artifacts from `build_dirs` (keyed by build name) into
    /// `output_dir`, returning the collected paths.
    ///
    /// A packing failure fails the overall build result, even when every
    /// individual build succeeded.
    fn pack_firmware(
        &self,
        output_dir: &Path,
        build_dirs: &HashMap<String, PathBuf>,
    ) -> Result<Vec<PathBuf>>;
}

/// Packer that copies each image's declared artifact files.
///
/// Artifacts land in the output directory as `<image>-<file>` so two
/// images producing identically named files never collide.
pub struct ArtifactPacker {
    artifacts: Vec<(String, Vec<String>)>,
}

impl ArtifactPacker {
    pub fn new(config: &FwbConfig) -> Self {
        Self {
            artifacts: config
                .images
                .iter()
                .map(|image| (image.name.clone(), image.artifacts.clone()))
                .collect(),
        }
    }
}

impl Packer for ArtifactPacker {
    fn pack_firmware(
        &self,
        output_dir: &Path,
        build_dirs: &HashMap<String, PathBuf>,
    ) -> Result<Vec<PathBuf>> {
        let mut packed = Vec::new();
        for (image, files) in &self.artifacts {
            let Some(build_dir) = build_dirs.get(image) else {
                continue;
            };
            for file in files {
                let source = build_dir.join(file);
                if !source.is_file() {
                    return Err(Error::MissingArtifact(source));
                }
                let target = output_dir.join(format!("{image}-{file}"));
                fs::copy(&source, &target)?;
                debug!("packed {source:?} as {target:?}");
                packed.push(target);
            }
        }
        Ok(packed)
    }
}

/// Packer that packs nothing.
pub struct NullPacker;

impl Packer for NullPacker {
    fn pack_firmware(
        &self,
        _output_dir: &Path,
        _build_dirs: &HashMap<String, PathBuf>,
    ) -> Result<Vec<PathBuf>> {
        Ok(Vec::new())
    }
}
