//! Core configuration types for the FWB orchestrator.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::prelude::*;

const DEFAULT_NINJA: &str = "/usr/bin/ninja";

/// Global project settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FwbGlobalConfig {
    /// Project name, used in summaries only.
    pub name: String,
    /// Path to the ninja binary driving each image build.
    pub ninja: Option<PathBuf>,
}

/// One firmware image as written by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FwbUserImage {
    /// Image name, e.g. `ro` or `rw`.
    pub name: String,
    /// Extra arguments appended to the build command.
    pub build_args: Option<Vec<String>>,
    /// Artifact file names the build produces in its build directory.
    pub artifacts: Option<Vec<String>>,
}

/// User-provided configuration from TOML files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FwbUserConfig {
    /// Global settings.
    pub global: FwbGlobalConfig,
    /// Image definitions.
    pub images: Vec<FwbUserImage>,
}

/// One firmware image with defaults resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FwbImage {
    /// Image name.
    pub name: String,
    /// Extra arguments appended to the build command.
    pub build_args: Vec<String>,
    /// Artifact file names the build produces in its build directory.
    pub artifacts: Vec<String>,
}

/// Internal configuration with defaults resolved and names validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FwbConfig {
    /// Project name.
    pub name: String,
    /// Path to the ninja binary.
    pub ninja: PathBuf,
    /// Image definitions.
    pub images: Vec<FwbImage>,
}

impl FwbConfig {
    /// Convert user configuration to internal configuration.
    ///
    /// Resolves the ninja default and rejects projects with no images or
    /// with duplicate image names.
    pub fn from_user_config(config: FwbUserConfig) -> Result<Self> {
        if config.images.is_empty() {
            return Err(Error::NoImages);
        }
        let mut images: Vec<FwbImage> = Vec::with_capacity(config.images.len());
        for image in config.images {
            if images.iter().any(|seen| seen.name == image.name) {
                return Err(Error::DuplicateImage(image.name));
            }
            images.push(FwbImage {
                name: image.name,
                build_args: image.build_args.unwrap_or_default(),
                artifacts: image.artifacts.unwrap_or_default(),
            });
        }
        Ok(Self {
            name: config.global.name,
            ninja: config
                .global
                .ninja
                .unwrap_or_else(|| PathBuf::from(DEFAULT_NINJA)),
            images,
        })
    }
}

impl FwbUserConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(file_path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(file_path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML string.
    pub fn from_toml(value: &str) -> Result<Self> {
        Ok(toml::from_str(value)?)
    }
}
