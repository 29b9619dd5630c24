//! Project configuration for the FWB build orchestrator.
//!
//! Defines the TOML project file listing the firmware images to build,
//! plus the `Project` and `Packer` capabilities the orchestrator consumes.
//!
//! # Usage
//!
//! ```rust
//! use fwb_config::{FwbConfig, FwbUserConfig, Project};
//!
//! let user = FwbUserConfig::from_toml(r#"
//!     [global]
//!     name = "reef"
//!
//!     [[images]]
//!     name = "ro"
//!
//!     [[images]]
//!     name = "rw"
//! "#).unwrap();
//! let config = FwbConfig::from_user_config(user).unwrap();
//!
//! let project = fwb_config::FirmwareProject::new(config);
//! assert_eq!(project.iter_builds().count(), 2);
//! ```

pub mod error;
pub mod fwb_config;
pub mod packer;
pub mod prelude;
pub mod project;

pub use fwb_config::{FwbConfig, FwbImage, FwbUserConfig};
pub use packer::{ArtifactPacker, NullPacker, Packer};
pub use project::{Build, FirmwareProject, Project};
