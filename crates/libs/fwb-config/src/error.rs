//! Configuration and packing error types.

use std::path::PathBuf;

/// Configuration errors.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error(transparent)]
    IO(#[from] std::io::Error),

    /// TOML deserialization failed.
    #[error(transparent)]
    Deserialization(#[from] toml::de::Error),

    /// Two images share one name.
    #[error("duplicate image name `{0}` in project configuration")]
    DuplicateImage(String),

    /// A project with no images cannot be built.
    #[error("project configuration declares no images")]
    NoImages,

    /// A built image did not produce a declared artifact.
    #[error("missing build artifact {0:?}")]
    MissingArtifact(PathBuf),
}
