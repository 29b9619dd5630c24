use fwb_config::prelude as config;
use fwb_jobserver::prelude as jobserver;
use fwb_multiproc::prelude as multiproc;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] config::Error),

    #[error(transparent)]
    Jobserver(#[from] jobserver::Error),

    #[error(transparent)]
    Multiproc(#[from] multiproc::Error),

    #[error("builds failed: {0:?}")]
    BuildFailed(Vec<String>),
}
