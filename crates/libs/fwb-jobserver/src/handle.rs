//! Job slot capability.

use std::sync::Arc;

use tracing::warn;

use crate::gnu::TokenPipe;
use crate::server::Slots;

/// How a handle returns its slot to the broker that issued it.
#[derive(Debug)]
pub(crate) enum Release {
    /// Return a slot to the standalone semaphore.
    Slot(Arc<Slots>),
    /// Write a token byte back to the parent jobserver pipe.
    Token {
        pipe: Arc<TokenPipe>,
        token: u8,
    },
}

/// Permission to run one concurrent unit of work.
///
/// Owned exclusively by the code path that requested it. The slot returns
/// to the broker exactly once, when the handle is dropped; the `Option`
/// guard makes a double release impossible by construction.
#[derive(Debug)]
pub struct JobHandle {
    release: Option<Release>,
}

impl JobHandle {
    pub(crate) fn new(release: Release) -> Self {
        Self {
            release: Some(release),
        }
    }

    /// Release the slot now instead of at end of scope.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for JobHandle {
    fn drop(&mut self) {
        match self.release.take() {
            Some(Release::Slot(slots)) => slots.release(),
            Some(Release::Token { pipe, token }) => {
                if let Err(err) = pipe.write_token(token) {
                    warn!("failed to return job token to parent jobserver: {err}");
                }
            }
            None => {}
        }
    }
}
