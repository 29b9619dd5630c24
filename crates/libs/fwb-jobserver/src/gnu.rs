//! Client for a parent GNU Make jobserver.
//!
//! A nested invocation (make driving `fwb` driving ninja) must share one
//! global concurrency limit. GNU Make advertises its token pipe through
//! `MAKEFLAGS` as `--jobserver-auth=R,W` (older makes:
//! `--jobserver-fds=R,W`); acquiring a job reads one byte from the read
//! descriptor, releasing writes the same byte back. The number of tokens
//! held never exceeds what the parent actually handed out.

use std::fs::File;
use std::io::{Read, Write};
use std::os::fd::{FromRawFd, RawFd};
use std::path::Path;
use std::process::Child;
use std::sync::{Arc, Mutex, PoisonError};

use fwb_log::LogSink;
use tracing::{debug, warn};

use crate::client::{JobClient, spawn_command};
use crate::handle::{JobHandle, Release};
use crate::prelude::*;

/// The inherited token pipe, shared with outstanding handles.
#[derive(Debug)]
pub(crate) struct TokenPipe {
    read: Mutex<File>,
    write: Mutex<File>,
}

impl TokenPipe {
    /// Block until the parent hands out a token byte.
    fn read_token(&self) -> std::io::Result<u8> {
        let mut buf = [0u8; 1];
        self.read
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Return a token byte to the parent's pool.
    pub(crate) fn write_token(&self, token: u8) -> std::io::Result<()> {
        self.write
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write_all(&[token])
    }
}

/// Broker client speaking the GNU Make jobserver token protocol.
pub struct GNUMakeJobClient {
    pipe: Arc<TokenPipe>,
    fds: (RawFd, RawFd),
    sink: Arc<dyn LogSink>,
}

impl GNUMakeJobClient {
    /// Detect a parent jobserver from the ambient environment.
    ///
    /// Returns `Ok(None)` when `MAKEFLAGS` is unset, carries no jobserver
    /// spec, or advertises a pool we cannot join (closed descriptors, or
    /// a fifo-style spec). A spec that is present but malformed is a
    /// configuration error.
    pub fn from_environ(sink: Arc<dyn LogSink>) -> Result<Option<Self>> {
        let Ok(flags) = std::env::var("MAKEFLAGS") else {
            return Ok(None);
        };
        let Some((read_fd, write_fd)) = parse_makeflags(&flags)? else {
            return Ok(None);
        };
        debug!("joining parent jobserver on fds {read_fd},{write_fd}");
        // SAFETY: the parent advertised these descriptors for our use and
        // keeps its own duplicates; we take ownership of our copies for
        // the lifetime of the process.
        Ok(Some(unsafe { Self::from_raw_fds(read_fd, write_fd, sink) }))
    }

    /// Build a client from an already-validated descriptor pair.
    ///
    /// # Safety
    ///
    /// `read_fd` and `write_fd` must be open, owned by the caller, and not
    /// used elsewhere after this call.
    pub unsafe fn from_raw_fds(read_fd: RawFd, write_fd: RawFd, sink: Arc<dyn LogSink>) -> Self {
        let read = unsafe { File::from_raw_fd(read_fd) };
        let write = unsafe { File::from_raw_fd(write_fd) };
        Self {
            pipe: Arc::new(TokenPipe {
                read: Mutex::new(read),
                write: Mutex::new(write),
            }),
            fds: (read_fd, write_fd),
            sink,
        }
    }
}

impl JobClient for GNUMakeJobClient {
    fn get_job(&self) -> Result<JobHandle> {
        let token = self.pipe.read_token().map_err(Error::TokenRead)?;
        Ok(JobHandle::new(Release::Token {
            pipe: Arc::clone(&self.pipe),
            token,
        }))
    }

    fn popen(&self, cmd: &[String], cwd: &Path) -> Result<Child> {
        spawn_command(cmd, cwd, &self.env(), &*self.sink)
    }

    fn env(&self) -> Vec<(String, String)> {
        vec![(
            String::from("MAKEFLAGS"),
            format!("--jobserver-auth={},{}", self.fds.0, self.fds.1),
        )]
    }
}

/// Extract the jobserver descriptor pair from a `MAKEFLAGS` value.
pub fn parse_makeflags(flags: &str) -> Result<Option<(RawFd, RawFd)>> {
    for word in flags.split_whitespace() {
        let Some(spec) = word
            .strip_prefix("--jobserver-auth=")
            .or_else(|| word.strip_prefix("--jobserver-fds="))
        else {
            continue;
        };
        if spec.starts_with("fifo:") {
            warn!("fifo-style jobserver is not supported, running standalone");
            return Ok(None);
        }
        let Some((read_fd, write_fd)) = spec.split_once(',') else {
            return Err(Error::BadMakeflags(word.to_string()));
        };
        let read_fd: RawFd = read_fd
            .parse()
            .map_err(|_| Error::BadMakeflags(word.to_string()))?;
        let write_fd: RawFd = write_fd
            .parse()
            .map_err(|_| Error::BadMakeflags(word.to_string()))?;
        if read_fd < 0 || write_fd < 0 {
            // The parent closed the pipe for this child (e.g. it was not
            // marked recursive); we must not touch the descriptors.
            debug!("parent jobserver descriptors are closed");
            return Ok(None);
        }
        return Ok(Some((read_fd, write_fd)));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::os::fd::IntoRawFd;
    use std::os::unix::net::UnixStream;
    use std::thread;
    use std::time::Duration;

    use fwb_log::{LogLevel, MemorySink};
    use ntest::timeout;

    use super::*;

    #[test]
    fn parses_auth_and_fds_specs() {
        assert_eq!(
            parse_makeflags("-j8 --jobserver-auth=7,8").unwrap(),
            Some((7, 8))
        );
        assert_eq!(
            parse_makeflags("--jobserver-fds=3,4 -j").unwrap(),
            Some((3, 4))
        );
        assert_eq!(parse_makeflags("-j8 -k").unwrap(), None);
        assert_eq!(parse_makeflags("").unwrap(), None);
    }

    #[test]
    fn closed_or_fifo_pools_are_skipped() {
        assert_eq!(parse_makeflags("--jobserver-auth=-1,-1").unwrap(), None);
        assert_eq!(
            parse_makeflags("--jobserver-auth=fifo:/tmp/fifo").unwrap(),
            None
        );
    }

    #[test]
    fn malformed_specs_are_errors() {
        assert!(matches!(
            parse_makeflags("--jobserver-auth=bogus"),
            Err(Error::BadMakeflags(_))
        ));
        assert!(matches!(
            parse_makeflags("--jobserver-fds=3,x"),
            Err(Error::BadMakeflags(_))
        ));
    }

    /// Wire a client to a socketpair standing in for the parent's pipe:
    /// tokens written by the "parent" side become readable by the client,
    /// and released tokens arrive back at the parent side.
    fn client_with_parent() -> (GNUMakeJobClient, UnixStream) {
        let (ours, parent) = UnixStream::pair().unwrap();
        let ours_write = ours.try_clone().unwrap();
        let sink = Arc::new(MemorySink::new(LogLevel::Debug));
        let client = unsafe {
            GNUMakeJobClient::from_raw_fds(ours.into_raw_fd(), ours_write.into_raw_fd(), sink)
        };
        (client, parent)
    }

    #[test]
    #[timeout(5000)]
    fn tokens_are_read_to_acquire_and_written_to_release() {
        let (client, parent) = client_with_parent();
        let mut parent_io = parent.try_clone().unwrap();
        parent_io.write_all(b"++").unwrap();

        let first = client.get_job().unwrap();
        let second = client.get_job().unwrap();

        drop(first);
        let mut buf = [0u8; 1];
        parent_io.read_exact(&mut buf).unwrap();
        assert_eq!(buf[0], b'+');

        second.release();
        parent_io.read_exact(&mut buf).unwrap();
        assert_eq!(buf[0], b'+');
    }

    #[test]
    #[timeout(5000)]
    fn get_job_blocks_until_the_parent_hands_out_a_token() {
        let (client, parent) = client_with_parent();
        let client = Arc::new(client);

        let waiter = {
            let client = Arc::clone(&client);
            thread::spawn(move || client.get_job())
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!waiter.is_finished());

        let mut parent_io = parent.try_clone().unwrap();
        parent_io.write_all(b"+").unwrap();
        let job = waiter.join().unwrap().unwrap();
        drop(job);
    }

    #[test]
    fn env_advertises_the_inherited_pool() {
        let (client, _parent) = client_with_parent();
        let env = client.env();
        assert_eq!(env.len(), 1);
        assert_eq!(env[0].0, "MAKEFLAGS");
        assert!(env[0].1.starts_with("--jobserver-auth="));
    }

    #[test]
    #[timeout(5000)]
    fn a_closed_parent_pipe_is_an_error_not_a_hang() {
        let (client, parent) = client_with_parent();
        drop(parent);
        assert!(matches!(client.get_job(), Err(Error::TokenRead(_))));
    }
}
