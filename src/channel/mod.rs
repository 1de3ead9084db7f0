//! Serialised access to the remote gateway host.
//!
//! The underlying transport is not safe for concurrent use, so a
//! [`RemoteChannel`] admits exactly one session at a time. A session is one
//! acquisition of the connection for the duration of a logical operation;
//! it is released on every exit path, including failures, when it is
//! dropped.

use std::sync::{Mutex, PoisonError};

use camino::Utf8Path;

use crate::command::RemoteCommand;

mod error;
mod process;
mod ssh;

pub use error::ChannelError;
pub use process::{ClientOutput, ClientRunner, SystemClientRunner};
pub use ssh::{SshSession, SshSettings, SshTransport};

/// Connection to the remote host held for the length of one operation.
pub trait Session {
    /// Runs `command` as a single remote shell invocation and returns its
    /// standard output.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Execution`] when the command exits non-zero,
    /// or [`ChannelError::Spawn`] when the local client cannot start.
    fn execute(&mut self, command: &RemoteCommand) -> Result<String, ChannelError>;

    /// Copies `local` to `remote`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Transfer`] when the copy fails.
    fn upload(&mut self, local: &Utf8Path, remote: &Utf8Path) -> Result<(), ChannelError>;
}

/// Factory for sessions against the remote host.
pub trait Transport {
    /// Session type produced by [`Transport::connect`].
    type Session: Session;

    /// Establishes a new session. Dropping the session disconnects it.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Connect`] when the host cannot be reached.
    fn connect(&self) -> Result<Self::Session, ChannelError>;
}

/// Owns the transport and serialises every session opened through it.
#[derive(Debug)]
pub struct RemoteChannel<T> {
    transport: T,
    lock: Mutex<()>,
}

impl<T: Transport> RemoteChannel<T> {
    /// Wraps `transport`. No connection is made until the first operation.
    #[must_use]
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            lock: Mutex::new(()),
        }
    }

    /// Runs `operation` against a freshly connected session while holding
    /// the channel lock.
    ///
    /// The session is dropped, and therefore disconnected, before the lock
    /// is released regardless of whether `operation` succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Connect`] when the session cannot be opened,
    /// or whatever error `operation` returns.
    pub fn session<O, F>(&self, operation: F) -> Result<O, ChannelError>
    where
        F: FnOnce(&mut T::Session) -> Result<O, ChannelError>,
    {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut session = self.transport.connect()?;
        operation(&mut session)
    }

    /// Executes a single command in its own session.
    ///
    /// # Errors
    ///
    /// See [`RemoteChannel::session`] and [`Session::execute`].
    pub fn execute(&self, command: &RemoteCommand) -> Result<String, ChannelError> {
        self.session(|session| session.execute(command))
    }

    /// Uploads a single file in its own session.
    ///
    /// # Errors
    ///
    /// See [`RemoteChannel::session`] and [`Session::upload`].
    pub fn upload(&self, local: &Utf8Path, remote: &Utf8Path) -> Result<(), ChannelError> {
        self.session(|session| session.upload(local, remote))
    }
}
