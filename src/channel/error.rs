//! Failures raised by the remote channel and its transports.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors surfaced while talking to the remote gateway host.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ChannelError {
    /// Raised when no connection to the remote host can be established.
    #[error("failed to connect to remote host {host}: {message}")]
    Connect {
        /// Host the channel attempted to reach.
        host: String,
        /// Transport-specific description of the failure.
        message: String,
    },
    /// Raised when a local helper program cannot be started.
    #[error("failed to spawn {program}: {message}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Operating system error string.
        message: String,
    },
    /// Raised when a remote command exits with a non-zero status.
    #[error("remote command `{command}` exited with status {status_text}: {stderr}")]
    Execution {
        /// Redacted rendering of the command that failed.
        command: String,
        /// Exit status as reported by the transport.
        status: Option<i32>,
        /// Human readable representation of the exit status.
        status_text: String,
        /// Stderr captured from the remote side.
        stderr: String,
    },
    /// Raised when copying a file to the remote host fails.
    #[error("failed to copy {local} to {remote}: {message}")]
    Transfer {
        /// Local source file.
        local: Utf8PathBuf,
        /// Destination path on the remote host.
        remote: Utf8PathBuf,
        /// Transport-specific description of the failure.
        message: String,
    },
}

pub(crate) fn status_text(code: Option<i32>) -> String {
    code.map_or_else(|| String::from("unknown"), |value| value.to_string())
}
