//! Local client processes (`ssh`, `scp`) spawned by the SSH transport.

use std::ffi::OsString;
use std::process::{Command, Output, Stdio};

use super::ChannelError;
use super::error::status_text;

/// Exit status and captured streams of a finished client process.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOutput {
    /// Exit code, or `None` when the client was killed by a signal.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ClientOutput {
    /// Whether the client exited with status zero.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.code, Some(0))
    }

    /// One-line summary used in transport error messages.
    #[must_use]
    pub fn failure_summary(&self, program: &str) -> String {
        format!(
            "{program} exited with status {}: {}",
            status_text(self.code),
            self.stderr.trim()
        )
    }
}

impl From<Output> for ClientOutput {
    fn from(output: Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Spawns a local client and waits for it to finish.
pub trait ClientRunner {
    /// Runs `program` with `args` and captures its output.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Spawn`] if the program cannot be started.
    fn run(&self, program: &str, args: &[OsString]) -> Result<ClientOutput, ChannelError>;
}

/// Runs clients as child processes of the current process. Standard input
/// is closed, so a client that would prompt fails instead of hanging.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClientRunner;

impl ClientRunner for SystemClientRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<ClientOutput, ChannelError> {
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map(ClientOutput::from)
            .map_err(|err| ChannelError::Spawn {
                program: program.to_owned(),
                message: err.to_string(),
            })
    }
}
