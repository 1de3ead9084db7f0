//! OpenSSH-backed transport.
//!
//! Each session starts a multiplexing master (`ControlMaster=auto`,
//! `ControlPersist=yes`) whose control socket lives in a private temporary
//! directory. Commands and `scp` uploads reuse that socket, and dropping the
//! session asks the master to exit.

use std::ffi::{OsStr, OsString};
use std::sync::Arc;

use camino::Utf8Path;
use tempfile::TempDir;
use tracing::{debug, warn};

use super::error::status_text;
use super::process::{ClientOutput, ClientRunner};
use super::{ChannelError, Session, Transport};
use crate::command::RemoteCommand;
use crate::config::expand_tilde;

const CONTROL_SOCKET_NAME: &str = "control";

/// Connection settings for the remote gateway host.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SshSettings {
    /// Host name or address of the gateway.
    pub host: String,
    /// Remote user to connect as.
    pub user: String,
    /// TCP port of the SSH daemon.
    pub port: u16,
    /// Path to the `ssh` executable.
    pub ssh_bin: String,
    /// Path to the `scp` executable.
    pub scp_bin: String,
    /// Private key used for authentication, if not the client default.
    pub identity_file: Option<String>,
    /// Whether to force batch mode so the client never prompts.
    pub batch_mode: bool,
    /// Whether unknown host keys are rejected.
    pub strict_host_key_checking: bool,
    /// Known hosts file override; empty keeps the client default.
    pub known_hosts_file: String,
}

impl SshSettings {
    fn target(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Options shared by `ssh` and `scp`: identity, then each `-o` setting.
    fn common_options(&self, control_path: &OsStr) -> Vec<OsString> {
        let mut settings = Vec::new();
        if self.batch_mode {
            settings.push(OsString::from("BatchMode=yes"));
        }
        if !self.strict_host_key_checking {
            settings.push(OsString::from("StrictHostKeyChecking=no"));
        }
        let known_hosts = self.known_hosts_file.trim();
        if !known_hosts.is_empty() {
            settings.push(OsString::from(format!("UserKnownHostsFile={known_hosts}")));
        }
        let mut control = OsString::from("ControlPath=");
        control.push(control_path);
        settings.push(control);

        self.identity_file
            .iter()
            .flat_map(|file| [OsString::from("-i"), OsString::from(expand_tilde(file))])
            .chain(
                settings
                    .into_iter()
                    .flat_map(|setting| [OsString::from("-o"), setting]),
            )
            .collect()
    }

    fn ssh_args(&self, control_path: &OsStr) -> Vec<OsString> {
        let mut args = vec![OsString::from("-p"), OsString::from(self.port.to_string())];
        args.extend(self.common_options(control_path));
        args
    }
}

/// Transport that drives the system OpenSSH client through a
/// [`ClientRunner`].
#[derive(Clone, Debug)]
pub struct SshTransport<R> {
    settings: Arc<SshSettings>,
    runner: R,
}

impl<R: ClientRunner + Clone> SshTransport<R> {
    /// Creates a transport for `settings` using `runner` to spawn clients.
    #[must_use]
    pub fn new(settings: SshSettings, runner: R) -> Self {
        Self {
            settings: Arc::new(settings),
            runner,
        }
    }

    /// Returns the connection settings.
    #[must_use]
    pub fn settings(&self) -> &SshSettings {
        &self.settings
    }

    fn connect_error(&self, message: String) -> ChannelError {
        ChannelError::Connect {
            host: self.settings.host.clone(),
            message,
        }
    }
}

impl<R: ClientRunner + Clone> Transport for SshTransport<R> {
    type Session = SshSession<R>;

    fn connect(&self) -> Result<Self::Session, ChannelError> {
        let socket_dir = tempfile::Builder::new()
            .prefix("mrgate-ssh-")
            .tempdir()
            .map_err(|err| self.connect_error(format!("control socket directory: {err}")))?;
        let control_path = socket_dir.path().join(CONTROL_SOCKET_NAME).into_os_string();

        let mut args = self.settings.ssh_args(&control_path);
        for option in ["ControlMaster=auto", "ControlPersist=yes"] {
            args.push(OsString::from("-o"));
            args.push(OsString::from(option));
        }
        args.push(OsString::from(self.settings.target()));
        args.push(OsString::from("true"));

        debug!(host = %self.settings.host, "opening ssh session");
        let output = self
            .runner
            .run(&self.settings.ssh_bin, &args)
            .map_err(|err| self.connect_error(err.to_string()))?;
        if !output.succeeded() {
            return Err(self.connect_error(output.failure_summary(&self.settings.ssh_bin)));
        }

        Ok(SshSession {
            settings: Arc::clone(&self.settings),
            runner: self.runner.clone(),
            control_path,
            _socket_dir: socket_dir,
        })
    }
}

/// Live session multiplexed over one OpenSSH control socket.
#[derive(Debug)]
pub struct SshSession<R: ClientRunner> {
    settings: Arc<SshSettings>,
    runner: R,
    control_path: OsString,
    _socket_dir: TempDir,
}

impl<R: ClientRunner> SshSession<R> {
    fn ssh(&self, options: &[&str], command: Option<&str>) -> Result<ClientOutput, ChannelError> {
        let mut args = self.settings.ssh_args(&self.control_path);
        args.extend(options.iter().map(OsString::from));
        args.push(OsString::from(self.settings.target()));
        if let Some(line) = command {
            args.push(OsString::from(line));
        }
        self.runner.run(&self.settings.ssh_bin, &args)
    }
}

impl<R: ClientRunner> Session for SshSession<R> {
    fn execute(&mut self, command: &RemoteCommand) -> Result<String, ChannelError> {
        debug!(%command, "executing remote command");
        let output = self.ssh(&[], Some(command.as_shell()))?;
        if output.succeeded() {
            return Ok(output.stdout);
        }

        Err(ChannelError::Execution {
            command: command.to_string(),
            status: output.code,
            status_text: status_text(output.code),
            stderr: output.stderr,
        })
    }

    fn upload(&mut self, local: &Utf8Path, remote: &Utf8Path) -> Result<(), ChannelError> {
        debug!(%local, %remote, "uploading file");
        let mut args = vec![OsString::from("-P"), OsString::from(self.settings.port.to_string())];
        args.extend(self.settings.common_options(&self.control_path));
        args.push(OsString::from(local.as_str()));
        args.push(OsString::from(format!("{}:{remote}", self.settings.target())));

        let transfer_error = |message: String| ChannelError::Transfer {
            local: local.to_path_buf(),
            remote: remote.to_path_buf(),
            message,
        };
        let output = self
            .runner
            .run(&self.settings.scp_bin, &args)
            .map_err(|err| transfer_error(err.to_string()))?;
        if output.succeeded() {
            return Ok(());
        }

        Err(transfer_error(output.failure_summary(&self.settings.scp_bin)))
    }
}

impl<R: ClientRunner> Drop for SshSession<R> {
    fn drop(&mut self) {
        match self.ssh(&["-O", "exit"], None) {
            Ok(output) if output.succeeded() => {
                debug!(host = %self.settings.host, "closed ssh session");
            }
            Ok(output) => warn!(
                host = %self.settings.host,
                status = %status_text(output.code),
                stderr = %output.stderr.trim(),
                "ssh control master did not exit cleanly"
            ),
            Err(err) => warn!(
                host = %self.settings.host,
                error = %err,
                "failed to close ssh session"
            ),
        }
    }
}
