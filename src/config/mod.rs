//! Gateway configuration loaded via `ortho-config`.
//!
//! Values merge defaults, the discovered `mrgate.toml`, and `MRGATE_*`
//! environment variables in that order of precedence.

use std::ffi::OsString;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::channel::SshSettings;
use crate::jobs::ClusterTools;
use crate::scope::ScopeLayout;

const APP_NAME: &str = "mrgate";

/// Default HDFS directory under which scope directories are created.
pub const DEFAULT_REMOTE_BASE_HDFS_DIR: &str = "/user/mrgate/scopes";

/// Default directory on the gateway host's local disk for scope workspaces.
pub const DEFAULT_REMOTE_BASE_LOCAL_DIR: &str = "/tmp/mrgate/scopes";

/// Default location of the Hadoop streaming jar on the gateway host.
pub const DEFAULT_STREAMING_JAR: &str = "/usr/lib/hadoop-mapreduce/hadoop-streaming.jar";

/// Connection and layout settings for the shared gateway host.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "MRGATE",
    discovery(
        app_name = "mrgate",
        env_var = "MRGATE_CONFIG_PATH",
        config_file_name = "mrgate.toml",
        dotfile_name = ".mrgate.toml",
        project_file_name = "mrgate.toml"
    )
)]
pub struct GatewayConfig {
    /// Host name or address of the Hadoop gateway. This value is required.
    #[ortho_config(default = String::new())]
    pub remote_host: String,
    /// Remote user to connect as.
    #[ortho_config(default = "hadoop".to_owned())]
    pub remote_user: String,
    /// TCP port of the SSH daemon on the gateway.
    #[ortho_config(default = 22)]
    pub ssh_port: u16,
    /// Path to the `ssh` executable.
    #[ortho_config(default = "ssh".to_owned())]
    pub ssh_bin: String,
    /// Path to the `scp` executable.
    #[ortho_config(default = "scp".to_owned())]
    pub scp_bin: String,
    /// Path to the SSH private key. Supports tilde expansion; when absent the
    /// client falls back to its default key locations.
    pub ssh_identity_file: Option<String>,
    /// Whether to force batch mode for SSH to avoid password prompts.
    #[ortho_config(default = true)]
    pub ssh_batch_mode: bool,
    /// Whether to reject unknown host keys. The gateway is long-lived so this
    /// defaults to enabled.
    #[ortho_config(default = true)]
    pub ssh_strict_host_key_checking: bool,
    /// Known hosts file override; empty keeps the client default.
    #[ortho_config(default = String::new())]
    pub ssh_known_hosts_file: String,
    /// HDFS directory that holds one subdirectory per scope.
    #[ortho_config(default = DEFAULT_REMOTE_BASE_HDFS_DIR.to_owned())]
    pub remote_base_hdfs_dir: String,
    /// Gateway-local directory that holds one working directory per scope.
    #[ortho_config(default = DEFAULT_REMOTE_BASE_LOCAL_DIR.to_owned())]
    pub remote_base_local_dir: String,
    /// `hadoop` client on the gateway.
    #[ortho_config(default = "hadoop".to_owned())]
    pub hadoop_bin: String,
    /// `yarn` client on the gateway.
    #[ortho_config(default = "yarn".to_owned())]
    pub yarn_bin: String,
    /// `sqoop` client on the gateway.
    #[ortho_config(default = "sqoop".to_owned())]
    pub sqoop_bin: String,
    /// Hadoop streaming jar on the gateway.
    #[ortho_config(default = DEFAULT_STREAMING_JAR.to_owned())]
    pub streaming_jar: String,
}

impl GatewayConfig {
    /// Merges defaults, the discovered configuration file, and `MRGATE_*`
    /// environment variables. Command-line arguments are not consulted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when a layer cannot be read or merged.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from(APP_NAME)])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Ensures required values are present after trimming whitespace. Error
    /// messages name both the environment variable and the TOML key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (value, field) in [
            (self.remote_host.as_str(), "remote_host"),
            (self.remote_user.as_str(), "remote_user"),
            (self.ssh_bin.as_str(), "ssh_bin"),
            (self.scp_bin.as_str(), "scp_bin"),
            (self.remote_base_hdfs_dir.as_str(), "remote_base_hdfs_dir"),
            (self.remote_base_local_dir.as_str(), "remote_base_local_dir"),
            (self.hadoop_bin.as_str(), "hadoop_bin"),
            (self.yarn_bin.as_str(), "yarn_bin"),
            (self.sqoop_bin.as_str(), "sqoop_bin"),
            (self.streaming_jar.as_str(), "streaming_jar"),
        ] {
            require_value(value, field)?;
        }
        if let Some(identity_file) = self.ssh_identity_file.as_deref() {
            require_value(identity_file, "ssh_identity_file")?;
        }
        if self.ssh_port == 0 {
            return Err(ConfigError::MissingField { field: "ssh_port" });
        }
        Ok(())
    }

    /// SSH connection settings for the channel transport.
    #[must_use]
    pub fn ssh_settings(&self) -> SshSettings {
        SshSettings {
            host: self.remote_host.trim().to_owned(),
            user: self.remote_user.trim().to_owned(),
            port: self.ssh_port,
            ssh_bin: self.ssh_bin.clone(),
            scp_bin: self.scp_bin.clone(),
            identity_file: self.ssh_identity_file.clone(),
            batch_mode: self.ssh_batch_mode,
            strict_host_key_checking: self.ssh_strict_host_key_checking,
            known_hosts_file: self.ssh_known_hosts_file.clone(),
        }
    }

    /// Base directories from which scope paths are derived.
    #[must_use]
    pub fn scope_layout(&self) -> ScopeLayout {
        ScopeLayout::new(
            Utf8PathBuf::from(self.remote_base_hdfs_dir.trim()),
            Utf8PathBuf::from(self.remote_base_local_dir.trim()),
        )
    }

    /// Cluster client binaries used to assemble job commands.
    #[must_use]
    pub fn cluster_tools(&self) -> ClusterTools {
        ClusterTools {
            hadoop_bin: self.hadoop_bin.clone(),
            yarn_bin: self.yarn_bin.clone(),
            sqoop_bin: self.sqoop_bin.clone(),
            streaming_jar: self.streaming_jar.clone(),
        }
    }
}

/// Expands a leading `~/` to the value of `HOME`. Other paths, and all
/// paths when `HOME` is unset, are returned unchanged.
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => Utf8PathBuf::from(home.to_string_lossy().into_owned())
            .join(rest)
            .into_string(),
        _ => path.to_owned(),
    }
}

fn require_value(value: &str, field: &'static str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField { field });
    }
    Ok(())
}

fn env_var_name(field: &str) -> String {
    format!("MRGATE_{}", field.to_uppercase())
}

/// Errors raised while loading or validating [`GatewayConfig`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// A required value is empty after trimming.
    #[error("missing {field}: set {} or add `{field}` to mrgate.toml", env_var_name(.field))]
    MissingField {
        /// TOML key of the missing value.
        field: &'static str,
    },
    /// A configuration layer could not be read or merged.
    #[error("failed to load configuration: {0}")]
    Parse(String),
}
