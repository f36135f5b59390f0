//! SSH connection settings and their validation.
//!
//! [`RemoteConfig`] is loaded via `ortho-config`, which merges defaults,
//! configuration files, and environment variables. Command-line overrides
//! for the target host are applied afterwards by the caller.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Port used when no SSH port is configured.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Privilege escalation prefix used for elevated commands.
pub const DEFAULT_SUDO_COMMAND: &str = "sudo -n";

/// Remote host and SSH client settings loaded via `ortho-config`.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "GAB_REMOTE",
    discovery(
        app_name = "gab",
        env_var = "GAB_CONFIG_PATH",
        config_file_name = "gab.toml",
        dotfile_name = ".gab.toml",
        project_file_name = "gab.toml"
    )
)]
pub struct RemoteConfig {
    /// Host name or address of the machine to manage.
    pub host: Option<String>,
    /// Path to the `ssh` executable.
    #[ortho_config(default = "ssh".to_owned())]
    pub ssh_bin: String,
    /// Remote user to connect as.
    #[ortho_config(default = "root".to_owned())]
    pub ssh_user: String,
    /// SSH port; falls back to [`DEFAULT_SSH_PORT`].
    pub ssh_port: Option<u16>,
    /// Path to the SSH private key. Supports tilde expansion. When absent the
    /// SSH client uses its default key locations.
    pub ssh_identity_file: Option<String>,
    /// Whether to force batch mode for SSH to avoid password prompts.
    #[ortho_config(default = true)]
    pub ssh_batch_mode: bool,
    /// Whether to enforce host key checking.
    #[ortho_config(default = true)]
    pub ssh_strict_host_key_checking: bool,
    /// Known hosts file override. Empty keeps the SSH client default.
    #[ortho_config(default = String::new())]
    pub ssh_known_hosts_file: String,
    /// Prefix used to run elevated commands, for example `sudo -n`.
    #[ortho_config(default = DEFAULT_SUDO_COMMAND.to_owned())]
    pub sudo_command: String,
}

/// Errors raised when loading the remote configuration from layered sources.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum RemoteConfigLoadError {
    /// Indicates that parsing or merging configuration layers failed.
    #[error("remote configuration parsing failed: {0}")]
    Parse(String),
}

impl RemoteConfig {
    /// Loads configuration from defaults, configuration files, and
    /// environment variables without parsing process arguments.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteConfigLoadError::Parse`] when merging sources fails.
    pub fn load_without_cli_args() -> Result<Self, RemoteConfigLoadError> {
        Self::load_from_iter([std::ffi::OsString::from("gab")])
            .map_err(|err| RemoteConfigLoadError::Parse(err.to_string()))
    }

    /// Applies command-line overrides on top of the loaded values.
    #[must_use]
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        user: Option<String>,
        port: Option<u16>,
    ) -> Self {
        if host.is_some() {
            self.host = host;
        }
        if let Some(value) = user {
            self.ssh_user = value;
        }
        if port.is_some() {
            self.ssh_port = port;
        }
        self
    }

    /// Effective SSH port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.ssh_port.unwrap_or(DEFAULT_SSH_PORT)
    }

    /// Ensures required values are present after trimming whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidConfig`] naming the first blank field.
    pub fn validate(&self) -> Result<(), RemoteError> {
        Self::require_present(self.host.as_deref(), "host")?;
        Self::require_value(&self.ssh_bin, "ssh_bin")?;
        Self::require_value(&self.ssh_user, "ssh_user")?;
        Self::require_optional_value(self.ssh_identity_file.as_deref(), "ssh_identity_file")?;
        Self::require_value(&self.sudo_command, "sudo_command")?;
        Ok(())
    }

    fn require_present(value: Option<&str>, field: &str) -> Result<(), RemoteError> {
        Self::require_value(value.unwrap_or_default(), field)
    }

    fn require_optional_value(value: Option<&str>, field: &str) -> Result<(), RemoteError> {
        match value {
            None => Ok(()),
            Some(v) if !v.trim().is_empty() => Ok(()),
            Some(_) => Err(RemoteError::InvalidConfig {
                field: field.to_owned(),
            }),
        }
    }

    fn require_value(value: &str, field: &str) -> Result<(), RemoteError> {
        Self::require_optional_value(Some(value), field)
    }
}

/// Errors surfaced while talking to the remote host.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RemoteError {
    /// Raised when configuration is missing required values.
    #[error("missing {field}: set GAB_REMOTE_{env_suffix} or add {field} to gab.toml", env_suffix = field.to_uppercase())]
    InvalidConfig {
        /// Configuration field that failed validation.
        field: String,
    },
    /// Raised when a command cannot be spawned.
    #[error("failed to spawn {program}: {message}")]
    Spawn {
        /// Command that failed to start.
        program: String,
        /// Operating system error string.
        message: String,
    },
}
