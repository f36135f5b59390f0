//! Remote command execution over the system `ssh` client.
//!
//! This is the command-runner collaborator used by the service actions. It
//! renders a [`RemoteCommand`] (optionally elevated and scoped to a working
//! directory) and runs it through `ssh`, returning the remote exit code and
//! captured output without interpreting them.

use std::ffi::OsString;

use tracing::debug;

mod command;
mod config;
mod types;
mod util;

pub use config::{
    DEFAULT_SSH_PORT, DEFAULT_SUDO_COMMAND, RemoteConfig, RemoteConfigLoadError, RemoteError,
};
pub use types::{
    CommandOutput, CommandRunner, ProcessCommandRunner, RemoteCommand, RemoteCommandOutput,
    RemoteExecutor,
};
pub use util::expand_tilde;

/// Runs commands on a single host via `ssh`.
#[derive(Clone, Debug)]
pub struct SshExecutor<R: CommandRunner> {
    config: RemoteConfig,
    runner: R,
}

impl SshExecutor<ProcessCommandRunner> {
    /// Convenience constructor that wires the real process runner.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidConfig`] when validation fails.
    pub fn with_process_runner(config: RemoteConfig) -> Result<Self, RemoteError> {
        Self::new(config, ProcessCommandRunner)
    }
}

impl<R: CommandRunner> SshExecutor<R> {
    /// Creates an executor using the provided runner and configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidConfig`] when configuration validation
    /// fails.
    pub fn new(config: RemoteConfig, runner: R) -> Result<Self, RemoteError> {
        config.validate()?;
        Ok(Self { config, runner })
    }

    /// Returns a reference to the underlying configuration.
    #[must_use]
    pub const fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Renders `command` exactly as it will be passed to the remote shell.
    #[must_use]
    pub fn render(&self, command: &RemoteCommand) -> String {
        command::render(&self.config, command)
    }

    fn build_ssh_args(&self, remote_command: &str) -> Vec<OsString> {
        let mut args = vec![
            OsString::from("-p"),
            OsString::from(self.config.port().to_string()),
        ];

        if let Some(ref identity_file) = self.config.ssh_identity_file {
            args.push(OsString::from("-i"));
            args.push(OsString::from(expand_tilde(identity_file)));
        }

        if self.config.ssh_batch_mode {
            args.push(OsString::from("-o"));
            args.push(OsString::from("BatchMode=yes"));
        }

        if !self.config.ssh_strict_host_key_checking {
            args.push(OsString::from("-o"));
            args.push(OsString::from("StrictHostKeyChecking=no"));
        }

        let known_hosts = self.config.ssh_known_hosts_file.trim();
        if !known_hosts.is_empty() {
            args.push(OsString::from("-o"));
            args.push(OsString::from(format!("UserKnownHostsFile={known_hosts}")));
        }

        args.push(OsString::from(format!(
            "{}@{}",
            self.config.ssh_user,
            self.config.host.as_deref().unwrap_or_default()
        )));
        args.push(OsString::from(remote_command));
        args
    }
}

impl<R: CommandRunner> RemoteExecutor for SshExecutor<R> {
    fn execute(&self, command: &RemoteCommand) -> Result<RemoteCommandOutput, RemoteError> {
        let rendered = self.render(command);
        debug!(
            host = self.config.host.as_deref().unwrap_or_default(),
            command = %rendered,
            "running remote command"
        );
        let args = self.build_ssh_args(&rendered);
        let output = self.runner.run(&self.config.ssh_bin, &args)?;

        Ok(RemoteCommandOutput {
            exit_code: output.code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
