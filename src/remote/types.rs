//! Command runner abstraction and the values exchanged with remote hosts.

use std::ffi::OsString;
use std::process::Command;

use super::RemoteError;

/// Result of running a local process.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandOutput {
    /// Exit code reported by the process, if available.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

/// Abstraction over local process execution to support fakes in tests.
pub trait CommandRunner {
    /// Runs `program` with the given arguments, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Spawn`] if the command cannot be started.
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, RemoteError>;
}

/// Real command runner that shells out to the host operating system.
#[derive(Clone, Debug, Default)]
pub struct ProcessCommandRunner;

impl CommandRunner for ProcessCommandRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, RemoteError> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|err| RemoteError::Spawn {
                program: program.to_owned(),
                message: err.to_string(),
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// A shell command to run on the remote host.
///
/// The command text is passed to the remote shell verbatim. Elevation and the
/// working directory scope are applied when the command is rendered.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemoteCommand {
    /// Shell command text.
    pub command: String,
    /// Whether the command runs with administrative privileges.
    pub elevated: bool,
    /// Directory to change into before running the command.
    pub working_dir: Option<String>,
}

impl RemoteCommand {
    /// Creates a command that runs as the connecting user.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            elevated: false,
            working_dir: None,
        }
    }

    /// Marks the command as requiring elevated privileges.
    #[must_use]
    pub fn elevated(mut self) -> Self {
        self.elevated = true;
        self
    }

    /// Scopes the command to `dir` on the remote host.
    #[must_use]
    pub fn in_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// Output captured from a command executed on the remote host.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RemoteCommandOutput {
    /// Exit code reported by the remote command, if any.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl RemoteCommandOutput {
    /// Returns `true` when the remote command exited with status zero.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }

    /// Human readable exit status, `unknown` when the command was killed.
    #[must_use]
    pub fn status_text(&self) -> String {
        self.exit_code
            .map_or_else(|| String::from("unknown"), |code| code.to_string())
    }

    /// Stdout followed by stderr, skipping empty streams.
    #[must_use]
    pub fn combined_output(&self) -> String {
        [self.stdout.trim_end(), self.stderr.trim_end()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Executes shell commands on a remote host.
///
/// A non-zero exit status is reported through
/// [`RemoteCommandOutput::exit_code`], never as an error. Callers decide
/// whether a failed command is fatal.
pub trait RemoteExecutor {
    /// Runs `command` on the remote host and captures its output.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the command could not be dispatched.
    fn execute(&self, command: &RemoteCommand) -> Result<RemoteCommandOutput, RemoteError>;
}

impl<E: RemoteExecutor + ?Sized> RemoteExecutor for &E {
    fn execute(&self, command: &RemoteCommand) -> Result<RemoteCommandOutput, RemoteError> {
        (**self).execute(command)
    }
}
