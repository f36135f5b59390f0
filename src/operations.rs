//! Ad-hoc commands on the remote host.

use thiserror::Error;
use tracing::info;

use crate::remote::{RemoteCommand, RemoteCommandOutput, RemoteError, RemoteExecutor};

/// Errors raised by [`shell`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ShellError {
    /// Raised when there is nothing to run.
    #[error("shell command is empty")]
    EmptyCommand,
    /// Raised when the executor could not run the command.
    #[error("remote command failed to start: {0}")]
    Dispatch(#[from] RemoteError),
}

/// Builds the [`RemoteCommand`] for an ad-hoc shell line.
///
/// A leading `sudo` word is removed and the command is marked as elevated
/// instead, so the configured privilege escalation prefix applies.
///
/// # Errors
///
/// Returns [`ShellError::EmptyCommand`] when nothing is left to run.
pub fn shell_command(line: &str, working_dir: Option<&str>) -> Result<RemoteCommand, ShellError> {
    let trimmed = line.trim();
    let (text, elevated) = match trimmed.strip_prefix("sudo") {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
            (rest.trim_start(), true)
        }
        _ => (trimmed, false),
    };
    if text.is_empty() {
        return Err(ShellError::EmptyCommand);
    }

    let mut command = RemoteCommand::new(text);
    if elevated {
        command = command.elevated();
    }
    if let Some(dir) = working_dir {
        command = command.in_dir(dir);
    }
    Ok(command)
}

/// Runs `line` on the remote host and returns its output uninterpreted.
///
/// # Errors
///
/// Returns [`ShellError`] when the line is empty or cannot be dispatched.
pub fn shell<E: RemoteExecutor>(
    executor: &E,
    line: &str,
    working_dir: Option<&str>,
) -> Result<RemoteCommandOutput, ShellError> {
    let command = shell_command(line, working_dir)?;
    info!(command = %command.command, elevated = command.elevated, "running shell command");
    Ok(executor.execute(&command)?)
}
