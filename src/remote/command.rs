//! Rendering of [`RemoteCommand`] values into the string handed to `ssh`.

use shell_escape::unix::escape;

use super::{RemoteCommand, RemoteConfig};

/// Renders `command` for the remote shell.
///
/// A working directory becomes a `cd <dir> &&` prefix. Elevated commands are
/// wrapped in `<sudo> sh -c '<command>'` so the directory change happens with
/// the same privileges as the command itself.
pub(crate) fn render(config: &RemoteConfig, command: &RemoteCommand) -> String {
    let scoped = command.working_dir.as_deref().map_or_else(
        || command.command.clone(),
        |dir| {
            let escaped_dir = escape(dir.into());
            format!("cd {escaped_dir} && {}", command.command)
        },
    );

    if !command.elevated {
        return scoped;
    }

    let sudo = config.sudo_command.trim();
    let escaped = escape(scoped.into());
    format!("{sudo} sh -c {escaped}")
}
