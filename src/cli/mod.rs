//! Command-line interface definitions for the `gab` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{Args, Parser, Subcommand};

/// Top-level CLI for the `gab` binary.
#[derive(Debug, Parser)]
#[command(
    name = "gab",
    about = "Start, stop, and inspect services on a remote host over SSH",
    arg_required_else_help = true
)]
pub(crate) struct Cli {
    /// Host selection shared by all subcommands.
    #[command(flatten)]
    pub(crate) target: TargetArgs,
    /// Action to perform.
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Overrides for the configured SSH target.
#[derive(Debug, Args)]
pub(crate) struct TargetArgs {
    /// Host to connect to (overrides `GAB_REMOTE_HOST`).
    #[arg(long, short = 'H', global = true, value_name = "HOST")]
    pub(crate) host: Option<String>,
    /// Remote user to connect as (overrides `GAB_REMOTE_SSH_USER`).
    #[arg(long, short = 'u', global = true, value_name = "USER")]
    pub(crate) user: Option<String>,
    /// SSH port (overrides `GAB_REMOTE_SSH_PORT`).
    #[arg(long, short = 'p', global = true, value_name = "PORT")]
    pub(crate) port: Option<u16>,
}

/// Subcommands of the `gab` binary.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Start one or more services.
    #[command(name = "start", about = "Start one or more services")]
    Start(ServiceArgs),
    /// Stop one or more services.
    #[command(name = "stop", about = "Stop one or more services")]
    Stop(BatchArgs),
    /// Restart one or more services.
    #[command(name = "restart", about = "Restart one or more services")]
    Restart(BatchArgs),
    /// Show the status of one or more services.
    #[command(name = "status", about = "Show the status of one or more services")]
    Status(ServiceArgs),
    /// Show how service names resolve without contacting the host.
    #[command(
        name = "resolve",
        about = "Show how service names resolve without contacting the host"
    )]
    Resolve(ServiceArgs),
    /// Run a shell command on the remote host.
    #[command(name = "shell", about = "Run a shell command on the remote host")]
    Shell(ShellArgs),
}

/// Service names for a single action.
#[derive(Debug, Args)]
pub(crate) struct ServiceArgs {
    /// Service names, processed in order.
    #[arg(required = true, value_name = "SERVICE")]
    pub(crate) services: Vec<String>,
}

/// Service names for actions that may need confirmation after a failed stop.
#[derive(Debug, Args)]
pub(crate) struct BatchArgs {
    /// Continue without prompting when a stop command fails.
    #[arg(long, short = 'y')]
    pub(crate) yes: bool,
    /// Service names, processed in order.
    #[arg(required = true, value_name = "SERVICE")]
    pub(crate) services: Vec<String>,
}

/// Arguments for `gab shell`.
#[derive(Debug, Args)]
pub(crate) struct ShellArgs {
    /// Remote directory to run the command in.
    #[arg(long, value_name = "DIR")]
    pub(crate) cwd: Option<String>,
    /// Command to run; a leading `sudo` runs it elevated (use -- to separate flags).
    #[arg(required = true, trailing_var_arg = true)]
    pub(crate) command: Vec<String>,
}
