//! Core library for the `gab` remote service management tool.
//!
//! The crate resolves service names through a registry of management
//! metadata (style, aliases, restart support, custom stop commands) and
//! dispatches the resulting elevated commands to a remote host over SSH.

pub mod operations;
pub mod remote;
pub mod services;
pub mod test_support;

pub use operations::{ShellError, shell};
pub use remote::{
    ProcessCommandRunner, RemoteCommand, RemoteCommandOutput, RemoteConfig, RemoteError,
    RemoteExecutor, SshExecutor,
};
pub use services::{
    Action, Confirmer, Decision, ManagementStyle, PromptConfirmer, ServiceController,
    ServiceDescriptor, ServiceError, ServiceRegistry, ServicesConfig, UnknownServicePolicy,
};
