//! Service management across the `service` and upstart conventions.
//!
//! A [`ServiceRegistry`] maps names to [`ServiceDescriptor`]s, follows
//! aliases (`apache` → `apache2`), and falls back to a default descriptor for
//! unregistered names. A [`ServiceController`] turns the resolved metadata
//! into elevated commands for start, stop, restart, and status, dispatching
//! them through a [`RemoteExecutor`](crate::remote::RemoteExecutor).

mod config;
mod confirm;
mod controller;
mod descriptor;
mod registry;

pub use config::{ServicesConfig, ServicesConfigError, apply_definitions};
pub use confirm::{
    AssumeYes, Confirmer, Decision, InvalidAnswer, PromptConfirmer, StopFailure, parse_answer,
};
pub use controller::{Action, Dispatched, ServiceController, ServiceError};
pub use descriptor::{
    ManagementStyle, ResolvedService, RestartPlan, RestartSupport, ServiceDescriptor,
    UnknownStyle,
};
pub use registry::{
    DEFAULT_SERVICE, MYSQL_STOP_COMMAND, RegistryError, ServiceRegistry, UnknownServicePolicy,
};

#[cfg(test)]
mod tests;
