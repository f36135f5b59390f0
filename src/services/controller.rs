//! Start, stop, restart, and status actions over batches of services.
//!
//! Every action resolves each requested name through the
//! [`ServiceRegistry`] and dispatches elevated commands through a
//! [`RemoteExecutor`], one name at a time in the order given. Only `stop`
//! tolerates a failed command: the [`Confirmer`] decides whether the batch
//! continues.

use std::fmt;

use thiserror::Error;
use tracing::{info, warn};

use crate::remote::{RemoteCommand, RemoteCommandOutput, RemoteError, RemoteExecutor};

use super::confirm::{Confirmer, Decision, StopFailure};
use super::descriptor::{ResolvedService, RestartPlan};
use super::registry::{RegistryError, ServiceRegistry};

/// Service lifecycle action.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    /// Start a service.
    Start,
    /// Stop a service.
    Stop,
    /// Restart a service.
    Restart,
    /// Query a service.
    Status,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::Stop => f.write_str("stop"),
            Self::Restart => f.write_str("restart"),
            Self::Status => f.write_str("status"),
        }
    }
}

/// A command that was dispatched for a service, with its output.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Dispatched {
    /// Canonical service name.
    pub service: String,
    /// Action the command belongs to.
    pub action: Action,
    /// Command text as handed to the executor.
    pub command: String,
    /// Output captured from the remote host.
    pub output: RemoteCommandOutput,
}

/// Errors raised by service actions.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Raised when a name cannot be resolved under the active policy.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// Raised when the executor could not run a command.
    #[error("failed to {action} {service}: {source}")]
    Dispatch {
        /// Canonical service name.
        service: String,
        /// Action being performed.
        action: Action,
        /// Underlying executor error.
        #[source]
        source: RemoteError,
    },
    /// Raised when a start or restart command exits unsuccessfully.
    #[error("`{command}` exited with status {status_text} while trying to {action} {service}: {stderr}")]
    CommandFailed {
        /// Canonical service name.
        service: String,
        /// Action being performed.
        action: Action,
        /// Command that failed.
        command: String,
        /// Human readable exit status.
        status_text: String,
        /// Stdout captured from the command.
        stdout: String,
        /// Stderr captured from the command.
        stderr: String,
    },
    /// Raised when the operator declines to continue after a stop failure.
    #[error("aborted after {service} failed to stop")]
    Aborted {
        /// Canonical name of the service whose stop failed.
        service: String,
    },
}

/// Callback receiving each command's output as soon as it returns.
type Observer<'r> = Box<dyn FnMut(&Dispatched) + 'r>;

/// Runs service actions against one host.
pub struct ServiceController<'r, E, C> {
    registry: &'r ServiceRegistry,
    executor: E,
    confirmer: C,
    observer: Option<Observer<'r>>,
}

impl<E: fmt::Debug, C: fmt::Debug> fmt::Debug for ServiceController<'_, E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceController")
            .field("registry", &self.registry)
            .field("executor", &self.executor)
            .field("confirmer", &self.confirmer)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

impl<'r, E: RemoteExecutor, C: Confirmer> ServiceController<'r, E, C> {
    /// Creates a controller resolving names through `registry`.
    pub const fn new(registry: &'r ServiceRegistry, executor: E, confirmer: C) -> Self {
        Self {
            registry,
            executor,
            confirmer,
            observer: None,
        }
    }

    /// Calls `observer` with every dispatched command before its exit status
    /// is checked, so output survives a batch that later fails.
    #[must_use]
    pub fn on_dispatch(mut self, observer: impl FnMut(&Dispatched) + 'r) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Registry used for name resolution.
    #[must_use]
    pub const fn registry(&self) -> &ServiceRegistry {
        self.registry
    }

    /// Starts each service in order.
    ///
    /// # Errors
    ///
    /// Stops at the first name that cannot be resolved, dispatched, or
    /// started, returning the corresponding [`ServiceError`].
    pub fn start<S: AsRef<str>>(&mut self, names: &[S]) -> Result<Vec<Dispatched>, ServiceError> {
        let mut dispatched = Vec::with_capacity(names.len());
        for name in names {
            let service = self.registry.lookup(name.as_ref())?;
            dispatched.push(self.start_one(&service)?);
        }
        Ok(dispatched)
    }

    /// Stops each service in order, asking the confirmer whether to go on
    /// whenever a stop command fails.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Aborted`] when the operator declines to
    /// continue; no further names are processed. Resolution and dispatch
    /// errors also end the batch.
    pub fn stop<S: AsRef<str>>(&mut self, names: &[S]) -> Result<Vec<Dispatched>, ServiceError> {
        let mut dispatched = Vec::with_capacity(names.len());
        for name in names {
            let service = self.registry.lookup(name.as_ref())?;
            dispatched.push(self.stop_one(&service)?);
        }
        Ok(dispatched)
    }

    /// Restarts each service in order.
    ///
    /// Services without an atomic restart are stopped and started again,
    /// including the stop confirmation path.
    ///
    /// # Errors
    ///
    /// Returns the first [`ServiceError`] raised by any step.
    pub fn restart<S: AsRef<str>>(
        &mut self,
        names: &[S],
    ) -> Result<Vec<Dispatched>, ServiceError> {
        let mut dispatched = Vec::with_capacity(names.len());
        for name in names {
            let service = self.registry.lookup(name.as_ref())?;
            match service.restart_plan() {
                RestartPlan::Command(command) | RestartPlan::Native(command) => {
                    dispatched.push(self.run_checked(&service, Action::Restart, command)?);
                }
                RestartPlan::StopThenStart => {
                    dispatched.push(self.stop_one(&service)?);
                    dispatched.push(self.start_one(&service)?);
                }
            }
        }
        Ok(dispatched)
    }

    /// Queries each service in order. Exit codes are passed through without
    /// interpretation.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when a name cannot be resolved or the
    /// executor cannot run the command.
    pub fn status<S: AsRef<str>>(&mut self, names: &[S]) -> Result<Vec<Dispatched>, ServiceError> {
        let mut dispatched = Vec::with_capacity(names.len());
        for name in names {
            let service = self.registry.lookup(name.as_ref())?;
            dispatched.push(self.run(&service, Action::Status, service.status_command())?);
        }
        Ok(dispatched)
    }

    fn start_one(&mut self, service: &ResolvedService) -> Result<Dispatched, ServiceError> {
        self.run_checked(service, Action::Start, service.start_command())
    }

    fn stop_one(&mut self, service: &ResolvedService) -> Result<Dispatched, ServiceError> {
        let dispatched = self.run(service, Action::Stop, service.stop_command())?;
        if dispatched.output.succeeded() {
            return Ok(dispatched);
        }

        warn!(
            service = %service.name,
            command = %dispatched.command,
            status = %dispatched.output.status_text(),
            "stop command failed"
        );
        let failure = StopFailure {
            service: &service.name,
            command: &dispatched.command,
            output: &dispatched.output,
        };
        match self.confirmer.confirm(&failure) {
            Decision::Continue => Ok(dispatched),
            Decision::Abort => Err(ServiceError::Aborted {
                service: service.name.clone(),
            }),
        }
    }

    fn run_checked(
        &mut self,
        service: &ResolvedService,
        action: Action,
        command: String,
    ) -> Result<Dispatched, ServiceError> {
        let dispatched = self.run(service, action, command)?;
        if dispatched.output.succeeded() {
            return Ok(dispatched);
        }
        Err(ServiceError::CommandFailed {
            service: dispatched.service,
            action,
            command: dispatched.command,
            status_text: dispatched.output.status_text(),
            stdout: dispatched.output.stdout,
            stderr: dispatched.output.stderr,
        })
    }

    fn run(
        &mut self,
        service: &ResolvedService,
        action: Action,
        command: String,
    ) -> Result<Dispatched, ServiceError> {
        info!(service = %service.name, %action, command = %command, "dispatching");
        let output = self
            .executor
            .execute(&RemoteCommand::new(command.clone()).elevated())
            .map_err(|source| ServiceError::Dispatch {
                service: service.name.clone(),
                action,
                source,
            })?;
        let dispatched = Dispatched {
            service: service.name.clone(),
            action,
            command,
            output,
        };
        if let Some(ref mut observer) = self.observer {
            observer(&dispatched);
        }
        Ok(dispatched)
    }
}
