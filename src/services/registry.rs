//! Name-keyed service metadata with alias resolution.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, warn};

use super::descriptor::{ManagementStyle, ResolvedService, RestartSupport, ServiceDescriptor};

/// Registry key holding the descriptor used for unregistered names.
pub const DEFAULT_SERVICE: &str = "__default__";

/// Stop command for MySQL; `mysqld_safe` can outlive `service mysql stop`.
pub const MYSQL_STOP_COMMAND: &str = "service mysql stop && { killall mysqld_safe || true; }";

/// What to do when a name resolves to nothing registered.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum UnknownServicePolicy {
    /// Use the default descriptor without comment.
    #[default]
    Fallback,
    /// Use the default descriptor and log a warning.
    Warn,
    /// Refuse to act on the name.
    Reject,
}

impl FromStr for UnknownServicePolicy {
    type Err = RegistryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fallback" => Ok(Self::Fallback),
            "warn" => Ok(Self::Warn),
            "reject" => Ok(Self::Reject),
            _ => Err(RegistryError::UnknownPolicy {
                value: value.to_owned(),
            }),
        }
    }
}

impl fmt::Display for UnknownServicePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fallback => f.write_str("fallback"),
            Self::Warn => f.write_str("warn"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

/// Errors raised while registering services or resolving names.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RegistryError {
    /// Raised when an alias registration would loop back on itself.
    #[error("alias {name} -> {target} would create a cycle")]
    AliasCycle {
        /// Name being registered.
        name: String,
        /// Alias target that leads back to `name`.
        target: String,
    },
    /// Raised when an unknown-service policy tag is not recognised.
    #[error("unknown service policy {value:?}: expected fallback, warn, or reject")]
    UnknownPolicy {
        /// Offending value.
        value: String,
    },
    /// Raised under [`UnknownServicePolicy::Reject`] for unregistered names.
    #[error("unknown service {name}")]
    UnknownService {
        /// Canonical name that has no registry entry.
        name: String,
    },
}

/// Mapping from service name to [`ServiceDescriptor`].
///
/// The registry always holds a [`DEFAULT_SERVICE`] entry. It is meant to be
/// populated during start-up and shared by reference afterwards.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServiceRegistry {
    entries: BTreeMap<String, ServiceDescriptor>,
    policy: UnknownServicePolicy,
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ServiceRegistry {
    /// Registry containing only the default descriptor: legacy init style
    /// without restart support.
    #[must_use]
    pub fn empty() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            String::from(DEFAULT_SERVICE),
            ServiceDescriptor::with_style(ManagementStyle::LegacyInit)
                .restart(RestartSupport::Unsupported),
        );
        Self {
            entries,
            policy: UnknownServicePolicy::default(),
        }
    }

    /// Registry populated with the built-in service set.
    #[must_use]
    pub fn builtin() -> Self {
        let supervised = || {
            ServiceDescriptor::with_style(ManagementStyle::Supervised)
                .restart(RestartSupport::Native)
        };
        let mut registry = Self::empty();
        for (name, descriptor) in [
            ("apache", ServiceDescriptor::alias("apache2")),
            ("apache2", supervised()),
            (
                "jetty",
                ServiceDescriptor::with_style(ManagementStyle::Supervised)
                    .restart(RestartSupport::Unsupported),
            ),
            ("memcached", supervised()),
            (
                "mysql",
                ServiceDescriptor::with_style(ManagementStyle::Supervised)
                    .stop_command(MYSQL_STOP_COMMAND),
            ),
            ("nginx", supervised()),
            ("rabbitmq", ServiceDescriptor::alias("rabbitmq-server")),
            ("rabbitmq-server", supervised()),
        ] {
            registry.entries.insert(String::from(name), descriptor);
        }
        registry
    }

    /// Sets the unknown-service policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: UnknownServicePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Active unknown-service policy.
    #[must_use]
    pub const fn policy(&self) -> UnknownServicePolicy {
        self.policy
    }

    /// Inserts or replaces the entry for `name`.
    ///
    /// Accepts a full [`ServiceDescriptor`] or a bare [`ManagementStyle`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AliasCycle`] when the descriptor aliases a
    /// name that resolves back to `name`. The registry is left unchanged.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        descriptor: impl Into<ServiceDescriptor>,
    ) -> Result<(), RegistryError> {
        let service = name.into();
        let entry = descriptor.into();
        if let Some(ref target) = entry.alias_of
            && self.alias_path(target).contains(&service)
        {
            return Err(RegistryError::AliasCycle {
                name: service,
                target: target.clone(),
            });
        }
        debug!(service = %service, ?entry, "registering service");
        self.entries.insert(service, entry);
        Ok(())
    }

    /// Descriptor registered under `name`, without alias resolution.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.entries.get(name)
    }

    /// Registered names in sorted order, excluding the default entry.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .keys()
            .map(String::as_str)
            .filter(|name| *name != DEFAULT_SERVICE)
    }

    /// Follows `alias_of` links from `name` and returns the terminal name.
    ///
    /// Unregistered names resolve to themselves.
    #[must_use]
    pub fn resolve_name(&self, name: &str) -> String {
        self.alias_path(name)
            .last()
            .cloned()
            .unwrap_or_else(|| name.to_owned())
    }

    /// Resolves `name` and merges its descriptor with the default.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownService`] when the canonical name is
    /// unregistered and the policy is [`UnknownServicePolicy::Reject`].
    pub fn lookup(&self, name: &str) -> Result<ResolvedService, RegistryError> {
        let canonical = self.resolve_name(name);
        let default = self.default_descriptor();
        let own = self.entries.get(&canonical);
        if own.is_none() {
            match self.policy {
                UnknownServicePolicy::Fallback => {}
                UnknownServicePolicy::Warn => {
                    warn!(service = %canonical, "service is not registered; using defaults");
                }
                UnknownServicePolicy::Reject => {
                    return Err(RegistryError::UnknownService { name: canonical });
                }
            }
        }
        let entry = own.unwrap_or(default);

        let resolved = ResolvedService {
            requested: name.to_owned(),
            style: entry
                .style
                .or(default.style)
                .unwrap_or(ManagementStyle::LegacyInit),
            restart: entry
                .restart
                .clone()
                .or_else(|| default.restart.clone())
                .unwrap_or(RestartSupport::Unsupported),
            custom_stop: entry
                .stop_command
                .clone()
                .or_else(|| default.stop_command.clone()),
            registered: own.is_some(),
            name: canonical,
        };
        debug!(?resolved, "resolved service");
        Ok(resolved)
    }

    fn default_descriptor(&self) -> &ServiceDescriptor {
        self.entries
            .get(DEFAULT_SERVICE)
            .unwrap_or(&FALLBACK_DESCRIPTOR)
    }

    /// Names visited while following aliases from `name`, starting with
    /// `name` itself. Stops at the first repeated name.
    fn alias_path(&self, name: &str) -> Vec<String> {
        let mut path = vec![name.to_owned()];
        let mut seen = BTreeSet::from([name.to_owned()]);
        let mut current = name;
        while let Some(next) = self
            .entries
            .get(current)
            .and_then(|entry| entry.alias_of.as_deref())
        {
            if !seen.insert(next.to_owned()) {
                warn!(service = %name, alias = %next, "alias cycle detected");
                break;
            }
            path.push(next.to_owned());
            current = next;
        }
        path
    }
}

static FALLBACK_DESCRIPTOR: ServiceDescriptor =
    ServiceDescriptor::with_style(ManagementStyle::LegacyInit);
