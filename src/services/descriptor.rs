//! Service metadata and the command strings derived from it.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// How a service is controlled on the remote host.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum ManagementStyle {
    /// A unified control command: `service <name> start|stop|restart|status`.
    #[serde(alias = "service")]
    Supervised,
    /// Separate top-level commands (`start <name>`, `stop <name>`,
    /// `status <name>`) with no restart subcommand.
    #[serde(alias = "upstart", alias = "legacy_init")]
    LegacyInit,
}

impl ManagementStyle {
    /// Command that starts `name`.
    #[must_use]
    pub fn start_command(self, name: &str) -> String {
        match self {
            Self::Supervised => format!("service {name} start"),
            Self::LegacyInit => format!("start {name}"),
        }
    }

    /// Command that stops `name`.
    #[must_use]
    pub fn stop_command(self, name: &str) -> String {
        match self {
            Self::Supervised => format!("service {name} stop"),
            Self::LegacyInit => format!("stop {name}"),
        }
    }

    /// Command that queries the status of `name`.
    #[must_use]
    pub fn status_command(self, name: &str) -> String {
        match self {
            Self::Supervised => format!("service {name} status"),
            Self::LegacyInit => format!("status {name}"),
        }
    }

    /// Atomic restart command, when the style has one.
    #[must_use]
    pub fn restart_command(self, name: &str) -> Option<String> {
        match self {
            Self::Supervised => Some(format!("service {name} restart")),
            Self::LegacyInit => None,
        }
    }
}

impl fmt::Display for ManagementStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Supervised => f.write_str("service"),
            Self::LegacyInit => f.write_str("upstart"),
        }
    }
}

/// Raised when a style tag is not recognised.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unknown management style {0:?}: expected service or upstart")]
pub struct UnknownStyle(pub String);

impl FromStr for ManagementStyle {
    type Err = UnknownStyle;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "service" | "supervised" => Ok(Self::Supervised),
            "upstart" | "legacy-init" | "legacy_init" => Ok(Self::LegacyInit),
            _ => Err(UnknownStyle(value.to_owned())),
        }
    }
}

/// Whether and how a service can be restarted in one step.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RestartSupport {
    /// No atomic restart; restarting means stop followed by start.
    Unsupported,
    /// The management style's own restart command is used.
    Native,
    /// A literal command that restarts the service.
    Command(String),
}

impl<'de> Deserialize<'de> for RestartSupport {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Command(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Flag(true) => Self::Native,
            Raw::Flag(false) => Self::Unsupported,
            Raw::Command(command) => Self::Command(command),
        })
    }
}

/// Management metadata registered for one service name.
///
/// Unset fields inherit from the registry's default descriptor. An alias
/// descriptor only carries `alias_of`; its other fields are never consulted.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceDescriptor {
    /// Management style, or `None` to inherit the default.
    pub style: Option<ManagementStyle>,
    /// Name this entry is an alias for.
    pub alias_of: Option<String>,
    /// Restart capability, or `None` to inherit the default.
    pub restart: Option<RestartSupport>,
    /// Literal stop command replacing the style default.
    pub stop_command: Option<String>,
}

impl ServiceDescriptor {
    /// Descriptor with only a management style set.
    #[must_use]
    pub const fn with_style(style: ManagementStyle) -> Self {
        Self {
            style: Some(style),
            alias_of: None,
            restart: None,
            stop_command: None,
        }
    }

    /// Descriptor that redirects lookups to `target`.
    #[must_use]
    pub fn alias(target: impl Into<String>) -> Self {
        Self {
            alias_of: Some(target.into()),
            ..Self::default()
        }
    }

    /// Sets the restart capability.
    #[must_use]
    pub fn restart(mut self, restart: RestartSupport) -> Self {
        self.restart = Some(restart);
        self
    }

    /// Sets a literal stop command.
    #[must_use]
    pub fn stop_command(mut self, command: impl Into<String>) -> Self {
        self.stop_command = Some(command.into());
        self
    }
}

impl From<ManagementStyle> for ServiceDescriptor {
    fn from(style: ManagementStyle) -> Self {
        Self::with_style(style)
    }
}

/// How a restart of a resolved service is carried out.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RestartPlan {
    /// Run a service-specific restart command.
    Command(String),
    /// Run the management style's restart command.
    Native(String),
    /// Stop the service, then start it again.
    StopThenStart,
}

/// Effective metadata for a requested name after alias resolution and
/// inheritance from the default descriptor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedService {
    /// Name as requested by the caller.
    pub requested: String,
    /// Canonical name after following aliases.
    pub name: String,
    /// Effective management style.
    pub style: ManagementStyle,
    /// Effective restart capability.
    pub restart: RestartSupport,
    /// Literal stop command, if configured.
    pub custom_stop: Option<String>,
    /// Whether the canonical name has its own registry entry.
    pub registered: bool,
}

impl ResolvedService {
    /// Command used to start the service.
    #[must_use]
    pub fn start_command(&self) -> String {
        self.style.start_command(&self.name)
    }

    /// Command used to stop the service; the custom stop command wins.
    #[must_use]
    pub fn stop_command(&self) -> String {
        self.custom_stop
            .clone()
            .unwrap_or_else(|| self.style.stop_command(&self.name))
    }

    /// Command used to query the service status.
    #[must_use]
    pub fn status_command(&self) -> String {
        self.style.status_command(&self.name)
    }

    /// Decides how a restart is performed.
    #[must_use]
    pub fn restart_plan(&self) -> RestartPlan {
        match self.restart {
            RestartSupport::Command(ref command) => RestartPlan::Command(command.clone()),
            RestartSupport::Native => self
                .style
                .restart_command(&self.name)
                .map_or(RestartPlan::StopThenStart, RestartPlan::Native),
            RestartSupport::Unsupported => RestartPlan::StopThenStart,
        }
    }
}
