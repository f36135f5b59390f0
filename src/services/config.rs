//! Service registry configuration and the definitions file.
//!
//! [`ServicesConfig`] is loaded via `ortho-config`. It selects the
//! unknown-service policy and optionally points at a TOML file whose
//! `[services]` table registers extra services on top of the built-in set:
//!
//! ```toml
//! [services]
//! sd-agent = "service"
//! apache = { alias_of = "apache2" }
//! tomcat = { style = "upstart", restart = "service tomcat force-reload" }
//! ```

use std::collections::BTreeMap;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use ortho_config::{OrthoConfig, toml};
use serde::Deserialize;
use thiserror::Error;

use super::descriptor::{ManagementStyle, ServiceDescriptor};
use super::registry::{RegistryError, ServiceRegistry, UnknownServicePolicy};

/// Registry settings loaded via `ortho-config`.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "GAB_SERVICES",
    discovery(
        app_name = "gab",
        env_var = "GAB_CONFIG_PATH",
        config_file_name = "gab.toml",
        dotfile_name = ".gab.toml",
        project_file_name = "gab.toml"
    )
)]
pub struct ServicesConfig {
    /// Handling of unregistered names: `fallback`, `warn`, or `reject`.
    #[ortho_config(default = "fallback".to_owned())]
    pub unknown_service_policy: String,
    /// TOML file with additional service definitions.
    pub definitions_file: Option<String>,
}

/// Errors raised while building a registry from configuration.
#[derive(Debug, Error)]
pub enum ServicesConfigError {
    /// Surfaces errors from the `ortho-config` loader.
    #[error("services configuration parsing failed: {0}")]
    Load(String),
    /// Raised when the definitions file cannot be read.
    #[error("failed to read {path}: {message}")]
    Io {
        /// Path that could not be read.
        path: Utf8PathBuf,
        /// Human-readable error message.
        message: String,
    },
    /// Raised when the definitions file is not valid.
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// Path that could not be parsed.
        path: Utf8PathBuf,
        /// Human-readable error message.
        message: String,
    },
    /// Raised when a definition is rejected by the registry.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DefinitionsFile {
    #[serde(default)]
    services: BTreeMap<String, Definition>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Definition {
    Style(ManagementStyle),
    Full(ServiceDescriptor),
}

impl From<Definition> for ServiceDescriptor {
    fn from(value: Definition) -> Self {
        match value {
            Definition::Style(style) => Self::with_style(style),
            Definition::Full(descriptor) => descriptor,
        }
    }
}

impl ServicesConfig {
    /// Loads configuration from defaults, configuration files, and
    /// environment variables without parsing process arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ServicesConfigError::Load`] when merging sources fails.
    pub fn load_without_cli_args() -> Result<Self, ServicesConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("gab")])
            .map_err(|err| ServicesConfigError::Load(err.to_string()))
    }

    /// Parsed unknown-service policy.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownPolicy`] for unrecognised values.
    pub fn policy(&self) -> Result<UnknownServicePolicy, RegistryError> {
        self.unknown_service_policy.parse()
    }

    /// Builds the built-in registry, applies the definitions file, and sets
    /// the unknown-service policy.
    ///
    /// # Errors
    ///
    /// Returns [`ServicesConfigError`] when the policy is invalid or the
    /// definitions file cannot be read, parsed, or registered.
    pub fn build_registry(&self) -> Result<ServiceRegistry, ServicesConfigError> {
        let mut registry = ServiceRegistry::builtin().with_policy(self.policy()?);
        if let Some(ref file) = self.definitions_file {
            let path = Utf8PathBuf::from(crate::remote::expand_tilde(file));
            let contents = read_definitions(&path)?;
            apply_definitions(&mut registry, &path, &contents)?;
        }
        Ok(registry)
    }
}

/// Registers every entry of a definitions document.
///
/// Entries are applied in name order, so an alias whose target is defined
/// later in the same file is still accepted as long as no cycle results.
///
/// # Errors
///
/// Returns [`ServicesConfigError::Parse`] for malformed TOML or
/// [`ServicesConfigError::Registry`] for rejected registrations.
pub fn apply_definitions(
    registry: &mut ServiceRegistry,
    path: &Utf8Path,
    contents: &str,
) -> Result<usize, ServicesConfigError> {
    let document: DefinitionsFile =
        toml::from_str(contents).map_err(|err| ServicesConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    let count = document.services.len();
    for (name, definition) in document.services {
        registry.register(name, ServiceDescriptor::from(definition))?;
    }
    Ok(count)
}

fn read_definitions(path: &Utf8Path) -> Result<String, ServicesConfigError> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_str().is_empty() => dir,
        _ => Utf8Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| ServicesConfigError::Io {
        path: path.to_path_buf(),
        message: String::from("definitions path is missing a filename"),
    })?;

    let io_error = |at: &Utf8Path, err: &io::Error| ServicesConfigError::Io {
        path: at.to_path_buf(),
        message: err.to_string(),
    };
    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|err| io_error(parent, &err))?;
    dir.read_to_string(file_name)
        .map_err(|err| io_error(path, &err))
}
