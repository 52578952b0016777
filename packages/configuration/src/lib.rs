//! Configuration data structures for [Seedbox Gateway](https://docs.rs/seedbox-gateway).
//!
//! This module contains the configuration data structures for the Seedbox
//! Gateway, the session and transfer reconciliation core for remote
//! seedbox drives.
//!
//! The configuration is loaded from a TOML file, optionally overridden by
//! environment variables.
pub mod core;
pub mod logging;

use std::env;

use derive_more::Constructor;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crate::core::Core;
pub use crate::logging::{Logging, Style, Threshold};

// Environment variables

/// The whole `gateway.toml` file content. It has priority over the config
/// file. Even if the file is not on the default path.
const ENV_VAR_CONFIG_TOML: &str = "SEEDBOX_GATEWAY_CONFIG_TOML";

/// The `gateway.toml` file location.
pub const ENV_VAR_CONFIG_TOML_PATH: &str = "SEEDBOX_GATEWAY_CONFIG_TOML_PATH";

/// Prefix for overriding a single setting, e.g.
/// `SEEDBOX_GATEWAY_CONFIG_OVERRIDE_CORE__SINGLE_TENANT=true`.
const CONFIG_OVERRIDE_PREFIX: &str = "SEEDBOX_GATEWAY_CONFIG_OVERRIDE_";

/// Separator between nested sections in an override variable name.
const CONFIG_OVERRIDE_SEPARATOR: &str = "__";

/// Information required for loading the configuration.
#[derive(Debug, Default, Clone)]
pub struct Info {
    config_toml: Option<String>,
    config_toml_path: String,
}

impl Info {
    /// Build the configuration `Info`.
    ///
    /// # Errors
    ///
    /// Will return `Err` if unable to obtain a configuration.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(default_config_toml_path: String) -> Result<Self, Error> {
        let config_toml = if let Ok(config_toml) = env::var(ENV_VAR_CONFIG_TOML) {
            println!("Loading extra configuration from environment variable:\n {config_toml}");
            Some(config_toml)
        } else {
            None
        };

        let config_toml_path = if let Ok(config_toml_path) = env::var(ENV_VAR_CONFIG_TOML_PATH) {
            println!("Loading extra configuration from file: `{config_toml_path}` ...");
            config_toml_path
        } else {
            println!("Loading extra configuration from default configuration file: `{default_config_toml_path}` ...");
            default_config_toml_path
        };

        Ok(Self {
            config_toml,
            config_toml_path,
        })
    }
}

/// Policy for the transfer completion poll loop.
///
/// All values are in seconds. Callers of the "submit and wait" operation
/// may pass their own interval and wait budget; both are clamped against
/// this policy before the loop starts.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Copy, Constructor)]
pub struct PollPolicy {
    /// Interval between two status polls when the caller does not specify
    /// one.
    #[serde(default = "PollPolicy::default_interval")]
    pub interval: u32,

    /// Shortest allowed poll interval. Caller-supplied intervals below
    /// this floor are raised to it so the remote service is not hammered.
    #[serde(default = "PollPolicy::default_interval_min")]
    pub interval_min: u32,

    /// Wait budget for "submit and wait" when the caller does not specify
    /// one.
    #[serde(default = "PollPolicy::default_max_wait")]
    pub max_wait: u32,

    /// Hard ceiling on the wait budget. Caller-supplied budgets above this
    /// value are capped, regardless of what the caller asked for.
    #[serde(default = "PollPolicy::default_max_wait_ceiling")]
    pub max_wait_ceiling: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Self::default_interval(),
            interval_min: Self::default_interval_min(),
            max_wait: Self::default_max_wait(),
            max_wait_ceiling: Self::default_max_wait_ceiling(),
        }
    }
}

impl PollPolicy {
    fn default_interval() -> u32 {
        5
    }

    fn default_interval_min() -> u32 {
        1
    }

    fn default_max_wait() -> u32 {
        300
    }

    fn default_max_wait_ceiling() -> u32 {
        600
    }
}

/// Credentials for the fixed default account used in single-tenant mode.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Constructor)]
pub struct Credentials {
    /// Account username. Most drives use an email address here.
    pub username: String,

    /// Account password.
    pub password: String,
}

/// Errors that can occur when loading the configuration.
#[derive(Error, Debug)]
pub enum Error {
    /// Unable to load the configuration from the configuration file.
    #[error("Failed processing the configuration: {source}")]
    ConfigError { source: figment::Error },
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigError { source: err }
    }
}

/// The whole configuration for the gateway.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Default)]
pub struct Configuration {
    /// Logging configuration.
    #[serde(default)]
    pub logging: Logging,

    /// The gateway core configuration.
    #[serde(default)]
    pub core: Core,
}

impl Configuration {
    /// Loads the configuration from the configuration file.
    ///
    /// # Errors
    ///
    /// Will return `Err` if `path` does not exist or has a bad configuration.
    pub fn load_from_file(path: &str) -> Result<Configuration, Error> {
        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(CONFIG_OVERRIDE_PREFIX).split(CONFIG_OVERRIDE_SEPARATOR));

        let config: Configuration = figment.extract()?;

        Ok(config)
    }

    /// Loads the configuration from the [`Info`] struct. The whole
    /// configuration in TOML format is included in the `info.config_toml`
    /// string, when present; otherwise it is read from the file at
    /// `info.config_toml_path`.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the TOML is invalid or has a bad configuration.
    pub fn load(info: &Info) -> Result<Configuration, Error> {
        let figment = if let Some(config_toml) = &info.config_toml {
            Figment::new().merge(Toml::string(config_toml))
        } else {
            Figment::new().merge(Toml::file(&info.config_toml_path))
        }
        .merge(Env::prefixed(CONFIG_OVERRIDE_PREFIX).split(CONFIG_OVERRIDE_SEPARATOR));

        let config: Configuration = figment.extract()?;

        Ok(config)
    }

    /// Saves the configuration to the configuration file.
    ///
    /// # Errors
    ///
    /// Will return `Err` if `path` is not a valid path or the configuration
    /// file cannot be created.
    ///
    /// # Panics
    ///
    /// Will panic if the configuration cannot be written into the file.
    pub fn save_to_file(&self, path: &str) -> Result<(), Error> {
        std::fs::write(path, self.to_toml()).expect("Could not write to file!");
        Ok(())
    }

    /// Encodes the configuration to TOML.
    fn to_toml(&self) -> String {
        toml::to_string(self).expect("Could not encode TOML value")
    }
}
