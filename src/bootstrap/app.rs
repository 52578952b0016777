//! Setup for the main gateway application.
//!
//! The [`setup`] function builds everything an embedder needs: it loads the
//! configuration, initializes logging and wires a [`SessionManager`] to the
//! drive connector the embedder provides.
use std::sync::Arc;

use seedbox_gateway_configuration::{Configuration, Info};

use crate::bootstrap;
use crate::core::drive::Connector;
use crate::core::services::manager_factory;
use crate::core::SessionManager;

/// It loads the configuration from the environment and builds the session
/// manager around the given drive connector.
///
/// Must be called from within a tokio runtime.
///
/// # Panics
///
/// Will panic if the configuration cannot be loaded.
#[must_use]
pub fn setup(connector: Arc<dyn Connector>) -> (Arc<Configuration>, Arc<SessionManager>) {
    let configuration = Arc::new(initialize_configuration());
    let manager = initialize_with_configuration(&configuration, connector);

    (configuration, manager)
}

/// It builds the session manager with the given configuration, initializing
/// logging along the way.
#[must_use]
pub fn initialize_with_configuration(configuration: &Arc<Configuration>, connector: Arc<dyn Connector>) -> Arc<SessionManager> {
    initialize_logging(configuration);
    Arc::new(initialize_manager(configuration, connector))
}

/// # Panics
///
/// Will panic if it can't load the configuration from either
/// the `./gateway.toml` file or the environment variables.
#[must_use]
fn initialize_configuration() -> Configuration {
    const DEFAULT_CONFIG_TOML_PATH: &str = "./gateway.toml";

    let info = Info::new(DEFAULT_CONFIG_TOML_PATH.to_owned()).unwrap();

    Configuration::load(&info).unwrap()
}

#[must_use]
pub fn initialize_manager(config: &Arc<Configuration>, connector: Arc<dyn Connector>) -> SessionManager {
    manager_factory(config, connector)
}

pub fn initialize_logging(config: &Arc<Configuration>) {
    bootstrap::logging::setup(config);
}
