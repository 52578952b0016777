//! Gateway domain services. Transfer, folder and capacity services.
//!
//! There are three groups of services:
//!
//! - [Transfer services](crate::core::services::transfer): submitting torrents to the drive and reconciling their completion.
//! - [Folder services](crate::core::services::folder): enumerating stored content and resolving download links.
//! - [Capacity services](crate::core::services::capacity): checking the space left on the drive.
//!
//! All of them operate on a [`Session`](crate::core::session::Session)
//! obtained from the [`SessionManager`](crate::core::SessionManager).
pub mod capacity;
pub mod folder;
pub mod transfer;

use std::sync::Arc;

use seedbox_gateway_configuration::Configuration;

use crate::core::drive::Connector;
use crate::core::rotation;
use crate::core::storage::TokenStore;
use crate::core::SessionManager;

/// It returns a new session manager building its dependencies.
///
/// The token store and the rotation keeper are built from the configuration,
/// the keeper's event listener is started, and the manager is wired to both.
///
/// Must be called from within a tokio runtime, because it spawns the rotation
/// event listener.
#[must_use]
pub fn manager_factory(config: &Configuration, connector: Arc<dyn Connector>) -> SessionManager {
    // Initialize token persistence
    let store = Arc::new(TokenStore::new(&config.core.token_file));

    // Initialize rotation handling
    let keeper = rotation::Keeper::new(store.clone());
    let rotation_sender = keeper.run_event_listener();

    SessionManager::new(config, connector, store, rotation_sender)
}
