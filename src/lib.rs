//! Seedbox Gateway. A session and transfer manager for remote seedbox drives.
//!
//! A seedbox drive is a cloud service that downloads torrents on the user's
//! behalf and stores the results in folders. This crate is the domain layer a
//! client application embeds to talk to such a service: it authenticates
//! accounts, keeps their sessions and tokens alive across restarts, submits
//! transfers and reconciles their completion by polling.
//!
//! It does not ship a network transport of its own. The embedder provides a
//! [`Connector`](crate::core::drive::Connector) implementation for the
//! concrete vendor API and gets back a ready
//! [`SessionManager`](crate::core::SessionManager):
//!
//! ```text
//! let (config, manager) = bootstrap::app::setup(connector);
//!
//! let session = manager.create_from_password("alice", "s3cr3t").await?;
//! let outcome = transfer::add_and_wait(&session, source, destination, plan, rx_halt).await?;
//! ```
//!
//! # Features
//!
//! - Password, device-code, refresh-token and stored-token authentication
//! - Durable token persistence with transparent session restore
//! - Token rotation handling for drives that refresh credentials mid-call
//! - Single-tenant mode for gateways embedded in single-user applications
//! - Transfer submission with completion polling, wait budgets and caller
//!   initiated cancellation
//! - Folder enumeration with per-file download link resolution
//! - Drive capacity checks before submitting
//!
//! # Modules
//!
//! - [`core`]: the session manager, the drive abstraction and the services.
//! - [`bootstrap`]: configuration loading, logging setup and application
//!   wiring for embedders.
//!
//! # Configuration
//!
//! The gateway is configured with a TOML file, by default `./gateway.toml`:
//!
//! ```toml
//! [logging]
//! threshold = "info"
//!
//! [core]
//! token_file = "./storage/gateway/lib/tokens.json"
//! single_tenant = false
//!
//! [core.polling]
//! interval = 5
//! interval_min = 1
//! max_wait = 300
//! max_wait_ceiling = 600
//! ```
//!
//! Refer to the `seedbox-gateway-configuration` crate docs for the whole
//! configuration surface, including the environment variable overrides.
pub mod bootstrap;
pub mod core;
