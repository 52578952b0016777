//! The core `gateway` module contains the generic session and transfer logic which is independent of the delivery layer.
//!
//! It contains the gateway services and their dependencies. It's a domain layer which does not
//! specify how the end user should connect to the `SessionManager`.
//!
//! Typically this module is intended to be used by higher modules like:
//!
//! - An HTTP API
//! - A command line client
//! - An embedding media application
//!
//! ```text
//! Delivery layer     Domain layer         Remote side
//!
//!      HTTP API |
//!    CLI client |> Core gateway <-----> seedbox drive
//!     Media app |
//! ```
//!
//! # Table of contents
//!
//! - [Session manager](#session-manager)
//!   - [Session lifecycle](#session-lifecycle)
//!   - [Single-tenant mode](#single-tenant-mode)
//! - [Configuration](#configuration)
//! - [Services](#services)
//! - [Persistence](#persistence)
//! - [Token rotation](#token-rotation)
//!
//! # Session manager
//!
//! The [`SessionManager`] is the main struct in this module. The manager has some groups of responsibilities:
//!
//! - **Authentication**: it runs the password, device-code, refresh-token and stored-token flows against the remote drive.
//! - **Session registry**: it keeps the live sessions in memory and serves them to callers.
//! - **Persistence**: it stores every token it obtains so sessions survive a restart.
//! - **Single-tenant redirection**: when enabled, it collapses every caller identity onto one configured account.
//!
//! ## Session lifecycle
//!
//! A session is created by one of the `create_from_*` operations. Each of them authenticates
//! against the drive, registers the resulting connection in the registry and persists the
//! initial token. From then on [`get_or_restore`](SessionManager::get_or_restore) serves the
//! registered session; after a restart it re-establishes one from the stored token without
//! asking the user to authenticate again.
//!
//! ```text
//! create_from_password ─┐
//! create_from_device_code ─┤
//! create_from_refresh_token ─┼─> connect ─> register ─> persist token
//! create_from_stored_token ─┘
//!
//! get_or_restore ─> registry hit? ─> session
//!                      │ miss
//!                      └─> stored token? ─> create_from_stored_token
//! ```
//!
//! [`logout`](SessionManager::logout) ends the lifecycle: it removes the session from the
//! registry, closes the drive connection and deletes the stored token.
//!
//! ## Single-tenant mode
//!
//! A gateway embedded in a single-user application serves exactly one account. With
//! `core.single_tenant` enabled every identity resolves to the default account, and the
//! manager authenticates that account lazily with the credentials from the configuration,
//! at most once per process unless the attempt fails.
//!
//! # Configuration
//!
//! The manager is built from a [`Configuration`](seedbox_gateway_configuration::Configuration):
//! the token file location, the single-tenant switch, the optional default account and the
//! polling policy all come from there.
//!
//! # Services
//!
//! Transfer submission, completion polling, folder listing and capacity checks live in the
//! [`services`] module and operate on sessions obtained from the manager.
//!
//! # Persistence
//!
//! Tokens are the only persistent state. The [`storage::TokenStore`] keeps them in a single
//! JSON document; everything else (sessions, poll state) is in memory and rebuilt on demand.
//!
//! # Token rotation
//!
//! Drives can replace the token backing a live connection. Every connection is handed a
//! [`rotation::RotationHook`] so the replacement reaches the token store; see the
//! [`rotation`] module for the event flow.
pub mod auth;
pub mod drive;
pub mod error;
pub mod registry;
pub mod rotation;
pub mod services;
pub mod session;
pub mod storage;

use std::panic::Location;
use std::sync::Arc;

use seedbox_gateway_configuration::{Configuration, Credentials, PollPolicy};
use tokio::sync::{mpsc, Mutex};
use tracing::warn;

use crate::core::auth::{Token, UserId};
use crate::core::drive::{Connector, DeviceAuthorization, Drive};
use crate::core::error::Error;
use crate::core::registry::SessionRegistry;
use crate::core::rotation::RotationHook;
use crate::core::session::Session;
use crate::core::storage::TokenStore;

/// The single authority for obtaining a working session for an identity.
pub struct SessionManager {
    /// Whether every caller identity resolves to the default account.
    single_tenant: bool,
    /// Credentials for the default account, when configured.
    default_account: Option<Credentials>,
    /// Limits applied to caller-supplied polling parameters.
    poll_policy: PollPolicy,
    /// The authentication factory for the remote drive.
    connector: Arc<dyn Connector>,
    /// The live sessions.
    registry: SessionRegistry,
    /// Durable token persistence.
    store: Arc<TokenStore>,
    /// Sending half of the rotation keeper's channel.
    rotation: mpsc::Sender<rotation::Event>,
    /// Set once the default account has authenticated successfully.
    default_auth_done: Mutex<bool>,
}

impl SessionManager {
    /// `SessionManager` constructor.
    ///
    /// The connector, token store and rotation channel are built by
    /// [`services::manager_factory`]; tests inject their own.
    #[must_use]
    pub fn new(
        config: &Configuration,
        connector: Arc<dyn Connector>,
        store: Arc<TokenStore>,
        rotation: mpsc::Sender<rotation::Event>,
    ) -> SessionManager {
        SessionManager {
            single_tenant: config.core.single_tenant,
            default_account: config.core.default_account.clone(),
            poll_policy: config.core.polling,
            connector,
            registry: SessionRegistry::new(),
            store,
            rotation,
            default_auth_done: Mutex::new(false),
        }
    }

    /// The limits applied to caller-supplied polling parameters.
    #[must_use]
    pub fn poll_policy(&self) -> PollPolicy {
        self.poll_policy
    }

    /// The identity all registry and store operations are keyed by.
    ///
    /// In single-tenant mode every requested identity resolves to the default
    /// account; otherwise identities pass through unchanged.
    #[must_use]
    pub fn effective_user_id(&self, requested: &UserId) -> UserId {
        if self.single_tenant {
            UserId::default_account()
        } else {
            requested.clone()
        }
    }

    /// Starts the device pairing flow by requesting fresh codes from the drive.
    ///
    /// # Errors
    ///
    /// Will return a `drive::Error` if the drive cannot issue codes.
    pub async fn request_device_code(&self) -> Result<DeviceAuthorization, drive::Error> {
        self.connector.request_device_code().await
    }

    /// Opens a session by authenticating with a username and password. The
    /// session is registered under the username.
    ///
    /// # Errors
    ///
    /// Will return an `Error::AuthenticationFailed` if the drive rejects the
    /// credentials.
    pub async fn create_from_password(&self, username: &str, password: &str) -> Result<Arc<Session>, Error> {
        let user_id = self.effective_user_id(&UserId::from(username));

        let drive = self
            .connector
            .connect_with_password(username, password, self.rotation_hook_for(&user_id))
            .await
            .map_err(|source| Error::AuthenticationFailed {
                user_id: user_id.clone(),
                source,
                location: Location::caller(),
            })?;

        Ok(self.register(user_id, drive).await)
    }

    /// Opens a session by exchanging an approved device code.
    ///
    /// # Errors
    ///
    /// Will return an `Error::AuthenticationFailed` if the code is unknown,
    /// expired or not yet approved.
    pub async fn create_from_device_code(&self, device_code: &str, requested: &UserId) -> Result<Arc<Session>, Error> {
        let user_id = self.effective_user_id(requested);

        let drive = self
            .connector
            .connect_with_device_code(device_code, self.rotation_hook_for(&user_id))
            .await
            .map_err(|source| Error::AuthenticationFailed {
                user_id: user_id.clone(),
                source,
                location: Location::caller(),
            })?;

        Ok(self.register(user_id, drive).await)
    }

    /// Opens a session from a refresh token obtained in an earlier session.
    ///
    /// # Errors
    ///
    /// Will return an `Error::AuthenticationFailed` if the drive rejects the
    /// token.
    pub async fn create_from_refresh_token(&self, refresh_token: &str, requested: &UserId) -> Result<Arc<Session>, Error> {
        let user_id = self.effective_user_id(requested);

        let drive = self
            .connector
            .connect_with_refresh_token(refresh_token, self.rotation_hook_for(&user_id))
            .await
            .map_err(|source| Error::AuthenticationFailed {
                user_id: user_id.clone(),
                source,
                location: Location::caller(),
            })?;

        Ok(self.register(user_id, drive).await)
    }

    /// Re-opens a session from a previously stored token, typically after a
    /// restart.
    ///
    /// # Errors
    ///
    /// Will return an `Error::AuthenticationFailed` if the token is no longer
    /// accepted.
    pub async fn create_from_stored_token(&self, token: Token, requested: &UserId) -> Result<Arc<Session>, Error> {
        let user_id = self.effective_user_id(requested);

        let drive = self
            .connector
            .connect_with_token(token, self.rotation_hook_for(&user_id))
            .await
            .map_err(|source| Error::AuthenticationFailed {
                user_id: user_id.clone(),
                source,
                location: Location::caller(),
            })?;

        Ok(self.register(user_id, drive).await)
    }

    /// Returns a session for the identity, restoring one from the stored
    /// token when no live session exists.
    ///
    /// Returns `None` when there is nothing to restore from, or when the
    /// stored token is no longer accepted by the drive.
    pub async fn get_or_restore(&self, requested: &UserId) -> Option<Arc<Session>> {
        if self.single_tenant {
            self.initialize_default_auth().await;
        }

        let user_id = self.effective_user_id(requested);

        if let Some(session) = self.registry.get(&user_id).await {
            return Some(session);
        }

        let token = self.store.load(&user_id).await?;

        match self.create_from_stored_token(token, &user_id).await {
            Ok(session) => Some(session),
            Err(err) => {
                warn!("could not restore a session for {user_id}: {err}");
                None
            }
        }
    }

    /// Like [`get_or_restore`](SessionManager::get_or_restore), for callers
    /// that treat a missing session as an error.
    ///
    /// # Errors
    ///
    /// Will return an `Error::NotAuthenticated` if no session exists and none
    /// could be restored.
    pub async fn require(&self, requested: &UserId) -> Result<Arc<Session>, Error> {
        self.get_or_restore(requested).await.ok_or_else(|| Error::NotAuthenticated {
            user_id: self.effective_user_id(requested),
            location: Location::caller(),
        })
    }

    /// Ends the identity's session: the drive connection is closed, the
    /// registry entry removed and the stored token deleted.
    ///
    /// Logout always succeeds from the caller's perspective. Failures while
    /// closing the connection or deleting the token are logged.
    pub async fn logout(&self, requested: &UserId) {
        let user_id = self.effective_user_id(requested);

        self.registry.remove(&user_id).await;

        if let Err(err) = self.store.remove(&user_id).await {
            warn!("could not delete the stored token for {user_id}: {err}");
        }
    }

    /// Authenticates the configured default account, at most once per process.
    ///
    /// Does nothing unless single-tenant mode is enabled. On success the
    /// session is registered under the default identity and aliased under the
    /// literal username. A failed attempt is logged and retried on the next
    /// call.
    ///
    /// Returns whether the default account is authenticated.
    pub async fn initialize_default_auth(&self) -> bool {
        if !self.single_tenant {
            return false;
        }

        let mut done = self.default_auth_done.lock().await;

        if *done {
            return true;
        }

        let Some(account) = self.default_account.clone() else {
            warn!("single-tenant mode is enabled but no default account is configured");
            return false;
        };

        match self.create_from_password(&account.username, &account.password).await {
            Ok(session) => {
                // Alias under the literal username so both keys resolve.
                self.registry.put(UserId::from(account.username.as_str()), session).await;
                *done = true;
                true
            }
            Err(err) => {
                warn!("could not authenticate the default account: {err}");
                false
            }
        }
    }

    fn rotation_hook_for(&self, user_id: &UserId) -> RotationHook {
        RotationHook::new(user_id.clone(), self.rotation.clone())
    }

    /// Registers a freshly authenticated connection and persists its token.
    ///
    /// The session stays registered even when the token cannot be persisted;
    /// losing durability is better than rejecting a working authentication.
    async fn register(&self, user_id: UserId, drive: Box<dyn Drive>) -> Arc<Session> {
        let session = Arc::new(Session::new(user_id.clone(), drive));

        self.registry.put(user_id.clone(), session.clone()).await;

        let token = session.current_token();

        if let Err(err) = self.store.save(&user_id, &token).await {
            warn!("could not persist the initial token for {user_id}: {err}");
        }

        session
    }
}
