//! A live authenticated session.
use tracing::debug;

use crate::core::auth::{Token, UserId};
use crate::core::drive::Drive;

/// An authenticated handle for one user identity.
///
/// The session owns the drive connection. Callers get sessions from the
/// [`SessionManager`](crate::core::SessionManager) behind an `Arc`, use the
/// [`drive`](Session::drive) to talk to the remote side, and never close the
/// connection themselves; the manager closes it on logout.
pub struct Session {
    user_id: UserId,
    drive: Box<dyn Drive>,
}

impl Session {
    #[must_use]
    pub fn new(user_id: UserId, drive: Box<dyn Drive>) -> Self {
        Self { user_id, drive }
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// The connection to the remote drive.
    #[must_use]
    pub fn drive(&self) -> &dyn Drive {
        self.drive.as_ref()
    }

    /// The token currently backing the connection, including any rotation the
    /// drive applied since authentication.
    #[must_use]
    pub fn current_token(&self) -> Token {
        self.drive.current_token()
    }

    /// Releases the drive connection. Best effort: a failure is logged and
    /// otherwise ignored.
    pub async fn close(&self) {
        if let Err(err) = self.drive.close().await {
            debug!("closing the drive connection for {} failed: {err}", self.user_id);
        }
    }
}
