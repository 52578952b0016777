//! Errors returned by the core `SessionManager`.
//!
//! Error | Context | Description
//! ---|---|---
//! `AuthenticationFailed` | Authentication | The remote drive rejected an attempt to open a session for the identity.
//! `NotAuthenticated` | Session lookup | No live session exists for the identity and none could be restored from the stored tokens.
//!
use std::panic::Location;

use crate::core::auth::UserId;
use crate::core::drive;

/// Session error returned by the core `SessionManager`.
#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    #[error("Authentication failed for {user_id}: {source}, {location}")]
    AuthenticationFailed {
        user_id: UserId,
        source: drive::Error,
        location: &'static Location<'static>,
    },

    #[error("No authenticated session for {user_id}, {location}")]
    NotAuthenticated {
        user_id: UserId,
        location: &'static Location<'static>,
    },
}
