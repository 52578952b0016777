//! The in-memory session registry.
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::core::auth::UserId;
use crate::core::session::Session;

/// Concurrency-safe map from user identity to live session.
///
/// The registry holds at most one session per identity; putting a new one
/// replaces the previous entry. All operations go through a single lock, so a
/// concurrent reader never observes a half-applied change.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<UserId, Arc<Session>>>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user_id: &UserId) -> Option<Arc<Session>> {
        self.sessions.read().await.get(user_id).cloned()
    }

    pub async fn put(&self, user_id: UserId, session: Arc<Session>) {
        self.sessions.write().await.insert(user_id, session);
    }

    /// Removes the identity's session, closing its drive connection.
    ///
    /// Removing an identity that has no session does nothing.
    pub async fn remove(&self, user_id: &UserId) {
        let removed = self.sessions.write().await.remove(user_id);

        // Closing happens outside the lock; it talks to the network.
        if let Some(session) = removed {
            session.close().await;
        }
    }
}

#[cfg(test)]
mod tests {

    mod the_session_registry {
        use std::sync::Arc;

        use crate::core::auth::{Token, UserId};
        use crate::core::drive::MockDrive;
        use crate::core::registry::SessionRegistry;
        use crate::core::session::Session;

        fn session_for(user_id: &UserId) -> Arc<Session> {
            let mut drive = MockDrive::new();
            drive.expect_current_token().returning(|| Token::new("access-token"));
            drive.expect_close().returning(|| Ok(()));

            Arc::new(Session::new(user_id.clone(), Box::new(drive)))
        }

        #[tokio::test]
        async fn should_return_the_session_stored_for_an_identity() {
            let registry = SessionRegistry::new();
            let user_id = UserId::from("alice");
            let session = session_for(&user_id);

            registry.put(user_id.clone(), session.clone()).await;

            let found = registry.get(&user_id).await.unwrap();

            assert!(Arc::ptr_eq(&found, &session));
        }

        #[tokio::test]
        async fn should_not_find_a_session_for_an_unknown_identity() {
            let registry = SessionRegistry::new();

            assert!(registry.get(&UserId::from("nobody")).await.is_none());
        }

        #[tokio::test]
        async fn should_replace_the_previous_session_when_putting_the_same_identity() {
            let registry = SessionRegistry::new();
            let user_id = UserId::from("alice");
            let first = session_for(&user_id);
            let second = session_for(&user_id);

            registry.put(user_id.clone(), first).await;
            registry.put(user_id.clone(), second.clone()).await;

            let found = registry.get(&user_id).await.unwrap();

            assert!(Arc::ptr_eq(&found, &second));
        }

        #[tokio::test]
        async fn should_close_the_drive_connection_when_removing_a_session() {
            let registry = SessionRegistry::new();
            let user_id = UserId::from("alice");

            let mut drive = MockDrive::new();
            drive.expect_close().times(1).returning(|| Ok(()));
            let session = Arc::new(Session::new(user_id.clone(), Box::new(drive)));

            registry.put(user_id.clone(), session).await;
            registry.remove(&user_id).await;

            assert!(registry.get(&user_id).await.is_none());
        }

        #[tokio::test]
        async fn should_do_nothing_when_removing_an_identity_that_has_no_session() {
            let registry = SessionRegistry::new();

            registry.remove(&UserId::from("nobody")).await;
        }
    }
}
