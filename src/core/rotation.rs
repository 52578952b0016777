//! Token rotation.
//!
//! A live drive connection can replace its own token in the middle of a
//! remote call, for example when the access token expires and the connection
//! refreshes it transparently. The replacement has to reach the
//! [`TokenStore`](crate::core::storage::TokenStore) or the next restart would
//! resurrect the stale token.
//!
//! Rotations are handled with an event channel:
//!
//! - Every connection is handed a [`RotationHook`] bound to its identity.
//! - The hook turns each replacement token into an [`Event`] and sends it
//!   through the channel.
//! - The [`Keeper`] runs an event listener that receives the events and
//!   writes them through the token store.
//!
//! ```text
//! drive connection -> RotationHook -> channel -> event listener -> TokenStore
//! ```
//!
//! Events for one identity are delivered in the order they were sent, so a
//! later rotation always overwrites an earlier one. Sending never makes the
//! remote call that triggered the rotation fail: if the event cannot be
//! delivered or persisted the problem is logged and the connection keeps
//! working with its in-memory token.
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::auth::{Token, UserId};
use crate::core::storage::TokenStore;

const CHANNEL_BUFFER_SIZE: usize = 65_535;

/// A token replacement announced by a live drive connection.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Event {
    pub user_id: UserId,
    pub token: Token,
}

/// The handle a drive connection uses to announce token replacements for its
/// identity.
#[derive(Clone)]
pub struct RotationHook {
    user_id: UserId,
    sender: mpsc::Sender<Event>,
}

impl RotationHook {
    #[must_use]
    pub fn new(user_id: UserId, sender: mpsc::Sender<Event>) -> Self {
        Self { user_id, sender }
    }

    /// Announces a replacement token for this hook's identity.
    ///
    /// Delivery failures are logged and swallowed. The connection already
    /// holds the new token in memory, so the caller's remote call must not
    /// fail because persistence lagged behind.
    pub async fn notify(&self, token: Token) {
        let event = Event {
            user_id: self.user_id.clone(),
            token,
        };

        if self.sender.send(event).await.is_err() {
            warn!("the rotation listener is gone; a rotated token for {} will not be persisted", self.user_id);
        }
    }
}

/// The service responsible for keeping rotated tokens persisted.
///
/// It owns the token store handle and spawns the event listener that writes
/// every received rotation through it.
pub struct Keeper {
    pub store: Arc<TokenStore>,
}

impl Keeper {
    #[must_use]
    pub fn new(store: Arc<TokenStore>) -> Self {
        Self { store }
    }

    /// Starts the event listener and returns the sending half of its channel.
    ///
    /// The returned sender is what [`RotationHook`]s are built from. The
    /// listener stops when the last sender is dropped.
    #[must_use]
    pub fn run_event_listener(&self) -> mpsc::Sender<Event> {
        let (sender, receiver) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let store = self.store.clone();

        tokio::spawn(async move { event_listener(receiver, store).await });

        sender
    }
}

async fn event_listener(mut receiver: mpsc::Receiver<Event>, store: Arc<TokenStore>) {
    while let Some(event) = receiver.recv().await {
        event_handler(event, &store).await;
    }
}

async fn event_handler(event: Event, store: &TokenStore) {
    debug!("persisting a rotated token for {}", event.user_id);

    if let Err(err) = store.save(&event.user_id, &event.token).await {
        warn!("failed to persist a rotated token for {}: {err}", event.user_id);
    }
}

#[cfg(test)]
mod tests {

    mod the_rotation_keeper {
        use std::sync::Arc;
        use std::time::Duration;

        use crate::core::auth::{Token, UserId};
        use crate::core::rotation::{event_handler, Event, Keeper, RotationHook};
        use crate::core::storage::TokenStore;

        fn ephemeral_store() -> Arc<TokenStore> {
            let config = seedbox_gateway_test_helpers::configuration::ephemeral();
            Arc::new(TokenStore::new(&config.core.token_file))
        }

        #[tokio::test]
        async fn should_persist_the_token_carried_by_an_event() {
            let store = ephemeral_store();
            let user_id = UserId::from("alice");

            let event = Event {
                user_id: user_id.clone(),
                token: Token::new("rotated-token"),
            };

            event_handler(event, &store).await;

            assert_eq!(store.load(&user_id).await, Some(Token::new("rotated-token")));
        }

        #[tokio::test]
        async fn should_overwrite_an_earlier_rotation_with_a_later_one() {
            let store = ephemeral_store();
            let user_id = UserId::from("alice");

            event_handler(
                Event {
                    user_id: user_id.clone(),
                    token: Token::new("first"),
                },
                &store,
            )
            .await;
            event_handler(
                Event {
                    user_id: user_id.clone(),
                    token: Token::new("second"),
                },
                &store,
            )
            .await;

            assert_eq!(store.load(&user_id).await, Some(Token::new("second")));
        }

        #[tokio::test]
        async fn should_persist_events_sent_through_a_running_listener() {
            let store = ephemeral_store();
            let user_id = UserId::from("alice");

            let keeper = Keeper::new(store.clone());
            let sender = keeper.run_event_listener();

            let hook = RotationHook::new(user_id.clone(), sender);
            hook.notify(Token::new("rotated-token")).await;

            let deadline = tokio::time::timeout(Duration::from_secs(5), async {
                loop {
                    if store.load(&user_id).await.is_some() {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            });

            deadline.await.expect("the listener should have persisted the rotation");
            assert_eq!(store.load(&user_id).await, Some(Token::new("rotated-token")));
        }
    }

    mod the_rotation_hook {
        use tokio::sync::mpsc;

        use crate::core::auth::{Token, UserId};
        use crate::core::rotation::{Event, RotationHook};

        #[tokio::test]
        async fn should_tag_every_event_with_the_identity_it_was_built_for() {
            let (sender, mut receiver) = mpsc::channel::<Event>(1);

            let hook = RotationHook::new(UserId::from("alice"), sender);
            hook.notify(Token::new("rotated-token")).await;

            let event = receiver.recv().await.unwrap();

            assert_eq!(event.user_id, UserId::from("alice"));
            assert_eq!(event.token, Token::new("rotated-token"));
        }

        #[tokio::test]
        async fn should_swallow_delivery_failures_when_the_listener_is_gone() {
            let (sender, receiver) = mpsc::channel::<Event>(1);
            drop(receiver);

            let hook = RotationHook::new(UserId::from("alice"), sender);

            // Must not panic or error; the connection keeps its token in memory.
            hook.notify(Token::new("rotated-token")).await;
        }
    }
}
