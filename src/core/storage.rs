//! The token store.
//!
//! Tokens are persisted so that sessions survive a process restart. The store
//! keeps one JSON document on disk: an object whose keys are user identities
//! and whose values are the canonical token records described in
//! [`auth`](crate::core::auth).
//!
//! The store is deliberately forgiving on the read side. A missing file means
//! "no tokens yet" and an unreadable or corrupt file is reported in the logs
//! and then treated as empty, so a damaged deployment recovers on the next
//! successful authentication instead of refusing to start. Writes, on the
//! other hand, do fail loudly: a token that cannot be persisted is a real
//! operational problem.
//!
//! Every update rewrites the whole document through a staging file that is
//! renamed over the target, and all operations are serialized internally, so
//! two identities saved concurrently never lose each other's records.
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::warn;

use crate::core::auth::{CanonicalTokenRecord, Token, UserId};

/// Durable mapping from user identity to token record, backed by a single
/// JSON file.
pub struct TokenStore {
    /// Location of the JSON document.
    path: Utf8PathBuf,
    /// Serializes every read-modify-write cycle on the document.
    lock: Mutex<()>,
}

/// Errors that can happen while persisting tokens.
#[derive(Debug, Error)]
pub enum Error {
    /// The token document could not be written or replaced on disk.
    #[error("Failed to write the token file at {path}: {source}")]
    UnwritableFile { path: Utf8PathBuf, source: io::Error },

    /// The in-memory token map could not be encoded as JSON.
    #[error("Failed to encode the token records: {source}")]
    EncodingBroken { source: serde_json::Error },
}

impl TokenStore {
    #[must_use]
    pub fn new(path: &Utf8Path) -> Self {
        Self {
            path: path.to_owned(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the stored token for the identity, if there is a usable one.
    ///
    /// Records that cannot be turned into a [`Token`] (for example, saved by
    /// an older version without an access token) are skipped as if they were
    /// not there.
    pub async fn load(&self, user_id: &UserId) -> Option<Token> {
        let _guard = self.lock.lock().await;

        let records = self.read_records().await;

        let record = records.get(user_id.as_str())?;

        let Value::Object(record) = record else {
            warn!("ignoring a malformed token record for {user_id} in {}", self.path);
            return None;
        };

        match Token::from_canonical_record(record) {
            Some(token) => Some(token),
            None => {
                warn!("ignoring a token record without an access token for {user_id} in {}", self.path);
                None
            }
        }
    }

    /// Inserts or replaces the record for the identity and rewrites the
    /// document.
    ///
    /// # Errors
    ///
    /// Will return an error if the updated document cannot be encoded or
    /// written to disk.
    pub async fn save(&self, user_id: &UserId, record: &dyn CanonicalTokenRecord) -> Result<(), Error> {
        let _guard = self.lock.lock().await;

        let mut records = self.read_records().await;

        records.insert(user_id.to_string(), Value::Object(record.to_canonical_record()));

        self.write_records(&records).await
    }

    /// Deletes the record for the identity. Removing an identity that has no
    /// record is not an error.
    ///
    /// # Errors
    ///
    /// Will return an error if the updated document cannot be written to disk.
    pub async fn remove(&self, user_id: &UserId) -> Result<(), Error> {
        let _guard = self.lock.lock().await;

        let mut records = self.read_records().await;

        if records.remove(user_id.as_str()).is_none() {
            return Ok(());
        }

        self.write_records(&records).await
    }

    async fn read_records(&self) -> Map<String, Value> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Map::new(),
            Err(err) => {
                warn!("could not read the token file at {}: {err}; treating it as empty", self.path);
                return Map::new();
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(Value::Object(records)) => records,
            Ok(_) | Err(_) => {
                warn!("the token file at {} is not a JSON object; treating it as empty", self.path);
                Map::new()
            }
        }
    }

    async fn write_records(&self, records: &Map<String, Value>) -> Result<(), Error> {
        let encoded = serde_json::to_vec_pretty(records).map_err(|source| Error::EncodingBroken { source })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|source| Error::UnwritableFile {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }

        // The staging file lives next to the target so the final rename stays
        // on one filesystem and readers only ever see a complete document.
        let staging = Utf8PathBuf::from(format!("{}.partial", self.path));

        tokio::fs::write(&staging, &encoded).await.map_err(|source| Error::UnwritableFile {
            path: staging.clone(),
            source,
        })?;

        tokio::fs::rename(&staging, &self.path).await.map_err(|source| Error::UnwritableFile {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {

    mod the_token_store {
        use serde_json::{json, Value};

        use crate::core::auth::{Token, UserId};
        use crate::core::storage::TokenStore;

        fn ephemeral_store() -> TokenStore {
            let config = seedbox_gateway_test_helpers::configuration::ephemeral();
            TokenStore::new(&config.core.token_file)
        }

        fn sample_token() -> Token {
            Token {
                access_token: "access-token".to_owned(),
                refresh_token: Some("refresh-token".to_owned()),
                token_type: Some("Bearer".to_owned()),
                expires_at: None,
            }
        }

        #[tokio::test]
        async fn should_not_find_anything_when_the_file_does_not_exist() {
            let store = ephemeral_store();

            assert_eq!(store.load(&UserId::from("alice")).await, None);
        }

        #[tokio::test]
        async fn should_return_a_saved_token() {
            let store = ephemeral_store();
            let user_id = UserId::from("alice");

            store.save(&user_id, &sample_token()).await.unwrap();

            assert_eq!(store.load(&user_id).await, Some(sample_token()));
        }

        #[tokio::test]
        async fn should_keep_the_records_of_other_identities_when_saving() {
            let store = ephemeral_store();

            store.save(&UserId::from("alice"), &sample_token()).await.unwrap();
            store.save(&UserId::from("bob"), &Token::new("bob-token")).await.unwrap();

            assert_eq!(store.load(&UserId::from("alice")).await, Some(sample_token()));
            assert_eq!(store.load(&UserId::from("bob")).await, Some(Token::new("bob-token")));
        }

        #[tokio::test]
        async fn should_treat_a_corrupt_file_as_if_it_were_empty() {
            let store = ephemeral_store();

            store.save(&UserId::from("alice"), &sample_token()).await.unwrap();
            std::fs::write(store.path.as_std_path(), b"not json at all {{{").unwrap();

            assert_eq!(store.load(&UserId::from("alice")).await, None);
        }

        #[tokio::test]
        async fn should_recover_from_corruption_on_the_next_save() {
            let store = ephemeral_store();
            let user_id = UserId::from("alice");

            store.save(&user_id, &sample_token()).await.unwrap();
            std::fs::write(store.path.as_std_path(), b"[1, 2, 3]").unwrap();

            store.save(&user_id, &sample_token()).await.unwrap();

            let raw = std::fs::read(store.path.as_std_path()).unwrap();
            let document: Value = serde_json::from_slice(&raw).unwrap();
            let records = document.as_object().unwrap();

            assert_eq!(records.len(), 1);
            assert_eq!(records["alice"]["access_token"], json!("access-token"));
        }

        #[tokio::test]
        async fn should_not_fail_when_removing_an_identity_that_has_no_record() {
            let store = ephemeral_store();

            assert!(store.remove(&UserId::from("nobody")).await.is_ok());
        }

        #[tokio::test]
        async fn should_remove_only_the_given_identity() {
            let store = ephemeral_store();

            store.save(&UserId::from("alice"), &sample_token()).await.unwrap();
            store.save(&UserId::from("bob"), &Token::new("bob-token")).await.unwrap();

            store.remove(&UserId::from("alice")).await.unwrap();

            assert_eq!(store.load(&UserId::from("alice")).await, None);
            assert_eq!(store.load(&UserId::from("bob")).await, Some(Token::new("bob-token")));
        }

        #[tokio::test]
        async fn should_skip_records_that_have_no_access_token() {
            let store = ephemeral_store();

            let document = json!({ "alice": { "note": "saved by an older version" } });
            std::fs::write(store.path.as_std_path(), serde_json::to_vec(&document).unwrap()).unwrap();

            assert_eq!(store.load(&UserId::from("alice")).await, None);
        }

        #[tokio::test]
        async fn should_keep_fields_it_does_not_understand_in_the_stored_record() {
            let store = ephemeral_store();
            let user_id = UserId::from("alice");

            let Value::Object(record) = json!({ "access_token": "access-token", "vendor_hint": 42 }) else {
                unreachable!()
            };

            store.save(&user_id, &record).await.unwrap();

            let raw = std::fs::read(store.path.as_std_path()).unwrap();
            let document: Value = serde_json::from_slice(&raw).unwrap();

            assert_eq!(document["alice"]["vendor_hint"], json!(42));
            assert_eq!(store.load(&user_id).await, Some(Token::new("access-token")));
        }
    }
}
