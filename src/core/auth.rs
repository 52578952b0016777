//! Gateway authentication structs.
//!
//! This module contains the types a session is built from: the [`UserId`]
//! under which sessions and tokens are stored, the [`Token`] credential
//! bundle the remote drive hands back after authenticating, and the
//! [`CanonicalTokenRecord`] capability that normalizes token-adjacent
//! values into the plain JSON objects the token store persists.
//!
//! A token belongs to exactly one identity. It is only ever replaced as a
//! whole: either by a fresh authentication or by the drive silently
//! rotating it (see [`rotation`](crate::core::rotation)).
use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The identity under which a session and its token are stored and looked
/// up. A username or an opaque user id.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone, Display, Hash)]
pub struct UserId(String);

/// The fixed identity every lookup resolves to in single-tenant mode.
const DEFAULT_ACCOUNT: &str = "default";

impl UserId {
    /// The fixed `default` identity used in single-tenant mode.
    #[must_use]
    pub fn default_account() -> Self {
        Self(DEFAULT_ACCOUNT.to_owned())
    }

    /// Whether this is the fixed `default` identity.
    #[must_use]
    pub fn is_default_account(&self) -> bool {
        self.0 == DEFAULT_ACCOUNT
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The credential bundle backing a session, persisted across process
/// restarts.
///
/// Only `access_token` is mandatory; drives differ in what else they
/// return. The expiry is absolute so that a restored token can still be
/// judged after a restart.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone)]
pub struct Token {
    /// Bearer token presented to the drive on every call.
    pub access_token: String,

    /// Credential the drive uses to mint a new access token when the
    /// current one expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Usually `Bearer`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Absolute expiry of the access token, when the drive reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Token {
    /// A token carrying only an access token.
    #[must_use]
    pub fn new(access_token: &str) -> Self {
        Self {
            access_token: access_token.to_owned(),
            refresh_token: None,
            token_type: None,
            expires_at: None,
        }
    }

    /// Best-effort extraction of a token from a stored record.
    ///
    /// Returns `None` when the essential `access_token` field is missing
    /// or not a string. All other fields are optional and ignored when
    /// they have an unexpected shape, so records written by older or
    /// foreign writers still restore.
    #[must_use]
    pub fn from_canonical_record(record: &Map<String, Value>) -> Option<Self> {
        let access_token = record.get("access_token")?.as_str()?.to_owned();

        let refresh_token = record.get("refresh_token").and_then(Value::as_str).map(ToOwned::to_owned);
        let token_type = record.get("token_type").and_then(Value::as_str).map(ToOwned::to_owned);
        let expires_at = record
            .get("expires_at")
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|parsed| parsed.with_timezone(&Utc));

        Some(Self {
            access_token,
            refresh_token,
            token_type,
            expires_at,
        })
    }
}

/// Conversion into the plain JSON object the token store persists.
///
/// Tokens reach the store either as typed [`Token`] bundles or as raw
/// records already shaped like the file contents; both normalize through
/// this capability instead of relying on runtime introspection.
pub trait CanonicalTokenRecord: Send + Sync {
    /// Returns the value as a plain JSON object.
    fn to_canonical_record(&self) -> Map<String, Value>;
}

impl CanonicalTokenRecord for Token {
    fn to_canonical_record(&self) -> Map<String, Value> {
        if let Ok(Value::Object(record)) = serde_json::to_value(self) {
            record
        } else {
            Map::new()
        }
    }
}

impl CanonicalTokenRecord for Map<String, Value> {
    fn to_canonical_record(&self) -> Map<String, Value> {
        self.clone()
    }
}
