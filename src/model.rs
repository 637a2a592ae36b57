use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

mod config;
pub use self::config::*;

/// Longest token lifetime accepted from the server (one year).
pub const MAX_EXPIRES_IN_SECS: i64 = 366 * 24 * 60 * 60;

/// Access/refresh credentials as held by a [`crate::store::TokenStore`].
///
/// The fields are only ever replaced together; `expires_at` is derived from the
/// server-declared lifetime at issuance and never extended locally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialBundle {
    pub access_token: String,
    pub id_token: Option<String>,
    pub refresh_token: String,
    pub expires_at: OffsetDateTime,
}

impl CredentialBundle {
    /// Builds a bundle from a freshly issued grant, expiring `expires_in` seconds
    /// after `now`. The instant is truncated to millisecond precision, which is
    /// what the store persists. Lifetimes are clamped to
    /// `0..=MAX_EXPIRES_IN_SECS`.
    pub fn from_grant(grant: &TokenGrant, now: OffsetDateTime) -> Self {
        let lifetime = time::Duration::seconds(grant.expires_in.clamp(0, MAX_EXPIRES_IN_SECS));
        let expires_at = now.checked_add(lifetime).unwrap_or(now);
        let expires_at = from_epoch_millis(epoch_millis(expires_at)).unwrap_or(expires_at);
        Self {
            access_token: grant.access_token.clone(),
            id_token: Some(grant.id_token.clone()),
            refresh_token: grant.refresh_token.clone(),
            expires_at,
        }
    }
}

/// Token set returned by `/login` and `/refresh`. All four fields are required.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

impl TokenGrant {
    /// Parses a grant out of a response body, rejecting bodies that lack any of
    /// the four fields or carry empty values.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, String> {
        let grant: TokenGrant =
            serde_json::from_value(value.clone()).map_err(|err| err.to_string())?;
        if grant.access_token.is_empty()
            || grant.id_token.is_empty()
            || grant.refresh_token.is_empty()
        {
            return Err("empty token field".to_string());
        }
        if !(1..=MAX_EXPIRES_IN_SECS).contains(&grant.expires_in) {
            return Err(format!("expires_in {} out of range", grant.expires_in));
        }
        Ok(grant)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,

    #[serde(default)]
    pub email_verified: bool,

    #[serde(default)]
    pub name: String,
}

/// Body shared by most auth-service endpoints.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

impl AuthResponse {
    /// Returns the token grant when the response carries a complete one.
    pub fn grant(&self) -> Option<TokenGrant> {
        let grant = TokenGrant {
            access_token: self.access_token.clone().filter(|s| !s.is_empty())?,
            id_token: self.id_token.clone().filter(|s| !s.is_empty())?,
            refresh_token: self.refresh_token.clone().filter(|s| !s.is_empty())?,
            expires_in: self
                .expires_in
                .filter(|n| (1..=MAX_EXPIRES_IN_SECS).contains(n))?,
        };
        Some(grant)
    }
}

pub fn epoch_millis(t: OffsetDateTime) -> i64 {
    (t.unix_timestamp_nanos() / 1_000_000) as i64
}

pub fn from_epoch_millis(ms: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(ms as i128 * 1_000_000).ok()
}
