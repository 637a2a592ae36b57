//! Auth-service capability interface and its Bearer-token implementation.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::AUTHORIZATION;

use crate::error::{AuthError, RefreshError};
use crate::model::{AuthResponse, TokenGrant, User};
use crate::store::TokenStore;

mod account;
mod session;

/// What the rest of the client needs from an identity provider.
///
/// One implementation is chosen when the client is assembled; alternatives
/// are never mixed.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Signs in and, when the provider returns a full token set, persists it.
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError>;

    /// Ends the session remotely on a best-effort basis; local credentials are
    /// always cleared.
    async fn logout(&self);

    async fn current_user(&self) -> Result<User, AuthError>;

    /// Exchanges `refresh_token` for a new grant. Does not touch the store.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, RefreshError>;

    /// URL of the refresh endpoint, so callers can keep it out of
    /// refresh-on-401 handling.
    fn refresh_url(&self) -> String;
}

/// Client for the JSON auth service (`/login`, `/refresh`, `/me`, ...).
pub struct AuthServiceClient {
    base_url: String,
    store: Arc<dyn TokenStore>,
    client: reqwest::Client,
}

impl AuthServiceClient {
    pub fn new(base_url: impl Into<String>, store: Arc<dyn TokenStore>) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder().user_agent("menuum").build()?;
        Ok(Self::with_client(base_url, store, client))
    }

    pub fn with_client(
        base_url: impl Into<String>,
        store: Arc<dyn TokenStore>,
        client: reqwest::Client,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            store,
            client,
        }
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a JSON request, attaching the stored access token when present.
    async fn auth_fetch(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> reqwest::Result<reqwest::Response> {
        let mut req = self.client.request(method, self.url(path));
        if let Some(bundle) = self.store.read() {
            req = req.header(AUTHORIZATION, format!("Bearer {}", bundle.access_token));
        }
        match body {
            Some(body) => req.json(&body).send().await,
            None => {
                req.header(reqwest::header::CONTENT_TYPE, "application/json")
                    .send()
                    .await
            }
        }
    }

    async fn post(
        &self,
        path: &str,
        body: serde_json::Value,
        fallback: &str,
    ) -> Result<AuthResponse, AuthError> {
        let resp = self.auth_fetch(Method::POST, path, Some(body)).await?;
        expect_ok(resp, fallback).await
    }
}

/// Turns a non-2xx response into [`AuthError::Rejected`] and parses the rest.
async fn expect_ok(resp: reqwest::Response, fallback: &str) -> Result<AuthResponse, AuthError> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    if !status.is_success() {
        let message = serde_json::from_slice::<serde_json::Value>(&bytes)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_string());
        return Err(AuthError::Rejected {
            status: status.as_u16(),
            message,
        });
    }
    if bytes.is_empty() {
        return Ok(AuthResponse::default());
    }
    Ok(serde_json::from_slice(&bytes)?)
}
