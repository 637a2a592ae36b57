//! Authenticated request dispatch with coordinated refresh-on-401.

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use time::OffsetDateTime;

use crate::auth::AuthBackend;
use crate::error::{DispatchError, RefreshError};
use crate::expiry::{DEFAULT_EXPIRY_MARGIN, is_usable};
use crate::model::CredentialBundle;
use crate::refresh::RefreshCoordinator;
use crate::store::TokenStore;

mod request;
pub use self::request::*;

/// Sends requests with the stored bearer token and recovers from expired
/// tokens with at most one refresh and one resend per request.
pub struct Dispatcher {
    client: reqwest::Client,
    store: Arc<dyn TokenStore>,
    backend: Arc<dyn AuthBackend>,
    coordinator: RefreshCoordinator,
    margin: time::Duration,
}

/// What happened to the single refresh a dispatch may attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RefreshAttempt {
    None,
    Succeeded,
    Failed,
}

impl Dispatcher {
    pub fn new(
        client: reqwest::Client,
        store: Arc<dyn TokenStore>,
        backend: Arc<dyn AuthBackend>,
    ) -> Self {
        Self {
            client,
            store,
            backend,
            coordinator: RefreshCoordinator::default(),
            margin: DEFAULT_EXPIRY_MARGIN,
        }
    }

    pub fn with_refresh_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.coordinator = RefreshCoordinator::new(timeout);
        self
    }

    pub fn with_expiry_margin(mut self, margin: time::Duration) -> Self {
        self.margin = margin;
        self
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    pub fn backend(&self) -> &Arc<dyn AuthBackend> {
        &self.backend
    }

    /// Whether the stored session can be used at `now` without refreshing.
    pub fn is_authenticated(&self, now: OffsetDateTime) -> bool {
        is_usable(self.store.read().as_ref(), now, self.margin)
    }

    /// Sends `request`, returning the server's response.
    ///
    /// A 401 triggers one coordinated refresh followed by one resend; the
    /// resend's response is returned whatever its status. If the refresh
    /// fails the store is cleared and the original 401 is returned. A failed
    /// refresh ahead of sending also clears the store, but the request still
    /// goes out with the token read before it.
    pub async fn dispatch(&self, request: &ApiRequest) -> Result<reqwest::Response, DispatchError> {
        let exempt = request.refresh_exempt || request.url == self.backend.refresh_url();
        let mut attempt = RefreshAttempt::None;
        let mut bundle = self.store.read();

        if !exempt
            && bundle.is_some()
            && !is_usable(bundle.as_ref(), OffsetDateTime::now_utc(), self.margin)
        {
            tracing::debug!(url = %request.url, "access token near expiry; refreshing first");
            match self.refresh().await {
                Ok(()) => {
                    attempt = RefreshAttempt::Succeeded;
                    bundle = self.store.read();
                }
                Err(err) => {
                    attempt = RefreshAttempt::Failed;
                    self.store.clear();
                    tracing::debug!(error = %err, "session cleared; sending with the token already read");
                }
            }
        }

        let sent = bundle.map(|b| b.access_token);
        let response = self.send(request, sent.as_deref()).await?;
        if exempt || response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::debug!(url = %request.url, "request unauthorized");
        let Some(current) = self.store.read() else {
            return Ok(response);
        };

        // Another request refreshed while this one was in flight.
        if Some(current.access_token.as_str()) != sent.as_deref()
            && is_usable(Some(&current), OffsetDateTime::now_utc(), self.margin)
        {
            return self.send(request, Some(&current.access_token)).await;
        }

        match attempt {
            RefreshAttempt::Succeeded => return Ok(response),
            RefreshAttempt::Failed => return Ok(response),
            RefreshAttempt::None => {}
        }

        match self.refresh().await {
            Ok(()) => match self.store.read() {
                Some(fresh) => self.send(request, Some(&fresh.access_token)).await,
                None => Ok(response),
            },
            Err(_) => {
                self.store.clear();
                Ok(response)
            }
        }
    }

    /// Runs a coordinated refresh and persists the new bundle before any
    /// waiter is released.
    pub async fn refresh(&self) -> Result<(), RefreshError> {
        let store = Arc::clone(&self.store);
        let backend = Arc::clone(&self.backend);
        self.coordinator
            .coordinate(move || refresh_and_store(store, backend))
            .await
    }

    async fn send(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> Result<reqwest::Response, DispatchError> {
        let mut headers = request.headers.clone();
        match &request.body {
            // Left to the transport, which adds the multipart boundary.
            RequestBody::Multipart(_) => {
                headers.remove(CONTENT_TYPE);
            }
            RequestBody::Json(_) | RequestBody::Empty => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
        }
        if let Some(token) = access_token {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => tracing::warn!("stored access token is not a valid header value"),
            }
        }

        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(headers);
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(bytes) => builder.body(bytes.clone()),
            RequestBody::Multipart(body) => builder.multipart(body.to_form()?),
        };
        Ok(builder.send().await?)
    }
}

async fn refresh_and_store(
    store: Arc<dyn TokenStore>,
    backend: Arc<dyn AuthBackend>,
) -> Result<(), RefreshError> {
    let current = store.read().ok_or(RefreshError::MissingRefreshToken)?;
    let grant = backend.refresh(&current.refresh_token).await?;
    store.write(&CredentialBundle::from_grant(
        &grant,
        OffsetDateTime::now_utc(),
    ));
    Ok(())
}
