//! Client for the meal-plan backend REST API. Every call goes through the
//! [`Dispatcher`], so expired tokens are refreshed transparently.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::dispatch::{ApiRequest, Dispatcher};
use crate::error::ApiError;

mod menus;
mod profile;
mod subscription;
mod types;
pub use self::types::*;

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    dispatcher: Arc<Dispatcher>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, dispatcher: Arc<Dispatcher>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    /// Dispatches and returns status and body, leaving status policy to the
    /// caller except for authorization failure.
    async fn execute_raw(&self, request: &ApiRequest) -> Result<(StatusCode, Vec<u8>), ApiError> {
        let resp = self.dispatcher.dispatch(request).await?;
        let status = resp.status();
        let body = resp.bytes().await?.to_vec();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        Ok((status, body))
    }

    async fn execute(&self, request: &ApiRequest, fallback: &str) -> Result<Vec<u8>, ApiError> {
        let (status, body) = self.execute_raw(request).await?;
        if !status.is_success() {
            return Err(status_error(status, &body, fallback));
        }
        Ok(body)
    }
}

fn status_error(status: StatusCode, body: &[u8], fallback: &str) -> ApiError {
    ApiError::Status {
        status: status.as_u16(),
        message: error_message(body).unwrap_or_else(|| fallback.to_string()),
    }
}

/// Pulls a human-readable message out of an error body. The backend uses
/// `error` (string or `{message}`), `message` or `detail` depending on the
/// endpoint.
pub fn error_message(body: &[u8]) -> Option<String> {
    let v: serde_json::Value = serde_json::from_slice(body).ok()?;
    let error = v.get("error");
    error
        .and_then(|e| e.as_str())
        .or_else(|| error.and_then(|e| e.get("message")).and_then(|m| m.as_str()))
        .or_else(|| v.get("message").and_then(|m| m.as_str()))
        .or_else(|| v.get("detail").and_then(|m| m.as_str()))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    Ok(serde_json::from_slice(body)?)
}

/// Unwraps the `{ "data": ... }` envelope some endpoints use.
fn decode_data<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    #[derive(serde::Deserialize)]
    struct Envelope<T> {
        data: T,
    }
    let envelope: Envelope<T> = serde_json::from_slice(body)?;
    Ok(envelope.data)
}
