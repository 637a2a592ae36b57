//! Typed errors for the library seams. The binary wraps these in `anyhow`.

use std::time::Duration;

use thiserror::Error;

/// Why a token refresh did not produce a new bundle.
///
/// Cloned to every caller waiting on the same refresh, so it carries rendered
/// messages rather than source errors.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RefreshError {
    #[error("no refresh token available")]
    MissingRefreshToken,

    #[error("refresh request failed: {0}")]
    Transport(String),

    #[error("refresh rejected with status {0}")]
    Status(u16),

    #[error("malformed refresh response: {0}")]
    Malformed(String),

    #[error("refresh timed out after {0:?}")]
    TimedOut(Duration),

    #[error("refresh ended without an outcome")]
    Abandoned,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{message} (status {status})")]
    Rejected { status: u16, message: String },

    #[error("auth request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid auth response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Refresh(#[from] RefreshError),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("not authenticated (session expired or missing; log in again)")]
    Unauthorized,

    #[error("{message} (status {status})")]
    Status { status: u16, message: String },

    #[error("reading response body: {0}")]
    Body(#[from] reqwest::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
