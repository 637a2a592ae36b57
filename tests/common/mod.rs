#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use time::OffsetDateTime;

use menuum_client::api::ApiClient;
use menuum_client::auth::AuthServiceClient;
use menuum_client::dispatch::Dispatcher;
use menuum_client::model::CredentialBundle;
use menuum_client::store::{MemoryTokenStore, TokenStore};

/// How the fake `/auth/refresh` answers.
#[derive(Clone, Debug)]
pub enum RefreshMode {
    Issue {
        access_token: String,
        refresh_token: String,
        expires_in: i64,
    },
    Status(u16),
    Malformed,
}

pub struct FakeBackend {
    accepted: Mutex<HashSet<String>>,
    refresh_mode: Mutex<RefreshMode>,
    refresh_delay: Mutex<Duration>,
    refresh_calls: AtomicUsize,
    refresh_tokens_seen: Mutex<Vec<String>>,
    authorizations: Mutex<Vec<String>>,
    content_types: Mutex<Vec<String>>,
    logout_calls: AtomicUsize,
}

impl FakeBackend {
    fn new() -> Self {
        Self {
            accepted: Mutex::new(HashSet::new()),
            refresh_mode: Mutex::new(RefreshMode::Issue {
                access_token: "A2".to_string(),
                refresh_token: "R2".to_string(),
                expires_in: 3600,
            }),
            refresh_delay: Mutex::new(Duration::ZERO),
            refresh_calls: AtomicUsize::new(0),
            refresh_tokens_seen: Mutex::new(Vec::new()),
            authorizations: Mutex::new(Vec::new()),
            content_types: Mutex::new(Vec::new()),
            logout_calls: AtomicUsize::new(0),
        }
    }

    pub fn accept(&self, token: &str) {
        self.accepted.lock().unwrap().insert(token.to_string());
    }

    pub fn set_refresh_mode(&self, mode: RefreshMode) {
        *self.refresh_mode.lock().unwrap() = mode;
    }

    pub fn set_refresh_delay(&self, delay: Duration) {
        *self.refresh_delay.lock().unwrap() = delay;
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_tokens_seen(&self) -> Vec<String> {
        self.refresh_tokens_seen.lock().unwrap().clone()
    }

    /// `Authorization` headers seen by the API routes, in arrival order.
    pub fn authorizations(&self) -> Vec<String> {
        self.authorizations.lock().unwrap().clone()
    }

    pub fn content_types(&self) -> Vec<String> {
        self.content_types.lock().unwrap().clone()
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }
}

pub struct ServerGuard {
    pub base_url: String,
    pub backend: Arc<FakeBackend>,
    task: tokio::task::JoinHandle<()>,
}

impl Drop for ServerGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl ServerGuard {
    pub fn auth_url(&self) -> String {
        format!("{}/auth", self.base_url)
    }
}

pub async fn spawn_server() -> Result<ServerGuard> {
    let backend = Arc::new(FakeBackend::new());

    let api = Router::new()
        .route("/api/v1/menu/history", get(menu_history))
        .route("/api/v1/menu", post(create_menu))
        .route("/api/v1/menu/:id", get(menu))
        .route("/api/v1/profile", get(profile))
        .route("/api/v1/profile/avatar", post(upload_avatar))
        .route("/api/v1/subscription/status", get(subscription_status))
        .route("/api/v1/always-unauthorized", get(always_unauthorized))
        .layer(middleware::from_fn_with_state(
            backend.clone(),
            record_and_require_bearer,
        ));

    let app = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/api/v1/public", get(|| async { "public" }))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/auth/refresh", post(refresh))
        .merge(api)
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind fake backend")?;
    let addr = listener.local_addr().context("fake backend addr")?;
    let task = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(ServerGuard {
        base_url: format!("http://{}", addr),
        backend,
        task,
    })
}

/// Dispatcher + API client over an in-memory store, pointed at `server`.
pub fn client(server: &ServerGuard, store: Arc<dyn TokenStore>) -> (Arc<Dispatcher>, ApiClient) {
    let auth = Arc::new(AuthServiceClient::with_client(
        server.auth_url(),
        Arc::clone(&store),
        reqwest::Client::new(),
    ));
    let dispatcher = Arc::new(Dispatcher::new(reqwest::Client::new(), store, auth));
    let api = ApiClient::new(&server.base_url, Arc::clone(&dispatcher));
    (dispatcher, api)
}

pub fn bundle(access: &str, refresh: &str, expires_in: time::Duration) -> CredentialBundle {
    CredentialBundle {
        access_token: access.to_string(),
        id_token: Some("I1".to_string()),
        refresh_token: refresh.to_string(),
        expires_at: OffsetDateTime::now_utc() + expires_in,
    }
}

pub fn memory_store(bundle: CredentialBundle) -> Arc<MemoryTokenStore> {
    Arc::new(MemoryTokenStore::with_bundle(bundle))
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(str::to_string)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({"error": "unauthorized"})),
    )
        .into_response()
}

async fn record_and_require_bearer(
    State(backend): State<Arc<FakeBackend>>,
    req: axum::extract::Request,
    next: Next,
) -> Response {
    let headers = req.headers();
    backend.authorizations.lock().unwrap().push(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
    );
    backend.content_types.lock().unwrap().push(
        headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
    );

    let Some(token) = bearer(headers) else {
        return unauthorized();
    };
    if !backend.accepted.lock().unwrap().contains(&token) {
        return unauthorized();
    }
    next.run(req).await
}

async fn login(
    State(backend): State<Arc<FakeBackend>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if body.get("password").and_then(|p| p.as_str()) != Some("secret") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "invalid_credentials", "message": "wrong email or password"})),
        )
            .into_response();
    }
    backend.accept("A1");
    Json(serde_json::json!({
        "user": {"id": "u1", "email": body["email"], "email_verified": true, "name": "Ana"},
        "access_token": "A1",
        "id_token": "I1",
        "refresh_token": "R1",
        "expires_in": 3600
    }))
    .into_response()
}

async fn register(Json(body): Json<serde_json::Value>) -> Response {
    Json(serde_json::json!({
        "user": {"id": "u2", "email": body["email"], "email_verified": false, "name": ""},
        "message": "verification code sent"
    }))
    .into_response()
}

async fn logout(State(backend): State<Arc<FakeBackend>>) -> Response {
    backend.logout_calls.fetch_add(1, Ordering::SeqCst);
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

async fn me(State(backend): State<Arc<FakeBackend>>, headers: HeaderMap) -> Response {
    match bearer(&headers) {
        Some(token) if backend.accepted.lock().unwrap().contains(&token) => Json(
            serde_json::json!({"user": {"id": "u1", "email": "ana@example.com", "email_verified": true, "name": "Ana"}}),
        )
        .into_response(),
        _ => unauthorized(),
    }
}

async fn refresh(
    State(backend): State<Arc<FakeBackend>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    backend.refresh_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(token) = body.get("refresh_token").and_then(|t| t.as_str()) {
        backend
            .refresh_tokens_seen
            .lock()
            .unwrap()
            .push(token.to_string());
    }
    let delay = *backend.refresh_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let mode = backend.refresh_mode.lock().unwrap().clone();
    match mode {
        RefreshMode::Issue {
            access_token,
            refresh_token,
            expires_in,
        } => {
            backend.accept(&access_token);
            Json(serde_json::json!({
                "access_token": access_token,
                "id_token": "I2",
                "refresh_token": refresh_token,
                "expires_in": expires_in
            }))
            .into_response()
        }
        RefreshMode::Status(code) => (
            StatusCode::from_u16(code).unwrap(),
            Json(serde_json::json!({"message": "refresh rejected"})),
        )
            .into_response(),
        RefreshMode::Malformed => Json(serde_json::json!({"access_token": "A2"})).into_response(),
    }
}

async fn menu_history() -> Response {
    Json(serde_json::json!([
        {
            "id": "m1",
            "user_id": "u1",
            "week_start_date": "2025-12-22",
            "calories_total": 14000,
            "source": "openai",
            "status": "completed",
            "created_at": "2025-12-21T10:00:00Z"
        }
    ]))
    .into_response()
}

async fn create_menu() -> Response {
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "id": "m2",
            "user_id": "u1",
            "week_start_date": "2025-12-29",
            "calories_total": 0,
            "source": "openai",
            "status": "processing",
            "created_at": "2025-12-28T10:00:00Z"
        })),
    )
        .into_response()
}

async fn menu(Path(id): Path<String>) -> Response {
    if id != "m1" {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": {"message": "menu not found"}})),
        )
            .into_response();
    }
    Json(serde_json::json!({
        "id": "m1",
        "profile_id": "p1",
        "week_start_date": "2025-12-22",
        "calories_total": 14000,
        "source": "openai",
        "status": "completed",
        "error_message": null,
        "days": [{
            "id": "d1",
            "day_name": "Monday",
            "calories_day": 2000,
            "meals": [{"id": "x1", "type": "Breakfast", "name": "Oatmeal", "calories": 400, "ingredients": ["oats", "milk"]}]
        }],
        "created_at": "2025-12-21T10:00:00Z"
    }))
    .into_response()
}

async fn profile() -> Response {
    Json(serde_json::json!({"data": {"id": "p1", "name": "Ana", "goal": "weight_loss", "calories": 1800}}))
        .into_response()
}

async fn upload_avatar(headers: HeaderMap) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with("multipart/form-data; boundary=") {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"message": "expected multipart body"})),
        )
            .into_response();
    }
    Json(serde_json::json!({"data": {"avatar_url": "https://cdn.example/avatar.png"}}))
        .into_response()
}

async fn subscription_status() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"detail": "no subscription"})),
    )
        .into_response()
}

async fn always_unauthorized() -> Response {
    unauthorized()
}
