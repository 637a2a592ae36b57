use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::ApiClient;
use crate::auth::AuthServiceClient;
use crate::dispatch::Dispatcher;
use crate::model::ClientConfig;
use crate::store::{FileTokenStore, TokenStore};

/// The assembled client: auth service, dispatcher and REST API sharing one
/// token store.
pub struct MenuumClient {
    auth: Arc<AuthServiceClient>,
    dispatcher: Arc<Dispatcher>,
    api: ApiClient,
}

impl MenuumClient {
    /// Builds a client persisting its session under the configured state dir.
    pub fn from_config(cfg: &ClientConfig) -> Result<Self> {
        let state_dir = cfg.state_dir()?;
        let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&state_dir));
        Self::with_store(cfg, store)
    }

    pub fn with_store(cfg: &ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("menuum")
            .build()
            .context("build reqwest client")?;

        let auth = Arc::new(AuthServiceClient::with_client(
            cfg.auth_url(),
            Arc::clone(&store),
            http.clone(),
        ));
        let dispatcher = Arc::new(
            Dispatcher::new(http, store, auth.clone())
                .with_refresh_timeout(cfg.refresh_timeout())
                .with_expiry_margin(cfg.expiry_margin()),
        );
        let api = ApiClient::new(cfg.api_url(), Arc::clone(&dispatcher));
        Ok(Self {
            auth,
            dispatcher,
            api,
        })
    }

    pub fn auth(&self) -> &AuthServiceClient {
        &self.auth
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}
