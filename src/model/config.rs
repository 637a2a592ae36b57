use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const PRODUCTION_AUTH_URL: &str = "https://api.menuum.com/auth";
const DEVELOPMENT_AUTH_URL: &str = "http://localhost:8080/auth";
const DEFAULT_API_URL: &str = "https://api.menuum.com";
const STATE_DIR: &str = ".menuum";
const DEFAULT_EXPIRY_MARGIN: time::Duration = time::Duration::minutes(5);
const MAX_EXPIRY_MARGIN_SECS: i64 = 24 * 60 * 60;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Auth service base URL. Falls back to the production or development
    /// default depending on `production`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,

    /// Backend REST API base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default)]
    pub production: bool,

    /// Upper bound on a single refresh call, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_timeout_secs: Option<u64>,

    /// Tokens closer than this to expiry are refreshed before use, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_margin_secs: Option<u64>,

    /// Where the session file lives. Defaults to `$HOME/.menuum`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
}

impl ClientConfig {
    /// Reads `path` when it exists, then applies `MENUUM_*` environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(path) if path.exists() => {
                let bytes =
                    fs::read(path).with_context(|| format!("read {}", path.display()))?;
                serde_json::from_slice(&bytes)
                    .with_context(|| format!("parse {}", path.display()))?
            }
            Some(path) => {
                tracing::debug!(path = %path.display(), "config file not found; using defaults");
                ClientConfig::default()
            }
            None => ClientConfig::default(),
        };
        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("MENUUM_AUTH_URL").filter(|s| !s.is_empty()) {
            self.auth_url = Some(url);
        }
        if let Some(url) = var("MENUUM_API_URL").filter(|s| !s.is_empty()) {
            self.api_url = Some(url);
        }
        if let Some(dir) = var("MENUUM_STATE_DIR").filter(|s| !s.is_empty()) {
            self.state_dir = Some(PathBuf::from(dir));
        }
        if var("MENUUM_ENV").as_deref() == Some("production") {
            self.production = true;
        }
    }

    pub fn auth_url(&self) -> String {
        let url = match &self.auth_url {
            Some(url) => url.as_str(),
            None if self.production => PRODUCTION_AUTH_URL,
            None => DEVELOPMENT_AUTH_URL,
        };
        url.trim_end_matches('/').to_string()
    }

    pub fn api_url(&self) -> String {
        self.api_url
            .as_deref()
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs.unwrap_or(10))
    }

    /// Configured values beyond a day fall back to the default.
    pub fn expiry_margin(&self) -> time::Duration {
        self.expiry_margin_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .filter(|secs| *secs <= MAX_EXPIRY_MARGIN_SECS)
            .map_or(DEFAULT_EXPIRY_MARGIN, time::Duration::seconds)
    }

    pub fn state_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.state_dir {
            return Ok(dir.clone());
        }
        let home = std::env::var_os("HOME")
            .context("HOME is not set (set MENUUM_STATE_DIR or `state_dir` in the config)")?;
        Ok(PathBuf::from(home).join(STATE_DIR))
    }
}
