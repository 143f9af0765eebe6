//! Client configuration loaded with figment.
//!
//! Precedence, lowest to highest: built-in defaults, an optional config file
//! (format chosen by extension), `CAPTURE_`-prefixed environment variables.
//! Callers apply their own overrides (CLI flags) on the returned value.

use crate::error::{BoardError, Result};
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default API root when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:3333/api";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CAPTURE_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Root URL of the REST API, without a trailing slash
    pub base_url: String,
    /// Bearer token of the signed-in session
    #[serde(default)]
    pub token: Option<String>,
    /// Identity of the signed-in user; part of the projection cache key
    #[serde(default)]
    pub user: Option<String>,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            user: None,
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Load from defaults, an optional file, then the environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(ClientConfig::default()));

        if let Some(path) = file {
            figment = match path.extension().and_then(|e| e.to_str()) {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                other => {
                    return Err(BoardError::Config(format!(
                        "unsupported config format {:?} for {}",
                        other.unwrap_or(""),
                        path.display()
                    )))
                }
            };
        }

        let config: ClientConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).map(|key| key.as_str().to_lowercase().into()))
            .extract()?;
        tracing::debug!(base_url = %config.base_url, user = ?config.user, "loaded client config");
        config.validated()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the HTTP client used by [`crate::api::HttpBoardApi`].
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout())
            .user_agent(concat!("capture-board/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BoardError::Config(format!("failed to build HTTP client: {e}")))
    }

    fn validated(mut self) -> Result<Self> {
        let trimmed = self.base_url.trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(BoardError::Config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        self.base_url = trimmed.to_string();
        Ok(self)
    }
}
