//! Client configuration.

use std::time::Duration;

use anyhow::{Context, Result};

pub const ENV_API_URL: &str = "CLINISTOCK_API_URL";
pub const ENV_API_TOKEN: &str = "CLINISTOCK_API_TOKEN";
pub const ENV_HISTORY_LIMIT: &str = "CLINISTOCK_HISTORY_LIMIT";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "CLINISTOCK_REQUEST_TIMEOUT_MS";
pub const ENV_REPROBE_SECS: &str = "CLINISTOCK_REPROBE_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the remote catalog service, without trailing slash.
    pub api_url: String,
    pub api_token: Option<String>,
    /// Default page size for movement history.
    pub history_limit: usize,
    pub request_timeout: Duration,
    /// Fallback re-probe interval; `None` keeps fallback until a forced refresh.
    pub reprobe_interval: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            api_token: None,
            history_limit: 50,
            request_timeout: Duration::from_millis(10_000),
            reprobe_interval: None,
        }
    }
}

impl ClientConfig {
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_reprobe_interval(mut self, interval: Duration) -> Self {
        self.reprobe_interval = Some(interval);
        self
    }

    /// Load from `CLINISTOCK_*` environment variables, defaulting unset ones.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (environment, file, test map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            config = config.with_api_url(url.trim());
        }
        if let Some(token) = get(ENV_API_TOKEN) {
            config = config.with_token(token.trim());
        }
        if let Some(raw) = get(ENV_HISTORY_LIMIT) {
            let limit: usize = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_HISTORY_LIMIT} must be a positive integer, got {raw:?}"))?;
            anyhow::ensure!(limit > 0, "{ENV_HISTORY_LIMIT} must be greater than zero");
            config.history_limit = limit;
        }
        if let Some(raw) = get(ENV_REQUEST_TIMEOUT_MS) {
            let ms: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_REQUEST_TIMEOUT_MS} must be milliseconds, got {raw:?}"))?;
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(raw) = get(ENV_REPROBE_SECS) {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_REPROBE_SECS} must be seconds, got {raw:?}"))?;
            config.reprobe_interval = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }
}
