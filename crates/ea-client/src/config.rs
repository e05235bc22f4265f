//! Connection settings for [`HaClient`](crate::HaClient)

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use ea_poller::DEFAULT_INTERVAL;

/// Home Assistant instance used by the dev container
pub const DEFAULT_BASE_URL: &str = "http://localhost:8123";

/// Per-request HTTP timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where and how to reach Home Assistant
///
/// Passed explicitly to [`HaClient::new`](crate::HaClient::new); the client
/// reads nothing from the environment on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL, without trailing slash
    pub base_url: String,
    /// Long-lived access token sent as a bearer token
    pub token: Option<String>,
    pub request_timeout: Duration,
    /// Pause between two fetches while waiting on a state
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poll_interval: DEFAULT_INTERVAL,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Defaults overridden by the environment
    pub fn from_env() -> Self {
        Self::default().merge_env()
    }

    /// Override fields from the environment
    ///
    /// - `HA_URL`: base URL
    /// - `HA_TOKEN`: access token, or `HA_TOKEN_FILE`: file holding it
    /// - `HA_REQUEST_TIMEOUT_SECS`: per-request timeout
    /// - `HA_POLL_INTERVAL_MS`: pause between polls
    ///
    /// Unparseable numbers are ignored.
    pub fn merge_env(mut self) -> Self {
        if let Ok(url) = env::var("HA_URL") {
            self.base_url = url;
        }

        if let Ok(token) = env::var("HA_TOKEN") {
            self.token = Some(token.trim().to_string());
        } else if let Ok(path) = env::var("HA_TOKEN_FILE") {
            if let Some(token) = read_token_file(&PathBuf::from(path)) {
                self.token = Some(token);
            }
        }

        if let Some(secs) = env_number("HA_REQUEST_TIMEOUT_SECS") {
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = env_number("HA_POLL_INTERVAL_MS") {
            self.poll_interval = Duration::from_millis(ms);
        }

        self
    }
}

fn env_number(var: &str) -> Option<u64> {
    env::var(var).ok().and_then(|v| v.trim().parse().ok())
}

/// Read a token file, `None` when missing or blank
pub fn read_token_file(path: &std::path::Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
