//! Harness configuration
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! YAML file, the environment, and finally command-line flags (applied by
//! the binary).
//!
//! ```yaml
//! url: http://localhost:8123
//! token_file: .ha-token
//! alert: door_open
//! switch_timeout_ms: 5000
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ea_client::{read_token_file, ClientConfig};
use ea_core::AlertId;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// How long an alert action waits for its switch to change
pub const DEFAULT_SWITCH_TIMEOUT: Duration = Duration::from_secs(5);

/// How long preflight waits for Home Assistant to come up
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(60);

/// On-disk shape of the configuration file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    url: Option<String>,
    token: Option<String>,
    token_file: Option<PathBuf>,
    request_timeout_secs: Option<u64>,
    poll_interval_ms: Option<u64>,
    alert: Option<String>,
    switch_timeout_ms: Option<u64>,
    ready_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct E2eConfig {
    pub client: ClientConfig,
    /// Alert to exercise; the first configured alert when unset
    pub alert: Option<AlertId>,
    pub switch_timeout: Duration,
    pub ready_timeout: Duration,
}

impl Default for E2eConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            alert: None,
            switch_timeout: DEFAULT_SWITCH_TIMEOUT,
            ready_timeout: DEFAULT_READY_TIMEOUT,
        }
    }
}

impl E2eConfig {
    /// Defaults, then `path` if given, then the environment
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.merge_env()
    }

    pub fn from_yaml_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content, path)
    }

    /// Parse YAML content; `origin` names the file in errors and anchors a
    /// relative `token_file`
    pub fn from_yaml_str(content: &str, origin: &Path) -> ConfigResult<Self> {
        let file: ConfigFile =
            serde_yaml::from_str(content).map_err(|source| ConfigError::ParseYaml {
                path: origin.to_path_buf(),
                source,
            })?;
        debug!(path = %origin.display(), "loaded harness configuration");

        let mut config = Self::default();
        if let Some(url) = file.url {
            config.client.base_url = url;
        }
        if let Some(token) = file.token {
            config.client.token = Some(token);
        } else if let Some(token_file) = file.token_file {
            let path = match origin.parent() {
                Some(dir) if token_file.is_relative() => dir.join(token_file),
                _ => token_file,
            };
            let token = read_token_file(&path).ok_or(ConfigError::TokenFile { path })?;
            config.client.token = Some(token);
        }
        if let Some(secs) = file.request_timeout_secs {
            config.client.request_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = file.poll_interval_ms {
            config.client.poll_interval = Duration::from_millis(ms);
        }
        if let Some(alert) = file.alert {
            config.alert = Some(parse_alert("alert", alert)?);
        }
        if let Some(ms) = file.switch_timeout_ms {
            config.switch_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = file.ready_timeout_secs {
            config.ready_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Apply `HA_*` client variables and `HA_ALERT_ID`
    pub fn merge_env(mut self) -> ConfigResult<Self> {
        self.client = self.client.merge_env();
        if let Ok(alert) = env::var("HA_ALERT_ID") {
            self.alert = Some(parse_alert("HA_ALERT_ID", alert)?);
        }
        Ok(self)
    }
}

fn parse_alert(key: &str, value: String) -> ConfigResult<AlertId> {
    AlertId::new(value).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
