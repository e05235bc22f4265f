//! HTTP client for the Home Assistant REST API

use std::time::Duration;

use ea_core::{
    AlertId, EntityId, HaConfig, State, ALERT_SENSOR_PREFIX, ALERT_SWITCH_PREFIX,
};
use ea_poller::{ConditionPoller, ObservableRef, PollConfig, Value, WaitResult};
use reqwest::{header, Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::{ClientConfig, ClientError, ClientResult};

/// Pause between two readiness probes
const READY_INTERVAL: Duration = Duration::from_secs(1);

/// REST client for one Home Assistant instance
///
/// Cheap to clone: clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HaClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    poll_interval: Duration,
}

impl HaClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
            poll_interval: config.poll_interval,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .request(method, &url)
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(ref token) = self.token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        request
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> ClientResult<T> {
        let response = request.send().await.map_err(|source| ClientError::Request {
            path: path.to_string(),
            source,
        })?;

        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => {
                return Err(ClientError::NotFound {
                    path: path.to_string(),
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ClientError::Unauthorized {
                    path: path.to_string(),
                    status,
                })
            }
            s if !s.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(ClientError::Status {
                    path: path.to_string(),
                    status,
                    body,
                });
            }
            _ => {}
        }

        response.json().await.map_err(|source| ClientError::Decode {
            path: path.to_string(),
            source,
        })
    }

    /// GET /api/states
    pub async fn get_all_states(&self) -> ClientResult<Vec<State>> {
        let path = "/api/states";
        self.send(self.request(Method::GET, path), path).await
    }

    /// GET /api/states/<entity_id>
    ///
    /// A missing entity is [`ClientError::NotFound`].
    pub async fn get_state(&self, entity_id: &EntityId) -> ClientResult<State> {
        let path = format!("/api/states/{}", entity_id);
        self.send(self.request(Method::GET, &path), &path).await
    }

    /// POST /api/services/<domain>/<service>, returning the states it changed
    #[instrument(skip(self, data))]
    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        data: Value,
    ) -> ClientResult<Vec<State>> {
        let path = format!("/api/services/{}/{}", domain, service);
        debug!(%data, "calling service");
        let request = self.request(Method::POST, &path).json(&data);
        self.send(request, &path).await
    }

    /// GET /api/config
    pub async fn get_config(&self) -> ClientResult<HaConfig> {
        let path = "/api/config";
        self.send(self.request(Method::GET, path), path).await
    }

    /// Whether the configuration is readable and reports a version
    pub async fn is_ready(&self) -> bool {
        match self.get_config().await {
            Ok(config) => config.is_ready(),
            Err(e) => {
                debug!(error = %e, "not ready");
                false
            }
        }
    }

    /// Probe readiness once a second until `timeout`
    pub async fn wait_for_ready(&self, timeout: Duration) -> ClientResult<()> {
        let start = Instant::now();

        loop {
            if self.is_ready().await {
                info!(url = %self.base_url, elapsed = ?start.elapsed(), "Home Assistant is ready");
                return Ok(());
            }
            if start.elapsed() >= timeout {
                warn!(url = %self.base_url, ?timeout, "Home Assistant did not become ready");
                return Err(ClientError::NotReady {
                    url: self.base_url.clone(),
                    timeout,
                });
            }
            tokio::time::sleep(READY_INTERVAL.min(timeout)).await;
        }
    }

    /// Every alert sensor (`binary_sensor.emergency_*`)
    pub async fn get_emergency_alerts(&self) -> ClientResult<Vec<State>> {
        let states = self.get_all_states().await?;
        Ok(states
            .into_iter()
            .filter(|s| s.entity_id.starts_with(ALERT_SENSOR_PREFIX))
            .collect())
    }

    /// Alert switches, optionally only those of one alert
    pub async fn get_emergency_alert_switches(
        &self,
        alert: Option<&AlertId>,
    ) -> ClientResult<Vec<State>> {
        let prefix = match alert {
            Some(alert) => alert.switch_prefix(),
            None => ALERT_SWITCH_PREFIX.to_string(),
        };
        let states = self.get_all_states().await?;
        Ok(states
            .into_iter()
            .filter(|s| s.entity_id.starts_with(&prefix))
            .collect())
    }

    /// A poller fetching through this client
    pub fn poller(&self, timeout: Duration) -> ClientResult<ConditionPoller<HaClient>> {
        let config = PollConfig::new(timeout, self.poll_interval)?;
        Ok(ConditionPoller::new(self.clone(), config))
    }

    /// Poll `target` until `predicate` holds, reporting a timeout as a result
    pub async fn wait_until<P>(
        &self,
        target: &ObservableRef,
        predicate: P,
        timeout: Duration,
    ) -> ClientResult<WaitResult>
    where
        P: Fn(&Value) -> bool + Send + Sync,
    {
        Ok(self.poller(timeout)?.wait(target, predicate).await?)
    }

    /// Wait until the entity's state equals `expected`
    ///
    /// The entity may not exist yet when the wait starts. Fails with
    /// [`ClientError::Timeout`] when the deadline passes.
    pub async fn wait_for_state(
        &self,
        entity_id: &EntityId,
        expected: &str,
        timeout: Duration,
    ) -> ClientResult<()> {
        let target = ObservableRef::state(entity_id.clone());
        self.wait_for_value(target, Value::from(expected), timeout)
            .await
    }

    /// Wait until one attribute of the entity equals `expected`
    pub async fn wait_for_attribute(
        &self,
        entity_id: &EntityId,
        attribute: &str,
        expected: impl Into<Value>,
        timeout: Duration,
    ) -> ClientResult<()> {
        let target = ObservableRef::attribute(entity_id.clone(), attribute);
        self.wait_for_value(target, expected.into(), timeout).await
    }

    async fn wait_for_value(
        &self,
        target: ObservableRef,
        expected: Value,
        timeout: Duration,
    ) -> ClientResult<()> {
        let result = self
            .poller(timeout)?
            .wait_for_value(&target, &expected)
            .await?;

        result
            .into_result(&target, timeout)
            .map(|_| ())
            .map_err(|timed_out| ClientError::Timeout {
                target: timed_out.target.to_string(),
                expected,
                timeout,
                last_seen: timed_out.last_seen,
            })
    }
}
