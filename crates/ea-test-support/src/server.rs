//! The mock server: state table, routes and lifecycle

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Request, State as AxumState},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use dashmap::DashMap;
use ea_core::{AlertId, EntityId, HaConfig, State, SwitchKind, INTEGRATION_DOMAIN, STATE_OFF, STATE_ON};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::services;

/// A service call received by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCallRecord {
    pub domain: String,
    pub service: String,
    pub data: Value,
}

pub(crate) struct Shared {
    pub(crate) states: DashMap<String, State>,
    token: Option<String>,
    version: RwLock<String>,
    components: Vec<String>,
    service_delay_ms: AtomicU64,
    calls: Mutex<Vec<ServiceCallRecord>>,
    /// Held while a service call reads and rewrites an alert's entities
    pub(crate) apply_lock: std::sync::Mutex<()>,
}

impl Shared {
    /// Create or update an entity, keeping attributes when none are given
    pub(crate) fn write(
        &self,
        entity_id: &EntityId,
        value: &str,
        attributes: Option<HashMap<String, Value>>,
    ) -> State {
        let key = entity_id.to_string();
        let existing = self.states.get(&key).map(|s| s.clone());
        let new_state = match existing {
            Some(old) => {
                let attributes = attributes.unwrap_or_else(|| old.attributes.clone());
                old.with_update(value, attributes)
            }
            None => State::new(entity_id.clone(), value, attributes.unwrap_or_default()),
        };
        self.states.insert(key, new_state.clone());
        new_state
    }

    pub(crate) fn is_state(&self, entity_id: &EntityId, value: &str) -> bool {
        self.states
            .get(&entity_id.to_string())
            .map(|s| s.state == value)
            .unwrap_or(false)
    }
}

/// Builder for [`MockHomeAssistant`]
pub struct MockHomeAssistantBuilder {
    token: Option<String>,
    version: String,
    components: Vec<String>,
    alerts: Vec<AlertId>,
    service_delay: Duration,
}

impl Default for MockHomeAssistantBuilder {
    fn default() -> Self {
        Self {
            token: None,
            version: "2026.1.1".to_string(),
            components: vec![
                "api".to_string(),
                "switch".to_string(),
                "binary_sensor".to_string(),
                INTEGRATION_DOMAIN.to_string(),
            ],
            alerts: Vec::new(),
            service_delay: Duration::ZERO,
        }
    }
}

impl MockHomeAssistantBuilder {
    /// Require `Authorization: Bearer <token>` on every request
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Version reported by `/api/config`; an empty string means "still starting"
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Report only these components as loaded
    pub fn components<I, S>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.components = components.into_iter().map(Into::into).collect();
        self
    }

    /// Seed an alert: its sensor (on) and its three switches (off)
    ///
    /// # Panics
    ///
    /// If `id` is not a valid alert id.
    pub fn alert(mut self, id: &str) -> Self {
        let alert = AlertId::new(id).unwrap_or_else(|e| panic!("{e}"));
        self.alerts.push(alert);
        self
    }

    /// Apply service calls this long after answering them
    pub fn service_delay(mut self, delay: Duration) -> Self {
        self.service_delay = delay;
        self
    }

    /// Bind to an ephemeral localhost port and start serving
    pub async fn start(self) -> std::io::Result<MockHomeAssistant> {
        let shared = Arc::new(Shared {
            states: DashMap::new(),
            token: self.token,
            version: RwLock::new(self.version),
            components: self.components,
            service_delay_ms: AtomicU64::new(self.service_delay.as_millis() as u64),
            calls: Mutex::new(Vec::new()),
            apply_lock: std::sync::Mutex::new(()),
        });

        for alert in &self.alerts {
            seed_alert(&shared, alert);
        }

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let router = create_router(shared.clone());
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                debug!(error = %e, "mock server stopped");
            }
        });

        Ok(MockHomeAssistant {
            shared,
            addr,
            server,
        })
    }
}

fn seed_alert(shared: &Shared, alert: &AlertId) {
    let mut attributes = HashMap::from([
        ("friendly_name".to_string(), json!(format!("Emergency {alert}"))),
        ("severity".to_string(), json!("warning")),
        ("trigger_type".to_string(), json!("simple")),
    ]);
    for kind in SwitchKind::ALL {
        attributes.insert(kind.as_str().to_string(), Value::Bool(false));
    }
    shared.write(&alert.sensor_entity_id(), STATE_ON, Some(attributes));

    for kind in SwitchKind::ALL {
        let friendly = HashMap::from([(
            "friendly_name".to_string(),
            json!(format!("{alert} {kind}")),
        )]);
        shared.write(&alert.switch_entity_id(kind), STATE_OFF, Some(friendly));
    }
}

/// In-process Home Assistant REST API; stops serving when dropped
pub struct MockHomeAssistant {
    shared: Arc<Shared>,
    addr: SocketAddr,
    server: JoinHandle<()>,
}

impl MockHomeAssistant {
    pub fn builder() -> MockHomeAssistantBuilder {
        MockHomeAssistantBuilder::default()
    }

    /// Base URL, e.g. `http://127.0.0.1:40123`
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Router over this mock's state, for `tower::ServiceExt::oneshot` tests
    pub fn router(&self) -> Router {
        create_router(self.shared.clone())
    }

    /// Current state of an entity
    pub fn state(&self, entity_id: &str) -> Option<State> {
        self.shared.states.get(entity_id).map(|s| s.clone())
    }

    /// Create or update an entity right away
    ///
    /// # Panics
    ///
    /// If `entity_id` is not a valid entity id.
    pub fn set_state(&self, entity_id: &str, value: &str, attributes: Option<Value>) -> State {
        let entity: EntityId = entity_id.parse().unwrap_or_else(|e| panic!("{e}"));
        let attributes = attributes.and_then(|a| serde_json::from_value(a).ok());
        self.shared.write(&entity, value, attributes)
    }

    /// Create or update an entity once `delay` has passed
    pub fn set_state_after(&self, entity_id: &str, value: &str, delay: Duration) {
        let shared = self.shared.clone();
        let entity: EntityId = entity_id.parse().unwrap_or_else(|e| panic!("{e}"));
        let value = value.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.write(&entity, &value, None);
        });
    }

    pub fn remove_state(&self, entity_id: &str) -> Option<State> {
        self.shared.states.remove(entity_id).map(|(_, s)| s)
    }

    pub async fn set_version(&self, version: &str) {
        *self.shared.version.write().await = version.to_string();
    }

    pub fn set_service_delay(&self, delay: Duration) {
        self.shared
            .service_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Service calls received so far, in order
    pub async fn service_calls(&self) -> Vec<ServiceCallRecord> {
        self.shared.calls.lock().await.clone()
    }
}

impl Drop for MockHomeAssistant {
    fn drop(&mut self) {
        self.server.abort();
    }
}

type SharedState = Arc<Shared>;

fn create_router(shared: SharedState) -> Router {
    Router::new()
        .route("/api/", get(api_status))
        .route("/api/config", get(get_config))
        .route("/api/states", get(get_states))
        .route("/api/states/:entity_id", get(get_state).post(set_state))
        .route(
            "/api/services/:domain/:service",
            axum::routing::post(call_service),
        )
        .layer(middleware::from_fn_with_state(shared.clone(), require_token))
        .with_state(shared)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "message": message.into() }))).into_response()
}

async fn require_token(AxumState(shared): AxumState<SharedState>, request: Request, next: Next) -> Response {
    if let Some(expected) = &shared.token {
        let presented = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if presented != Some(expected.as_str()) {
            return error_response(StatusCode::UNAUTHORIZED, "401: Unauthorized");
        }
    }
    next.run(request).await
}

async fn api_status() -> Json<Value> {
    Json(json!({ "message": "API running." }))
}

async fn get_config(AxumState(shared): AxumState<SharedState>) -> Json<HaConfig> {
    Json(HaConfig {
        location_name: "Mock Home".to_string(),
        version: shared.version.read().await.clone(),
        components: shared.components.clone(),
        time_zone: "UTC".to_string(),
        ..HaConfig::default()
    })
}

async fn get_states(AxumState(shared): AxumState<SharedState>) -> Json<Vec<State>> {
    let mut states: Vec<State> = shared.states.iter().map(|s| s.value().clone()).collect();
    states.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
    Json(states)
}

async fn get_state(
    AxumState(shared): AxumState<SharedState>,
    Path(entity_id): Path<String>,
) -> Response {
    match shared.states.get(&entity_id) {
        Some(state) => Json(state.clone()).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Entity not found."),
    }
}

#[derive(Deserialize)]
struct SetStateRequest {
    state: String,
    #[serde(default)]
    attributes: Option<HashMap<String, Value>>,
}

async fn set_state(
    AxumState(shared): AxumState<SharedState>,
    Path(entity_id): Path<String>,
    Json(request): Json<SetStateRequest>,
) -> Response {
    let Ok(entity) = entity_id.parse::<EntityId>() else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid entity ID specified.");
    };
    let created = !shared.states.contains_key(&entity_id);
    let state = shared.write(&entity, &request.state, request.attributes);
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (status, Json(state)).into_response()
}

async fn call_service(
    AxumState(shared): AxumState<SharedState>,
    Path((domain, service)): Path<(String, String)>,
    body: Option<Json<Value>>,
) -> Response {
    let data = body.map(|Json(v)| v).unwrap_or_else(|| json!({}));

    if !services::is_supported(&domain, &service) {
        return error_response(StatusCode::BAD_REQUEST, "Service not found.");
    }

    shared.calls.lock().await.push(ServiceCallRecord {
        domain: domain.clone(),
        service: service.clone(),
        data: data.clone(),
    });

    let delay = Duration::from_millis(shared.service_delay_ms.load(Ordering::SeqCst));
    if delay.is_zero() {
        return Json(services::apply(&shared, &domain, &service, &data)).into_response();
    }

    debug!(%domain, %service, ?delay, "deferring service call");
    let deferred = shared.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        services::apply(&deferred, &domain, &service, &data);
    });
    Json(Vec::<State>::new()).into_response()
}
