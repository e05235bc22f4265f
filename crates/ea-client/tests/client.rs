//! HaClient against the in-process mock Home Assistant

use std::time::{Duration, Instant};

use ea_client::{ClientConfig, ClientError, HaClient};
use ea_core::{AlertId, EntityId, SwitchKind};
use ea_poller::{FetchError, ObservableRef, PollError, WaitResult};
use ea_test_support::MockHomeAssistant;
use serde_json::json;
use tokio::net::TcpListener;

const TOKEN: &str = "test-token";

async fn start(builder: ea_test_support::MockHomeAssistantBuilder) -> (MockHomeAssistant, HaClient) {
    let hass = builder.token(TOKEN).start().await.unwrap();
    let config = ClientConfig::new(hass.url())
        .with_token(TOKEN)
        .with_poll_interval(Duration::from_millis(50));
    let client = HaClient::new(config).unwrap();
    (hass, client)
}

fn entity(id: &str) -> EntityId {
    id.parse().unwrap()
}

#[tokio::test]
async fn test_get_state() {
    let (_hass, client) = start(MockHomeAssistant::builder().alert("door")).await;

    let state = client
        .get_state(&entity("binary_sensor.emergency_door"))
        .await
        .unwrap();
    assert!(state.is_on());
    assert_eq!(state.attribute("severity"), Some(&json!("warning")));
}

#[tokio::test]
async fn test_missing_entity_is_not_found() {
    let (_hass, client) = start(MockHomeAssistant::builder()).await;

    let err = client
        .get_state(&entity("switch.emergency_nothing_snoozed"))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_bad_token_is_unauthorized() {
    let hass = MockHomeAssistant::builder()
        .token(TOKEN)
        .alert("door")
        .start()
        .await
        .unwrap();
    let client = HaClient::new(ClientConfig::new(hass.url()).with_token("wrong")).unwrap();

    let err = client.get_all_states().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized { .. }));
}

#[tokio::test]
async fn test_trailing_slash_in_base_url() {
    let hass = MockHomeAssistant::builder().start().await.unwrap();
    let client = HaClient::new(ClientConfig::new(format!("{}/", hass.url()))).unwrap();

    assert_eq!(client.base_url(), hass.url());
    assert!(client.is_ready().await);
}

#[tokio::test]
async fn test_call_service_returns_changed_states() {
    let (hass, client) = start(MockHomeAssistant::builder().alert("door")).await;
    let switch = "switch.emergency_door_acknowledged";

    let changed = client
        .call_service("switch", "turn_on", json!({ "entity_id": switch }))
        .await
        .unwrap();

    assert!(changed
        .iter()
        .any(|s| s.entity_id.to_string() == switch && s.is_on()));
    assert!(hass.state(switch).unwrap().is_on());

    let calls = hass.service_calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].domain, "switch");
    assert_eq!(calls[0].data, json!({ "entity_id": switch }));
}

#[tokio::test]
async fn test_unknown_service_is_status_error() {
    let (_hass, client) = start(MockHomeAssistant::builder()).await;

    let err = client
        .call_service("light", "turn_on", json!({}))
        .await
        .unwrap_err();
    match err {
        ClientError::Status { status, .. } => assert_eq!(status.as_u16(), 400),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_config_and_readiness() {
    let (_hass, client) = start(MockHomeAssistant::builder()).await;

    let config = client.get_config().await.unwrap();
    assert_eq!(config.version, "2026.1.1");
    assert!(config.has_component("emergency_alerts"));
    assert!(client.is_ready().await);
    client.wait_for_ready(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test]
async fn test_wait_for_ready_times_out_while_starting() {
    let (hass, client) = start(MockHomeAssistant::builder().version("")).await;
    assert!(!client.is_ready().await);

    let err = client
        .wait_for_ready(Duration::from_millis(300))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotReady { .. }));

    hass.set_version("2026.1.1").await;
    client.wait_for_ready(Duration::from_secs(2)).await.unwrap();
}

#[tokio::test]
async fn test_alert_queries() {
    let (hass, client) = start(MockHomeAssistant::builder().alert("door").alert("water_leak")).await;
    hass.set_state("binary_sensor.front_door", "off", None);
    hass.set_state("switch.kitchen", "on", None);

    let alerts = client.get_emergency_alerts().await.unwrap();
    let mut ids: Vec<_> = alerts
        .iter()
        .filter_map(|s| AlertId::from_sensor(&s.entity_id))
        .map(|a| a.to_string())
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["door", "water_leak"]);

    let all_switches = client.get_emergency_alert_switches(None).await.unwrap();
    assert_eq!(all_switches.len(), 6);

    let door = AlertId::new("door").unwrap();
    let door_switches = client
        .get_emergency_alert_switches(Some(&door))
        .await
        .unwrap();
    assert_eq!(door_switches.len(), 3);
    for kind in SwitchKind::ALL {
        let id = door.switch_entity_id(kind);
        assert!(door_switches.iter().any(|s| s.entity_id == id));
    }
}

#[tokio::test]
async fn test_wait_for_state_after_delayed_service_call() {
    let (hass, client) = start(
        MockHomeAssistant::builder()
            .alert("door")
            .service_delay(Duration::from_millis(200)),
    )
    .await;
    let switch = entity("switch.emergency_door_snoozed");

    let changed = client
        .call_service("switch", "turn_on", json!({ "entity_id": switch.to_string() }))
        .await
        .unwrap();
    assert!(changed.is_empty());
    assert!(!hass.state(&switch.to_string()).unwrap().is_on());

    let start = Instant::now();
    client
        .wait_for_state(&switch, "on", Duration::from_secs(5))
        .await
        .unwrap();
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_wait_for_state_tolerates_entity_creation() {
    let (hass, client) = start(MockHomeAssistant::builder()).await;
    hass.set_state_after(
        "switch.emergency_new_alert_acknowledged",
        "on",
        Duration::from_millis(200),
    );

    client
        .wait_for_state(
            &entity("switch.emergency_new_alert_acknowledged"),
            "on",
            Duration::from_secs(5),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_wait_for_state_timeout() {
    let (_hass, client) = start(MockHomeAssistant::builder().alert("door")).await;

    let start = Instant::now();
    let err = client
        .wait_for_state(
            &entity("switch.emergency_door_resolved"),
            "on",
            Duration::from_millis(300),
        )
        .await
        .unwrap_err();

    assert!(start.elapsed() >= Duration::from_millis(300));
    match err {
        ClientError::Timeout {
            target,
            expected,
            last_seen,
            ..
        } => {
            assert_eq!(target, "switch.emergency_door_resolved");
            assert_eq!(expected, json!("on"));
            assert_eq!(last_seen, Some(json!("off")));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_wait_for_missing_entity_times_out_without_value() {
    let (_hass, client) = start(MockHomeAssistant::builder()).await;

    let err = client
        .wait_for_state(
            &entity("switch.emergency_ghost_resolved"),
            "on",
            Duration::from_millis(200),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Timeout { last_seen: None, .. }));
    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_wait_for_attribute() {
    let (hass, client) = start(
        MockHomeAssistant::builder()
            .alert("door")
            .service_delay(Duration::from_millis(150)),
    )
    .await;
    let sensor = entity("binary_sensor.emergency_door");

    client
        .call_service(
            "switch",
            "turn_on",
            json!({ "entity_id": "switch.emergency_door_acknowledged" }),
        )
        .await
        .unwrap();

    client
        .wait_for_attribute(&sensor, "acknowledged", true, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(
        hass.state("binary_sensor.emergency_door")
            .unwrap()
            .attribute_as::<bool>("acknowledged"),
        Some(true)
    );

    let err = client
        .wait_for_attribute(&sensor, "no_such_attribute", "x", Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Timeout {
            last_seen: Some(serde_json::Value::Null),
            ..
        }
    ));
}

#[tokio::test]
async fn test_auth_failure_aborts_wait_early() {
    let hass = MockHomeAssistant::builder()
        .token(TOKEN)
        .alert("door")
        .start()
        .await
        .unwrap();
    let client = HaClient::new(ClientConfig::new(hass.url()).with_token("wrong")).unwrap();

    let start = Instant::now();
    let err = client
        .wait_for_state(
            &entity("switch.emergency_door_acknowledged"),
            "on",
            Duration::from_secs(10),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Poll(PollError::Fetch { .. })));
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_wait_until_custom_predicate() {
    let (hass, client) = start(MockHomeAssistant::builder()).await;
    hass.set_state("sensor.temperature", "18", None);
    hass.set_state_after("sensor.temperature", "23", Duration::from_millis(150));
    let target = ObservableRef::state(entity("sensor.temperature"));

    let result = client
        .wait_until(
            &target,
            |v| {
                v.as_str()
                    .and_then(|s| s.parse::<f64>().ok())
                    .is_some_and(|t| t > 20.0)
            },
            Duration::from_secs(5),
        )
        .await
        .unwrap();
    assert_eq!(result, WaitResult::Success(json!("23")));
}

#[tokio::test]
async fn test_concurrent_waits() {
    let (hass, client) = start(MockHomeAssistant::builder().alert("a").alert("b")).await;
    hass.set_state_after("switch.emergency_a_snoozed", "on", Duration::from_millis(100));
    hass.set_state_after("switch.emergency_b_resolved", "on", Duration::from_millis(250));

    let a = entity("switch.emergency_a_snoozed");
    let b = entity("switch.emergency_b_resolved");
    let (ra, rb) = futures::join!(
        client.wait_for_state(&a, "on", Duration::from_secs(5)),
        client.wait_for_state(&b, "on", Duration::from_secs(5)),
    );
    ra.unwrap();
    rb.unwrap();
}

#[tokio::test]
async fn test_invalid_wait_timeout_fails_fast() {
    let (_hass, client) = start(MockHomeAssistant::builder()).await;

    let err = client
        .wait_for_state(&entity("switch.emergency_a_snoozed"), "on", Duration::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Poll(PollError::InvalidConfig { .. })
    ));
}

#[tokio::test]
async fn test_poller_uses_client_interval() {
    let (_hass, client) = start(MockHomeAssistant::builder()).await;

    let config = client.poller(Duration::from_secs(2)).unwrap().config();
    assert_eq!(config.timeout(), Duration::from_secs(2));
    assert_eq!(config.interval(), Duration::from_millis(50));

    let short = client.poller(Duration::from_millis(20)).unwrap().config();
    assert_eq!(short.interval(), Duration::from_millis(20));
}

#[tokio::test]
async fn test_request_timeout_cancels_wait() {
    // Accepts connections and never answers
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            open.push(socket);
        }
    });

    let config = ClientConfig::new(format!("http://{addr}"))
        .with_request_timeout(Duration::from_millis(200))
        .with_poll_interval(Duration::from_millis(50));
    let client = HaClient::new(config).unwrap();

    let start = Instant::now();
    let err = client
        .wait_for_state(
            &entity("switch.emergency_door_acknowledged"),
            "on",
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();

    assert!(
        matches!(
            err,
            ClientError::Poll(PollError::Fetch {
                source: FetchError::Cancelled(_),
                ..
            })
        ),
        "unexpected error: {err}"
    );
    assert!(start.elapsed() < Duration::from_secs(2));
    server.abort();
}
