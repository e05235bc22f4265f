//! State type as served by `GET /api/states`

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ulid::Ulid;

use crate::{EntityId, STATE_ON, STATE_UNAVAILABLE};

/// Origin of a state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl Context {
    /// Create a context with a fresh ULID
    pub fn new() -> Self {
        Self {
            id: Ulid::new().to_string(),
            parent_id: None,
            user_id: None,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// The state of one entity at a point in time
///
/// Mirrors the JSON objects returned by the REST API. Only `entity_id` and
/// `state` are required when parsing; attributes default to an empty map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    pub entity_id: EntityId,

    /// The state value (e.g., "on", "off", "unavailable")
    pub state: String,

    #[serde(default)]
    pub attributes: HashMap<String, Value>,

    #[serde(default = "Utc::now")]
    pub last_changed: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reported: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
}

impl State {
    /// Create a new state stamped with the current time
    pub fn new(
        entity_id: EntityId,
        state: impl Into<String>,
        attributes: HashMap<String, Value>,
    ) -> Self {
        let now = Utc::now();
        Self {
            entity_id,
            state: state.into(),
            attributes,
            last_changed: now,
            last_updated: now,
            last_reported: Some(now),
            context: Some(Context::new()),
        }
    }

    /// Produce the successor state, keeping `last_changed` when the value is unchanged
    pub fn with_update(
        &self,
        new_state: impl Into<String>,
        new_attributes: HashMap<String, Value>,
    ) -> Self {
        let now = Utc::now();
        let new_state = new_state.into();
        let last_changed = if self.state == new_state {
            self.last_changed
        } else {
            now
        };

        Self {
            entity_id: self.entity_id.clone(),
            state: new_state,
            attributes: new_attributes,
            last_changed,
            last_updated: now,
            last_reported: Some(now),
            context: Some(Context::new()),
        }
    }

    pub fn is_on(&self) -> bool {
        self.state == STATE_ON
    }

    /// The integration failed to evaluate the entity
    pub fn is_unavailable(&self) -> bool {
        self.state == STATE_UNAVAILABLE
    }

    /// Raw attribute value
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Attribute value deserialized into `T`, `None` if missing or of another shape
    pub fn attribute_as<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        // Timestamps and context are not compared
        self.entity_id == other.entity_id
            && self.state == other.state
            && self.attributes == other.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_rest_payload() {
        let state: State = serde_json::from_value(json!({
            "entity_id": "binary_sensor.emergency_door_open",
            "state": "on",
            "attributes": {"severity": "critical", "acknowledged": false},
            "last_changed": "2026-01-07T10:00:00.123456+00:00",
            "last_updated": "2026-01-07T10:00:01+00:00",
            "context": {"id": "01HQ", "parent_id": null, "user_id": null}
        }))
        .unwrap();

        assert!(state.is_on());
        assert_eq!(state.attribute("severity"), Some(&json!("critical")));
        assert_eq!(state.attribute_as::<bool>("acknowledged"), Some(false));
        assert_eq!(state.attribute_as::<bool>("severity"), None);
        assert!(state.last_reported.is_none());
    }

    #[test]
    fn test_minimal_payload() {
        let state: State = serde_json::from_value(json!({
            "entity_id": "switch.emergency_door_open_snoozed",
            "state": "off"
        }))
        .unwrap();
        assert!(!state.is_on());
        assert!(!state.is_unavailable());
        assert!(state.attributes.is_empty());
    }

    #[test]
    fn test_unavailable() {
        let id: EntityId = "binary_sensor.emergency_door_open".parse().unwrap();
        let state = State::new(id, STATE_UNAVAILABLE, HashMap::new());
        assert!(state.is_unavailable());
        assert!(!state.is_on());
    }

    #[test]
    fn test_with_update_keeps_last_changed() {
        let id: EntityId = "switch.emergency_a_resolved".parse().unwrap();
        let original = State::new(id, "off", HashMap::new());

        let same = original.with_update("off", HashMap::new());
        assert_eq!(same.last_changed, original.last_changed);

        let flipped = original.with_update("on", HashMap::new());
        assert!(flipped.last_changed >= original.last_changed);
        assert!(flipped.is_on());
        assert_ne!(flipped, original);
    }
}
