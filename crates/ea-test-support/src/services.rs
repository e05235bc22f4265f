//! Service handling of the mock: `switch.*` and `homeassistant.update_entity`

use std::collections::HashMap;
use std::sync::PoisonError;

use ea_core::{EntityId, State, SwitchKind, STATE_OFF, STATE_ON};
use serde_json::Value;
use tracing::debug;

use crate::server::Shared;

/// Entity ids named by a service call's `entity_id` field (string or list)
pub(crate) fn target_entities(data: &Value) -> Vec<EntityId> {
    match data.get("entity_id") {
        Some(Value::String(id)) => id.parse().into_iter().collect(),
        Some(Value::Array(ids)) => ids
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|id| id.parse().ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Check that the mock knows how to run `domain.service`
pub(crate) fn is_supported(domain: &str, service: &str) -> bool {
    matches!(
        (domain, service),
        ("switch", "turn_on" | "turn_off" | "toggle") | ("homeassistant", "update_entity")
    )
}

/// Apply a supported service call, returning the states it changed
pub(crate) fn apply(shared: &Shared, domain: &str, service: &str, data: &Value) -> Vec<State> {
    let mut changed = Vec::new();
    if domain != "switch" {
        return changed;
    }

    let _guard = shared
        .apply_lock
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    for entity_id in target_entities(data) {
        let Some(current) = shared.states.get(&entity_id.to_string()).map(|s| s.clone()) else {
            debug!(%entity_id, "service call targets unknown entity");
            continue;
        };

        let turn_on = match service {
            "turn_on" => true,
            "turn_off" => false,
            _ => !current.is_on(),
        };
        changed.extend(set_switch(shared, &current, turn_on));
    }

    changed
}

fn set_switch(shared: &Shared, current: &State, turn_on: bool) -> Vec<State> {
    let value = if turn_on { STATE_ON } else { STATE_OFF };
    let mut changed = vec![shared.write(&current.entity_id, value, None)];

    let Some((alert, kind)) = SwitchKind::parse_switch(&current.entity_id) else {
        return changed;
    };

    if turn_on {
        for other in kind.excluded() {
            let sibling = alert.switch_entity_id(other);
            if shared.is_state(&sibling, STATE_ON) {
                changed.push(shared.write(&sibling, STATE_OFF, None));
            }
        }
    }

    // The alert sensor mirrors the switch states in its attributes
    let sensor = alert.sensor_entity_id();
    if let Some(state) = shared.states.get(&sensor.to_string()).map(|s| s.clone()) {
        let mut attributes: HashMap<String, Value> = state.attributes.clone();
        for kind in SwitchKind::ALL {
            let on = shared.is_state(&alert.switch_entity_id(kind), STATE_ON);
            attributes.insert(kind.as_str().to_string(), Value::Bool(on));
        }
        changed.push(shared.write(&sensor, &state.state, Some(attributes)));
    }

    changed
}
