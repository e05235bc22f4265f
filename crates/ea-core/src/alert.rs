//! Naming scheme of the Emergency Alerts entities
//!
//! Every configured alert `<id>` owns one binary sensor,
//! `binary_sensor.emergency_<id>`, and three mutually exclusive switches,
//! `switch.emergency_<id>_acknowledged`, `_snoozed` and `_resolved`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity_id::is_slug;
use crate::EntityId;

const SENSOR_DOMAIN: &str = "binary_sensor";
const SWITCH_DOMAIN: &str = "switch";
const OBJECT_PREFIX: &str = "emergency_";

/// Prefix shared by every alert sensor entity id
pub const ALERT_SENSOR_PREFIX: &str = "binary_sensor.emergency_";

/// Prefix shared by every alert switch entity id
pub const ALERT_SWITCH_PREFIX: &str = "switch.emergency_";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid alert id '{0}' (lowercase alphanumeric and underscores)")]
pub struct AlertIdError(pub String);

/// Identifier of one configured alert, e.g. `door_open`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AlertId(String);

impl AlertId {
    pub fn new(id: impl Into<String>) -> Result<Self, AlertIdError> {
        let id = id.into();
        if is_slug(&id) {
            Ok(Self(id))
        } else {
            Err(AlertIdError(id))
        }
    }

    /// Recover the alert id from its `binary_sensor.emergency_<id>` entity
    pub fn from_sensor(entity_id: &EntityId) -> Option<Self> {
        if entity_id.domain() != SENSOR_DOMAIN {
            return None;
        }
        entity_id
            .object_id()
            .strip_prefix(OBJECT_PREFIX)
            .and_then(|id| Self::new(id).ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn sensor_entity_id(&self) -> EntityId {
        EntityId::from_valid_parts(SENSOR_DOMAIN, format!("{OBJECT_PREFIX}{}", self.0))
    }

    pub fn switch_entity_id(&self, kind: SwitchKind) -> EntityId {
        EntityId::from_valid_parts(
            SWITCH_DOMAIN,
            format!("{OBJECT_PREFIX}{}_{}", self.0, kind.as_str()),
        )
    }

    /// Prefix matching the three switches of this alert and nothing else
    pub fn switch_prefix(&self) -> String {
        format!("{ALERT_SWITCH_PREFIX}{}_", self.0)
    }
}

impl FromStr for AlertId {
    type Err = AlertIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for AlertId {
    type Error = AlertIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<AlertId> for String {
    fn from(id: AlertId) -> String {
        id.0
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of the three per-alert switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchKind {
    Acknowledged,
    Snoozed,
    Resolved,
}

impl SwitchKind {
    pub const ALL: [SwitchKind; 3] = [Self::Acknowledged, Self::Snoozed, Self::Resolved];

    /// Entity id suffix
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Acknowledged => "acknowledged",
            Self::Snoozed => "snoozed",
            Self::Resolved => "resolved",
        }
    }

    /// Switches turned off by the integration when this one turns on
    pub fn excluded(self) -> [SwitchKind; 2] {
        match self {
            Self::Acknowledged => [Self::Snoozed, Self::Resolved],
            Self::Snoozed => [Self::Acknowledged, Self::Resolved],
            Self::Resolved => [Self::Acknowledged, Self::Snoozed],
        }
    }

    /// Split a `switch.emergency_<id>_<kind>` entity into its alert and kind
    pub fn parse_switch(entity_id: &EntityId) -> Option<(AlertId, SwitchKind)> {
        if entity_id.domain() != SWITCH_DOMAIN {
            return None;
        }
        let rest = entity_id.object_id().strip_prefix(OBJECT_PREFIX)?;
        Self::ALL.into_iter().find_map(|kind| {
            rest.strip_suffix(kind.as_str())
                .and_then(|id| id.strip_suffix('_'))
                .and_then(|id| AlertId::new(id).ok())
                .map(|alert| (alert, kind))
        })
    }
}

impl fmt::Display for SwitchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
