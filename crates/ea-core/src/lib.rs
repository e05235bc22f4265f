//! Core types for the Emergency Alerts end-to-end harness
//!
//! This crate provides the types shared by the poller, the REST client and
//! the alert helpers: EntityId, State (as served by the Home Assistant REST
//! API), the `/api/config` payload, and the naming scheme the Emergency
//! Alerts integration uses for its sensors and switches.

mod alert;
mod entity_id;
mod ha_config;
mod state;

pub use alert::{AlertId, AlertIdError, SwitchKind, ALERT_SENSOR_PREFIX, ALERT_SWITCH_PREFIX};
pub use entity_id::{EntityId, EntityIdError};
pub use ha_config::HaConfig;
pub use state::{Context, State};

/// Domain of the Emergency Alerts integration
pub const INTEGRATION_DOMAIN: &str = "emergency_alerts";

/// State value of a switch or binary sensor that is on
pub const STATE_ON: &str = "on";

/// State value of a switch or binary sensor that is off
pub const STATE_OFF: &str = "off";

/// State value of an entity its integration could not evaluate
pub const STATE_UNAVAILABLE: &str = "unavailable";
