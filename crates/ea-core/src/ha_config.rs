//! Subset of the `GET /api/config` payload the harness reads

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Home Assistant core configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HaConfig {
    #[serde(default)]
    pub location_name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub time_zone: String,
    #[serde(default)]
    pub unit_system: HashMap<String, String>,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub elevation: f64,
}

impl HaConfig {
    /// Whether `domain` is among the loaded components
    pub fn has_component(&self, domain: &str) -> bool {
        self.components.iter().any(|c| c == domain)
    }

    /// A server that reports a version has finished starting up
    pub fn is_ready(&self) -> bool {
        !self.version.is_empty()
    }
}
