//! Checks run once before a suite: is Home Assistant up, is the integration
//! loaded, are there alerts to test against
//!
//! A missing integration or an empty alert list is reported as a warning
//! rather than an error, so the report can explain what to fix.

use std::time::Duration;

use ea_client::HaClient;
use ea_core::{AlertId, INTEGRATION_DOMAIN};
use tracing::{info, warn};

use crate::HarnessResult;

#[derive(Debug, Clone, Default)]
pub struct PreflightReport {
    pub version: String,
    pub integration_loaded: bool,
    pub alerts: Vec<AlertId>,
    pub warnings: Vec<String>,
}

impl PreflightReport {
    /// Ready to run the synchronization scenarios
    pub fn is_ready(&self) -> bool {
        self.integration_loaded && !self.alerts.is_empty()
    }

    pub fn print_summary(&self) {
        println!("\n=== Preflight ===");
        println!("Home Assistant: {}", self.version);
        println!(
            "Integration {}: {}",
            INTEGRATION_DOMAIN,
            if self.integration_loaded { "loaded" } else { "missing" }
        );
        println!("Alerts found: {}", self.alerts.len());
        for alert in &self.alerts {
            println!("  - {}", alert);
        }
        for warning in &self.warnings {
            println!("⚠️  {}", warning);
        }
    }
}

/// Wait for readiness, then inspect components and alerts
pub async fn run(client: &HaClient, ready_timeout: Duration) -> HarnessResult<PreflightReport> {
    info!(url = %client.base_url(), "running preflight checks");
    client.wait_for_ready(ready_timeout).await?;

    let config = client.get_config().await?;
    let mut report = PreflightReport {
        version: config.version.clone(),
        integration_loaded: config.has_component(INTEGRATION_DOMAIN),
        ..PreflightReport::default()
    };

    if !report.integration_loaded {
        let message = format!(
            "{} integration not found in loaded components; make sure it is installed and Home Assistant restarted",
            INTEGRATION_DOMAIN
        );
        warn!("{}", message);
        report.warnings.push(message);
    }

    let sensors = client.get_emergency_alerts().await?;
    report.alerts = sensors
        .iter()
        .filter_map(|s| AlertId::from_sensor(&s.entity_id))
        .collect();
    report.alerts.sort_by(|a, b| a.as_str().cmp(b.as_str()));

    for sensor in sensors.iter().filter(|s| s.is_unavailable()) {
        let message = format!("{} is unavailable", sensor.entity_id);
        warn!("{}", message);
        report.warnings.push(message);
    }
    info!(count = report.alerts.len(), "found emergency alerts");

    if report.alerts.is_empty() {
        let message = "no test alerts found; configure at least one alert in Home Assistant".to_string();
        warn!("{}", message);
        report.warnings.push(message);
    }

    Ok(report)
}
