//! Switch synchronization scenarios
//!
//! Each scenario starts from an alert with every switch off, acts through a
//! service call, and asserts the state the backend converges to.

use std::time::{Duration, Instant};

use ea_core::{AlertId, SwitchKind, STATE_OFF};
use tracing::{error, info};

use crate::alerts::AlertHelpers;
use crate::{HarnessError, HarnessResult};

/// Outcome of one scenario
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub name: &'static str,
    pub passed: bool,
    pub error: Option<String>,
    pub elapsed: Duration,
}

impl ScenarioResult {
    pub fn print_summary(&self) {
        if self.passed {
            println!("✓ {} ({:?})", self.name, self.elapsed);
        } else {
            println!(
                "✗ {} ({:?}): {}",
                self.name,
                self.elapsed,
                self.error.as_deref().unwrap_or("failed")
            );
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Acknowledge,
    Snooze,
    Resolve,
    MutualExclusion,
    TurnOff,
}

impl Scenario {
    /// Execution order of a full run
    pub const ALL: [Scenario; 5] = [
        Self::Acknowledge,
        Self::Snooze,
        Self::Resolve,
        Self::MutualExclusion,
        Self::TurnOff,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Acknowledge => "acknowledge switch updates backend state",
            Self::Snooze => "snooze switch updates backend state",
            Self::Resolve => "resolve switch updates backend state",
            Self::MutualExclusion => "switches are mutually exclusive",
            Self::TurnOff => "turning a switch off clears it",
        }
    }
}

/// Runs every scenario against one alert and keeps the results
pub struct SyncSuite {
    helpers: AlertHelpers,
    alert: AlertId,
    pub results: Vec<ScenarioResult>,
}

impl SyncSuite {
    pub fn new(helpers: AlertHelpers, alert: AlertId) -> Self {
        Self {
            helpers,
            alert,
            results: Vec::new(),
        }
    }

    pub fn alert(&self) -> &AlertId {
        &self.alert
    }

    pub async fn run_all(&mut self) {
        for scenario in Scenario::ALL {
            self.run(scenario).await;
        }
    }

    /// Run one scenario, resetting the alert's switches first
    pub async fn run(&mut self, scenario: Scenario) -> &ScenarioResult {
        let name = scenario.name();
        let start = Instant::now();
        let outcome = match self.helpers.reset_switches(&self.alert).await {
            Ok(_) => self.execute(scenario).await,
            Err(e) => Err(e),
        };

        let result = ScenarioResult {
            name,
            passed: outcome.is_ok(),
            error: outcome.err().map(|e| e.to_string()),
            elapsed: start.elapsed(),
        };
        match &result.error {
            None => info!(scenario = name, "passed"),
            Some(e) => error!(scenario = name, error = %e, "failed"),
        }

        self.results.push(result);
        &self.results[self.results.len() - 1]
    }

    async fn execute(&self, scenario: Scenario) -> HarnessResult<()> {
        let alert = &self.alert;
        match scenario {
            Scenario::Acknowledge => {
                self.helpers.acknowledge_alert(alert).await?;
                self.helpers
                    .client()
                    .wait_for_attribute(
                        &alert.sensor_entity_id(),
                        "acknowledged",
                        true,
                        self.helpers.switch_timeout(),
                    )
                    .await?;
                self.expect_only(SwitchKind::Acknowledged).await
            }
            Scenario::Snooze => {
                self.helpers.snooze_alert(alert).await?;
                self.expect_only(SwitchKind::Snoozed).await
            }
            Scenario::Resolve => {
                self.helpers.resolve_alert(alert).await?;
                self.expect_only(SwitchKind::Resolved).await
            }
            Scenario::MutualExclusion => {
                self.helpers.acknowledge_alert(alert).await?;
                self.helpers.snooze_alert(alert).await?;
                self.helpers
                    .wait_for_exclusive(alert, SwitchKind::Snoozed)
                    .await?;
                self.helpers.resolve_alert(alert).await?;
                self.helpers
                    .wait_for_exclusive(alert, SwitchKind::Resolved)
                    .await?;
                self.expect_only(SwitchKind::Resolved).await
            }
            Scenario::TurnOff => {
                self.helpers.acknowledge_alert(alert).await?;
                self.helpers
                    .set_switch(alert, SwitchKind::Acknowledged, false)
                    .await?;
                let switches = self.helpers.get_alert_switches(alert).await?;
                match switches.get(SwitchKind::Acknowledged) {
                    Some(state) if state.state == STATE_OFF => Ok(()),
                    other => Err(HarnessError::Assertion(format!(
                        "acknowledged switch should be off, found {:?}",
                        other.map(|s| &s.state)
                    ))),
                }
            }
        }
    }

    /// Exactly `kind` is on among the alert's switches
    async fn expect_only(&self, kind: SwitchKind) -> HarnessResult<()> {
        let active = self.helpers.get_alert_switches(&self.alert).await?.active();
        if active == [kind] {
            Ok(())
        } else {
            Err(HarnessError::Assertion(format!(
                "expected only {} to be on, found {:?}",
                kind, active
            )))
        }
    }

    pub fn print_summary(&self) {
        println!("\n=== Switch Synchronization: {} ===", self.alert);
        for result in &self.results {
            result.print_summary();
        }

        let passed = self.results.iter().filter(|r| r.passed).count();
        let total = self.results.len();
        println!();
        println!("Results: {}/{} passed", passed, total);

        if passed == total {
            println!("✅ All scenarios passed!");
        } else {
            println!("❌ {} scenarios failed", total - passed);
        }
    }

    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }
}
