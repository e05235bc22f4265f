//! Backend-side helpers for acting on one alert and waiting for the result

use std::time::Duration;

use ea_client::HaClient;
use ea_core::{AlertId, State, SwitchKind, STATE_OFF, STATE_ON};
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::{HarnessError, HarnessResult};

/// Current states of an alert's three switches; `None` if the entity is missing
#[derive(Debug, Clone, Default)]
pub struct AlertSwitches {
    pub acknowledged: Option<State>,
    pub snoozed: Option<State>,
    pub resolved: Option<State>,
}

impl AlertSwitches {
    pub fn get(&self, kind: SwitchKind) -> Option<&State> {
        match kind {
            SwitchKind::Acknowledged => self.acknowledged.as_ref(),
            SwitchKind::Snoozed => self.snoozed.as_ref(),
            SwitchKind::Resolved => self.resolved.as_ref(),
        }
    }

    /// Kinds whose switch is currently on
    pub fn active(&self) -> Vec<SwitchKind> {
        SwitchKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind).is_some_and(State::is_on))
            .collect()
    }
}

/// Acts on alerts through service calls and waits for the backend to follow
#[derive(Debug, Clone)]
pub struct AlertHelpers {
    client: HaClient,
    switch_timeout: Duration,
}

impl AlertHelpers {
    pub fn new(client: HaClient, switch_timeout: Duration) -> Self {
        Self {
            client,
            switch_timeout,
        }
    }

    pub fn client(&self) -> &HaClient {
        &self.client
    }

    pub fn switch_timeout(&self) -> Duration {
        self.switch_timeout
    }

    /// The first configured alert, by sensor entity id
    pub async fn first_alert(&self) -> HarnessResult<AlertId> {
        let mut alerts: Vec<AlertId> = self
            .client
            .get_emergency_alerts()
            .await?
            .iter()
            .filter_map(|s| AlertId::from_sensor(&s.entity_id))
            .collect();
        alerts.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        alerts.into_iter().next().ok_or(HarnessError::NoAlerts)
    }

    /// State of the alert's binary sensor
    pub async fn get_alert_state(&self, alert: &AlertId) -> HarnessResult<State> {
        Ok(self.client.get_state(&alert.sensor_entity_id()).await?)
    }

    pub async fn get_alert_switches(&self, alert: &AlertId) -> HarnessResult<AlertSwitches> {
        let mut switches = AlertSwitches::default();
        for state in self.client.get_emergency_alert_switches(Some(alert)).await? {
            let Some((_, kind)) = SwitchKind::parse_switch(&state.entity_id) else {
                continue;
            };
            let slot = match kind {
                SwitchKind::Acknowledged => &mut switches.acknowledged,
                SwitchKind::Snoozed => &mut switches.snoozed,
                SwitchKind::Resolved => &mut switches.resolved,
            };
            *slot = Some(state);
        }
        Ok(switches)
    }

    /// Turn one switch on or off and wait until the backend reports it
    #[instrument(skip(self, alert), fields(alert = %alert))]
    pub async fn set_switch(&self, alert: &AlertId, kind: SwitchKind, on: bool) -> HarnessResult<()> {
        let entity_id = alert.switch_entity_id(kind);
        let (service, expected) = if on {
            ("turn_on", STATE_ON)
        } else {
            ("turn_off", STATE_OFF)
        };

        self.client
            .call_service("switch", service, json!({ "entity_id": entity_id.to_string() }))
            .await?;
        self.client
            .wait_for_state(&entity_id, expected, self.switch_timeout)
            .await?;

        debug!(%entity_id, expected, "switch settled");
        Ok(())
    }

    pub async fn acknowledge_alert(&self, alert: &AlertId) -> HarnessResult<()> {
        self.set_switch(alert, SwitchKind::Acknowledged, true).await
    }

    pub async fn snooze_alert(&self, alert: &AlertId) -> HarnessResult<()> {
        self.set_switch(alert, SwitchKind::Snoozed, true).await
    }

    pub async fn resolve_alert(&self, alert: &AlertId) -> HarnessResult<()> {
        self.set_switch(alert, SwitchKind::Resolved, true).await
    }

    /// Turn off every switch of the alert that is on; returns how many were
    pub async fn reset_switches(&self, alert: &AlertId) -> HarnessResult<usize> {
        let active = self.get_alert_switches(alert).await?.active();
        for kind in &active {
            self.set_switch(alert, *kind, false).await?;
        }
        if !active.is_empty() {
            info!(%alert, count = active.len(), "reset alert switches");
        }
        Ok(active.len())
    }

    /// Ask Home Assistant to re-evaluate the alert sensor
    pub async fn trigger_alert(&self, alert: &AlertId) -> HarnessResult<()> {
        self.client
            .call_service(
                "homeassistant",
                "update_entity",
                json!({ "entity_id": alert.sensor_entity_id().to_string() }),
            )
            .await?;
        Ok(())
    }

    /// Wait until `kind` is on and the two switches it excludes are off
    pub async fn wait_for_exclusive(&self, alert: &AlertId, kind: SwitchKind) -> HarnessResult<()> {
        self.client
            .wait_for_state(&alert.switch_entity_id(kind), STATE_ON, self.switch_timeout)
            .await?;
        for other in kind.excluded() {
            self.client
                .wait_for_state(&alert.switch_entity_id(other), STATE_OFF, self.switch_timeout)
                .await?;
        }
        Ok(())
    }
}
