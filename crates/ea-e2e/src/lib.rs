//! End-to-end checks for the Emergency Alerts integration
//!
//! Drives the alert switches through Home Assistant service calls and
//! asserts that the backend converges: the switch turns on, its siblings
//! turn off, and the alert sensor reflects the change.
//!
//! - [`alerts::AlertHelpers`]: per-alert actions that wait for the backend
//! - [`preflight`]: checks run once before a suite
//! - [`scenarios::SyncSuite`]: the switch synchronization scenarios
//! - [`config::E2eConfig`]: YAML file + environment configuration

pub mod alerts;
pub mod config;
pub mod error;
pub mod preflight;
pub mod scenarios;

pub use error::{HarnessError, HarnessResult};
