//! Test support for the Emergency Alerts harness
//!
//! [`MockHomeAssistant`] serves the subset of the Home Assistant REST API the
//! harness talks to, from an in-memory state table. It models the parts of
//! the integration the tests assert on: the three alert switches are
//! mutually exclusive, and service calls can be applied after a delay to
//! reproduce the backend's eventual consistency.
//!
//! ```ignore
//! let hass = MockHomeAssistant::builder()
//!     .token("secret")
//!     .alert("door_open")
//!     .start()
//!     .await?;
//! let url = hass.url();
//! ```

mod server;
mod services;

pub use server::{MockHomeAssistant, MockHomeAssistantBuilder, ServiceCallRecord};
