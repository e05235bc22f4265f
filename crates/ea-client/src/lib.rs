//! Home Assistant REST client for the Emergency Alerts harness
//!
//! [`HaClient`] wraps the handful of REST endpoints the harness needs
//! (`/api/states`, `/api/services`, `/api/config`) and layers the
//! eventual-consistency waits from `ea-poller` on top of them.
//!
//! ```ignore
//! let client = HaClient::new(ClientConfig::from_env())?;
//! client.call_service("switch", "turn_on", json!({"entity_id": id})).await?;
//! client.wait_for_state(&id, "on", Duration::from_secs(5)).await?;
//! ```

mod client;
mod config;
mod error;
mod fetch;

pub use client::HaClient;
pub use config::{read_token_file, ClientConfig, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
pub use error::{ClientError, ClientResult};
