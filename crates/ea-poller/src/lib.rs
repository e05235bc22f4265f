//! Eventual-consistency waits for remotely observed entity state
//!
//! The alerting backend applies switch changes asynchronously, so tests
//! cannot assert on state right after acting. [`ConditionPoller`] fetches a
//! value at a fixed interval until a caller-supplied predicate holds or the
//! deadline passes.
//!
//! ```text
//!   fetch ──► NotFound ─────────────┐
//!     │                             │
//!     ├──► value ─► predicate true ─┼──► Success(value)
//!     │              │ false        │
//!     │              ▼              ▼
//!     │           sleep(interval) ◄─┘
//!     │              │
//!     └── elapsed < timeout ◄───────┴──► TimedOut(last value)
//! ```
//!
//! Only "not found" lookups are retried. Any other fetch error ends the wait
//! immediately with [`PollError::Fetch`].

mod error;
mod fetch;
mod observable;
mod poller;

pub use error::{FetchError, PollError, WaitTimeout};
pub use fetch::Fetch;
pub use observable::ObservableRef;
pub use poller::{
    ConditionPoller, PollConfig, PollOutcome, WaitResult, DEFAULT_INTERVAL, DEFAULT_TIMEOUT,
};

/// Observed values are JSON: a state string or an attribute value
pub use serde_json::Value;
