//! Error types for polling

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::ObservableRef;

/// Failure reported by a [`Fetch`](crate::Fetch) implementation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The observed resource does not exist (yet)
    #[error("{0} not found")]
    NotFound(String),

    /// The fetch itself was cancelled or timed out
    #[error("fetch cancelled: {0}")]
    Cancelled(String),

    /// Transport, authentication or decoding failure
    #[error("fetch failed: {0}")]
    Other(String),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Errors that end a wait before its deadline
#[derive(Debug, Error)]
pub enum PollError {
    #[error("invalid poll configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("fetching {target} failed: {source}")]
    Fetch {
        target: ObservableRef,
        #[source]
        source: FetchError,
    },
}

/// A timed-out wait, raised at the caller's boundary via
/// [`WaitResult::into_result`](crate::WaitResult::into_result)
#[derive(Debug, Clone, Error, PartialEq)]
#[error("timed out after {timeout:?} waiting for {target} (last seen: {})", describe(.last_seen))]
pub struct WaitTimeout {
    pub target: ObservableRef,
    pub timeout: Duration,
    pub last_seen: Option<Value>,
}

fn describe(value: &Option<Value>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "nothing".to_string(),
    }
}
