//! Error types for the REST client

use std::time::Duration;

use ea_poller::{PollError, Value};
use reqwest::StatusCode;
use thiserror::Error;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors returned by [`HaClient`](crate::HaClient)
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("request to {path} failed: {source}")]
    Request {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{path} not found")]
    NotFound { path: String },

    #[error("{path} rejected the access token ({status})")]
    Unauthorized { path: String, status: StatusCode },

    #[error("{path} returned {status}: {body}")]
    Status {
        path: String,
        status: StatusCode,
        body: String,
    },

    #[error("invalid response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("timed out after {timeout:?} waiting for {target} to equal {expected} (last seen: {})", describe(.last_seen))]
    Timeout {
        target: String,
        expected: Value,
        timeout: Duration,
        last_seen: Option<Value>,
    },

    #[error("Home Assistant at {url} was not ready within {timeout:?}")]
    NotReady { url: String, timeout: Duration },

    #[error(transparent)]
    Poll(#[from] PollError),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::NotReady { .. } => true,
            Self::Request { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

fn describe(value: &Option<Value>) -> String {
    value
        .as_ref()
        .map_or_else(|| "nothing".to_string(), Value::to_string)
}
