//! Fixed-interval polling until a predicate holds or a deadline passes

use std::time::Duration;

use serde_json::Value;
use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::{debug, instrument, trace};

use crate::{Fetch, FetchError, ObservableRef, PollError, WaitTimeout};

/// Default deadline for a wait
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default pause between two fetches
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// Deadline and poll interval of a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    timeout: Duration,
    interval: Duration,
}

impl PollConfig {
    /// Validate a timeout/interval pair
    ///
    /// Both must be non-zero. An interval longer than the timeout is clamped
    /// to the timeout, so such a wait makes one fetch, sleeps once and gives up.
    pub fn new(timeout: Duration, interval: Duration) -> Result<Self, PollError> {
        if timeout.is_zero() {
            return Err(PollError::InvalidConfig {
                reason: "timeout must be positive".to_string(),
            });
        }
        if interval.is_zero() {
            return Err(PollError::InvalidConfig {
                reason: "interval must be positive".to_string(),
            });
        }

        Ok(Self {
            timeout,
            interval: interval.min(timeout),
        })
    }

    /// Custom timeout with the default 500ms interval
    pub fn with_timeout(timeout: Duration) -> Result<Self, PollError> {
        Self::new(timeout, DEFAULT_INTERVAL)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
        }
    }
}

/// Result of a single poll cycle
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Satisfied(Value),
    NotYetSatisfied(Value),
    LookupFailed(FetchError),
}

/// Terminal result of a wait
#[derive(Debug, Clone, PartialEq)]
pub enum WaitResult {
    /// The predicate held for this value
    Success(Value),
    /// The deadline passed; carries the last value seen, if any fetch succeeded
    TimedOut(Option<Value>),
}

impl WaitResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Turn a timeout into an error for callers that fail on it
    pub fn into_result(
        self,
        target: &ObservableRef,
        timeout: Duration,
    ) -> Result<Value, WaitTimeout> {
        match self {
            Self::Success(value) => Ok(value),
            Self::TimedOut(last_seen) => Err(WaitTimeout {
                target: target.clone(),
                timeout,
                last_seen,
            }),
        }
    }
}

/// Polls a [`Fetch`] source until a predicate holds
///
/// A poller carries no per-wait state, so one instance can serve any number
/// of concurrent waits on different references.
#[derive(Debug, Clone)]
pub struct ConditionPoller<F> {
    fetcher: F,
    config: PollConfig,
}

impl<F: Fetch> ConditionPoller<F> {
    pub fn new(fetcher: F, config: PollConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> PollConfig {
        self.config
    }

    /// Fetch once and classify the result
    ///
    /// Not-found lookups become [`PollOutcome::LookupFailed`]; every other
    /// fetch error is returned as [`PollError::Fetch`].
    pub async fn poll_once<P>(
        &self,
        target: &ObservableRef,
        predicate: &P,
    ) -> Result<PollOutcome, PollError>
    where
        P: Fn(&Value) -> bool + Send + Sync,
    {
        match self.fetcher.fetch(target).await {
            Ok(value) if predicate(&value) => Ok(PollOutcome::Satisfied(value)),
            Ok(value) => Ok(PollOutcome::NotYetSatisfied(value)),
            Err(err) if err.is_not_found() => Ok(PollOutcome::LookupFailed(err)),
            Err(source) => Err(PollError::Fetch {
                target: target.clone(),
                source,
            }),
        }
    }

    /// Wait until `predicate` holds for the value behind `target`
    ///
    /// Always fetches at least once, and that first fetch runs to completion
    /// even if it outlasts the timeout. Returns as soon as the predicate
    /// holds, without sleeping again. Otherwise sleeps one interval between
    /// fetches and reports [`WaitResult::TimedOut`] at the deadline. Later
    /// fetches still in flight at the deadline are abandoned, so a failing
    /// wait ends at the deadline unless the first fetch alone outlasts it.
    #[instrument(skip(self, predicate), fields(target = %target))]
    pub async fn wait<P>(&self, target: &ObservableRef, predicate: P) -> Result<WaitResult, PollError>
    where
        P: Fn(&Value) -> bool + Send + Sync,
    {
        let start = Instant::now();
        let deadline = start + self.config.timeout;
        let mut last_seen = None;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let outcome = if attempts == 1 {
                self.poll_once(target, &predicate).await?
            } else {
                match timeout_at(deadline, self.poll_once(target, &predicate)).await {
                    Ok(outcome) => outcome?,
                    Err(_) => {
                        debug!(attempts, ?last_seen, "condition timed out during fetch");
                        return Ok(WaitResult::TimedOut(last_seen));
                    }
                }
            };

            match outcome {
                PollOutcome::Satisfied(value) => {
                    debug!(attempts, elapsed = ?start.elapsed(), "condition satisfied");
                    return Ok(WaitResult::Success(value));
                }
                PollOutcome::NotYetSatisfied(value) => {
                    trace!(attempts, %value, "condition not yet satisfied");
                    last_seen = Some(value);
                }
                PollOutcome::LookupFailed(err) => {
                    trace!(attempts, error = %err, "lookup failed, retrying");
                }
            }

            sleep_until((Instant::now() + self.config.interval).min(deadline)).await;

            if Instant::now() >= deadline {
                debug!(attempts, ?last_seen, "condition timed out");
                return Ok(WaitResult::TimedOut(last_seen));
            }
        }
    }

    /// Wait until the observed value equals `expected`
    pub async fn wait_for_value(
        &self,
        target: &ObservableRef,
        expected: &Value,
    ) -> Result<WaitResult, PollError> {
        self.wait(target, |value| value == expected).await
    }
}
