//! Constant-pause retry policy and per-call retry bookkeeping.

use crate::error::{FailureReason, TransportError};
use crate::{ClientConfig, Error};
use http::StatusCode;
use std::time::Duration;

/// Retry a failed attempt after a fixed pause, up to `retry_count` times.
///
/// There is no jitter and no backoff growth: every pause has the same length.
///
/// # Examples
///
/// ```
/// use iexcloud::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(3, Duration::from_millis(500));
///
/// assert_eq!(policy.max_attempts(), 4);
/// assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_millis(500)));
/// assert_eq!(policy.delay_for_attempt(3), Some(Duration::from_millis(500)));
/// assert_eq!(policy.delay_for_attempt(4), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    retry_count: usize,
    pause: Duration,
}

impl RetryPolicy {
    /// Creates a policy allowing `retry_count` retries with a constant `pause`.
    pub const fn new(retry_count: usize, pause: Duration) -> Self {
        Self { retry_count, pause }
    }

    /// Takes the retry settings of a client configuration.
    pub const fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.retry_count(), config.retry_pause())
    }

    /// Returns the pause to take after failed attempt number `attempt`
    /// (1-indexed), or `None` when no attempts remain.
    pub fn delay_for_attempt(&self, attempt: usize) -> Option<Duration> {
        if attempt > self.retry_count {
            None
        } else {
            Some(self.pause)
        }
    }

    /// Total number of attempts, the first one included.
    pub const fn max_attempts(&self) -> usize {
        self.retry_count.saturating_add(1)
    }

    /// Number of retries after the first attempt.
    pub const fn retry_count(&self) -> usize {
        self.retry_count
    }

    /// The constant pause between attempts.
    pub const fn pause(&self) -> Duration {
        self.pause
    }
}

/// Attempt counter and last failure of one pipeline execution.
///
/// Lives only for the duration of a single call.
#[derive(Debug, Default)]
pub(crate) struct RetryState {
    attempts: usize,
    last_response: Option<(StatusCode, String)>,
    last_transport_error: Option<TransportError>,
}

impl RetryState {
    /// Starts a new attempt and returns its 1-indexed number.
    pub(crate) fn begin_attempt(&mut self) -> usize {
        self.attempts += 1;
        self.attempts
    }

    pub(crate) fn record_response(&mut self, status: StatusCode, body: String) {
        self.last_response = Some((status, body));
    }

    pub(crate) fn record_transport_error(&mut self, error: TransportError) {
        self.last_transport_error = Some(error);
    }

    /// Converts an exhausted state into the error surfaced to the caller.
    ///
    /// The last observed response wins; the transport error is only reported
    /// when no attempt ever got a response.
    pub(crate) fn into_error(self) -> Error {
        match (self.last_response, self.last_transport_error) {
            (Some((status, body)), _) => Error::query_failed(status, body, FailureReason::Status),
            (None, Some(source)) => Error::TransportUnavailable {
                attempts: self.attempts,
                source,
            },
            (None, None) => Error::TransportUnavailable {
                attempts: self.attempts,
                source: TransportError::Other("no attempt was made".to_string()),
            },
        }
    }
}
