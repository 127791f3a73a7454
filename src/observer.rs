//! Diagnostics for the query pipeline.
//!
//! The executor reports what it does to a [`QueryObserver`]. Observers are
//! purely informational: nothing they do can change the outcome of a query.

use http::StatusCode;
use std::time::Duration;
use url::Url;

/// Response header carrying the provider's message usage counter.
pub const USAGE_HEADER: &str = "iexcloud-messages-used";

/// Receives request, response, usage and retry events from the executor.
///
/// Every method has an empty default so implementations only override what
/// they need.
///
/// # Examples
///
/// ```
/// use iexcloud::QueryObserver;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// #[derive(Default)]
/// struct UsageTotal(AtomicUsize);
///
/// impl QueryObserver for UsageTotal {
///     fn on_usage(&self, messages_used: Option<&str>) {
///         let used = messages_used.and_then(|m| m.parse().ok()).unwrap_or(0);
///         self.0.fetch_add(used, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait QueryObserver: Send + Sync {
    /// An attempt is about to be sent to `url`.
    ///
    /// The URL carries the credential token in its query string.
    fn on_request(&self, _url: &Url, _attempt: usize) {}

    /// An attempt got a response with `status`.
    fn on_response(&self, _status: StatusCode, _attempt: usize) {}

    /// An attempt failed below the HTTP layer.
    fn on_transport_error(&self, _error: &crate::TransportError, _attempt: usize) {}

    /// A 200 response was rejected by validation.
    fn on_rejected(&self, _error: &crate::Error, _attempt: usize) {}

    /// A 200 response arrived; `messages_used` is the provider's usage
    /// counter when the response carried one.
    fn on_usage(&self, _messages_used: Option<&str>) {}

    /// Attempt `attempt` failed and the executor will pause for `delay`.
    fn on_retry(&self, _delay: Duration, _attempt: usize) {}
}

/// Reports events through `tracing`, with the token redacted.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl QueryObserver for TracingObserver {
    fn on_request(&self, url: &Url, attempt: usize) {
        tracing::debug!(url = %redact_token(url), attempt = attempt, "REQUEST");
    }

    fn on_response(&self, status: StatusCode, attempt: usize) {
        tracing::debug!(status = status.as_u16(), attempt = attempt, "RESPONSE");

        if status.is_client_error() {
            tracing::error!(status = status.as_u16(), attempt = attempt, "Client error (4xx)");
        } else if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), attempt = attempt, "Server error (5xx)");
        }
    }

    fn on_rejected(&self, error: &crate::Error, attempt: usize) {
        tracing::error!(
            error = %error,
            reason = ?error.reason(),
            attempt = attempt,
            "Response rejected"
        );
    }

    fn on_transport_error(&self, error: &crate::TransportError, attempt: usize) {
        tracing::warn!(error = %error, attempt = attempt, "Request failed");
    }

    fn on_usage(&self, messages_used: Option<&str>) {
        tracing::info!(messages_used = messages_used.unwrap_or("N/A"), "MESSAGES USED");
    }

    fn on_retry(&self, delay: Duration, attempt: usize) {
        tracing::info!(
            delay_ms = delay.as_millis(),
            attempt = attempt,
            "Retrying request after delay"
        );
    }
}

/// Returns `url` with the value of its `token` parameter replaced.
pub fn redact_token(url: &Url) -> Url {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == crate::client::TOKEN_PARAM {
                "REDACTED".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();

    if pairs.is_empty() {
        return redacted;
    }
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted
}
