//! Error types for IEX Cloud queries.
//!
//! Every failure of the query pipeline surfaces to the caller as an [`Error`].
//! Errors that originate from a provider response keep the HTTP status and the
//! raw body text so they can be logged or displayed as-is.

use http::StatusCode;

/// The main error type for IEX Cloud queries.
///
/// # Examples
///
/// ```no_run
/// use iexcloud::{Client, ClientConfig, EndpointDescriptor, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::new(ClientConfig::builder().token("pk_test").build()?)?;
///
/// match client.execute(&EndpointDescriptor::new("stock/aapl/quote")).await {
///     Ok(value) => println!("Quote: {}", value),
///     Err(Error::QueryFailed { status, raw_response, reason }) => {
///         eprintln!("Query failed ({status}, {reason:?}): {raw_response}");
///     }
///     Err(Error::TransportUnavailable { attempts, source }) => {
///         eprintln!("No response after {attempts} attempts: {source}");
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The client configuration is invalid.
    ///
    /// Raised at construction when the output mode or API version is outside
    /// its enumerated set, or when no token was supplied. Fix the
    /// configuration before trying again.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The query could not be completed.
    ///
    /// Either every attempt returned a non-200 status, or a 200 response was
    /// rejected by validation. The status and body are those of the last
    /// response observed.
    #[error("An error occurred while making the query ({status}): {raw_response}")]
    QueryFailed {
        /// The HTTP status code of the last observed response
        status: StatusCode,
        /// The raw body of the last observed response
        raw_response: String,
        /// Why the response was rejected
        reason: FailureReason,
    },

    /// No attempt produced an HTTP response.
    ///
    /// Every attempt failed at the transport level (connection refused,
    /// timeout, ...), so there is no status or body to report.
    #[error("Transport unavailable after {attempts} attempts: {source}")]
    TransportUnavailable {
        /// The number of attempts made
        attempts: usize,
        /// The transport error of the final attempt
        #[source]
        source: TransportError,
    },

    /// The validated payload cannot be laid out as a table.
    #[error("Cannot build a table from {0}")]
    NotTabular(String),

    /// An invalid URL was provided or built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// An endpoint path that would leave the versioned base URL.
    #[error("Endpoint path {0:?} must stay below the base URL")]
    InvalidPath(String),
}

/// Why a response was classified as a failed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The provider answered with a status other than 200 on every attempt.
    Status,
    /// A 200 response whose body was the plain text `Unknown symbol`.
    UnknownSymbol,
    /// A 200 response whose body was not valid JSON.
    InvalidJson,
    /// A 200 response whose body was a JSON string carrying `Error Message`.
    ErrorMessage,
    /// A 200 batch response that was not an object keyed by symbol.
    MalformedBatch,
}

/// A failure of one attempt below the HTTP layer.
///
/// Transport errors consume a retry attempt exactly like a non-200 status.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// A network-level error reported by `reqwest`.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request timed out.
    #[error("Request timed out")]
    Timeout,

    /// Any other transport failure, for custom transports.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::QueryFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::QueryFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Returns the failure classification of a [`Error::QueryFailed`].
    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            Error::QueryFailed { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    pub(crate) fn query_failed(
        status: StatusCode,
        raw_response: impl Into<String>,
        reason: FailureReason,
    ) -> Self {
        Error::QueryFailed {
            status,
            raw_response: raw_response.into(),
            reason,
        }
    }
}

/// A specialized `Result` type for IEX Cloud queries.
pub type Result<T> = std::result::Result<T, Error>;
