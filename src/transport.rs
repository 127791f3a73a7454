//! The network seam of the query pipeline.
//!
//! A [`Transport`] performs exactly one HTTP GET per call and buffers the
//! whole body. The executor owns retrying; transports never retry on their
//! own.

use crate::error::TransportError;
use http::{HeaderMap, StatusCode};
use std::future::Future;
use std::time::Duration;
use url::Url;

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The response body as text.
    pub body: String,
}

impl RawResponse {
    /// Creates a response with no headers.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

/// Performs single GET requests on behalf of the executor.
///
/// Implementations are expected to be used from one task at a time; a
/// session that needs concurrency should be cloned or duplicated per task.
///
/// # Examples
///
/// ```
/// use http::{HeaderMap, StatusCode};
/// use iexcloud::{RawResponse, Transport, TransportError};
/// use url::Url;
///
/// /// Answers every request with the same body.
/// struct Fixed(&'static str);
///
/// impl Transport for Fixed {
///     async fn get(&self, _url: Url, _headers: HeaderMap) -> Result<RawResponse, TransportError> {
///         Ok(RawResponse::new(StatusCode::OK, self.0))
///     }
/// }
/// ```
pub trait Transport: Send + Sync {
    /// Issues one GET to `url` (query string included) with `headers`.
    fn get(
        &self,
        url: Url,
        headers: HeaderMap,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

/// The production transport: a reusable `reqwest` session.
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    /// Creates a transport with a fresh session.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder().build()?;
        Ok(Self::with_client(http_client, timeout))
    }

    /// Wraps an existing session, e.g. one shared with other code.
    pub fn with_client(http_client: reqwest::Client, timeout: Option<Duration>) -> Self {
        Self {
            http_client,
            timeout,
        }
    }
}

impl Transport for ReqwestTransport {
    async fn get(&self, url: Url, headers: HeaderMap) -> Result<RawResponse, TransportError> {
        let mut request = self.http_client.get(url).headers(headers);

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(classify)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(classify)?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

fn classify(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(error)
    }
}
