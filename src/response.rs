//! Successful query results with their HTTP details.
//!
//! [`Client::execute`](crate::Client::execute) returns only the parsed value.
//! [`Client::execute_with_metadata`](crate::Client::execute_with_metadata)
//! wraps it in a [`Response`] that also keeps the status, headers, raw body,
//! latency and number of attempts.

use crate::observer::USAGE_HEADER;
use http::{HeaderMap, StatusCode};
use std::time::Duration;

/// A validated response and the details of the HTTP exchange that produced it.
///
/// # Examples
///
/// ```no_run
/// use iexcloud::{Client, ClientConfig, EndpointDescriptor};
///
/// # async fn example() -> Result<(), iexcloud::Error> {
/// let client = Client::new(ClientConfig::from_env().build()?)?;
///
/// let response = client
///     .execute_with_metadata(&EndpointDescriptor::new("stock/aapl/quote"))
///     .await?;
///
/// println!("Latest price: {}", response.data["latestPrice"]);
/// println!("Request took {:?} over {} attempts", response.latency, response.attempts);
/// println!("Messages used: {}", response.usage().unwrap_or("N/A"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The validated response data.
    pub data: T,

    /// The raw response body as a string.
    pub raw_body: String,

    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// Time from the first attempt until the successful response, pauses
    /// included.
    pub latency: Duration,

    /// The number of attempts made, the successful one included.
    pub attempts: usize,
}

impl<T> Response<T> {
    /// Creates a new `Response`.
    pub fn new(
        data: T,
        raw_body: String,
        status: StatusCode,
        headers: HeaderMap,
        latency: Duration,
        attempts: usize,
    ) -> Self {
        Self {
            data,
            raw_body,
            status,
            headers,
            latency,
            attempts,
        }
    }

    /// Returns `true` if the request required retries.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// The provider's message usage counter, if the response carried one.
    ///
    /// # Examples
    ///
    /// ```
    /// # use iexcloud::Response;
    /// # use http::{HeaderMap, HeaderValue, StatusCode};
    /// # use std::time::Duration;
    /// let mut headers = HeaderMap::new();
    /// headers.insert("iexcloud-messages-used", HeaderValue::from_static("12"));
    ///
    /// let response = Response::new((), String::new(), StatusCode::OK, headers, Duration::ZERO, 1);
    ///
    /// assert_eq!(response.usage(), Some("12"));
    /// ```
    pub fn usage(&self) -> Option<&str> {
        self.headers.get(USAGE_HEADER)?.to_str().ok()
    }
}
