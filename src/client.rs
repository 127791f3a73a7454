//! The query executor.
//!
//! [`Client`] turns an [`EndpointDescriptor`] into a validated JSON value:
//! it builds the request target, injects the credential token, retries
//! failed attempts with a constant pause, and hands 200 responses to
//! [`validate`](crate::validate). [`Client::fetch`] then formats the value
//! according to the configured [`OutputMode`](crate::OutputMode).

use crate::{
    format::{format, Output},
    observer::{QueryObserver, TracingObserver, USAGE_HEADER},
    retry::{RetryPolicy, RetryState},
    transport::{RawResponse, ReqwestTransport, Transport},
    validate::validate,
    ClientConfig, EndpointDescriptor, Error, Response, Result,
};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Query parameter the credential token is sent under.
pub const TOKEN_PARAM: &str = "token";

const PROJECT_HEADER: &str = "project";
const PROJECT_HEADER_VALUE: &str = "iex (Language=Rust)";

/// Executes queries against the IEX Cloud API.
///
/// The client is meant to be reused across many sequential queries: it owns
/// the configuration and the HTTP session. Queries made through one client
/// never overlap their attempts; retries are strictly sequential.
///
/// # Examples
///
/// ```no_run
/// use iexcloud::{Client, ClientConfig, EndpointDescriptor, Output};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), iexcloud::Error> {
/// let config = ClientConfig::builder()
///     .token("pk_test")
///     .retry_count(3)
///     .retry_pause(Duration::from_millis(500))
///     .build()?;
/// let client = Client::new(config)?;
///
/// let quote = EndpointDescriptor::new("stock/aapl/quote");
///
/// // The validated JSON value
/// let value = client.execute(&quote).await?;
/// println!("{}", value["latestPrice"]);
///
/// // Formatted according to the configured output mode
/// if let Output::Table(table) = client.fetch(&quote).await? {
///     println!("{table}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct Client<T = ReqwestTransport> {
    inner: Arc<ClientInner<T>>,
    observer: Arc<dyn QueryObserver>,
}

struct ClientInner<T> {
    transport: T,
    config: ClientConfig,
    base_url: Url,
    default_headers: HeaderMap,
    retry_policy: RetryPolicy,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            observer: Arc::clone(&self.observer),
        }
    }
}

impl Client<ReqwestTransport> {
    /// Creates a client with a fresh `reqwest` session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the HTTP session cannot be
    /// created, or [`Error::InvalidUrl`] if the base URL does not parse.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout()).map_err(|e| {
            Error::InvalidConfiguration(format!("Failed to build HTTP client: {}", e))
        })?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> Client<T> {
    /// Creates a client on top of a custom transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the base URL does not parse.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        let base_url = Url::parse(config.base_url())?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            HeaderName::from_static(PROJECT_HEADER),
            HeaderValue::from_static(PROJECT_HEADER_VALUE),
        );

        let retry_policy = RetryPolicy::from_config(&config);

        Ok(Self {
            inner: Arc::new(ClientInner {
                transport,
                config,
                base_url,
                default_headers,
                retry_policy,
            }),
            observer: Arc::new(TracingObserver),
        })
    }

    /// Replaces the diagnostics observer (by default [`TracingObserver`]).
    pub fn with_observer(mut self, observer: impl QueryObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The retry policy derived from the configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.inner.retry_policy
    }

    /// Builds the full request target for `descriptor`.
    ///
    /// The descriptor's path segments are appended to the versioned base
    /// URL, and its parameters are merged with the credential token, which
    /// overrides any caller-supplied `token` parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if the path is an absolute URL or has
    /// `.` or `..` segments.
    pub fn prepare_query(&self, descriptor: &EndpointDescriptor) -> Result<Url> {
        let path = descriptor.path();
        if Url::parse(path).is_ok() || path.split('/').any(|s| s == "." || s == "..") {
            return Err(Error::InvalidPath(path.to_string()));
        }

        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));

        {
            let mut query = url.query_pairs_mut();
            for (key, value) in descriptor.params() {
                if key != TOKEN_PARAM {
                    query.append_pair(key, value);
                }
            }
            query.append_pair(TOKEN_PARAM, self.inner.config.token());
        }

        Ok(url)
    }

    /// Executes a query and returns the validated JSON value.
    ///
    /// # Errors
    ///
    /// - [`Error::QueryFailed`] when every attempt returned a non-200 status,
    ///   or when a 200 response fails validation (not retried).
    /// - [`Error::TransportUnavailable`] when no attempt got a response.
    /// - [`Error::InvalidPath`] when the request target would leave the base
    ///   URL.
    pub async fn execute(&self, descriptor: &EndpointDescriptor) -> Result<Value> {
        self.execute_with_metadata(descriptor)
            .await
            .map(|response| response.data)
    }

    /// Executes a query and returns the validated value with its HTTP
    /// details.
    ///
    /// # Errors
    ///
    /// Same as [`Client::execute`].
    pub async fn execute_with_metadata(
        &self,
        descriptor: &EndpointDescriptor,
    ) -> Result<Response<Value>> {
        let url = self.prepare_query(descriptor)?;
        let policy = self.inner.retry_policy;
        let start_time = Instant::now();
        let mut state = RetryState::default();

        loop {
            let attempt = state.begin_attempt();
            self.observer.on_request(&url, attempt);

            match self
                .inner
                .transport
                .get(url.clone(), self.inner.default_headers.clone())
                .await
            {
                Ok(response) => {
                    self.observer.on_response(response.status, attempt);

                    if response.status == StatusCode::OK {
                        return self.parse_response(response, start_time.elapsed(), attempt);
                    }
                    state.record_response(response.status, response.body);
                }
                Err(e) => {
                    self.observer.on_transport_error(&e, attempt);
                    state.record_transport_error(e);
                }
            }

            match policy.delay_for_attempt(attempt) {
                Some(delay) => self.pause(delay, attempt).await,
                None => return Err(state.into_error()),
            }
        }
    }

    /// Executes a query and formats the result per the configured output
    /// mode: the raw value, or a [`Table`](crate::Table).
    ///
    /// # Errors
    ///
    /// Same as [`Client::execute`], plus [`Error::NotTabular`] when a table
    /// is requested for a payload without tabular shape.
    pub async fn fetch(&self, descriptor: &EndpointDescriptor) -> Result<Output> {
        self.fetch_inner::<Value, fn(Value) -> Value>(descriptor, None)
            .await
    }

    /// Executes a query and applies `transform` to the result.
    ///
    /// In raw mode the transform is ignored and [`Output::Raw`] is returned.
    ///
    /// # Errors
    ///
    /// Same as [`Client::execute`].
    pub async fn fetch_with<U, F>(
        &self,
        descriptor: &EndpointDescriptor,
        transform: F,
    ) -> Result<Output<U>>
    where
        F: FnOnce(Value) -> U,
    {
        self.fetch_inner(descriptor, Some(transform)).await
    }

    async fn fetch_inner<U, F>(
        &self,
        descriptor: &EndpointDescriptor,
        transform: Option<F>,
    ) -> Result<Output<U>>
    where
        F: FnOnce(Value) -> U,
    {
        let value = self.execute(descriptor).await?;
        format(value, self.inner.config.output_mode(), transform)
    }

    /// Validates a 200 response and wraps it with its metadata.
    fn parse_response(
        &self,
        response: RawResponse,
        latency: Duration,
        attempts: usize,
    ) -> Result<Response<Value>> {
        let usage = response
            .headers
            .get(USAGE_HEADER)
            .and_then(|value| value.to_str().ok());
        self.observer.on_usage(usage);

        match validate(&response.body, response.status) {
            Ok(data) => Ok(Response::new(
                data,
                response.body,
                response.status,
                response.headers,
                latency,
                attempts,
            )),
            Err(e) => {
                self.observer.on_rejected(&e, attempts);
                Err(e)
            }
        }
    }

    async fn pause(&self, delay: Duration, attempt: usize) {
        self.observer.on_retry(delay, attempt);
        tokio::time::sleep(delay).await;
    }
}
