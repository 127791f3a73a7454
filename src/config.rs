//! Client configuration.
//!
//! [`ClientConfig`] is an immutable value built once through
//! [`ClientConfigBuilder`]. Values not set explicitly fall back to the
//! `IEX_TOKEN`, `IEX_OUTPUT_FORMAT` and `IEX_API_VERSION` environment variables
//! when the builder is created with [`ClientConfig::from_env`].

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable holding the credential token.
pub const TOKEN_ENV: &str = "IEX_TOKEN";
/// Environment variable holding the default output mode.
pub const OUTPUT_FORMAT_ENV: &str = "IEX_OUTPUT_FORMAT";
/// Environment variable holding the API version.
pub const API_VERSION_ENV: &str = "IEX_API_VERSION";

const DEFAULT_RETRY_COUNT: usize = 3;
const DEFAULT_RETRY_PAUSE: Duration = Duration::from_millis(500);

/// The API versions the provider exposes, each with its own base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    /// The current stable API.
    #[default]
    Stable,
    /// The pinned v1 API.
    V1,
    /// The beta API.
    Beta,
    /// The sandbox environment, which serves test data.
    Sandbox,
}

impl ApiVersion {
    /// Returns the base URL requests for this version are made against.
    ///
    /// ```
    /// use iexcloud::ApiVersion;
    ///
    /// assert_eq!(ApiVersion::Sandbox.base_url(), "https://sandbox.iexapis.com/stable/");
    /// ```
    pub const fn base_url(self) -> &'static str {
        match self {
            ApiVersion::Stable => "https://cloud.iexapis.com/stable/",
            ApiVersion::V1 => "https://cloud.iexapis.com/v1/",
            ApiVersion::Beta => "https://cloud.iexapis.com/beta/",
            ApiVersion::Sandbox => "https://sandbox.iexapis.com/stable/",
        }
    }

    /// Returns the name used in configuration.
    pub const fn as_str(self) -> &'static str {
        match self {
            ApiVersion::Stable => "stable",
            ApiVersion::V1 => "v1",
            ApiVersion::Beta => "beta",
            ApiVersion::Sandbox => "sandbox",
        }
    }
}

impl FromStr for ApiVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stable" => Ok(ApiVersion::Stable),
            "v1" => Ok(ApiVersion::V1),
            "beta" => Ok(ApiVersion::Beta),
            "sandbox" => Ok(ApiVersion::Sandbox),
            other => Err(Error::InvalidConfiguration(format!(
                "Please select a valid API version (stable, sandbox, beta, v1), got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How successful query results are handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// The parsed JSON value, untouched.
    #[serde(alias = "json")]
    Raw,
    /// A [`Table`](crate::Table), or the result of a caller-supplied transform.
    #[default]
    #[serde(alias = "pandas")]
    Tabular,
}

impl FromStr for OutputMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" | "json" => Ok(OutputMode::Raw),
            "tabular" | "pandas" => Ok(OutputMode::Tabular),
            other => Err(Error::InvalidConfiguration(format!(
                "Please enter a valid output format (raw or tabular), got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Raw => f.write_str("raw"),
            OutputMode::Tabular => f.write_str("tabular"),
        }
    }
}

/// Immutable configuration shared by every query of a client.
///
/// # Examples
///
/// ```
/// use iexcloud::{ApiVersion, ClientConfig, OutputMode};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), iexcloud::Error> {
/// let config = ClientConfig::builder()
///     .token("pk_test")
///     .api_version("sandbox")
///     .output_mode("raw")
///     .retry_count(2)
///     .retry_pause(Duration::from_millis(250))
///     .build()?;
///
/// assert_eq!(config.api_version(), ApiVersion::Sandbox);
/// assert_eq!(config.output_mode(), OutputMode::Raw);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    api_version: ApiVersion,
    token: String,
    retry_count: usize,
    retry_pause: Duration,
    output_mode: OutputMode,
    timeout: Option<Duration>,
    base_url: Option<String>,
}

impl ClientConfig {
    /// Creates a builder with no environment fallback.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Creates a builder pre-populated from the environment.
    ///
    /// Reads [`TOKEN_ENV`], [`OUTPUT_FORMAT_ENV`] and [`API_VERSION_ENV`].
    /// Values set on the builder afterwards take precedence.
    pub fn from_env() -> ClientConfigBuilder {
        ClientConfigBuilder {
            token: std::env::var(TOKEN_ENV).ok(),
            output_mode: std::env::var(OUTPUT_FORMAT_ENV).ok(),
            api_version: std::env::var(API_VERSION_ENV).ok(),
            ..Default::default()
        }
    }

    /// The selected API version.
    pub const fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    /// The credential token sent with every request.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Number of retries after the first attempt.
    pub const fn retry_count(&self) -> usize {
        self.retry_count
    }

    /// Constant pause between attempts.
    pub const fn retry_pause(&self) -> Duration {
        self.retry_pause
    }

    /// The default output mode.
    pub const fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    /// Per-request transport timeout, if any.
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The base URL requests are made against.
    ///
    /// This is the version's base URL unless an override was configured.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.api_version.base_url())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_version", &self.api_version)
            .field("token", &"<redacted>")
            .field("retry_count", &self.retry_count)
            .field("retry_pause", &self.retry_pause)
            .field("output_mode", &self.output_mode)
            .field("timeout", &self.timeout)
            .field("base_url", &self.base_url())
            .finish()
    }
}

/// Builder for [`ClientConfig`].
///
/// The API version and output mode are kept as text until [`build`] so that
/// values from any source (code, environment, CLI) go through the same
/// validation.
///
/// [`build`]: ClientConfigBuilder::build
#[derive(Debug, Default, Clone)]
pub struct ClientConfigBuilder {
    token: Option<String>,
    api_version: Option<String>,
    output_mode: Option<String>,
    retry_count: Option<usize>,
    retry_pause: Option<Duration>,
    timeout: Option<Duration>,
    base_url: Option<String>,
}

impl ClientConfigBuilder {
    /// Sets the credential token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the API version by name (`stable`, `v1`, `beta` or `sandbox`).
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Sets the output mode by name (`raw` or `tabular`).
    pub fn output_mode(mut self, mode: impl Into<String>) -> Self {
        self.output_mode = Some(mode.into());
        self
    }

    /// Sets the number of retries after the first attempt.
    pub fn retry_count(mut self, retry_count: usize) -> Self {
        self.retry_count = Some(retry_count);
        self
    }

    /// Sets the constant pause between attempts.
    pub fn retry_pause(mut self, pause: Duration) -> Self {
        self.retry_pause = Some(pause);
        self
    }

    /// Sets the per-request transport timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replaces the version-mapped base URL, e.g. to route through a proxy.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Validates the collected values and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when the API version or output
    /// mode is not one of the known names, or when the token is missing.
    /// Returns [`Error::InvalidUrl`] when a base URL override does not parse.
    pub fn build(self) -> Result<ClientConfig> {
        let api_version = match self.api_version {
            Some(version) => version.parse()?,
            None => ApiVersion::default(),
        };
        let output_mode = match self.output_mode {
            Some(mode) => mode.parse()?,
            None => OutputMode::default(),
        };

        let token = self
            .token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                Error::InvalidConfiguration(format!(
                    "An API token is required (set it explicitly or via {TOKEN_ENV})"
                ))
            })?;

        let base_url = match self.base_url {
            Some(url) => {
                // Same shape as the version-mapped base URLs.
                let url = if url.ends_with('/') { url } else { format!("{url}/") };
                url::Url::parse(&url)?;
                Some(url)
            }
            None => None,
        };

        Ok(ClientConfig {
            api_version,
            token,
            retry_count: self.retry_count.unwrap_or(DEFAULT_RETRY_COUNT),
            retry_pause: self.retry_pause.unwrap_or(DEFAULT_RETRY_PAUSE),
            output_mode,
            timeout: self.timeout,
            base_url,
        })
    }
}
