//! # iexcloud - IEX Cloud query client
//!
//! A client for the IEX Cloud financial-data API built on top of `reqwest`.
//! Every query goes through the same pipeline:
//!
//! 1. an [`EndpointDescriptor`] names the path and query parameters;
//! 2. the [`Client`] injects the credential token and issues GET attempts,
//!    pausing a constant [`retry_pause`](ClientConfig::retry_pause) between
//!    failures;
//! 3. a 200 response is [validated](validate), catching the provider's
//!    disguised errors;
//! 4. the value is [formatted](format()) as raw JSON, a [`Table`], or the
//!    result of a caller-supplied transform.
//!
//! ## Quick Start
//!
//! ```no_run
//! use iexcloud::{Client, ClientConfig, Output, Stock};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), iexcloud::Error> {
//!     // Token and output mode may also come from IEX_TOKEN / IEX_OUTPUT_FORMAT
//!     let config = ClientConfig::from_env()
//!         .api_version("stable")
//!         .retry_count(3)
//!         .retry_pause(Duration::from_millis(500))
//!         .build()?;
//!     let client = Client::new(config)?;
//!
//!     let stock = Stock::new(client, ["AAPL", "MSFT"])?;
//!     match stock.quote().await? {
//!         Output::Table(quotes) => println!("{quotes}"),
//!         Output::Raw(value) => println!("{value:#}"),
//!         Output::Custom(_) => unreachable!(),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! ```no_run
//! use iexcloud::{Client, ClientConfig, EndpointDescriptor, Error, FailureReason};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = Client::new(ClientConfig::builder().token("pk_test").build()?)?;
//! match client.execute(&EndpointDescriptor::new("stock/nope/quote")).await {
//!     Ok(value) => println!("Success: {}", value),
//!     Err(Error::QueryFailed { reason: FailureReason::UnknownSymbol, .. }) => {
//!         eprintln!("No such symbol");
//!     }
//!     Err(Error::QueryFailed { status, raw_response, .. }) => {
//!         eprintln!("HTTP error {}: {}", status, raw_response);
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Diagnostics
//!
//! Requests, responses, the provider's message usage counter and retries are
//! reported to a [`QueryObserver`]. The default [`TracingObserver`] emits
//! `tracing` events with the token redacted; use
//! [`Client::with_observer`] to route them elsewhere.

mod client;
mod config;
mod endpoint;
mod error;
mod format;
pub mod observer;
mod response;
mod retry;
pub mod stock;
mod table;
pub mod transport;
mod validate;

pub use client::{Client, TOKEN_PARAM};
pub use config::{
    ApiVersion, ClientConfig, ClientConfigBuilder, OutputMode, API_VERSION_ENV, OUTPUT_FORMAT_ENV,
    TOKEN_ENV,
};
pub use endpoint::EndpointDescriptor;
pub use error::{Error, FailureReason, Result, TransportError};
pub use format::{apply, format, Format, Output};
pub use observer::{QueryObserver, TracingObserver};
pub use response::Response;
pub use retry::RetryPolicy;
pub use stock::{Stock, StockEndpoint};
pub use table::Table;
pub use transport::{RawResponse, ReqwestTransport, Transport};
pub use validate::validate;
