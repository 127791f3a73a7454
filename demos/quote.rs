//! Fetches the latest quotes for a few symbols and prints them.
//!
//! Reads the token from `IEX_TOKEN`. Set `IEX_OUTPUT_FORMAT=raw` to print the
//! JSON payload instead of a table, and `IEX_API_VERSION=sandbox` to query
//! test data.
//!
//! Run with: `cargo run --example quote -- AAPL MSFT`

use iexcloud::{Client, ClientConfig, Error, Output, Stock};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("iexcloud=debug,quote=info")
        .init();

    let mut symbols: Vec<String> = std::env::args().skip(1).collect();
    if symbols.is_empty() {
        symbols = vec!["AAPL".to_string(), "MSFT".to_string(), "GOOGL".to_string()];
    }

    let client = Client::new(ClientConfig::from_env().build()?)?;
    let stock = Stock::new(client, &symbols)?;

    match stock.quote().await? {
        Output::Table(table) => println!("{table}"),
        Output::Raw(value) => println!("{value:#}"),
        Output::Custom(value) => println!("{value}"),
    }

    Ok(())
}
