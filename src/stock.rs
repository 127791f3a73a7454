//! Stock resources: quotes and advanced statistics.
//!
//! A [`Stock`] covers one or many symbols. A single symbol is queried on its
//! own endpoint (`stock/{symbol}/{type}`); several symbols go through the
//! market batch endpoint in sequential batches of at most
//! [`MAX_BATCH_SYMBOLS`].

use crate::{
    error::FailureReason,
    format::{format, Output},
    transport::{ReqwestTransport, Transport},
    Client, EndpointDescriptor, Error, Result, Table,
};
use http::StatusCode;
use serde_json::{Map, Value};
use std::fmt;

/// Largest number of symbols the batch endpoint accepts per request.
pub const MAX_BATCH_SYMBOLS: usize = 100;

const SYMBOL_COLUMN: &str = "symbol";

/// The stock data types this collaborator knows how to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StockEndpoint {
    /// Latest quote.
    Quote,
    /// Key and advanced statistics (valuation ratios, price changes, ...).
    AdvancedStats,
}

impl StockEndpoint {
    /// The provider's name for this data type.
    pub const fn as_str(self) -> &'static str {
        match self {
            StockEndpoint::Quote => "quote",
            StockEndpoint::AdvancedStats => "advanced-stats",
        }
    }
}

impl fmt::Display for StockEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Queries stock resources for a fixed set of symbols.
///
/// In tabular mode the result is a [`Table`] with one row per symbol and a
/// leading `symbol` column.
///
/// # Examples
///
/// ```no_run
/// use iexcloud::{Client, ClientConfig, Output, Stock};
///
/// # async fn example() -> Result<(), iexcloud::Error> {
/// let client = Client::new(ClientConfig::from_env().output_mode("tabular").build()?)?;
/// let stock = Stock::new(client, ["AAPL", "MSFT"])?;
///
/// if let Output::Table(quotes) = stock.quote().await? {
///     println!("{quotes}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct Stock<T = ReqwestTransport> {
    client: Client<T>,
    symbols: Vec<String>,
}

impl<T: Transport> Stock<T> {
    /// Creates a stock collaborator for `symbols`, upper-cased.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when no symbol is given or a
    /// symbol is blank.
    pub fn new<S>(client: Client<T>, symbols: impl IntoIterator<Item = S>) -> Result<Self>
    where
        S: AsRef<str>,
    {
        let symbols: Vec<String> = symbols
            .into_iter()
            .map(|symbol| symbol.as_ref().trim().to_ascii_uppercase())
            .collect();

        if symbols.is_empty() {
            return Err(Error::InvalidConfiguration(
                "At least one symbol is required".to_string(),
            ));
        }
        if symbols.iter().any(String::is_empty) {
            return Err(Error::InvalidConfiguration(
                "Symbols must not be blank".to_string(),
            ));
        }

        Ok(Self { client, symbols })
    }

    /// The symbols this collaborator queries.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// The descriptors issued for `endpoint`, in request order.
    pub fn descriptors(&self, endpoint: StockEndpoint) -> Vec<EndpointDescriptor> {
        if let [symbol] = self.symbols.as_slice() {
            return vec![EndpointDescriptor::new(format!(
                "stock/{}/{}",
                symbol.to_ascii_lowercase(),
                endpoint
            ))];
        }

        self.symbols
            .chunks(MAX_BATCH_SYMBOLS)
            .map(|batch| {
                EndpointDescriptor::new("stock/market/batch")
                    .with_param("symbols", batch.join(","))
                    .with_param("types", endpoint.as_str())
            })
            .collect()
    }

    /// Latest quotes.
    ///
    /// # Errors
    ///
    /// Any error of [`Client::execute`].
    pub async fn quote(&self) -> Result<Output> {
        self.fetch(StockEndpoint::Quote).await
    }

    /// Latest quotes, passed through `transform` in tabular mode.
    ///
    /// # Errors
    ///
    /// Any error of [`Client::execute`].
    pub async fn quote_with<U, F>(&self, transform: F) -> Result<Output<U>>
    where
        F: FnOnce(Value) -> U,
    {
        self.fetch_with(StockEndpoint::Quote, transform).await
    }

    /// Advanced statistics.
    ///
    /// # Errors
    ///
    /// Any error of [`Client::execute`].
    pub async fn advanced_stats(&self) -> Result<Output> {
        self.fetch(StockEndpoint::AdvancedStats).await
    }

    /// Advanced statistics, passed through `transform` in tabular mode.
    ///
    /// # Errors
    ///
    /// Any error of [`Client::execute`].
    pub async fn advanced_stats_with<U, F>(&self, transform: F) -> Result<Output<U>>
    where
        F: FnOnce(Value) -> U,
    {
        self.fetch_with(StockEndpoint::AdvancedStats, transform).await
    }

    /// Queries `endpoint` for every symbol and formats the result.
    ///
    /// In tabular mode the payload is laid out with one row per symbol.
    ///
    /// # Errors
    ///
    /// Any error of [`Client::execute`], plus [`Error::NotTabular`] when a
    /// symbol's entry is missing its data or is not an object.
    pub async fn fetch(&self, endpoint: StockEndpoint) -> Result<Output> {
        let value = self.fetch_value(endpoint).await?;
        let tabulate = |value: Value| self.symbol_table(&value, endpoint);

        match format(value, self.client.config().output_mode(), Some(tabulate))? {
            Output::Raw(value) => Ok(Output::Raw(value)),
            Output::Table(table) => Ok(Output::Table(table)),
            Output::Custom(table) => table.map(Output::Table),
        }
    }

    /// Queries `endpoint` for every symbol and applies `transform` in
    /// tabular mode.
    ///
    /// # Errors
    ///
    /// Any error of [`Client::execute`].
    pub async fn fetch_with<U, F>(
        &self,
        endpoint: StockEndpoint,
        transform: F,
    ) -> Result<Output<U>>
    where
        F: FnOnce(Value) -> U,
    {
        let value = self.fetch_value(endpoint).await?;
        format(value, self.client.config().output_mode(), Some(transform))
    }

    /// Runs every descriptor for `endpoint`, in order.
    ///
    /// A single symbol's value is returned as the provider sent it; batch
    /// results are merged into one object keyed by symbol.
    async fn fetch_value(&self, endpoint: StockEndpoint) -> Result<Value> {
        let mut values = Vec::new();
        for descriptor in self.descriptors(endpoint) {
            values.push(self.client.execute(&descriptor).await?);
        }

        if let [_] = self.symbols.as_slice() {
            return Ok(values.pop().unwrap_or(Value::Null));
        }
        merge_batches(values)
    }

    /// Lays a stock payload out with one row per symbol.
    fn symbol_table(&self, value: &Value, endpoint: StockEndpoint) -> Result<Table> {
        if let [symbol] = self.symbols.as_slice() {
            let fields = value.as_object().ok_or_else(|| {
                Error::NotTabular(format!("{endpoint} data for {symbol} that is not an object"))
            })?;
            return Table::from_records(&[symbol_record(symbol, fields)]);
        }

        let batch = value.as_object().ok_or_else(|| {
            Error::NotTabular("a batch payload that is not keyed by symbol".to_string())
        })?;
        let records = batch
            .iter()
            .map(|(symbol, types)| match types.get(endpoint.as_str()) {
                Some(Value::Object(fields)) => Ok(symbol_record(symbol, fields)),
                Some(other) => Err(Error::NotTabular(format!(
                    "{endpoint} data for {symbol} that is not an object ({other})"
                ))),
                None => Err(Error::NotTabular(format!(
                    "a batch entry for {symbol} without {endpoint} data"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Table::from_records(&records)
    }
}

/// Merges batch responses into a single object keyed by symbol.
///
/// Every batch must be an object; anything else is reported as a failed
/// query carrying the offending payload.
fn merge_batches(values: Vec<Value>) -> Result<Value> {
    let mut merged = Map::new();
    for value in values {
        match value {
            Value::Object(batch) => merged.extend(batch),
            other => {
                return Err(Error::query_failed(
                    StatusCode::OK,
                    other.to_string(),
                    FailureReason::MalformedBatch,
                ))
            }
        }
    }
    Ok(Value::Object(merged))
}

fn symbol_record(symbol: &str, fields: &Map<String, Value>) -> Value {
    let mut record = Map::with_capacity(fields.len() + 1);
    record.insert(SYMBOL_COLUMN.to_string(), Value::String(symbol.to_string()));
    for (key, value) in fields {
        if key != SYMBOL_COLUMN {
            record.insert(key.clone(), value.clone());
        }
    }
    Value::Object(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RawResponse;
    use crate::{ClientConfig, TransportError};
    use http::HeaderMap;
    use serde_json::json;
    use url::Url;

    struct Unused;

    impl Transport for Unused {
        async fn get(
            &self,
            _url: Url,
            _headers: HeaderMap,
        ) -> std::result::Result<RawResponse, TransportError> {
            Err(TransportError::Other("not used".to_string()))
        }
    }

    fn stock(symbols: &[&str]) -> Stock<Unused> {
        let config = ClientConfig::builder().token("pk_test").build().unwrap();
        let client = Client::with_transport(config, Unused).unwrap();
        Stock::new(client, symbols.iter().copied()).unwrap()
    }

    #[test]
    fn test_symbols_upper_cased() {
        assert_eq!(stock(&["aapl", " msft "]).symbols(), ["AAPL", "MSFT"]);
    }

    #[test]
    fn test_no_symbols_rejected() {
        let config = ClientConfig::builder().token("pk_test").build().unwrap();
        let client = Client::with_transport(config, Unused).unwrap();

        assert!(matches!(
            Stock::new(client.clone(), Vec::<String>::new()),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(matches!(
            Stock::new(client, ["AAPL", ""]),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_single_symbol_descriptor() {
        let descriptors = stock(&["AAPL"]).descriptors(StockEndpoint::AdvancedStats);

        assert_eq!(descriptors, vec![EndpointDescriptor::new("stock/aapl/advanced-stats")]);
    }

    #[test]
    fn test_batches_of_one_hundred() {
        let symbols: Vec<String> = (0..250).map(|i| format!("S{i}")).collect();
        let refs: Vec<&str> = symbols.iter().map(String::as_str).collect();

        let descriptors = stock(&refs).descriptors(StockEndpoint::Quote);

        assert_eq!(descriptors.len(), 3);
        assert_eq!(descriptors[0].path(), "stock/market/batch");
        assert_eq!(descriptors[0].param("types"), Some("quote"));
        assert_eq!(descriptors[0].param("symbols").unwrap().split(',').count(), 100);
        assert_eq!(descriptors[2].param("symbols").unwrap().split(',').count(), 50);
        assert!(descriptors[2].param("symbols").unwrap().starts_with("S200,"));
    }

    #[test]
    fn test_symbol_table_from_batch() {
        let stock = stock(&["AAPL", "MSFT", "ZZZZ"]);
        let value = json!({
            "AAPL": {"quote": {"symbol": "AAPL", "latestPrice": 190.5}},
            "MSFT": {"quote": {"symbol": "MSFT", "latestPrice": 410.0, "peRatio": 35.2}}
        });

        let table = stock.symbol_table(&value, StockEndpoint::Quote).unwrap();

        assert_eq!(table.columns(), ["symbol", "latestPrice", "peRatio"]);
        assert_eq!(
            table.string_column("symbol").unwrap(),
            [Some("AAPL".to_string()), Some("MSFT".to_string())]
        );
        assert_eq!(table.f64_column("peRatio").unwrap(), [None, Some(35.2)]);
    }

    #[test]
    fn test_symbol_table_single_symbol() {
        let stock = stock(&["AAPL"]);
        let value = json!({"marketcap": 3.0e12, "year1ChangePercent": 0.21});

        let table = stock
            .symbol_table(&value, StockEndpoint::AdvancedStats)
            .unwrap();

        assert_eq!(table.columns(), ["symbol", "marketcap", "year1ChangePercent"]);
        assert_eq!(table.string_column("symbol").unwrap(), [Some("AAPL".to_string())]);
    }

    #[test]
    fn test_single_symbol_non_object_not_tabular() {
        let stock = stock(&["AAPL"]);

        let result = stock.symbol_table(&json!([1, 2, 3]), StockEndpoint::Quote);

        assert!(matches!(result, Err(Error::NotTabular(_))));
    }

    #[test]
    fn test_batch_entry_without_type_not_tabular() {
        let stock = stock(&["AAPL", "MSFT"]);
        let value = json!({
            "AAPL": {"quote": {"latestPrice": 190.5}},
            "MSFT": {"news": []}
        });

        match stock.symbol_table(&value, StockEndpoint::Quote) {
            Err(Error::NotTabular(message)) => assert!(message.contains("MSFT")),
            other => panic!("Expected NotTabular, got {:?}", other),
        }
    }

    #[test]
    fn test_batch_entry_with_scalar_data_not_tabular() {
        let stock = stock(&["AAPL", "MSFT"]);
        let value = json!({"AAPL": {"quote": 1}, "MSFT": {"quote": {"latestPrice": 1.0}}});

        let result = stock.symbol_table(&value, StockEndpoint::Quote);

        assert!(matches!(result, Err(Error::NotTabular(_))));
    }

    #[test]
    fn test_merge_batches() {
        let merged = merge_batches(vec![json!({"A": {"quote": {}}}), json!({"B": {"quote": {}}})])
            .unwrap();

        assert_eq!(merged, json!({"A": {"quote": {}}, "B": {"quote": {}}}));
    }

    #[test]
    fn test_merge_rejects_non_object_batch() {
        let err = merge_batches(vec![json!({"A": {"quote": {}}}), json!([1, 2])]).unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::OK));
        assert_eq!(err.reason(), Some(FailureReason::MalformedBatch));
        assert_eq!(err.raw_response(), Some("[1,2]"));
    }
}
