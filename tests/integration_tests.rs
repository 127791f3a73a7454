//! Integration tests using wiremock to simulate the IEX Cloud API.

use iexcloud::{
    Client, ClientConfig, EndpointDescriptor, Error, FailureReason, Output, Stock,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, retry_count: usize, mode: &str) -> Client {
    let config = ClientConfig::builder()
        .token("pk_test")
        .base_url(server.uri())
        .retry_count(retry_count)
        .retry_pause(Duration::from_millis(10))
        .output_mode(mode)
        .build()
        .unwrap();
    Client::new(config).unwrap()
}

#[tokio::test]
async fn test_successful_quote() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stock/aapl/quote"))
        .and(query_param("token", "pk_test"))
        .and(header("project", "iex (Language=Rust)"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"symbol": "AAPL", "latestPrice": 190.5}))
                .insert_header("iexcloud-messages-used", "1"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 3, "raw");

    let response = client
        .execute_with_metadata(&EndpointDescriptor::new("stock/aapl/quote"))
        .await
        .unwrap();

    assert_eq!(response.data, json!({"symbol": "AAPL", "latestPrice": 190.5}));
    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(response.attempts, 1);
    assert!(!response.was_retried());
    assert_eq!(response.usage(), Some("1"));
}

#[tokio::test]
async fn test_token_overrides_caller_parameter() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stock/aapl/chart"))
        .and(query_param("token", "pk_test"))
        .and(query_param("range", "1m"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 0, "raw");
    let descriptor = EndpointDescriptor::new("stock/aapl/chart")
        .with_param("range", "1m")
        .with_param("token", "someone-else");

    let value = client.execute(&descriptor).await.unwrap();
    assert_eq!(value, json!([]));
}

#[tokio::test]
async fn test_http_error_retried_until_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stock/aapl/quote"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 2, "raw");

    let result = client.execute(&EndpointDescriptor::new("stock/aapl/quote")).await;

    match result {
        Err(Error::QueryFailed {
            status,
            raw_response,
            reason,
        }) => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(raw_response, "Not found");
            assert_eq!(reason, FailureReason::Status);
        }
        _ => panic!("Expected QueryFailed, got {:?}", result),
    }
}

#[tokio::test]
async fn test_unknown_symbol() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stock/nope/quote"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Unknown symbol"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 3, "raw");

    let err = client
        .execute(&EndpointDescriptor::new("stock/nope/quote"))
        .await
        .unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(200));
    assert_eq!(err.reason(), Some(FailureReason::UnknownSymbol));
}

#[tokio::test]
async fn test_error_message_string() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stock/aapl/quote"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!("{\"Error Message\": \"Invalid API call\"}")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 3, "raw");

    let err = client
        .execute(&EndpointDescriptor::new("stock/aapl/quote"))
        .await
        .unwrap_err();

    assert_eq!(err.reason(), Some(FailureReason::ErrorMessage));
}

#[tokio::test]
async fn test_retry_on_5xx() {
    let mock_server = MockServer::start().await;
    let attempt_count = Arc::new(AtomicUsize::new(0));
    let attempt_count_clone = attempt_count.clone();

    // First two requests fail with 500, third succeeds
    Mock::given(method("GET"))
        .and(path("/stock/aapl/quote"))
        .respond_with(move |_req: &wiremock::Request| {
            let count = attempt_count_clone.fetch_add(1, Ordering::SeqCst);
            if count < 2 {
                ResponseTemplate::new(500).set_body_string("Server error")
            } else {
                ResponseTemplate::new(200).set_body_json(json!({"a": 1}))
            }
        })
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 3, "raw");

    let response = client
        .execute_with_metadata(&EndpointDescriptor::new("stock/aapl/quote"))
        .await
        .unwrap();

    assert_eq!(response.data, json!({"a": 1}));
    assert_eq!(response.attempts, 3);
    assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_connection_refused() {
    // Nothing listens on the discard port.
    let config = ClientConfig::builder()
        .token("pk_test")
        .base_url("http://127.0.0.1:9")
        .retry_count(1)
        .retry_pause(Duration::from_millis(10))
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let client = Client::new(config).unwrap();

    let result = client.execute(&EndpointDescriptor::new("status")).await;

    match result {
        Err(Error::TransportUnavailable { attempts, .. }) => assert_eq!(attempts, 2),
        _ => panic!("Expected TransportUnavailable, got {:?}", result),
    }
}

#[tokio::test]
async fn test_fetch_tabular() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stock/aapl/chart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"date": "2024-01-02", "close": 185.64},
            {"date": "2024-01-03", "close": 184.25}
        ])))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 0, "tabular");

    let out = client
        .fetch(&EndpointDescriptor::new("stock/aapl/chart"))
        .await
        .unwrap();

    let table = out.as_table().unwrap();
    assert_eq!(table.columns(), ["date", "close"]);
    assert_eq!(table.f64_column("close").unwrap(), [Some(185.64), Some(184.25)]);
}

#[tokio::test]
async fn test_fetch_with_in_raw_mode() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stock/aapl/quote"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"latestPrice": 190.5})))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 0, "raw");

    let out = client
        .fetch_with(&EndpointDescriptor::new("stock/aapl/quote"), |v: Value| {
            v["latestPrice"].as_f64()
        })
        .await
        .unwrap();

    assert_eq!(out, Output::Raw(json!({"latestPrice": 190.5})));
}

#[tokio::test]
async fn test_stock_batch_quotes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stock/market/batch"))
        .and(query_param("symbols", "AAPL,MSFT"))
        .and(query_param("types", "quote"))
        .and(query_param("token", "pk_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "AAPL": {"quote": {"symbol": "AAPL", "latestPrice": 190.5}},
            "MSFT": {"quote": {"symbol": "MSFT", "latestPrice": 410.0}}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let stock = Stock::new(client(&mock_server, 0, "tabular"), ["aapl", "msft"]).unwrap();

    let table = stock.quote().await.unwrap().into_table().unwrap();

    assert_eq!(table.columns(), ["symbol", "latestPrice"]);
    assert_eq!(table.len(), 2);
    assert_eq!(table.f64_column("latestPrice").unwrap(), [Some(190.5), Some(410.0)]);
}

#[tokio::test]
async fn test_stock_batches_are_merged() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stock/market/batch"))
        .respond_with(|req: &wiremock::Request| {
            let symbols = req
                .url
                .query_pairs()
                .find(|(key, _)| key == "symbols")
                .map(|(_, value)| value.into_owned())
                .unwrap_or_default();
            let body: serde_json::Map<String, Value> = symbols
                .split(',')
                .map(|symbol| {
                    (
                        symbol.to_string(),
                        json!({"advanced-stats": {"month1ChangePercent": 0.01}}),
                    )
                })
                .collect();
            ResponseTemplate::new(200).set_body_json(Value::Object(body))
        })
        .expect(2)
        .mount(&mock_server)
        .await;

    let symbols: Vec<String> = (0..150).map(|i| format!("S{i}")).collect();
    let stock = Stock::new(client(&mock_server, 0, "raw"), &symbols).unwrap();

    let value = stock.advanced_stats().await.unwrap().into_raw().unwrap();

    let merged = value.as_object().unwrap();
    assert_eq!(merged.len(), 150);
    assert!(merged.contains_key("S0"));
    assert!(merged.contains_key("S149"));
}

#[tokio::test]
async fn test_stock_single_symbol_with_transform() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stock/aapl/advanced-stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"peRatio": 29.4})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let stock = Stock::new(client(&mock_server, 0, "tabular"), ["AAPL"]).unwrap();

    let out = stock
        .advanced_stats_with(|v: Value| v["peRatio"].as_f64())
        .await
        .unwrap();

    assert_eq!(out, Output::Custom(Some(29.4)));
}

#[tokio::test]
async fn test_stock_single_symbol_non_object_not_tabular() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stock/aapl/quote"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let stock = Stock::new(client(&mock_server, 0, "tabular"), ["AAPL"]).unwrap();

    let result = stock.quote().await;

    assert!(matches!(result, Err(Error::NotTabular(_))), "got {:?}", result);
}

#[tokio::test]
async fn test_stock_malformed_batch_rejected() {
    let mock_server = MockServer::start().await;
    let batch_count = Arc::new(AtomicUsize::new(0));
    let batch_count_clone = batch_count.clone();

    // The second batch answers with an array instead of an object
    Mock::given(method("GET"))
        .and(path("/stock/market/batch"))
        .respond_with(move |_req: &wiremock::Request| {
            if batch_count_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                ResponseTemplate::new(200).set_body_json(json!({"S0": {"quote": {}}}))
            } else {
                ResponseTemplate::new(200).set_body_json(json!([]))
            }
        })
        .expect(2)
        .mount(&mock_server)
        .await;

    let symbols: Vec<String> = (0..150).map(|i| format!("S{i}")).collect();
    let stock = Stock::new(client(&mock_server, 0, "raw"), &symbols).unwrap();

    let err = stock.quote().await.unwrap_err();

    assert_eq!(err.reason(), Some(FailureReason::MalformedBatch));
    assert_eq!(err.raw_response(), Some("[]"));
}
