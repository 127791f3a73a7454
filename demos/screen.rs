//! A momentum and value screen over a list of symbols.
//!
//! Quotes and advanced stats are joined per symbol, and symbols missing any
//! screened figure are dropped. Two scores are then computed within the list:
//!
//! - HQM ("high quality momentum"): the mean percentile of the 1 year,
//!   6 month, 3 month and 1 month price changes;
//! - RV ("robust value"): the mean percentile of price-to-book,
//!   price-to-sales, EV/EBITDA and EV/gross profit.
//!
//! The top scorers of both lists are sized as an equal-weight portfolio.
//!
//! Run with: `IEX_TOKEN=... cargo run --example screen -- AAPL MSFT NVDA AMZN META`

use iexcloud::{Client, ClientConfig, Error, Stock, Table};
use serde_json::{json, Value};
use std::collections::HashMap;

const QUOTE_COLUMNS: [&str; 2] = ["marketCap", "latestPrice"];
const STATS_COLUMNS: [&str; 9] = [
    "year1ChangePercent",
    "month6ChangePercent",
    "month3ChangePercent",
    "month1ChangePercent",
    "priceToBook",
    "priceToSales",
    "enterpriseValue",
    "EBITDA",
    "grossProfit",
];
const MOMENTUM_COLUMNS: [&str; 4] = [
    "year1ChangePercent",
    "month6ChangePercent",
    "month3ChangePercent",
    "month1ChangePercent",
];
const VALUE_COLUMNS: [&str; 4] = [
    "priceToBook",
    "priceToSales",
    "ev_to_ebitda",
    "ev_to_gross_profit",
];
const TOP_N: usize = 50;
const PORTFOLIO_SIZE: f64 = 5_000_000.0;

type Figures = HashMap<&'static str, f64>;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("iexcloud=info,screen=info")
        .init();

    let symbols: Vec<String> = std::env::args().skip(1).collect();
    let client = Client::new(ClientConfig::from_env().output_mode("tabular").build()?)?;
    let stock = Stock::new(client, &symbols)?;

    let quotes = table_of(stock.quote().await?.into_table())?;
    let stats = table_of(stock.advanced_stats().await?.into_table())?;

    let mut universe = join(&quotes, &stats);
    for figures in universe.values_mut() {
        figures.insert("ev_to_ebitda", figures["enterpriseValue"] / figures["EBITDA"]);
        figures.insert(
            "ev_to_gross_profit",
            figures["enterpriseValue"] / figures["grossProfit"],
        );
    }
    universe.retain(|_, figures| figures.values().all(|v| v.is_finite()));

    let hqm = percentile_score(&universe, &MOMENTUM_COLUMNS, TOP_N);
    let rv = percentile_score(&universe, &VALUE_COLUMNS, TOP_N);

    // Only symbols ranked on both lists make it into the portfolio.
    let mut picks: Vec<(&String, f64, f64)> = hqm
        .iter()
        .filter_map(|(symbol, hqm)| Some((symbol, *hqm, *rv.get(symbol)?)))
        .collect();
    picks.sort_by(|a, b| b.1.total_cmp(&a.1));

    let position_size = PORTFOLIO_SIZE / picks.len().max(1) as f64;
    let records: Vec<Value> = picks
        .iter()
        .map(|(symbol, hqm, rv)| {
            let price = universe[*symbol]["latestPrice"];
            json!({
                "symbol": symbol,
                "hqm_score": round3(*hqm),
                "rv_score": round3(*rv),
                "latestPrice": price,
                "shares_to_buy": (position_size / price).floor() as u64,
            })
        })
        .collect();

    println!("{}", Table::from_records(&records)?);
    Ok(())
}

fn table_of(table: Option<Table>) -> Result<Table, Error> {
    table.ok_or_else(|| Error::NotTabular("a screen input that is not a table".to_string()))
}

/// Inner join of quotes and stats on `symbol`, keeping symbols with every
/// screened figure present and positive prices.
fn join(quotes: &Table, stats: &Table) -> HashMap<String, Figures> {
    let quote_rows = rows_by_symbol(quotes, &QUOTE_COLUMNS);
    let stats_rows = rows_by_symbol(stats, &STATS_COLUMNS);

    quote_rows
        .into_iter()
        .filter_map(|(symbol, mut figures)| {
            figures.extend(stats_rows.get(&symbol)?);
            (figures["latestPrice"] > 0.0).then_some((symbol, figures))
        })
        .collect()
}

/// Maps each row's symbol to its figures in `columns`, dropping rows with a
/// gap in any of them.
fn rows_by_symbol(table: &Table, columns: &[&'static str]) -> HashMap<String, Figures> {
    let Some(symbols) = table.string_column("symbol") else {
        return HashMap::new();
    };
    let values: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|column| {
            table
                .f64_column(column)
                .unwrap_or_else(|| vec![None; table.len()])
        })
        .collect();

    symbols
        .into_iter()
        .enumerate()
        .filter_map(|(row, symbol)| {
            let figures = columns
                .iter()
                .zip(&values)
                .map(|(column, cells)| Some((*column, cells[row]?)))
                .collect::<Option<Figures>>()?;
            Some((symbol?, figures))
        })
        .collect()
}

/// Mean percentile of `columns` for every symbol, keeping the `top_n`
/// highest scores.
fn percentile_score(
    universe: &HashMap<String, Figures>,
    columns: &[&str],
    top_n: usize,
) -> HashMap<String, f64> {
    let mut scores: Vec<(String, f64)> = universe
        .iter()
        .map(|(symbol, figures)| {
            let total: f64 = columns
                .iter()
                .map(|column| {
                    let values: Vec<f64> = universe.values().map(|f| f[*column]).collect();
                    percentile_of(&values, figures[*column])
                })
                .sum();
            (symbol.clone(), total / columns.len() as f64)
        })
        .collect();
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));
    scores.truncate(top_n);
    scores.into_iter().collect()
}

/// Rank percentile of `score` within `values`, in `0.0..=1.0`; ties take the
/// mean of their positions.
fn percentile_of(values: &[f64], score: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let below = values.iter().filter(|v| **v < score).count();
    let at_or_below = values.iter().filter(|v| **v <= score).count();
    let ties = usize::from(at_or_below > below);
    (below + at_or_below + ties) as f64 / (2 * values.len()) as f64
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
