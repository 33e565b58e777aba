//! Kraken public OHLC client (primary candle source)
//!
//! No API key required. The OHLC endpoint answers with
//! `{"error": [], "result": {"<PAIR>": [[time, o, h, l, c, vwap, volume, count], ...], "last": n}}`
//! where prices and volumes are strings. The pair key is Kraken's internal
//! name (`XXBTZUSD` for `XBTUSD`), so the series is taken as whichever
//! entry is not `last`.

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::Value;
use tracing::{debug, warn};

use super::{normalize_series, CandleSource};
use crate::common::{HttpClient, TransportError};
use crate::{Candle, Symbol};

/// Kraken OHLC client
#[derive(Debug, Clone)]
pub struct KrakenClient {
    http: HttpClient,
    base_url: String,
    interval_minutes: u32,
    lookback: usize,
}

impl KrakenClient {
    pub fn new(
        http: HttpClient,
        base_url: impl Into<String>,
        interval_minutes: u32,
        lookback: usize,
    ) -> Self {
        KrakenClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            interval_minutes,
            lookback,
        }
    }

    /// Kraken pair name for a watchlist symbol (`BTC/USDT` -> `BTCUSDT`)
    pub fn pair_name(symbol: &Symbol) -> String {
        symbol.compact()
    }

    /// Fetch and parse the OHLC series for `symbol`
    pub async fn get_ohlc(&self, symbol: &Symbol) -> Result<Vec<Candle>, TransportError> {
        let url = format!("{}/OHLC", self.base_url);
        let query = [
            ("pair", Self::pair_name(symbol)),
            ("interval", self.interval_minutes.to_string()),
        ];

        debug!(
            "Fetching OHLC: pair={}, interval={}m",
            query[0].1, self.interval_minutes
        );

        let body = self.http.get_json(&url, &query).await?;
        Ok(normalize_series(parse_ohlc(&body), self.lookback))
    }
}

/// Parse an OHLC response body into candles
///
/// Rows that are malformed or fail candle validation are skipped. A body
/// with a non-empty `error` array or no `result` yields nothing.
pub fn parse_ohlc(body: &Value) -> Vec<Candle> {
    if let Some(errors) = body.get("error").and_then(Value::as_array) {
        if !errors.is_empty() {
            debug!("Kraken reported errors: {:?}", errors);
            return Vec::new();
        }
    }

    let Some(result) = body.get("result").and_then(Value::as_object) else {
        return Vec::new();
    };

    let Some(rows) = result
        .iter()
        .find(|(key, _)| key.as_str() != "last")
        .and_then(|(_, rows)| rows.as_array())
    else {
        return Vec::new();
    };

    let mut skipped = 0;
    let candles: Vec<Candle> = rows
        .iter()
        .filter_map(|row| {
            let candle = parse_row(row);
            if candle.is_none() {
                skipped += 1;
            }
            candle
        })
        .collect();

    if skipped > 0 {
        debug!("Skipped {} malformed OHLC rows", skipped);
    }
    candles
}

fn parse_row(row: &Value) -> Option<Candle> {
    let row = row.as_array()?;
    if row.len() < 7 {
        return None;
    }

    let datetime = DateTime::from_timestamp(row[0].as_i64()?, 0)?;
    let num = |v: &Value| -> Option<f64> {
        match v {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    };

    Candle::new(
        datetime,
        num(&row[1])?,
        num(&row[2])?,
        num(&row[3])?,
        num(&row[4])?,
        num(&row[6])?,
    )
    .ok()
}

#[async_trait]
impl CandleSource for KrakenClient {
    async fn fetch_candles(&self, symbol: &Symbol) -> Vec<Candle> {
        match self.get_ohlc(symbol).await {
            Ok(candles) => candles,
            Err(e) => {
                warn!("No candles for {}: {}", symbol, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_ohlc() {
        let body = json!({
            "error": [],
            "result": {
                "last": 1700003600,
                "XBTUSDT": [
                    [1700000000, "100.0", "101.0", "99.0", "100.5", "100.2", "12.5", 40],
                    [1700001800, "100.5", "102.0", "100.0", "101.5", "101.0", "3.0", 12],
                    [1700003600, "bad", "102.0", "100.0", "101.5", "101.0", "3.0", 12],
                    [1700005400, "101.5", "99.0", "100.0", "101.5", "101.0", "3.0", 12]
                ]
            }
        });

        let candles = parse_ohlc(&body);
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].close, 100.5);
        assert_eq!(candles[0].volume, 12.5);
        assert_eq!(candles[1].datetime.timestamp(), 1_700_001_800);
    }

    #[test]
    fn test_parse_ohlc_error_body() {
        let body = json!({ "error": ["EQuery:Unknown asset pair"] });
        assert!(parse_ohlc(&body).is_empty());
        assert!(parse_ohlc(&json!({})).is_empty());
        assert!(parse_ohlc(&json!({ "error": [], "result": { "last": 1 } })).is_empty());
    }

    #[test]
    fn test_pair_name() {
        assert_eq!(KrakenClient::pair_name(&Symbol::new("SOL/USDT")), "SOLUSDT");
    }
}
