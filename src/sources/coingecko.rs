//! CoinGecko client (secondary turnover source)
//!
//! Turnover is looked up in two steps: the base asset is resolved to a
//! CoinGecko coin id through `/search`, then `/coins/markets` reports the
//! coin's 24h `total_volume` in USD. Resolved ids are memoized in an
//! [`IdentifierCache`] shared across scans.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{IdentifierCache, TurnoverSource};
use crate::common::{HttpClient, TransportError};
use crate::Symbol;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    coins: Vec<SearchCoin>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchCoin {
    pub id: String,
    #[serde(default)]
    pub symbol: String,
}

#[derive(Debug, Deserialize)]
struct MarketEntry {
    total_volume: Option<f64>,
}

/// CoinGecko public API client
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http: HttpClient,
    base_url: String,
    ids: Arc<IdentifierCache>,
}

impl CoinGeckoClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>, ids: Arc<IdentifierCache>) -> Self {
        CoinGeckoClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ids,
        }
    }

    /// The shared identifier cache
    pub fn id_cache(&self) -> &Arc<IdentifierCache> {
        &self.ids
    }

    /// Resolve a base asset (e.g. `BTC`) to a coin id, memoized
    pub async fn coin_id(&self, base: &str) -> Option<String> {
        self.ids
            .get_or_resolve(base, || async {
                match self.search(base).await {
                    Ok(coins) => pick_coin_id(base, &coins),
                    Err(e) => {
                        warn!("CoinGecko search for {} failed: {}", base, e);
                        None
                    }
                }
            })
            .await
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchCoin>, TransportError> {
        let url = format!("{}/search", self.base_url);
        let body = self
            .http
            .get_json(&url, &[("query", query.to_string())])
            .await?;
        Ok(serde_json::from_value::<SearchResponse>(body)
            .map(|r| r.coins)
            .unwrap_or_default())
    }

    /// 24h USD volume for a coin id
    pub async fn total_volume(&self, coin_id: &str) -> Result<f64, TransportError> {
        let url = format!("{}/coins/markets", self.base_url);
        let query = [("vs_currency", "usd".to_string()), ("ids", coin_id.to_string())];
        let body = self.http.get_json(&url, &query).await?;

        let volume = serde_json::from_value::<Vec<MarketEntry>>(body)
            .ok()
            .and_then(|entries| entries.into_iter().next())
            .and_then(|entry| entry.total_volume)
            .unwrap_or(0.0);
        Ok(volume)
    }
}

/// Pick the coin whose ticker matches `base` exactly, else the first hit
pub fn pick_coin_id(base: &str, coins: &[SearchCoin]) -> Option<String> {
    coins
        .iter()
        .find(|c| c.symbol.eq_ignore_ascii_case(base))
        .or_else(|| coins.first())
        .map(|c| c.id.clone())
}

#[async_trait]
impl TurnoverSource for CoinGeckoClient {
    async fn turnover_usd(&self, symbol: &Symbol) -> f64 {
        let base = symbol.base();
        let Some(id) = self.coin_id(base).await else {
            debug!("No CoinGecko id for {}", base);
            return 0.0;
        };

        match self.total_volume(&id).await {
            Ok(volume) if volume.is_finite() && volume > 0.0 => volume,
            Ok(_) => 0.0,
            Err(e) => {
                warn!("CoinGecko volume for {} failed: {}", id, e);
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(id: &str, symbol: &str) -> SearchCoin {
        SearchCoin {
            id: id.to_string(),
            symbol: symbol.to_string(),
        }
    }

    #[test]
    fn test_pick_exact_symbol_match() {
        let coins = vec![
            coin("wrapped-bitcoin", "WBTC"),
            coin("bitcoin", "BTC"),
            coin("bitcoin-cash", "BCH"),
        ];
        assert_eq!(pick_coin_id("btc", &coins).as_deref(), Some("bitcoin"));
    }

    #[test]
    fn test_pick_falls_back_to_first() {
        let coins = vec![coin("pengu-token", "PENGUX"), coin("other", "OTH")];
        assert_eq!(pick_coin_id("PENGU", &coins).as_deref(), Some("pengu-token"));
        assert_eq!(pick_coin_id("PENGU", &[]), None);
    }

    #[test]
    fn test_search_response_shape() {
        let body = serde_json::json!({
            "coins": [{ "id": "solana", "symbol": "SOL", "name": "Solana", "market_cap_rank": 5 }],
            "exchanges": []
        });
        let parsed: SearchResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.coins[0].id, "solana");
    }
}
