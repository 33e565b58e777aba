//! Market data sources
//!
//! The scanner talks to two collaborators through these traits:
//!
//! - a [`CandleSource`] supplying the OHLCV window per symbol (Kraken)
//! - a [`TurnoverSource`] supplying an independent 24h turnover figure
//!   used when the candle-derived liquidity is too thin (CoinGecko)
//!
//! Implementations absorb transport failures. An empty candle vector or
//! a zero turnover is the failure signal; nothing here returns an error.

pub mod coingecko;
pub mod id_cache;
pub mod kraken;

use async_trait::async_trait;

use crate::{Candle, Symbol};

pub use coingecko::CoinGeckoClient;
pub use id_cache::IdentifierCache;
pub use kraken::KrakenClient;

/// Primary source of candle history
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Candles for `symbol`, oldest first, strictly increasing timestamps,
    /// truncated to the configured lookback. Empty on any failure.
    async fn fetch_candles(&self, symbol: &Symbol) -> Vec<Candle>;
}

/// Secondary source of turnover figures
#[async_trait]
pub trait TurnoverSource: Send + Sync {
    /// Quote-currency turnover for the symbol's base asset, 0.0 when unknown
    async fn turnover_usd(&self, symbol: &Symbol) -> f64;
}

/// Sort by time, drop duplicate timestamps, keep the most recent `lookback`
pub fn normalize_series(mut candles: Vec<Candle>, lookback: usize) -> Vec<Candle> {
    candles.sort_by_key(|c| c.datetime);
    candles.dedup_by_key(|c| c.datetime);
    let excess = candles.len().saturating_sub(lookback);
    candles.drain(..excess);
    candles
}
