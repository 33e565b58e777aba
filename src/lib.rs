//! GridPick
//!
//! Scans a watchlist of crypto pairs and recommends grid-trading setups.
//! Each cycle pulls recent candles from Kraken, falls back to CoinGecko
//! for liquidity when the candle-derived turnover is thin, scores every
//! pair for range-bound behaviour, and solves a grid plan (range, level
//! count, take-profit, cycle estimate) for the top pick.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use gridpick::common::{HttpClient, TransportConfig};
//! use gridpick::sources::{CoinGeckoClient, IdentifierCache, KrakenClient};
//! use gridpick::{Config, Scanner};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let http = HttpClient::new(TransportConfig::from(&config.sources))?;
//!     let kraken = KrakenClient::new(
//!         http.clone(),
//!         &config.sources.kraken_base_url,
//!         config.scan.interval_minutes(),
//!         config.scan.lookback,
//!     );
//!     let gecko = CoinGeckoClient::new(
//!         http,
//!         &config.sources.coingecko_base_url,
//!         Arc::new(IdentifierCache::new()),
//!     );
//!
//!     let scanner = Scanner::new(config, Arc::new(kraken), Arc::new(gecko));
//!     for record in scanner.scan_once().await {
//!         println!("{} {:.1}", record.symbol, record.score);
//!     }
//!     Ok(())
//! }
//! ```

pub mod common;
pub mod config;
pub mod grid;
pub mod indicators;
pub mod liquidity;
pub mod report;
pub mod scanner;
pub mod scoring;
pub mod sources;
pub mod types;

pub use config::Config;
pub use scanner::Scanner;
pub use types::*;
