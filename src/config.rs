//! Configuration management
//!
//! Handles loading and parsing of JSON configuration files, with
//! environment variable overrides for every threshold the scanner uses.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::Symbol;

/// Pairs scanned when no watchlist is configured
pub const DEFAULT_WATCHLIST: &[&str] = &[
    "BTC/USDT", "ETH/USDT", "SOL/USDT", "XRP/USDT", "ADA/USDT", "LINK/USDT", "LTC/USDT",
    "DOGE/USDT", "AVAX/USDT", "SUI/USDT", "OPEN/USDT", "ENA/USDT", "PEPE/USDT", "PENGU/USDT",
    "WIF/USDT", "BONK/USDT", "WLD/USDT", "HBAR/USDT", "FLOKI/USDT", "APEX/USDT", "RFC/USDT",
    "IP/USDT", "PI/USDT", "LINEA/USDT", "HYPE/USDT", "MYX/USDT", "CAKE/USDT", "ASTER/USDT",
    "AVNT/USDT", "XPL/USDT", "SEI/USDT", "ZKC/USDT", "MBTC/USDT", "TRUMP/USDT", "EIGEN/USDT",
    "0G/USDT",
];

/// Invalid configuration values
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("watchlist is empty")]
    EmptyWatchlist,
}

/// Map an interval string to minutes
///
/// Unknown intervals fall back to 30 minutes.
pub fn interval_minutes(interval: &str) -> u32 {
    match interval.to_lowercase().as_str() {
        "15m" => 15,
        "30m" => 30,
        "1h" | "60m" => 60,
        "240m" => 240,
        _ => 30,
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub sources: SourceConfig,
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;
        Ok(config)
    }

    /// Load from an optional file, apply environment overrides, then validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.scan.normalize_watchlist();
        config.validate()?;
        Ok(config)
    }

    /// Override values from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Override values from an arbitrary key lookup
    ///
    /// Unparseable values are an error naming the variable.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(list) = lookup("WATCHLIST") {
            self.scan.watchlist = list.split(',').map(str::to_string).collect();
        }
        if let Some(interval) = lookup("INTERVAL") {
            self.scan.interval = interval.to_lowercase();
        }
        override_parsed(&lookup, "LIMIT", &mut self.scan.lookback)?;
        override_parsed(&lookup, "REFRESH", &mut self.scan.refresh_secs)?;
        override_parsed(&lookup, "TOPN", &mut self.scan.top_n)?;
        override_parsed(&lookup, "MIN_ATR_PCT", &mut self.filters.min_atr_pct)?;
        override_parsed(&lookup, "MIN_CHOP", &mut self.filters.min_chop)?;
        override_parsed(&lookup, "MAX_DRIFT_PCT", &mut self.filters.max_drift_pct)?;
        override_parsed(&lookup, "MIN_TURNOVER_USD", &mut self.filters.min_turnover_usd)?;
        override_parsed(
            &lookup,
            "CG_MIN_TURNOVER_USD",
            &mut self.filters.secondary_min_turnover_usd,
        )?;
        override_parsed(&lookup, "FEE_PCT", &mut self.grid.fee_pct)?;
        override_parsed(&lookup, "MIN_GRID_MULT", &mut self.grid.min_grid_mult)?;
        Ok(())
    }

    /// Check that thresholds and batch parameters are usable
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let positive = [
            ("scan.lookback", self.scan.lookback),
            ("scan.indicator_period", self.scan.indicator_period),
            ("scan.batch_size", self.scan.batch_size),
            ("scan.workers", self.scan.workers),
            ("scan.top_n", self.scan.top_n),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::NotPositive { field });
            }
        }

        if self.grid.min_grid_mult <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "grid.min_grid_mult",
            });
        }

        let non_negative = [
            ("filters.min_atr_pct", self.filters.min_atr_pct),
            ("filters.min_chop", self.filters.min_chop),
            ("filters.max_drift_pct", self.filters.max_drift_pct),
            ("filters.min_turnover_usd", self.filters.min_turnover_usd),
            (
                "filters.secondary_min_turnover_usd",
                self.filters.secondary_min_turnover_usd,
            ),
            ("grid.fee_pct", self.grid.fee_pct),
        ];
        for (field, value) in non_negative {
            if value < 0.0 || value.is_nan() {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if self.scan.watchlist.is_empty() {
            return Err(ConfigError::EmptyWatchlist);
        }

        Ok(())
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, target: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Some(raw) = lookup(key) {
        *target = raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw))?;
    }
    Ok(())
}

/// Watchlist, candle window, and batching
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub watchlist: Vec<String>,
    /// Candle interval, e.g. "30m"
    pub interval: String,
    /// Number of most recent candles kept per symbol
    pub lookback: usize,
    /// ATR period
    pub indicator_period: usize,
    pub batch_size: usize,
    /// Concurrent fetches within a batch
    pub workers: usize,
    /// Pause between batches
    pub batch_delay_ms: u64,
    /// Pause between scan cycles
    pub refresh_secs: u64,
    /// Rows shown per cycle
    pub top_n: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            watchlist: DEFAULT_WATCHLIST.iter().map(|s| s.to_string()).collect(),
            interval: "30m".to_string(),
            lookback: 240,
            indicator_period: 14,
            batch_size: 6,
            workers: 3,
            batch_delay_ms: 300,
            refresh_secs: 25,
            top_n: 5,
        }
    }
}

impl ScanConfig {
    /// Trim and upper-case symbols, dropping empty entries
    pub fn normalize_watchlist(&mut self) {
        self.watchlist = self
            .watchlist
            .iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.watchlist.iter().map(Symbol::new).collect()
    }

    pub fn interval_minutes(&self) -> u32 {
        interval_minutes(&self.interval)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn refresh(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    /// Approximate lookback window in whole days
    pub fn lookback_days(&self) -> u64 {
        (self.lookback as u64 * self.interval_minutes() as u64) / 1440
    }
}

/// Hard qualification thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Minimum ATR in percent of price
    pub min_atr_pct: f64,
    /// Minimum choppiness factor
    pub min_chop: f64,
    /// Maximum absolute drift in percent
    pub max_drift_pct: f64,
    /// Minimum primary turnover (quote currency)
    pub min_turnover_usd: f64,
    /// Minimum secondary-source turnover for the fallback to be used
    pub secondary_min_turnover_usd: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            min_atr_pct: 0.10,
            min_chop: 0.20,
            max_drift_pct: 7.0,
            min_turnover_usd: 50_000.0,
            secondary_min_turnover_usd: 5_000.0,
        }
    }
}

/// Fee model for the grid solver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Per-side trading fee in percent (0.10 = 0.10%)
    pub fee_pct: f64,
    /// A grid step must cover `fee_pct * min_grid_mult`
    pub min_grid_mult: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            fee_pct: 0.10,
            min_grid_mult: 3.0,
        }
    }
}

impl GridConfig {
    /// Smallest feasible grid step in percent
    pub fn min_step_pct(&self) -> f64 {
        self.fee_pct * self.min_grid_mult
    }
}

/// Market data endpoints and transport behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kraken_base_url: String,
    pub coingecko_base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub backoff_ms: u64,
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            kraken_base_url: "https://api.kraken.com/0/public".to_string(),
            coingecko_base_url: "https://api.coingecko.com/api/v3".to_string(),
            timeout_secs: 8,
            max_retries: 4,
            backoff_ms: 600,
            user_agent: "GridPick/relaxed".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scan.watchlist.len(), 36);
        assert_eq!(config.scan.interval_minutes(), 30);
        assert_eq!(config.scan.lookback_days(), 5);
        assert!((config.grid.min_step_pct() - 0.30).abs() < 1e-12);
    }

    #[test]
    fn test_interval_lookup() {
        assert_eq!(interval_minutes("15m"), 15);
        assert_eq!(interval_minutes("1H"), 60);
        assert_eq!(interval_minutes("60m"), 60);
        assert_eq!(interval_minutes("240m"), 240);
        assert_eq!(interval_minutes("1d"), 30);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "filters": { "min_chop": 0.35 }, "scan": { "workers": 2 } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.filters.min_chop, 0.35);
        assert_eq!(config.filters.max_drift_pct, 7.0);
        assert_eq!(config.scan.workers, 2);
        assert_eq!(config.scan.batch_size, 6);
        assert_eq!(config.grid.fee_pct, 0.10);
    }

    #[test]
    fn test_sample_config_file() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/configs/gridpick.json");
        let config = Config::from_file(path).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.scan.watchlist.len(), 6);
        assert_eq!(config.sources.user_agent, "GridPick/relaxed");
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("WATCHLIST", " btc/usdt, ,eth/usdt "),
            ("MIN_TURNOVER_USD", "1000"),
            ("TOPN", "3"),
            ("INTERVAL", "1H"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        config.scan.normalize_watchlist();

        assert_eq!(config.scan.watchlist, vec!["BTC/USDT", "ETH/USDT"]);
        assert_eq!(config.filters.min_turnover_usd, 1000.0);
        assert_eq!(config.scan.top_n, 3);
        assert_eq!(config.scan.interval_minutes(), 60);
    }

    #[test]
    fn test_bad_override_names_variable() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|k| (k == "MIN_CHOP").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("MIN_CHOP"));
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = Config::default();
        config.scan.workers = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "scan.workers"
            })
        );
    }

    #[test]
    fn test_validate_rejects_negative_threshold() {
        let mut config = Config::default();
        config.filters.max_drift_pct = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Negative {
                field: "filters.max_drift_pct",
                ..
            })
        ));
    }
}
