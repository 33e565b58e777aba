//! Core data types shared by the indicator, scoring and grid modules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for candle data
#[derive(Debug, Error, PartialEq)]
pub enum CandleValidationError {
    #[error("high ({high}) must be >= low ({low})")]
    HighLessThanLow { high: f64, low: f64 },

    #[error("volume ({0}) must be >= 0")]
    NegativeVolume(f64),

    #[error("prices must be positive: open={open}, high={high}, low={low}, close={close}")]
    NonPositivePrice {
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },

    #[error("candle contains a non-finite value")]
    NonFinite,
}

/// OHLCV candlestick data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub datetime: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Create a new candle with validation
    pub fn new(
        datetime: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, CandleValidationError> {
        let candle = Self::new_unchecked(datetime, open, high, low, close, volume);
        candle.validate()?;
        Ok(candle)
    }

    /// Create a candle without validation (tests and trusted sources)
    pub fn new_unchecked(
        datetime: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            datetime,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Validate the candle against the adapter contract: four positive
    /// prices, a non-negative volume, and `high >= low`.
    ///
    /// Open and close are not forced inside `[low, high]`; exchanges report
    /// the first and last trade of the bucket and rounding can put them a
    /// tick outside the range.
    pub fn validate(&self) -> Result<(), CandleValidationError> {
        let fields = [self.open, self.high, self.low, self.close, self.volume];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(CandleValidationError::NonFinite);
        }

        if self.open <= 0.0 || self.high <= 0.0 || self.low <= 0.0 || self.close <= 0.0 {
            return Err(CandleValidationError::NonPositivePrice {
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
            });
        }

        if self.high < self.low {
            return Err(CandleValidationError::HighLessThanLow {
                high: self.high,
                low: self.low,
            });
        }

        if self.volume < 0.0 {
            return Err(CandleValidationError::NegativeVolume(self.volume));
        }

        Ok(())
    }

    /// Midpoint of the candle's range
    pub fn mid(&self) -> f64 {
        (self.high + self.low) / 2.0
    }
}

/// Trading pair symbol using Arc<str> for cheap cloning
///
/// Symbols are written `BASE/QUOTE` (e.g. `BTC/USDT`) and are cloned into
/// every score record, so the backing string is shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(#[serde(with = "arc_str_serde")] std::sync::Arc<str>);

/// Custom serde for Arc<str>
mod arc_str_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::sync::Arc;

    pub fn serialize<S>(value: &Arc<str>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Arc<str>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Arc::from(s.as_str()))
    }
}

impl Symbol {
    pub fn new(s: impl AsRef<str>) -> Self {
        Symbol(std::sync::Arc::from(s.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Base asset, the part before `/` (`BTC/USDT` -> `BTC`)
    pub fn base(&self) -> &str {
        self.0.split('/').next().unwrap_or(&self.0)
    }

    /// Pair without the separator (`BTC/USDT` -> `BTCUSDT`)
    pub fn compact(&self) -> String {
        self.0.replace('/', "")
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Indicator values derived from one candle series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    /// Average true range as a percentage of the latest close, `>= 0`
    pub atr_pct: f64,
    /// Absolute first-to-last close change in percent, `>= 0`
    pub drift_pct: f64,
    /// Fraction of close-delta sign reversals, in `[0, 1]`
    pub chop_factor: f64,
    /// Directional-bias proxy, `50` is neutral
    pub trend_strength: f64,
}

/// Where a liquidity figure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquiditySource {
    /// EMA of notional turnover over the primary candle series
    Primary,
    /// Independent 24h volume figure from the secondary source
    Secondary,
}

impl std::fmt::Display for LiquiditySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LiquiditySource::Primary => write!(f, "primary"),
            LiquiditySource::Secondary => write!(f, "secondary"),
        }
    }
}

/// Notional turnover estimate in quote currency, tagged with its source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiquidityEstimate {
    pub value: f64,
    pub source: LiquiditySource,
}

impl LiquidityEstimate {
    pub fn primary(value: f64) -> Self {
        Self {
            value,
            source: LiquiditySource::Primary,
        }
    }

    pub fn secondary(value: f64) -> Self {
        Self {
            value,
            source: LiquiditySource::Secondary,
        }
    }
}

/// Result of scoring one symbol in one scan cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub symbol: Symbol,
    /// Latest close
    pub price: f64,
    pub indicators: IndicatorSet,
    pub liquidity: LiquidityEstimate,
    /// Suitability in `[0, 100]`, one decimal
    pub score: f64,
    /// All four hard filters passed
    pub qualified: bool,
}

/// Estimated time for price to travel the take-profit distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleEstimate {
    /// Bars to target, clamped to `[10, 500]`
    pub bars: f64,
    pub hours: f64,
}

impl CycleEstimate {
    pub fn days(&self) -> f64 {
        self.hours / 24.0
    }
}

impl std::fmt::Display for CycleEstimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.hours >= 48.0 {
            write!(f, "~{:.1}d", self.days())
        } else {
            write!(f, "~{:.1}h", self.hours)
        }
    }
}

/// Recommended grid configuration for one symbol
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPlan {
    pub lo: f64,
    pub hi: f64,
    /// Number of grid intervals, in `[12, 40]`
    pub grid_count: u32,
    /// Width of one grid interval as a percentage of price
    pub step_pct: f64,
    /// Take-profit target in percent, in `[5, 20]`
    pub take_profit_pct: f64,
    pub cycle_estimate: CycleEstimate,
}

impl GridPlan {
    /// Evenly spaced price levels from `lo` to `hi`, both ends included
    pub fn levels(&self) -> Vec<f64> {
        let step = (self.hi - self.lo) / self.grid_count as f64;
        (0..=self.grid_count)
            .map(|i| {
                if i == self.grid_count {
                    self.hi
                } else {
                    self.lo + step * i as f64
                }
            })
            .collect()
    }

    /// One-line summary for pasting into an exchange's grid bot form
    pub fn export_line(&self, symbol: &Symbol) -> String {
        format!(
            "EXPORT: symbol={}, low={:.8}, high={:.8}, levels={}, step={:.4}%, tp={:.2}%",
            symbol, self.lo, self.hi, self.grid_count, self.step_pct, self.take_profit_pct
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_candle_validation() {
        assert!(Candle::new(ts(), 100.0, 101.0, 99.0, 100.5, 10.0).is_ok());
        assert_eq!(
            Candle::new(ts(), 100.0, 99.0, 101.0, 100.0, 10.0),
            Err(CandleValidationError::HighLessThanLow {
                high: 99.0,
                low: 101.0
            })
        );
        assert_eq!(
            Candle::new(ts(), 100.0, 101.0, 99.0, 100.0, -1.0),
            Err(CandleValidationError::NegativeVolume(-1.0))
        );
        assert!(matches!(
            Candle::new(ts(), 0.0, 101.0, 99.0, 100.0, 1.0),
            Err(CandleValidationError::NonPositivePrice { .. })
        ));
        assert_eq!(
            Candle::new(ts(), f64::NAN, 101.0, 99.0, 100.0, 1.0),
            Err(CandleValidationError::NonFinite)
        );
    }

    #[test]
    fn test_symbol_parts() {
        let s = Symbol::new("PEPE/USDT");
        assert_eq!(s.base(), "PEPE");
        assert_eq!(s.compact(), "PEPEUSDT");
        assert_eq!(Symbol::new("BTCUSD").base(), "BTCUSD");
    }

    #[test]
    fn test_cycle_estimate_display() {
        let short = CycleEstimate {
            bars: 40.0,
            hours: 20.0,
        };
        assert_eq!(short.to_string(), "~20.0h");

        let long = CycleEstimate {
            bars: 120.0,
            hours: 60.0,
        };
        assert_eq!(long.to_string(), "~2.5d");

        let boundary = CycleEstimate {
            bars: 96.0,
            hours: 48.0,
        };
        assert_eq!(boundary.to_string(), "~2.0d");
    }

    #[test]
    fn test_grid_levels() {
        let plan = GridPlan {
            lo: 90.0,
            hi: 110.0,
            grid_count: 20,
            step_pct: 1.0,
            take_profit_pct: 5.0,
            cycle_estimate: CycleEstimate {
                bars: 10.0,
                hours: 5.0,
            },
        };
        let levels = plan.levels();
        assert_eq!(levels.len(), 21);
        assert_eq!(levels[0], 90.0);
        assert_eq!(levels[20], 110.0);
        assert!((levels[1] - 91.0).abs() < 1e-9);
        assert!(levels.windows(2).all(|w| w[0] < w[1]));
    }
}
