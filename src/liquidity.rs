//! Primary-source liquidity estimate
//!
//! Smoothed notional turnover from the candle series itself. Whether to
//! consult the secondary source is the scanner's decision, see
//! [`crate::scanner`].

use crate::Candle;

/// Number of most recent candles fed into the EMA
pub const TURNOVER_WINDOW: usize = 48;

/// EMA smoothing factor
pub const TURNOVER_ALPHA: f64 = 0.2;

/// EMA of `volume * mid_price` over the last [`TURNOVER_WINDOW`] candles
///
/// The EMA is seeded at zero, so short histories under-report turnover.
/// Returns 0.0 for an empty series.
pub fn turnover_ema(candles: &[Candle]) -> f64 {
    let start = candles.len().saturating_sub(TURNOVER_WINDOW);
    candles[start..].iter().fold(0.0, |ema, c| {
        TURNOVER_ALPHA * (c.volume * c.mid()) + (1.0 - TURNOVER_ALPHA) * ema
    })
}
