//! Technical indicators
//!
//! Range-trading indicators computed over one candle window. Every function
//! degrades to a neutral value on short or degenerate input instead of
//! failing; thin markets and fresh listings hit these paths routinely.

use crate::{Candle, IndicatorSet};

/// Default ATR period
pub const DEFAULT_PERIOD: usize = 14;

/// Default window for the trend-strength proxy
pub const DEFAULT_TREND_LOOK: usize = 14;

/// Minimum series length for ATR, regardless of period
pub const MIN_ATR_CANDLES: usize = 20;

/// Neutral trend strength returned when history is too short
pub const NEUTRAL_TREND: f64 = 50.0;

/// Calculate True Range for each candle
///
/// The first candle is measured against its own close, so its true range
/// is `high - low` unless the close sits outside the range.
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    let Some(first) = candles.first() else {
        return Vec::new();
    };

    let mut prev_close = first.close;
    candles
        .iter()
        .map(|c| {
            let hl = c.high - c.low;
            let hc = (c.high - prev_close).abs();
            let lc = (c.low - prev_close).abs();
            prev_close = c.close;
            hl.max(hc).max(lc)
        })
        .collect()
}

/// Average true range of the last `period` candles as a percent of the last close
///
/// Returns 0.0 when fewer than `max(period + 1, 20)` candles are available.
pub fn atr_pct(candles: &[Candle], period: usize) -> f64 {
    if period == 0 || candles.len() < (period + 1).max(MIN_ATR_CANDLES) {
        return 0.0;
    }

    let tr = true_range(candles);
    let window = &tr[tr.len() - period..];
    let atr = window.iter().sum::<f64>() / period as f64;

    match candles.last() {
        Some(last) if last.close > 0.0 => atr / last.close * 100.0,
        _ => 0.0,
    }
}

/// Absolute percent change from the first to the last close
pub fn drift_pct(candles: &[Candle]) -> f64 {
    match (candles.first(), candles.last()) {
        (Some(first), Some(last)) if first.close > 0.0 => {
            ((last.close - first.close) / first.close).abs() * 100.0
        }
        _ => 0.0,
    }
}

/// Fraction of consecutive close deltas that reverse sign
///
/// A zero delta never counts as a reversal. The denominator is the number
/// of delta pairs, floored at one, so the result stays in `[0, 1]`.
pub fn chop_factor(candles: &[Candle]) -> f64 {
    let deltas: Vec<f64> = candles.windows(2).map(|w| w[1].close - w[0].close).collect();
    let flips = deltas.windows(2).filter(|d| d[0] * d[1] < 0.0).count();
    let pairs = candles.len().saturating_sub(2).max(1);
    flips as f64 / pairs as f64
}

/// Directional-bias proxy over the last `look` close deltas
///
/// `50 * (1 + |ups - downs| / look)`: 50 for a balanced window, 100 when
/// every move points the same way. This is deliberately not Wilder's ADX;
/// the scoring thresholds are calibrated against this curve.
pub fn trend_strength(candles: &[Candle], look: usize) -> f64 {
    if look == 0 || candles.len() < look + 2 {
        return NEUTRAL_TREND;
    }

    let recent = &candles[candles.len() - look - 1..];
    let (ups, downs) = recent
        .windows(2)
        .map(|w| w[1].close - w[0].close)
        .fold((0usize, 0usize), |(u, d), delta| {
            (u + (delta > 0.0) as usize, d + (delta < 0.0) as usize)
        });

    let balance = ups.abs_diff(downs) as f64 / look as f64;
    NEUTRAL_TREND * (1.0 + balance)
}

/// Compute the full indicator set for a candle window
pub fn compute(candles: &[Candle], period: usize) -> IndicatorSet {
    IndicatorSet {
        atr_pct: atr_pct(candles, period),
        drift_pct: drift_pct(candles),
        chop_factor: chop_factor(candles),
        trend_strength: trend_strength(candles, DEFAULT_TREND_LOOK),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};

    fn candles_from_closes(closes: &[f64], spread: f64) -> Vec<Candle> {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Candle::new_unchecked(
                    start + Duration::minutes(30 * i as i64),
                    c,
                    c + spread,
                    c - spread,
                    c,
                    100.0,
                )
            })
            .collect()
    }

    fn flat(n: usize) -> Vec<Candle> {
        candles_from_closes(&vec![100.0; n], 0.0)
    }

    #[test]
    fn test_atr_requires_minimum_history() {
        let closes: Vec<f64> = (0..19).map(|i| 100.0 + (i % 2) as f64).collect();
        let candles = candles_from_closes(&closes, 0.5);
        assert_eq!(atr_pct(&candles, 14), 0.0);

        // period 25 needs 26 candles
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + (i % 2) as f64).collect();
        assert_eq!(atr_pct(&candles_from_closes(&closes, 0.5), 25), 0.0);
    }

    #[test]
    fn test_atr_constant_range() {
        // Every candle spans 99..101 around a constant close of 100
        let candles = candles_from_closes(&vec![100.0; 30], 1.0);
        assert!((atr_pct(&candles, 14) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_atr_uses_previous_close_gap() {
        // Alternating closes 100/104 with a 1.0 half-spread: each true range
        // is the 4.0 gap plus the half-spread, i.e. 5.0
        let closes: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 100.0 } else { 104.0 }).collect();
        let candles = candles_from_closes(&closes, 1.0);
        let expected = 5.0 / candles.last().unwrap().close * 100.0;
        assert!((atr_pct(&candles, 14) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_drift() {
        assert_eq!(drift_pct(&[]), 0.0);
        let up = candles_from_closes(&[100.0, 90.0, 110.0], 0.0);
        assert!((drift_pct(&up) - 10.0).abs() < 1e-9);
        let down = candles_from_closes(&[100.0, 95.0], 0.0);
        assert!((drift_pct(&down) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_chop_alternating_is_one() {
        let closes: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect();
        assert!((chop_factor(&candles_from_closes(&closes, 0.0)) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_chop_monotonic_and_flat_are_zero() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        assert_eq!(chop_factor(&candles_from_closes(&closes, 0.0)), 0.0);
        assert_eq!(chop_factor(&flat(40)), 0.0);
    }

    #[test]
    fn test_chop_bounds_on_short_series() {
        assert_eq!(chop_factor(&[]), 0.0);
        assert_eq!(chop_factor(&flat(1)), 0.0);
        let three = candles_from_closes(&[100.0, 101.0, 100.0], 0.0);
        assert_eq!(chop_factor(&three), 1.0);
    }

    #[test]
    fn test_chop_zero_delta_breaks_reversal() {
        // deltas: +1, 0, -1 -> no strict sign reversal
        let candles = candles_from_closes(&[100.0, 101.0, 101.0, 100.0], 0.0);
        assert_eq!(chop_factor(&candles), 0.0);
    }

    #[test]
    fn test_trend_strength() {
        assert_eq!(trend_strength(&flat(15), 14), NEUTRAL_TREND);

        let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        assert!((trend_strength(&candles_from_closes(&rising, 0.0), 14) - 100.0).abs() < 1e-12);

        let alternating: Vec<f64> = (0..30).map(|i| 100.0 + (i % 2) as f64).collect();
        assert!((trend_strength(&candles_from_closes(&alternating, 0.0), 14) - 50.0).abs() < 1e-12);

        // Flat series: no ups, no downs -> balanced
        assert_eq!(trend_strength(&flat(30), 14), 50.0);
    }

    #[test]
    fn test_trend_strength_partial_bias() {
        // Last 14 deltas: 10 up, 4 down -> 50 * (1 + 6/14)
        let mut closes = vec![100.0; 10];
        let mut px = 100.0;
        for i in 0..14 {
            px += if i < 10 { 1.0 } else { -1.0 };
            closes.push(px);
        }
        let expected = 50.0 * (1.0 + 6.0 / 14.0);
        assert!((trend_strength(&candles_from_closes(&closes, 0.0), 14) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_compute_flat_series() {
        let set = compute(&flat(240), DEFAULT_PERIOD);
        assert_eq!(set.atr_pct, 0.0);
        assert_eq!(set.drift_pct, 0.0);
        assert_eq!(set.chop_factor, 0.0);
        assert_eq!(set.trend_strength, 50.0);
    }
}
