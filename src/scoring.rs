//! Grid suitability scoring
//!
//! Combines the indicator set and a liquidity estimate into a hard
//! qualification flag and a continuous 0-100 score. The score rewards
//! moderate volatility and choppy price action, and penalises drift and
//! persistent one-way moves.

use crate::config::FilterConfig;
use crate::indicators;
use crate::{Candle, IndicatorSet, LiquidityEstimate, ScoreRecord, Symbol};

/// Lower edge of the volatility sweet spot (ATR %)
pub const VOL_SWEET_LO: f64 = 0.2;
/// Upper edge of the volatility sweet spot (ATR %)
pub const VOL_SWEET_HI: f64 = 1.5;

const W_CHOP: f64 = 0.40;
const W_VOL: f64 = 0.35;
const W_LIQ: f64 = 0.15;
const W_DRIFT: f64 = 0.15;
const W_TREND: f64 = 0.10;

/// Volatility fitness in `[0, 1]`
///
/// Linear ramp up to the sweet spot, flat at 1.0 inside it, linear decay
/// above it reaching zero at twice the upper edge.
pub fn volatility_fitness(atr_pct: f64) -> f64 {
    if atr_pct <= 0.0 {
        0.0
    } else if atr_pct < VOL_SWEET_LO {
        atr_pct / VOL_SWEET_LO
    } else if atr_pct > VOL_SWEET_HI {
        (1.0 - (atr_pct - VOL_SWEET_HI) / VOL_SWEET_HI).max(0.0)
    } else {
        1.0
    }
}

/// Drift penalty, saturating at 12% drift
pub fn drift_penalty(drift_pct: f64) -> f64 {
    (drift_pct / 12.0).min(1.0)
}

/// Logistic boost centred on the minimum-turnover threshold
///
/// Steepness is `0.6 * threshold`. With a zero threshold every non-negative
/// turnover saturates the boost.
pub fn liquidity_boost(turnover: f64, min_turnover: f64) -> f64 {
    if min_turnover <= 0.0 {
        return if turnover >= 0.0 { 1.0 } else { 0.0 };
    }
    let z = (turnover - min_turnover) / (min_turnover * 0.6);
    1.0 / (1.0 + (-z).exp())
}

/// Trend penalty, zero at strength 22 and saturating at 72
pub fn trend_penalty(trend_strength: f64) -> f64 {
    ((trend_strength - 22.0) / 50.0).clamp(0.0, 1.0)
}

/// All four hard filters, each inclusive at its threshold
pub fn is_qualified(ind: &IndicatorSet, turnover: f64, filters: &FilterConfig) -> bool {
    ind.atr_pct >= filters.min_atr_pct
        && ind.chop_factor >= filters.min_chop
        && ind.drift_pct <= filters.max_drift_pct
        && turnover >= filters.min_turnover_usd
}

/// Continuous score in `[0, 100]`, rounded to one decimal
pub fn suitability_score(ind: &IndicatorSet, turnover: f64, min_turnover: f64) -> f64 {
    let raw = W_CHOP * ind.chop_factor + W_VOL * volatility_fitness(ind.atr_pct)
        + W_LIQ * liquidity_boost(turnover, min_turnover)
        - W_DRIFT * drift_penalty(ind.drift_pct)
        - W_TREND * trend_penalty(ind.trend_strength);

    // NaN from a degenerate input must not escape the [0, 100] range
    let clamped = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) };
    (clamped * 1000.0).round() / 10.0
}

/// Score one symbol from its candle window and liquidity estimate
///
/// Returns `None` for an empty series; there is no price to report.
pub fn score_symbol(
    symbol: &Symbol,
    candles: &[Candle],
    liquidity: LiquidityEstimate,
    filters: &FilterConfig,
    period: usize,
) -> Option<ScoreRecord> {
    let price = candles.last()?.close;
    let ind = indicators::compute(candles, period);

    Some(ScoreRecord {
        symbol: symbol.clone(),
        price,
        indicators: ind,
        liquidity,
        score: suitability_score(&ind, liquidity.value, filters.min_turnover_usd),
        qualified: is_qualified(&ind, liquidity.value, filters),
    })
}
