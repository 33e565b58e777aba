//! Grid parameter solver
//!
//! Derives a price range, level count, take-profit and cycle estimate from
//! a symbol's price and indicators. The range/level pair is searched so
//! that one grid step covers round-trip fees with a safety multiplier; the
//! search is bounded and returns its best candidate if it never converges.

use thiserror::Error;
use tracing::debug;

use crate::config::GridConfig;
use crate::{CycleEstimate, GridPlan, ScoreRecord};

/// Half-width bounds of the initial range, as a fraction of price
pub const MIN_SPAN: f64 = 0.03;
pub const MAX_SPAN: f64 = 0.08;

/// Range widening applied when liquidity is below threshold
pub const ILLIQUID_SPAN_FACTOR: f64 = 1.2;

pub const MIN_GRIDS: u32 = 12;
pub const MAX_GRIDS: u32 = 40;

/// Grid counts above this are shrunk before the range is widened
pub const BASE_GRIDS: u32 = 18;

pub const MAX_SEARCH_ITERATIONS: usize = 8;

const GRID_SHRINK: f64 = 0.9;
const SPAN_WIDEN: f64 = 1.08;

const MIN_TAKE_PROFIT: f64 = 5.0;
const MAX_TAKE_PROFIT: f64 = 20.0;

/// Fraction of ATR assumed to be net progress per bar
const VELOCITY_PER_ATR: f64 = 0.35;
const MIN_BARS: f64 = 10.0;
const MAX_BARS: f64 = 500.0;

/// Invalid solver inputs
#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("price must be positive (got {0})")]
    NonPositivePrice(f64),

    #[error("{0} is not a finite number")]
    NonFinite(&'static str),
}

/// Everything the solver needs about one symbol
///
/// Choppiness and drift are passed explicitly; the solver never guesses
/// them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridInputs {
    pub price: f64,
    pub atr_pct: f64,
    pub liquidity_ok: bool,
    pub chop: f64,
    pub drift_pct: f64,
}

impl GridInputs {
    /// Inputs for a scored symbol; liquidity is judged against the primary threshold
    pub fn for_record(record: &ScoreRecord, min_turnover_usd: f64) -> Self {
        GridInputs {
            price: record.price,
            atr_pct: record.indicators.atr_pct,
            liquidity_ok: record.liquidity.value >= min_turnover_usd,
            chop: record.indicators.chop_factor,
            drift_pct: record.indicators.drift_pct,
        }
    }

    fn check(&self) -> Result<(), GridError> {
        let fields = [
            ("price", self.price),
            ("atr_pct", self.atr_pct),
            ("chop", self.chop),
            ("drift_pct", self.drift_pct),
        ];
        if let Some(&(name, _)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(GridError::NonFinite(name));
        }
        if self.price <= 0.0 {
            return Err(GridError::NonPositivePrice(self.price));
        }
        Ok(())
    }
}

/// One range/level combination considered by the feasibility search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCandidate {
    pub price: f64,
    /// Half-width of the range as a fraction of price
    pub span: f64,
    pub grid_count: u32,
}

impl GridCandidate {
    pub fn lo(&self) -> f64 {
        self.price * (1.0 - self.span)
    }

    pub fn hi(&self) -> f64 {
        self.price * (1.0 + self.span)
    }

    /// Full range width in percent of price
    pub fn span_pct(&self) -> f64 {
        (self.hi() - self.lo()) / self.price * 100.0
    }

    /// Width of one grid interval in percent of price
    pub fn step_pct(&self) -> f64 {
        self.span_pct() / self.grid_count.max(2) as f64
    }

    pub fn is_feasible(&self, min_step_pct: f64) -> bool {
        self.step_pct() >= min_step_pct
    }

    /// Next candidate: fewer levels while above the base count, else a wider range
    fn adjusted(self) -> Self {
        if self.grid_count > BASE_GRIDS {
            GridCandidate {
                grid_count: (self.grid_count as f64 * GRID_SHRINK) as u32,
                ..self
            }
        } else {
            GridCandidate {
                span: self.span * SPAN_WIDEN,
                ..self
            }
        }
    }
}

/// Iterator over the candidates visited by the fee-feasibility search
///
/// Yields the initial candidate first and stops after a feasible one or
/// after [`MAX_SEARCH_ITERATIONS`] adjustments. The last item is the
/// solver's choice.
#[derive(Debug, Clone)]
pub struct FeasibilitySearch {
    next: Option<GridCandidate>,
    min_step_pct: f64,
    iterations: usize,
}

impl FeasibilitySearch {
    pub fn new(initial: GridCandidate, min_step_pct: f64) -> Self {
        FeasibilitySearch {
            next: Some(initial),
            min_step_pct,
            iterations: 0,
        }
    }
}

impl Iterator for FeasibilitySearch {
    type Item = GridCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        if !current.is_feasible(self.min_step_pct) && self.iterations < MAX_SEARCH_ITERATIONS {
            self.iterations += 1;
            self.next = Some(current.adjusted());
        }
        Some(current)
    }
}

/// Initial half-width: ATR/30 clamped to `[0.03, 0.08]`, widened when illiquid
pub fn initial_span(atr_pct: f64, liquidity_ok: bool) -> f64 {
    let span = (atr_pct / 30.0).clamp(MIN_SPAN, MAX_SPAN);
    if liquidity_ok {
        span
    } else {
        span * ILLIQUID_SPAN_FACTOR
    }
}

/// Initial level count: `round(18 + 10 * atr_pct)` clamped to `[12, 40]`
pub fn initial_grid_count(atr_pct: f64) -> u32 {
    (BASE_GRIDS as f64 + atr_pct * 10.0)
        .round()
        .clamp(MIN_GRIDS as f64, MAX_GRIDS as f64) as u32
}

/// Expected edge per cycle: volatility times choppiness, discounted by drift
pub fn cycle_edge(atr_pct: f64, chop: f64, drift_pct: f64) -> f64 {
    (atr_pct * chop) / (1.0 + drift_pct / 5.0)
}

/// Dynamic take-profit in percent, clamped to `[5, 20]`
pub fn take_profit_pct(atr_pct: f64, chop: f64, drift_pct: f64) -> f64 {
    (4.0 + cycle_edge(atr_pct, chop, drift_pct) * 25.0).clamp(MIN_TAKE_PROFIT, MAX_TAKE_PROFIT)
}

/// Time for price to cover the take-profit distance at a fraction of ATR per bar
pub fn cycle_estimate(atr_pct: f64, take_profit_pct: f64, interval_minutes: u32) -> CycleEstimate {
    let velocity_per_bar = atr_pct * VELOCITY_PER_ATR;
    let bars = (take_profit_pct / velocity_per_bar.max(0.01)).clamp(MIN_BARS, MAX_BARS);
    CycleEstimate {
        bars,
        hours: bars * interval_minutes as f64 / 60.0,
    }
}

/// Solve a grid plan for one symbol
pub fn solve(
    inputs: &GridInputs,
    config: &GridConfig,
    interval_minutes: u32,
) -> Result<GridPlan, GridError> {
    inputs.check()?;

    // Contract says drift is an absolute magnitude and chop a fraction
    let atr_pct = inputs.atr_pct.max(0.0);
    let chop = inputs.chop.clamp(0.0, 1.0);
    let drift_pct = inputs.drift_pct.abs();

    let initial = GridCandidate {
        price: inputs.price,
        span: initial_span(atr_pct, inputs.liquidity_ok),
        grid_count: initial_grid_count(atr_pct),
    };

    let (adjustments, chosen) = FeasibilitySearch::new(initial, config.min_step_pct())
        .enumerate()
        .last()
        .unwrap_or((0, initial));

    let take_profit = take_profit_pct(atr_pct, chop, drift_pct);
    let cycle = cycle_estimate(atr_pct, take_profit, interval_minutes);

    debug!(
        "grid solved: px={:.6} span={:.4} grids={} step={:.3}% feasible={} after {} adjustments",
        inputs.price,
        chosen.span,
        chosen.grid_count,
        chosen.step_pct(),
        chosen.is_feasible(config.min_step_pct()),
        adjustments
    );

    Ok(GridPlan {
        lo: chosen.lo(),
        hi: chosen.hi(),
        grid_count: chosen.grid_count,
        step_pct: chosen.step_pct(),
        take_profit_pct: take_profit,
        cycle_estimate: cycle,
    })
}
