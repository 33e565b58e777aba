//! Watchlist scanner
//!
//! One scan cycle walks the watchlist in fixed-size batches. Within a
//! batch, up to `workers` symbols are fetched and scored concurrently;
//! batches run back to back with a short courtesy pause. A symbol with no
//! candles is dropped for the cycle. Results are ranked by score with ties
//! kept in watchlist order.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::grid::{self, GridError, GridInputs};
use crate::liquidity;
use crate::scoring;
use crate::sources::{CandleSource, TurnoverSource};
use crate::{GridPlan, LiquidityEstimate, ScoreRecord, Symbol};

/// Whether the displayed picks passed the hard filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickMode {
    /// At least one symbol qualified; only qualified symbols are shown
    Qualified,
    /// Nothing qualified; the best-scoring symbols are shown anyway
    Relaxed,
}

impl std::fmt::Display for PickMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PickMode::Qualified => write!(f, "QUALIFIED"),
            PickMode::Relaxed => write!(f, "RELAXED"),
        }
    }
}

/// Symbols to present for one cycle, best first
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub mode: PickMode,
    pub picks: Vec<ScoreRecord>,
}

impl Selection {
    pub fn top(&self) -> Option<&ScoreRecord> {
        self.picks.first()
    }
}

/// Pick up to `top_n` records from a ranked list
///
/// Qualified records are preferred; when none qualified, the head of the
/// full ranking is used. Returns `None` for an empty ranking.
pub fn select_picks(ranked: &[ScoreRecord], top_n: usize) -> Option<Selection> {
    if ranked.is_empty() {
        return None;
    }

    let qualified: Vec<ScoreRecord> = ranked
        .iter()
        .filter(|r| r.qualified)
        .take(top_n)
        .cloned()
        .collect();

    if qualified.is_empty() {
        Some(Selection {
            mode: PickMode::Relaxed,
            picks: ranked.iter().take(top_n).cloned().collect(),
        })
    } else {
        Some(Selection {
            mode: PickMode::Qualified,
            picks: qualified,
        })
    }
}

/// Sort by score, highest first; equal scores keep their input order
pub fn rank(records: &mut [ScoreRecord]) {
    records.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// Scan orchestrator
///
/// Owns the configuration and the two data sources. The secondary
/// source's identifier cache lives inside the source and outlives every
/// cycle.
pub struct Scanner {
    config: Config,
    candles: Arc<dyn CandleSource>,
    turnover: Arc<dyn TurnoverSource>,
}

impl Scanner {
    pub fn new(
        config: Config,
        candles: Arc<dyn CandleSource>,
        turnover: Arc<dyn TurnoverSource>,
    ) -> Self {
        Scanner {
            config,
            candles,
            turnover,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one scan cycle over the whole watchlist and return the ranking
    pub async fn scan_once(&self) -> Vec<ScoreRecord> {
        let symbols = self.config.scan.symbols();
        let batch_size = self.config.scan.batch_size.max(1);
        let workers = self.config.scan.workers.max(1);
        let batch_count = symbols.len().div_ceil(batch_size);

        let mut records = Vec::with_capacity(symbols.len());

        for (i, batch) in symbols.chunks(batch_size).enumerate() {
            if i > 0 && !self.config.scan.batch_delay().is_zero() {
                sleep(self.config.scan.batch_delay()).await;
            }

            // `buffered` keeps results in submission order, which the
            // stable ranking relies on for tie-breaking
            let scored: Vec<Option<ScoreRecord>> = stream::iter(batch)
                .map(|symbol| self.evaluate(symbol))
                .buffered(workers.min(batch.len()))
                .collect()
                .await;

            records.extend(scored.into_iter().flatten());
            debug!("Batch {}/{} done", i + 1, batch_count);
        }

        rank(&mut records);

        info!(
            "Scan complete: {}/{} symbols scored, {} qualified",
            records.len(),
            symbols.len(),
            records.iter().filter(|r| r.qualified).count()
        );
        records
    }

    /// Fetch, estimate liquidity, and score one symbol
    pub async fn evaluate(&self, symbol: &Symbol) -> Option<ScoreRecord> {
        let candles = self.candles.fetch_candles(symbol).await;
        if candles.is_empty() {
            warn!("{}: no candle data, skipped this cycle", symbol);
            return None;
        }

        let liquidity = self
            .resolve_liquidity(symbol, liquidity::turnover_ema(&candles))
            .await;

        let record = scoring::score_symbol(
            symbol,
            &candles,
            liquidity,
            &self.config.filters,
            self.config.scan.indicator_period,
        )?;

        debug!(
            "{}: score={:.1} qualified={} atr={:.3}% chop={:.2} drift={:.2}% trend={:.1} liq={:.0} ({})",
            symbol,
            record.score,
            record.qualified,
            record.indicators.atr_pct,
            record.indicators.chop_factor,
            record.indicators.drift_pct,
            record.indicators.trend_strength,
            record.liquidity.value,
            record.liquidity.source
        );
        Some(record)
    }

    /// Apply the liquidity fallback policy
    ///
    /// The secondary source is only consulted when the primary estimate is
    /// below the minimum turnover, and only replaces it when it clears the
    /// secondary threshold.
    pub async fn resolve_liquidity(&self, symbol: &Symbol, primary: f64) -> LiquidityEstimate {
        let filters = &self.config.filters;
        if primary >= filters.min_turnover_usd {
            return LiquidityEstimate::primary(primary);
        }

        let secondary = self.turnover.turnover_usd(symbol).await;
        if secondary >= filters.secondary_min_turnover_usd {
            debug!(
                "{}: primary turnover {:.0} below threshold, using secondary {:.0}",
                symbol, primary, secondary
            );
            LiquidityEstimate::secondary(secondary)
        } else {
            LiquidityEstimate::primary(primary)
        }
    }

    /// Grid plan for a scored symbol, using its own chop and drift
    pub fn plan_for(&self, record: &ScoreRecord) -> Result<GridPlan, GridError> {
        let inputs = GridInputs::for_record(record, self.config.filters.min_turnover_usd);
        grid::solve(
            &inputs,
            &self.config.grid,
            self.config.scan.interval_minutes(),
        )
    }
}
