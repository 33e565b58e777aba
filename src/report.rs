//! Plain-text rendering of scan results
//!
//! Formatting only; records and plans are never modified here.

use std::fmt::Write;

use crate::config::Config;
use crate::scanner::PickMode;
use crate::{GridPlan, ScoreRecord};

/// Cycle header: settings, filters and sources
pub fn render_header(config: &Config, timestamp: &str) -> String {
    let scan = &config.scan;
    let f = &config.filters;
    let mut out = String::new();

    let _ = writeln!(out, "{}", "=".repeat(72));
    let _ = writeln!(
        out,
        "GridPick | {} interval | ~{}d lookback | {} pairs | {}s refresh",
        scan.interval,
        scan.lookback_days(),
        scan.watchlist.len(),
        scan.refresh_secs
    );
    let _ = writeln!(
        out,
        "Filters: ATR% >= {} | Chop >= {} | Drift <= {}% | Liq >= ${}",
        f.min_atr_pct,
        f.min_chop,
        f.max_drift_pct,
        group_thousands(f.min_turnover_usd)
    );
    let _ = writeln!(out, "Sources: Kraken (primary) -> CoinGecko (fallback)");
    let _ = writeln!(out, "{}", timestamp);
    let _ = writeln!(out, "{}", "=".repeat(72));
    out
}

/// Ranked table, one row per record
pub fn render_table(records: &[ScoreRecord]) -> String {
    let mut out = String::new();
    let header = format!(
        "{:>3}  {:^3}  {:<12}  {:>7}  {:>6}  {:>7}  {:>7}  {:>6}  {:>14}  {:>14}",
        "#", "Q", "Symbol", "Score", "Chop", "ATR%", "Drift", "Trend", "Liquidity", "Price"
    );
    let _ = writeln!(out, "{}", header);
    let _ = writeln!(out, "{}", "-".repeat(header.len()));

    for (i, r) in records.iter().enumerate() {
        let badge = if r.qualified { "+" } else { "~" };
        let _ = writeln!(
            out,
            "{:>3}  {:^3}  {:<12}  {:>7.1}  {:>6.2}  {:>7.2}  {:>7.1}  {:>6.1}  {:>14}  {:>14.6}",
            i + 1,
            badge,
            r.symbol.as_str(),
            r.score,
            r.indicators.chop_factor,
            r.indicators.atr_pct,
            r.indicators.drift_pct,
            r.indicators.trend_strength,
            format!("${}", group_thousands(r.liquidity.value)),
            r.price
        );
    }
    out
}

/// Top-pick block with the grid configuration and export line
pub fn render_pick(record: &ScoreRecord, plan: &GridPlan, mode: PickMode) -> String {
    let ind = &record.indicators;
    let mut out = String::new();

    let _ = writeln!(out, "{}", "-".repeat(60));
    let _ = writeln!(out, "TOP PICK: {}  [{}]", record.symbol, mode);
    let _ = writeln!(out, "{}", "-".repeat(60));
    let _ = writeln!(
        out,
        "  Score: {:.1} | Chop: {:.2} | ATR: {:.2}% | Drift: {:.1}% | Trend: {:.1}",
        record.score, ind.chop_factor, ind.atr_pct, ind.drift_pct, ind.trend_strength
    );
    let _ = writeln!(
        out,
        "  Liquidity: ${} ({})",
        group_thousands(record.liquidity.value),
        record.liquidity.source
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "  Range:      {:.8} -> {:.8}", plan.lo, plan.hi);
    let _ = writeln!(out, "  Levels:     {}", plan.grid_count);
    let _ = writeln!(out, "  Step Size:  {:.3}%", plan.step_pct);
    let _ = writeln!(out, "  Target:     ~{:.2}%", plan.take_profit_pct);
    let _ = writeln!(out, "  Est. Cycle: {}", plan.cycle_estimate);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", plan.export_line(&record.symbol));
    out
}

/// Whole-dollar amount with comma separators
pub fn group_thousands(value: f64) -> String {
    let whole = if value.is_finite() { value.trunc() as i64 } else { 0 };
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if whole < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CycleEstimate, IndicatorSet, LiquidityEstimate, Symbol};

    fn sample() -> (ScoreRecord, GridPlan) {
        let record = ScoreRecord {
            symbol: Symbol::new("SOL/USDT"),
            price: 150.0,
            indicators: IndicatorSet {
                atr_pct: 0.8,
                drift_pct: 2.0,
                chop_factor: 0.45,
                trend_strength: 57.1,
            },
            liquidity: LiquidityEstimate::secondary(1_234_567.9),
            score: 61.3,
            qualified: true,
        };
        let plan = GridPlan {
            lo: 145.0,
            hi: 155.0,
            grid_count: 20,
            step_pct: 0.3333,
            take_profit_pct: 10.43,
            cycle_estimate: CycleEstimate {
                bars: 37.2,
                hours: 18.6,
            },
        };
        (record, plan)
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.9), "999");
        assert_eq!(group_thousands(50_000.0), "50,000");
        assert_eq!(group_thousands(1_234_567.0), "1,234,567");
        assert_eq!(group_thousands(-1_500.0), "-1,500");
        assert_eq!(group_thousands(f64::NAN), "0");
    }

    #[test]
    fn test_render_table_rows() {
        let (record, _) = sample();
        let table = render_table(&[record]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("SOL/USDT"));
        assert!(lines[2].contains("61.3"));
        assert!(lines[2].contains("$1,234,567"));
    }

    #[test]
    fn test_render_pick() {
        let (record, plan) = sample();
        let block = render_pick(&record, &plan, PickMode::Qualified);
        assert!(block.contains("TOP PICK: SOL/USDT  [QUALIFIED]"));
        assert!(block.contains("Levels:     20"));
        assert!(block.contains("Est. Cycle: ~18.6h"));
        assert!(block.contains("(secondary)"));
        assert!(block.contains("EXPORT: symbol=SOL/USDT, low=145.00000000"));
    }

    #[test]
    fn test_render_header() {
        let header = render_header(&Config::default(), "2026-01-01 00:00:00");
        assert!(header.contains("30m interval | ~5d lookback | 36 pairs | 25s refresh"));
        assert!(header.contains("Liq >= $50,000"));
    }
}
