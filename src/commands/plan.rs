//! Plan command - run the grid solver offline for given inputs

use anyhow::{Context, Result};
use std::path::PathBuf;

use gridpick::config::interval_minutes;
use gridpick::grid::{self, GridInputs};
use gridpick::{Config, Symbol};

pub struct PlanArgs {
    pub config: Option<PathBuf>,
    pub symbol: String,
    pub price: f64,
    pub atr_pct: f64,
    pub chop: f64,
    pub drift: f64,
    pub illiquid: bool,
    pub interval: Option<String>,
    pub levels: bool,
}

pub fn run(args: PlanArgs) -> Result<()> {
    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    let interval = args.interval.as_deref().unwrap_or(&config.scan.interval);

    let inputs = GridInputs {
        price: args.price,
        atr_pct: args.atr_pct,
        liquidity_ok: !args.illiquid,
        chop: args.chop,
        drift_pct: args.drift,
    };

    let plan = grid::solve(&inputs, &config.grid, interval_minutes(interval))
        .context("Invalid solver inputs")?;

    println!("\n{}", "=".repeat(60));
    println!("GRID PLAN");
    println!("{}", "=".repeat(60));
    println!(
        "  Inputs:     px={} atr={:.3}% chop={:.2} drift={:.2}% liquid={}",
        args.price, args.atr_pct, args.chop, args.drift, !args.illiquid
    );
    println!(
        "  Fees:       {:.2}% x {:.1} -> min step {:.2}%",
        config.grid.fee_pct,
        config.grid.min_grid_mult,
        config.grid.min_step_pct()
    );
    println!("  Range:      {:.8} -> {:.8}", plan.lo, plan.hi);
    println!("  Levels:     {}", plan.grid_count);
    println!("  Step Size:  {:.3}%", plan.step_pct);
    println!("  Target:     ~{:.2}%", plan.take_profit_pct);
    println!("  Est. Cycle: {} ({} interval)", plan.cycle_estimate, interval);

    if args.levels {
        println!();
        for (i, level) in plan.levels().iter().enumerate() {
            println!("  {:>3}  {:.8}", i, level);
        }
    }

    println!("\n{}", plan.export_line(&Symbol::new(&args.symbol)));
    Ok(())
}
