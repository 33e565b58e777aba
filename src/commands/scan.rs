//! Scan command - the outer polling loop
//!
//! Scans the watchlist, prints the ranking and the top pick's grid plan,
//! sleeps for the refresh interval, and repeats until Ctrl-C.

use anyhow::{Context, Result};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use gridpick::common::{HttpClient, TransportConfig};
use gridpick::grid::{cycle_edge, GridInputs};
use gridpick::report::{render_header, render_pick, render_table};
use gridpick::scanner::{select_picks, PickMode, Selection};
use gridpick::sources::{CoinGeckoClient, IdentifierCache, KrakenClient};
use gridpick::{Config, Scanner};

pub fn run(config_path: Option<PathBuf>, once: bool, tpdebug: bool) -> Result<()> {
    let config = Config::load(config_path.as_deref()).context("Failed to load configuration")?;

    info!(
        "Scanning {} pairs every {}s ({} interval, lookback {})",
        config.scan.watchlist.len(),
        config.scan.refresh_secs,
        config.scan.interval,
        config.scan.lookback
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_loop(config, once, tpdebug))
}

fn build_scanner(config: Config) -> Result<Scanner> {
    let http = HttpClient::new(TransportConfig::from(&config.sources))?;

    let kraken = KrakenClient::new(
        http.clone(),
        &config.sources.kraken_base_url,
        config.scan.interval_minutes(),
        config.scan.lookback,
    );

    // Lives as long as the scanner, i.e. the whole process
    let ids = Arc::new(IdentifierCache::new());
    let gecko = CoinGeckoClient::new(http, &config.sources.coingecko_base_url, ids);

    Ok(Scanner::new(config, Arc::new(kraken), Arc::new(gecko)))
}

/// Run `fut` unless Ctrl-C arrives first
async fn until_interrupted<F: Future>(fut: F) -> Option<F::Output> {
    tokio::select! {
        out = fut => Some(out),
        _ = tokio::signal::ctrl_c() => None,
    }
}

async fn run_loop(config: Config, once: bool, tpdebug: bool) -> Result<()> {
    let scanner = build_scanner(config)?;
    let refresh = scanner.config().scan.refresh();
    let mut cycle: u64 = 0;

    loop {
        cycle += 1;
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        println!("{}", render_header(scanner.config(), &timestamp));

        let Some(results) = until_interrupted(scanner.scan_once()).await else {
            break;
        };

        match select_picks(&results, scanner.config().scan.top_n) {
            None => warn!("No data this pass (network/API), cycle {}", cycle),
            Some(selection) => present(&scanner, &selection, tpdebug),
        }

        if once {
            return Ok(());
        }

        println!("Next refresh in {}s... (Ctrl+C to exit)", refresh.as_secs());
        if until_interrupted(tokio::time::sleep(refresh)).await.is_none() {
            break;
        }
    }

    info!("Interrupted, shutting down");
    println!("\nBye.");
    Ok(())
}

fn present(scanner: &Scanner, selection: &Selection, tpdebug: bool) {
    if selection.mode == PickMode::Relaxed {
        warn!("No symbols passed filters, showing best available (relaxed)");
    }

    println!("{}", render_table(&selection.picks));

    let Some(top) = selection.top() else {
        return;
    };

    match scanner.plan_for(top) {
        Ok(plan) => {
            if tpdebug {
                let inputs = GridInputs::for_record(top, scanner.config().filters.min_turnover_usd);
                info!(
                    "[TPDEBUG] px={:.4} atr%={:.3} chop={:.2} drift={:.1} PER={:.4} -> TP%={:.2} est={}",
                    inputs.price,
                    inputs.atr_pct,
                    inputs.chop,
                    inputs.drift_pct,
                    cycle_edge(inputs.atr_pct, inputs.chop, inputs.drift_pct),
                    plan.take_profit_pct,
                    plan.cycle_estimate
                );
            }
            println!("{}", render_pick(top, &plan, selection.mode));
        }
        Err(e) => warn!("No grid plan for {}: {}", top.symbol, e),
    }
}
