//! GridPick - main entry point
//!
//! This binary provides two subcommands:
//! - scan: Poll the watchlist and print ranked grid candidates
//! - plan: Solve a grid plan offline for given price and indicators

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "gridpick")]
#[command(about = "Grid-trading pair scanner with dynamic take-profit and cycle estimates", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan the watchlist and recommend a grid for the top pick
    Scan {
        /// Path to JSON configuration file (defaults plus env overrides when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,

        /// Log take-profit inputs and intermediates for the top pick (also TPDEBUG=1)
        #[arg(long)]
        tpdebug: bool,
    },

    /// Solve a grid plan for given inputs without fetching data
    Plan {
        /// Path to JSON configuration file (fee model and interval)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Symbol used in the export line
        #[arg(short, long, default_value = "BTC/USDT")]
        symbol: String,

        /// Current price
        #[arg(long)]
        price: f64,

        /// ATR as a percent of price
        #[arg(long)]
        atr_pct: f64,

        /// Choppiness factor (0-1)
        #[arg(long, default_value = "0.5")]
        chop: f64,

        /// Absolute drift in percent
        #[arg(long, default_value = "0.0")]
        drift: f64,

        /// Treat liquidity as insufficient (widens the range)
        #[arg(long)]
        illiquid: bool,

        /// Candle interval for the cycle estimate (e.g. 30m, 1h)
        #[arg(long)]
        interval: Option<String>,

        /// Print every grid level
        #[arg(long)]
        levels: bool,
    },
}

/// `TPDEBUG=1` in the environment or `.env`
fn tpdebug_from_env() -> bool {
    std::env::var("TPDEBUG")
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn setup_logging(verbose: bool, command_name: &str) -> Result<()> {
    std::fs::create_dir_all("logs")?;

    // {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    // Filter out noisy external crates
    let level = if verbose { "debug" } else { "info" };
    let filter_str = format!(
        "{},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn",
        level
    );
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

    // Same format, no ANSI colors
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("Logging initialized");
    info!("Log file: {}", log_path.display());

    Ok(())
}

fn main() -> Result<()> {
    // .env is optional
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let command_name = match &cli.command {
        Commands::Scan { .. } => "scan",
        Commands::Plan { .. } => "plan",
    };
    setup_logging(cli.verbose, command_name)?;

    match cli.command {
        Commands::Scan {
            config,
            once,
            tpdebug,
        } => commands::scan::run(config, once, tpdebug || tpdebug_from_env()),

        Commands::Plan {
            config,
            symbol,
            price,
            atr_pct,
            chop,
            drift,
            illiquid,
            interval,
            levels,
        } => commands::plan::run(commands::plan::PlanArgs {
            config,
            symbol,
            price,
            atr_pct,
            chop,
            drift,
            illiquid,
            interval,
            levels,
        }),
    }
}
