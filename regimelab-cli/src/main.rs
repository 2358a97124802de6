//! RegimeLab CLI: backtest, allocation sweep and synthetic data commands.
//!
//! Commands:
//! - `run`: execute every strategy in a TOML config and save artifacts
//! - `allocate`: sweep the trend / mean-reversion capital split
//! - `synth`: write a seeded synthetic bar file

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use regimelab_core::domain::Bar;
use regimelab_core::portfolio::PortfolioCurve;
use regimelab_runner::{
    allocation_sweep, dataset_hash, derive_execution_signal, generate_synthetic_bars, load_csv,
    run_strategies, save_artifacts, save_portfolio, write_csv, write_order_ticket,
    BacktestConfig, BacktestReport, ReportContext,
};

const SYNTHETIC_SEED: u64 = 42;

#[derive(Parser)]
#[command(
    name = "regimelab",
    about = "RegimeLab CLI: regime-driven long-only backtesting"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every strategy in a TOML config and combine their equity.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// CSV bar file. Overrides `backtest.data` in the config.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Use this many synthetic bars instead of a data file.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Write next-session execution signals to this CSV.
        #[arg(long)]
        ticket: Option<PathBuf>,
    },
    /// Sweep static trend / mean-reversion capital splits.
    Allocate {
        /// CSV bar file.
        #[arg(long)]
        data: PathBuf,

        /// Total capital to split.
        #[arg(long, default_value_t = 100_000.0)]
        capital: f64,

        /// Trend weights to evaluate, comma separated.
        #[arg(
            long,
            value_delimiter = ',',
            default_value = "0.9,0.8,0.7,0.6,0.5"
        )]
        weights: Vec<f64>,
    },
    /// Generate a synthetic bar file.
    Synth {
        /// Output CSV path.
        #[arg(long)]
        out: PathBuf,

        /// Number of bars.
        #[arg(long, default_value_t = 1000)]
        bars: usize,

        /// RNG seed.
        #[arg(long, default_value_t = SYNTHETIC_SEED)]
        seed: u64,

        /// First calendar date (YYYY-MM-DD); weekends are skipped.
        #[arg(long, default_value = "2015-01-01")]
        start: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            data,
            synthetic,
            output_dir,
            ticket,
        } => run_backtest_cmd(&config, data, synthetic, &output_dir, ticket.as_deref()),
        Commands::Allocate {
            data,
            capital,
            weights,
        } => run_allocate(&data, capital, &weights),
        Commands::Synth {
            out,
            bars,
            seed,
            start,
        } => run_synth(&out, bars, seed, &start),
    }
}

fn run_backtest_cmd(
    config_path: &Path,
    data: Option<PathBuf>,
    synthetic: Option<usize>,
    output_dir: &Path,
    ticket: Option<&Path>,
) -> Result<()> {
    let config = BacktestConfig::load(config_path)?;
    let specs = config.specs()?;

    let (bars, has_synthetic) = match synthetic {
        Some(n) => {
            warn!(bars = n, seed = SYNTHETIC_SEED, "using SYNTHETIC data");
            (generate_synthetic_bars(default_start()?, n, SYNTHETIC_SEED), true)
        }
        None => {
            let Some(path) = data.or_else(|| config.backtest.data.clone()) else {
                bail!("no data source: pass --data, --synthetic or set backtest.data");
            };
            (load_csv(&path)?, false)
        }
    };
    if bars.is_empty() {
        bail!("no bars to backtest");
    }

    let ctx = ReportContext {
        instrument: config.backtest.instrument.clone(),
        config_fingerprint: config.fingerprint()?,
        dataset_hash: dataset_hash(&bars),
        has_synthetic,
    };
    info!(
        strategies = specs.len(),
        bars = bars.len(),
        fingerprint = %ctx.config_fingerprint,
        "starting backtest"
    );

    let multi = run_strategies(&bars, &specs)?;

    let mut reports = Vec::with_capacity(multi.runs.len());
    let mut signals = Vec::new();
    for run in &multi.runs {
        let report = BacktestReport::new(run, &bars, &ctx);
        print_summary(&report);
        let run_dir = save_artifacts(&report, output_dir)?;
        println!("Artifacts saved to: {}", run_dir.display());

        signals.extend(derive_execution_signal(
            &run.name,
            &ctx.instrument,
            &run.result,
            &bars,
        ));
        reports.push(report);
    }

    save_portfolio(&reports, &multi.portfolio, output_dir)?;
    print_portfolio(&multi.portfolio, &bars);

    if let Some(path) = ticket {
        write_order_ticket(&signals, path)?;
        println!("Order ticket written to: {}", path.display());
    }

    Ok(())
}

fn run_allocate(data: &Path, capital: f64, weights: &[f64]) -> Result<()> {
    let bars = load_csv(data)?;
    let results = allocation_sweep(&bars, capital, weights)?;

    for r in &results {
        info!(
            "Trend {:.0}% / MR {:.0}% | Final equity: {:.2} | Max DD: {:.2}",
            r.trend_weight * 100.0,
            (1.0 - r.trend_weight) * 100.0,
            r.final_equity,
            r.max_drawdown
        );
    }
    Ok(())
}

fn run_synth(out: &Path, n: usize, seed: u64, start: &str) -> Result<()> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .with_context(|| format!("invalid --start date '{start}'"))?;
    let bars = generate_synthetic_bars(start, n, seed);
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    write_csv(out, &bars).with_context(|| format!("failed to write {}", out.display()))?;
    println!("Wrote {} synthetic bars to {}", bars.len(), out.display());
    Ok(())
}

fn default_start() -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(2015, 1, 1).context("invalid default start date")
}

fn print_summary(report: &BacktestReport) {
    println!();
    println!("=== {} ({}) ===", report.strategy, report.provider);
    if let (Some(start), Some(end)) = (report.start_date, report.end_date) {
        println!("Period:         {start} to {end}");
    }
    println!(
        "Bars:           {} ({} processed)",
        report.bar_count, report.bars_processed
    );
    println!("Trades:         {}", report.stats.total_trades);
    println!();
    println!("--- Performance ---");
    println!("Initial:        {:.2}", report.initial_capital);
    println!("Final Cash:     {:.2}", report.final_cash);
    println!("Total Return:   {:.2}%", report.total_return() * 100.0);
    println!("Max Drawdown:   {:.2}", report.max_drawdown);
    println!("Max DD %:       {:.2}%", report.max_drawdown_pct * 100.0);
    println!("Win Rate:       {:.1}%", report.stats.win_rate * 100.0);
    println!("Profit Factor:  {:.2}", report.stats.profit_factor);
    println!("Expectancy:     {:.2}", report.stats.expectancy);
    println!(
        "Exits:          {} regime / {} stop",
        report.stats.regime_exits, report.stats.stop_exits
    );
    println!("Max Consec Loss:{}", report.stats.max_consecutive_losses);
    if report.halted {
        println!("HALTED:         drawdown kill-switch fired");
    }
    if report.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
}

fn print_portfolio(portfolio: &PortfolioCurve, bars: &[Bar]) {
    println!();
    println!("=== Portfolio ===");
    println!("Strategies:     {}", portfolio.strategies.join(", "));
    println!("Bars:           {}", bars.len());
    match portfolio.final_equity() {
        Some(equity) => println!("Final Equity:   {equity:.2}"),
        None => println!("Final Equity:   n/a"),
    }
    println!("Max Drawdown:   {:.2}", portfolio.max_drawdown());
}
