//! Backtest runner: wires config, engine, equity curves and aggregation.
//!
//! Entry points:
//! - `run_strategy()`: one spec over pre-loaded bars.
//! - `run_strategies()`: many specs in parallel, merged into a portfolio curve.
//! - `run_allocation()` / `allocation_sweep()`: the fixed trend + mean-reversion
//!   pair under a static capital split.

use rayon::prelude::*;
use thiserror::Error;
use tracing::info;

use regimelab_core::domain::Bar;
use regimelab_core::engine::{EngineConfig, EngineError, RunResult, SimulationEngine};
use regimelab_core::equity::EquityCurve;
use regimelab_core::portfolio::{PortfolioAggregator, PortfolioCurve, PortfolioError};

use crate::config::{ConfigError, SignalConfig, StrategySpec};
use crate::data_loader::LoadError;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("portfolio error: {0}")]
    Portfolio(#[from] PortfolioError),
    #[error("trend weight {0} must be in [0, 1]")]
    InvalidWeight(f64),
}

/// Result of one strategy over one bar series.
#[derive(Debug, Clone)]
pub struct StrategyRun {
    pub name: String,
    /// Name reported by the signal provider (e.g., "sma_trend").
    pub provider: String,
    pub config: EngineConfig,
    pub result: RunResult,
    pub equity: EquityCurve,
}

/// Independent strategy runs and their combined portfolio curve.
#[derive(Debug, Clone)]
pub struct MultiRun {
    /// In the order the specs were given.
    pub runs: Vec<StrategyRun>,
    pub portfolio: PortfolioCurve,
}

impl MultiRun {
    pub fn final_equity(&self) -> Option<f64> {
        self.portfolio.final_equity()
    }

    pub fn max_drawdown(&self) -> f64 {
        self.portfolio.max_drawdown()
    }
}

/// Run a single strategy over pre-loaded bars: no I/O.
pub fn run_strategy(bars: &[Bar], spec: &StrategySpec) -> Result<StrategyRun, RunError> {
    let provider = spec.signal.build();
    let provider_name = provider.name().to_string();
    let result = SimulationEngine::new(spec.engine.clone(), provider)?.run(bars);
    let equity = result.equity_curve(bars);

    Ok(StrategyRun {
        name: spec.name.clone(),
        provider: provider_name,
        config: spec.engine.clone(),
        result,
        equity,
    })
}

/// Run every spec as an independent engine on the rayon pool, then merge the
/// equity curves.
pub fn run_strategies(bars: &[Bar], specs: &[StrategySpec]) -> Result<MultiRun, RunError> {
    let runs: Vec<StrategyRun> = specs
        .par_iter()
        .map(|spec| run_strategy(bars, spec))
        .collect::<Result<_, _>>()?;

    let mut aggregator = PortfolioAggregator::new();
    for run in &runs {
        aggregator.insert(run.name.clone(), run.equity.clone())?;
    }
    let portfolio = aggregator.combine();

    info!(
        strategies = runs.len(),
        final_equity = ?portfolio.final_equity(),
        max_drawdown = portfolio.max_drawdown(),
        "portfolio combined"
    );

    Ok(MultiRun { runs, portfolio })
}

// ─── Static allocation ──────────────────────────────────────────────

pub const TREND_LEG: &str = "trend";
pub const MEAN_REVERSION_LEG: &str = "mean_reversion";

/// Trend leg: SMA(200) regime, 1% risk, ATR(14) x 2.0.
pub fn trend_leg(capital: f64) -> StrategySpec {
    StrategySpec::new(
        TREND_LEG,
        SignalConfig::SmaTrend { window: 200 },
        EngineConfig::new(capital)
            .with_risk(0.01, 0.20)
            .with_atr(14, 2.0)
            .with_costs(10.0, 0.5),
    )
}

/// Mean-reversion leg: default parameters, 0.5% risk, ATR(14) x 1.0.
pub fn mean_reversion_leg(capital: f64) -> StrategySpec {
    StrategySpec::new(
        MEAN_REVERSION_LEG,
        SignalConfig::MeanReversion {
            mean_window: 20,
            regime_window: 200,
            atr_period: 14,
            entry_atr: 1.0,
        },
        EngineConfig::new(capital)
            .with_risk(0.005, 0.20)
            .with_atr(14, 1.0)
            .with_costs(10.0, 0.5),
    )
}

/// Outcome of one static capital split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationResult {
    pub trend_weight: f64,
    pub final_equity: f64,
    /// Absolute max drawdown of the combined curve (<= 0).
    pub max_drawdown: f64,
}

/// Split `total_capital` between the trend and mean-reversion legs and run
/// both. A leg whose share is zero is left out.
pub fn run_allocation(
    bars: &[Bar],
    total_capital: f64,
    trend_weight: f64,
) -> Result<AllocationResult, RunError> {
    if !(0.0..=1.0).contains(&trend_weight) {
        return Err(RunError::InvalidWeight(trend_weight));
    }
    if !(total_capital.is_finite() && total_capital > 0.0) {
        return Err(EngineError::InvalidConfig {
            field: "initial_capital",
            value: total_capital,
            reason: "must be > 0",
        }
        .into());
    }

    let trend_capital = total_capital * trend_weight;
    let mr_capital = total_capital * (1.0 - trend_weight);
    let mut specs = Vec::with_capacity(2);
    if trend_capital > 0.0 {
        specs.push(trend_leg(trend_capital));
    }
    if mr_capital > 0.0 {
        specs.push(mean_reversion_leg(mr_capital));
    }

    let multi = run_strategies(bars, &specs)?;
    Ok(AllocationResult {
        trend_weight,
        final_equity: multi.final_equity().unwrap_or(total_capital),
        max_drawdown: multi.max_drawdown(),
    })
}

/// Evaluate many trend weights in parallel. Output order matches `weights`.
pub fn allocation_sweep(
    bars: &[Bar],
    total_capital: f64,
    weights: &[f64],
) -> Result<Vec<AllocationResult>, RunError> {
    weights
        .par_iter()
        .map(|&w| run_allocation(bars, total_capital, w))
        .collect()
}
