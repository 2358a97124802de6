//! Per-strategy backtest report: everything needed to reproduce and review a run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use regimelab_core::domain::{Bar, TradeRecord};
use regimelab_core::engine::EngineConfig;
use regimelab_core::equity::{max_drawdown_pct, EquityCurve};
use regimelab_core::stats::{yearly_performance, TradeStatistics, YearlyPerformance};

use crate::runner::StrategyRun;

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run-independent labels attached to every report of one invocation.
#[derive(Debug, Clone, Default)]
pub struct ReportContext {
    pub instrument: String,
    pub config_fingerprint: String,
    pub dataset_hash: String,
    pub has_synthetic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub strategy: String,
    pub provider: String,
    pub instrument: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub bar_count: usize,
    pub bars_processed: usize,
    pub config: EngineConfig,
    pub config_fingerprint: String,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub initial_capital: f64,
    pub final_cash: f64,
    pub halted: bool,
    pub max_drawdown: f64,
    pub max_drawdown_pct: f64,
    pub stats: TradeStatistics,
    pub yearly: Vec<YearlyPerformance>,
    pub trades: Vec<TradeRecord>,
    pub equity: EquityCurve,
}

impl BacktestReport {
    pub fn new(run: &StrategyRun, bars: &[Bar], ctx: &ReportContext) -> Self {
        let values = run.equity.values();
        Self {
            schema_version: SCHEMA_VERSION,
            strategy: run.name.clone(),
            provider: run.provider.clone(),
            instrument: ctx.instrument.clone(),
            start_date: bars.first().map(|b| b.date),
            end_date: bars.last().map(|b| b.date),
            bar_count: bars.len(),
            bars_processed: run.result.bars_processed,
            config: run.config.clone(),
            config_fingerprint: ctx.config_fingerprint.clone(),
            dataset_hash: ctx.dataset_hash.clone(),
            has_synthetic: ctx.has_synthetic,
            initial_capital: run.result.initial_capital,
            final_cash: run.result.final_cash,
            halted: run.result.is_halted(),
            max_drawdown: run.equity.max_drawdown(),
            max_drawdown_pct: max_drawdown_pct(&values),
            stats: TradeStatistics::from_ledger(&run.result.trades),
            yearly: yearly_performance(&run.result.trades),
            trades: run.result.trades.clone(),
            equity: run.equity.clone(),
        }
    }

    pub fn total_return(&self) -> f64 {
        if self.initial_capital > 0.0 {
            self.final_cash / self.initial_capital - 1.0
        } else {
            0.0
        }
    }
}
