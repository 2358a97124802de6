//! RegimeLab Runner: backtest orchestration on top of `regimelab-core`.
//!
//! This crate provides:
//! - TOML configuration with per-strategy engine parameters and capital weights
//! - CSV bar ingestion with named errors, plus seeded synthetic bars
//! - Single and multi-strategy runs (parallel, merged into a portfolio curve)
//! - The static trend / mean-reversion allocation sweep
//! - Execution signals and order-ticket export
//! - JSON, CSV and Markdown artifacts

pub mod config;
pub mod data_loader;
pub mod execution;
pub mod export;
pub mod report;
pub mod runner;

pub use config::{BacktestConfig, ConfigError, EngineParams, SignalConfig, StrategyConfig, StrategySpec};
pub use data_loader::{dataset_hash, generate_synthetic_bars, load_csv, write_csv, LoadError};
pub use execution::{derive_execution_signal, write_order_ticket, Action, ExecutionSignal};
pub use export::{load_artifacts, save_artifacts, save_portfolio};
pub use report::{BacktestReport, ReportContext, SCHEMA_VERSION};
pub use runner::{
    allocation_sweep, run_allocation, run_strategies, run_strategy, AllocationResult, MultiRun,
    RunError, StrategyRun,
};
