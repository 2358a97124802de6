//! RegimeLab Core: deterministic bar-by-bar replay of a long-only strategy.
//!
//! This crate contains the stateful heart of the backtester:
//! - Domain types (bars, signals, positions, trade ledger records)
//! - Rolling indicators (SMA, ATR) behind a single `Indicator` trait
//! - The `SignalProvider` capability and its strategy variants
//! - The simulation engine: volatility sizing, stop-loss, drawdown kill-switch
//! - Equity curve construction, drawdown, portfolio aggregation
//! - Trade statistics and yearly performance

pub mod domain;
pub mod engine;
pub mod equity;
pub mod indicators;
pub mod portfolio;
pub mod stats;
pub mod strategy;
