//! Engine configuration and its preconditions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised before a run starts. A run itself never fails.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid engine config: {field} = {value} ({reason})")]
    InvalidConfig {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },
}

/// How the engine turns a Long signal into a position size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PositionSizing {
    /// `cash * risk_per_trade / (atr_multiplier * ATR)`.
    #[default]
    AtrRisk,
    /// Constant size regardless of cash or volatility.
    FixedUnits { units: f64 },
    /// `cash * risk_per_trade / entry_price` (a notional fraction of cash).
    CashFraction,
}

/// Configuration for a single run. Immutable for the duration of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_capital: f64,
    /// Fraction of cash risked per trade, in (0, 1].
    pub risk_per_trade: f64,
    /// Drawdown fraction that fires the kill-switch, in (0, 1].
    pub max_drawdown: f64,
    pub atr_period: usize,
    /// Stop distance in ATR units.
    pub atr_multiplier: f64,
    /// Flat cost charged on every entry and every exit.
    pub transaction_cost: f64,
    /// Absolute price slippage applied against the trader on entries and
    /// regime exits (never on stop fills).
    pub slippage: f64,
    #[serde(default)]
    pub sizing: PositionSizing,
    #[serde(default = "enabled")]
    pub stop_loss: bool,
    #[serde(default = "enabled")]
    pub kill_switch: bool,
}

fn enabled() -> bool {
    true
}

impl EngineConfig {
    /// Risk-sized config with stops and the kill-switch enabled.
    ///
    /// Defaults: 1% risk, 20% max drawdown, ATR(14) x 2.0, no costs.
    pub fn new(initial_capital: f64) -> Self {
        Self {
            initial_capital,
            risk_per_trade: 0.01,
            max_drawdown: 0.20,
            atr_period: 14,
            atr_multiplier: 2.0,
            transaction_cost: 0.0,
            slippage: 0.0,
            sizing: PositionSizing::AtrRisk,
            stop_loss: true,
            kill_switch: true,
        }
    }

    /// Degenerate variant: one unit per trade, no stop.
    pub fn fixed_units(initial_capital: f64) -> Self {
        Self {
            sizing: PositionSizing::FixedUnits { units: 1.0 },
            stop_loss: false,
            ..Self::new(initial_capital)
        }
    }

    pub fn with_costs(mut self, transaction_cost: f64, slippage: f64) -> Self {
        self.transaction_cost = transaction_cost;
        self.slippage = slippage;
        self
    }

    pub fn with_risk(mut self, risk_per_trade: f64, max_drawdown: f64) -> Self {
        self.risk_per_trade = risk_per_trade;
        self.max_drawdown = max_drawdown;
        self
    }

    pub fn with_atr(mut self, atr_period: usize, atr_multiplier: f64) -> Self {
        self.atr_period = atr_period;
        self.atr_multiplier = atr_multiplier;
        self
    }

    /// True if entries need a valid volatility reading.
    pub fn needs_volatility(&self) -> bool {
        self.stop_loss || matches!(self.sizing, PositionSizing::AtrRisk)
    }

    /// Check every precondition the engine relies on.
    pub fn validate(&self) -> Result<(), EngineError> {
        fn invalid(field: &'static str, value: f64, reason: &'static str) -> EngineError {
            EngineError::InvalidConfig {
                field,
                value,
                reason,
            }
        }

        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(invalid("initial_capital", self.initial_capital, "must be > 0"));
        }
        if !(self.risk_per_trade > 0.0 && self.risk_per_trade <= 1.0) {
            return Err(invalid("risk_per_trade", self.risk_per_trade, "must be in (0, 1]"));
        }
        if !(self.max_drawdown > 0.0 && self.max_drawdown <= 1.0) {
            return Err(invalid("max_drawdown", self.max_drawdown, "must be in (0, 1]"));
        }
        if self.atr_period < 1 {
            return Err(invalid("atr_period", self.atr_period as f64, "must be >= 1"));
        }
        if !(self.atr_multiplier.is_finite() && self.atr_multiplier > 0.0) {
            return Err(invalid("atr_multiplier", self.atr_multiplier, "must be > 0"));
        }
        if !(self.transaction_cost.is_finite() && self.transaction_cost >= 0.0) {
            return Err(invalid("transaction_cost", self.transaction_cost, "must be >= 0"));
        }
        if !(self.slippage.is_finite() && self.slippage >= 0.0) {
            return Err(invalid("slippage", self.slippage, "must be >= 0"));
        }
        if let PositionSizing::FixedUnits { units } = self.sizing {
            if !(units.is_finite() && units > 0.0) {
                return Err(invalid("sizing.units", units, "must be > 0"));
            }
        }
        Ok(())
    }
}
