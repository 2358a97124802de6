//! Mutable engine state and the run result.

use crate::domain::{Bar, OpenPosition, Position, TradeRecord};
use crate::equity::{build_equity_curve, EquityCurve};
use serde::{Deserialize, Serialize};

/// Externally visible state of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    Flat,
    Long,
    /// Terminal: the drawdown kill-switch fired.
    Halted,
}

/// State that evolves bar by bar. Owned by exactly one run.
///
/// `cash` holds realized P&L only; open positions are never marked to market
/// here, so the peak and drawdown are purely capital based.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub cash: f64,
    pub peak_cash: f64,
    pub position: Position,
    pub halted: bool,
}

impl EngineState {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            cash: initial_capital,
            peak_cash: initial_capital,
            position: Position::Flat,
            halted: false,
        }
    }

    /// Raise the running peak to the current cash and return the drawdown
    /// `(cash - peak) / peak`, always <= 0.
    pub fn update_drawdown(&mut self) -> f64 {
        self.peak_cash = self.peak_cash.max(self.cash);
        (self.cash - self.peak_cash) / self.peak_cash
    }

    pub fn status(&self) -> EngineStatus {
        if self.halted {
            EngineStatus::Halted
        } else if self.position.is_flat() {
            EngineStatus::Flat
        } else {
            EngineStatus::Long
        }
    }
}

/// Result of a complete run. A pure function of `(bars, config, provider)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Append-only ledger. If it contains a `Halt`, that record is last.
    pub trades: Vec<TradeRecord>,
    pub initial_capital: f64,
    pub final_cash: f64,
    pub peak_cash: f64,
    /// Bars consumed, including the bar on which a halt fired.
    pub bars_processed: usize,
    pub status: EngineStatus,
    /// Position still open at end of data; never force-closed.
    pub open_position: Option<OpenPosition>,
}

impl RunResult {
    pub fn is_halted(&self) -> bool {
        self.status == EngineStatus::Halted
    }

    /// One equity point per processed bar.
    pub fn equity_curve(&self, bars: &[Bar]) -> EquityCurve {
        let processed = &bars[..self.bars_processed.min(bars.len())];
        build_equity_curve(processed, &self.trades, self.initial_capital)
    }
}
