//! TradeRecord: one entry of the append-only trade ledger.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single ledger entry.
///
/// `Sell` and `Stop` are the only records that realize P&L. A `Halt` record is
/// terminal: the engine never appends anything after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeRecord {
    /// Entry fill at `close + slippage`.
    Buy {
        date: NaiveDate,
        price: f64,
        size: f64,
        stop: Option<f64>,
        cash: f64,
    },
    /// Regime exit at `close - slippage`.
    Sell {
        date: NaiveDate,
        price: f64,
        size: f64,
        pnl: f64,
        cash: f64,
    },
    /// Forced exit filled exactly at the stop price.
    Stop {
        date: NaiveDate,
        price: f64,
        size: f64,
        pnl: f64,
        cash: f64,
    },
    /// Drawdown kill-switch fired.
    Halt {
        date: NaiveDate,
        reason: String,
        cash: f64,
    },
}

/// Discriminant of a `TradeRecord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeKind {
    Buy,
    Sell,
    Stop,
    Halt,
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeKind::Buy => "BUY",
            TradeKind::Sell => "SELL",
            TradeKind::Stop => "STOP",
            TradeKind::Halt => "HALT",
        };
        f.write_str(s)
    }
}

impl TradeRecord {
    pub fn kind(&self) -> TradeKind {
        match self {
            TradeRecord::Buy { .. } => TradeKind::Buy,
            TradeRecord::Sell { .. } => TradeKind::Sell,
            TradeRecord::Stop { .. } => TradeKind::Stop,
            TradeRecord::Halt { .. } => TradeKind::Halt,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            TradeRecord::Buy { date, .. }
            | TradeRecord::Sell { date, .. }
            | TradeRecord::Stop { date, .. }
            | TradeRecord::Halt { date, .. } => *date,
        }
    }

    /// Cash snapshot taken right after the record was applied.
    pub fn cash(&self) -> f64 {
        match self {
            TradeRecord::Buy { cash, .. }
            | TradeRecord::Sell { cash, .. }
            | TradeRecord::Stop { cash, .. }
            | TradeRecord::Halt { cash, .. } => *cash,
        }
    }

    pub fn price(&self) -> Option<f64> {
        match self {
            TradeRecord::Buy { price, .. }
            | TradeRecord::Sell { price, .. }
            | TradeRecord::Stop { price, .. } => Some(*price),
            TradeRecord::Halt { .. } => None,
        }
    }

    pub fn size(&self) -> Option<f64> {
        match self {
            TradeRecord::Buy { size, .. }
            | TradeRecord::Sell { size, .. }
            | TradeRecord::Stop { size, .. } => Some(*size),
            TradeRecord::Halt { .. } => None,
        }
    }

    /// Realized P&L; only exits carry one.
    pub fn pnl(&self) -> Option<f64> {
        match self {
            TradeRecord::Sell { pnl, .. } | TradeRecord::Stop { pnl, .. } => Some(*pnl),
            _ => None,
        }
    }

    /// True for `Sell` and `Stop`.
    pub fn is_exit(&self) -> bool {
        matches!(self, TradeRecord::Sell { .. } | TradeRecord::Stop { .. })
    }

    pub fn is_halt(&self) -> bool {
        matches!(self, TradeRecord::Halt { .. })
    }
}
