//! Trade statistics: pure functions over the ledger's realized exits.
//!
//! Only `Sell` and `Stop` records carry P&L; everything else is ignored. An
//! empty ledger yields a zeroed result rather than a division error.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::domain::{TradeKind, TradeRecord};

/// Aggregate statistics over all exits of one run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TradeStatistics {
    pub total_trades: usize,
    pub win_rate: f64,
    /// Mean P&L of winning exits (pnl > 0), 0 if none.
    pub avg_win: f64,
    /// Mean P&L of losing exits (pnl <= 0), 0 if none.
    pub avg_loss: f64,
    pub expectancy: f64,
    /// Gross profit / gross loss, capped at 100.
    pub profit_factor: f64,
    pub total_pnl: f64,
    pub stop_exits: usize,
    pub regime_exits: usize,
    pub max_consecutive_losses: usize,
}

impl TradeStatistics {
    pub fn from_ledger(ledger: &[TradeRecord]) -> Self {
        let exits: Vec<(TradeKind, f64)> = ledger
            .iter()
            .filter_map(|r| r.pnl().map(|pnl| (r.kind(), pnl)))
            .collect();

        if exits.is_empty() {
            return Self::default();
        }

        let total = exits.len() as f64;
        let wins: Vec<f64> = exits.iter().map(|&(_, p)| p).filter(|&p| p > 0.0).collect();
        let losses: Vec<f64> = exits.iter().map(|&(_, p)| p).filter(|&p| p <= 0.0).collect();

        let win_rate = wins.len() as f64 / total;
        let avg_win = mean(&wins);
        let avg_loss = mean(&losses);

        Self {
            total_trades: exits.len(),
            win_rate,
            avg_win,
            avg_loss,
            expectancy: win_rate * avg_win + (1.0 - win_rate) * avg_loss,
            profit_factor: profit_factor(&wins, &losses),
            total_pnl: exits.iter().map(|&(_, p)| p).sum(),
            stop_exits: exits.iter().filter(|(k, _)| *k == TradeKind::Stop).count(),
            regime_exits: exits.iter().filter(|(k, _)| *k == TradeKind::Sell).count(),
            max_consecutive_losses: max_streak(exits.iter().map(|&(_, p)| p <= 0.0)),
        }
    }
}

/// P&L and trade count for one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearlyPerformance {
    pub year: i32,
    pub total_pnl: f64,
    pub trade_count: usize,
}

/// Group exits by the calendar year of their date, ascending by year.
pub fn yearly_performance(ledger: &[TradeRecord]) -> Vec<YearlyPerformance> {
    let mut by_year: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for record in ledger {
        if let Some(pnl) = record.pnl() {
            let entry = by_year.entry(record.date().year()).or_insert((0.0, 0));
            entry.0 += pnl;
            entry.1 += 1;
        }
    }
    by_year
        .into_iter()
        .map(|(year, (total_pnl, trade_count))| YearlyPerformance {
            year,
            total_pnl,
            trade_count,
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn profit_factor(wins: &[f64], losses: &[f64]) -> f64 {
    let gross_profit: f64 = wins.iter().sum();
    let gross_loss: f64 = losses.iter().map(|l| l.abs()).sum();
    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

fn max_streak(flags: impl Iterator<Item = bool>) -> usize {
    let mut best = 0;
    let mut current = 0;
    for flag in flags {
        current = if flag { current + 1 } else { 0 };
        best = best.max(current);
    }
    best
}
