//! Equity curve construction and drawdown: pure functions over a finished ledger.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Bar, TradeRecord};

/// One point of an equity curve.
///
/// `date` is `None` only for the placeholder point of a run without trades.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: Option<NaiveDate>,
    pub equity: f64,
}

/// Ordered `(date, equity)` series, one point per processed bar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquityCurve {
    points: Vec<EquityPoint>,
}

impl EquityCurve {
    /// Wrap points that are already in ascending date order.
    pub fn from_points(points: Vec<EquityPoint>) -> Self {
        Self { points }
    }

    /// Single undated point at `equity`.
    pub fn flat(equity: f64) -> Self {
        Self {
            points: vec![EquityPoint { date: None, equity }],
        }
    }

    pub fn points(&self) -> &[EquityPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.equity).collect()
    }

    pub fn final_equity(&self) -> Option<f64> {
        self.points.last().map(|p| p.equity)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Absolute maximum drawdown of this curve (<= 0).
    pub fn max_drawdown(&self) -> f64 {
        max_drawdown(&self.values())
    }
}

/// Build an equity curve from the processed bars and the run's ledger.
///
/// Equity starts at `initial_capital` and only moves when a `Sell` or `Stop`
/// cash snapshot is observed; entries and quiet bars carry the previous value
/// forward. The curve ends at the bar carrying a `Halt` record.
///
/// An empty ledger (or no bars) yields a single undated point at
/// `initial_capital`, never an empty curve.
pub fn build_equity_curve(bars: &[Bar], ledger: &[TradeRecord], initial_capital: f64) -> EquityCurve {
    if ledger.is_empty() || bars.is_empty() {
        return EquityCurve::flat(initial_capital);
    }

    let mut equity = initial_capital;
    let mut records = ledger.iter().peekable();
    let mut points = Vec::with_capacity(bars.len());

    for bar in bars {
        let mut halted = false;
        while let Some(record) = records.next_if(|r| r.date() <= bar.date) {
            if record.is_exit() {
                equity = record.cash();
            }
            halted |= record.is_halt();
        }
        points.push(EquityPoint {
            date: Some(bar.date),
            equity,
        });
        if halted {
            break;
        }
    }

    EquityCurve::from_points(points)
}

/// Maximum peak-to-trough drawdown in absolute terms:
/// `min(equity[t] - max(equity[0..=t]))`.
///
/// Always <= 0; exactly 0 iff the series never decreases. Empty input gives 0.
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &value in equity {
        peak = peak.max(value);
        worst = worst.min(value - peak);
    }
    worst
}

/// Maximum drawdown as a negative fraction of the running peak
/// (e.g., -0.15 = 15% drawdown). Peaks <= 0 are skipped.
pub fn max_drawdown_pct(equity: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &value in equity {
        peak = peak.max(value);
        if peak > 0.0 {
            worst = worst.min((value - peak) / peak);
        }
    }
    worst
}
