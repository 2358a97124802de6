//! Portfolio aggregation: merges independent equity curves onto one date axis.
//!
//! Works only on finished, immutable curves; there is no link back to the
//! engines that produced them.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::equity::{max_drawdown, EquityCurve, EquityPoint};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortfolioError {
    #[error("equity curve '{0}' is already part of the portfolio")]
    DuplicateCurve(String),
}

/// Named equity curves waiting to be combined.
///
/// Curves are kept in name order, so the combined result does not depend on
/// insertion order and merging is commutative.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioAggregator {
    curves: BTreeMap<String, EquityCurve>,
}

impl PortfolioAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        curve: EquityCurve,
    ) -> Result<(), PortfolioError> {
        let name = name.into();
        if self.curves.contains_key(&name) {
            return Err(PortfolioError::DuplicateCurve(name));
        }
        self.curves.insert(name, curve);
        Ok(())
    }

    /// Union of two aggregators. Fails if a name appears in both.
    pub fn merge(mut self, other: PortfolioAggregator) -> Result<Self, PortfolioError> {
        for (name, curve) in other.curves {
            self.insert(name, curve)?;
        }
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn combine(&self) -> PortfolioCurve {
        combine_equity_curves(&self.curves)
    }
}

/// One row of the combined portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRow {
    /// `None` only when no curve carries a dated point.
    pub date: Option<NaiveDate>,
    /// Forward-filled equity per strategy; `None` before its first observation.
    pub equities: BTreeMap<String, Option<f64>>,
    /// Sum of the strategies that have a value on this date.
    pub portfolio_equity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioCurve {
    pub strategies: Vec<String>,
    pub rows: Vec<PortfolioRow>,
}

impl PortfolioCurve {
    pub fn portfolio_equity(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.portfolio_equity).collect()
    }

    pub fn final_equity(&self) -> Option<f64> {
        self.rows.last().map(|r| r.portfolio_equity)
    }

    pub fn max_drawdown(&self) -> f64 {
        max_drawdown(&self.portfolio_equity())
    }

    /// The `portfolio_equity` column as a plain equity curve.
    pub fn to_equity_curve(&self) -> EquityCurve {
        EquityCurve::from_points(
            self.rows
                .iter()
                .map(|r| EquityPoint {
                    date: r.date,
                    equity: r.portfolio_equity,
                })
                .collect(),
        )
    }
}

/// Per-curve lookup: the undated baseline (if any) plus dated observations.
struct Observations {
    baseline: Option<f64>,
    dated: BTreeMap<NaiveDate, f64>,
}

impl Observations {
    fn from_curve(curve: &EquityCurve) -> Self {
        let mut baseline = None;
        let mut dated = BTreeMap::new();
        for point in curve.points() {
            match point.date {
                Some(date) => {
                    dated.insert(date, point.equity);
                }
                None => baseline = Some(point.equity),
            }
        }
        Self { baseline, dated }
    }

    /// Last known value at or before `date`; never back-filled.
    fn value_at(&self, date: NaiveDate) -> Option<f64> {
        self.dated
            .range(..=date)
            .next_back()
            .map(|(_, &v)| v)
            .or(self.baseline)
    }
}

/// Merge curves onto the sorted, deduplicated union of their dates.
///
/// Each curve is forward-filled across dates it does not observe and left
/// empty before its first observation. An undated point (a run without
/// trades) counts as known from the start. `portfolio_equity` sums the
/// available values in strategy-name order.
pub fn combine_equity_curves(curves: &BTreeMap<String, EquityCurve>) -> PortfolioCurve {
    let strategies: Vec<String> = curves.keys().cloned().collect();
    let observations: Vec<(&String, Observations)> = curves
        .iter()
        .map(|(name, curve)| (name, Observations::from_curve(curve)))
        .collect();

    let axis: BTreeSet<NaiveDate> = observations
        .iter()
        .flat_map(|(_, obs)| obs.dated.keys().copied())
        .collect();

    let row = |date: Option<NaiveDate>| {
        let equities: BTreeMap<String, Option<f64>> = observations
            .iter()
            .map(|(name, obs)| {
                let value = match date {
                    Some(d) => obs.value_at(d),
                    None => obs.baseline,
                };
                ((*name).clone(), value)
            })
            .collect();
        let portfolio_equity = equities.values().flatten().sum();
        PortfolioRow {
            date,
            equities,
            portfolio_equity,
        }
    };

    let rows = if axis.is_empty() {
        if curves.is_empty() {
            Vec::new()
        } else {
            vec![row(None)]
        }
    } else {
        axis.into_iter().map(|d| row(Some(d))).collect()
    };

    PortfolioCurve { strategies, rows }
}
