//! Indicators: pure functions from bar history to a numeric series.
//!
//! Indicators are computed once over the full bar series before the bar loop
//! and queried by index during the loop. Each implementation maintains rolling
//! aggregates, so a full pass is O(n) rather than recomputing the window on
//! every bar.

pub mod atr;
pub mod rolling;
pub mod sma;

pub use atr::{true_range, Atr};
pub use rolling::RollingSum;
pub use sma::Sma;

use crate::domain::Bar;
use std::collections::HashMap;

/// Trait for indicators.
///
/// `compute` returns a series of the same length as `bars`; positions where
/// the indicator is not yet defined hold `f64::NAN` (the "invalid" marker).
///
/// # Look-ahead guard
/// The value at index t may depend only on `bars[0..=t]`. Computing over a
/// truncated series must reproduce the prefix of the full-series output.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_200", "atr_14").
    fn name(&self) -> &str;

    /// Number of leading bars that are `NaN`.
    fn lookback(&self) -> usize;

    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Container for precomputed indicator values, keyed by indicator name.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Value at `bar_index`, or `None` if the series or index is missing.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
    }

    /// Value at `bar_index` only if it is a finite number.
    pub fn valid(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.get(name, bar_index).filter(|v| v.is_finite())
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Compute every indicator over `bars`. Duplicate names are computed once.
pub fn precompute_indicators(indicators: &[Box<dyn Indicator>], bars: &[Bar]) -> IndicatorValues {
    let mut values = IndicatorValues::new();
    for indicator in indicators {
        if values.series.contains_key(indicator.name()) {
            continue;
        }
        values.insert(indicator.name(), indicator.compute(bars));
    }
    values
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for the first bar), high = max(open, close) + 1,
/// low = min(open, close) - 1, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
