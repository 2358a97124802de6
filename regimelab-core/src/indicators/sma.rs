//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices. Lookback: period - 1 (first valid value at
//! index period-1).

use super::rolling::RollingSum;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut window = RollingSum::new(self.period);
        bars.iter()
            .map(|bar| window.push_mean(bar.close).unwrap_or(f64::NAN))
            .collect()
    }
}
