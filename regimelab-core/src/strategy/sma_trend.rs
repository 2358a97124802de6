//! SMA trend: long above the long-term moving average, flat below it.

use super::SignalProvider;
use crate::domain::{Bar, Signal};
use crate::indicators::{Indicator, IndicatorValues, Sma};

/// Trend-following regime signal.
///
/// Long when close > SMA(window); Flat when close <= SMA(window) or while the
/// SMA is still warming up.
#[derive(Debug, Clone)]
pub struct SmaTrend {
    sma: Sma,
}

impl SmaTrend {
    pub fn new(window: usize) -> Self {
        Self {
            sma: Sma::new(window),
        }
    }

    pub fn window(&self) -> usize {
        self.sma.period()
    }
}

impl Default for SmaTrend {
    fn default() -> Self {
        Self::new(200)
    }
}

impl SignalProvider for SmaTrend {
    fn name(&self) -> &str {
        "sma_trend"
    }

    fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![Box::new(self.sma.clone())]
    }

    fn evaluate(&self, bars: &[Bar], index: usize, indicators: &IndicatorValues) -> Signal {
        let Some(bar) = bars.get(index) else {
            return Signal::Flat;
        };
        match indicators.valid(self.sma.name(), index) {
            Some(sma) if bar.close > sma => Signal::Long,
            _ => Signal::Flat,
        }
    }
}
