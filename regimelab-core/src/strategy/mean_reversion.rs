//! Mean reversion: buys sharp dips below the short-term mean, only while the
//! long-term regime is not trending up.

use super::SignalProvider;
use crate::domain::{Bar, Signal};
use crate::indicators::{Atr, Indicator, IndicatorValues, Sma};

/// Mean-reversion entry signal for sideways/down regimes.
///
/// - Flat until SMA(mean), SMA(regime) and ATR are all defined
/// - Flat when close > SMA(regime) (uptrend: stand aside)
/// - Long when close < SMA(mean) - entry_atr * ATR
/// - Flat otherwise, including when ATR is non-positive
#[derive(Debug, Clone)]
pub struct MeanReversion {
    mean: Sma,
    regime: Sma,
    atr: Atr,
    entry_atr: f64,
}

impl MeanReversion {
    pub fn new(mean_window: usize, regime_window: usize, atr_period: usize, entry_atr: f64) -> Self {
        Self {
            mean: Sma::new(mean_window),
            regime: Sma::new(regime_window),
            atr: Atr::new(atr_period),
            entry_atr,
        }
    }
}

impl Default for MeanReversion {
    fn default() -> Self {
        Self::new(20, 200, 14, 1.0)
    }
}

impl SignalProvider for MeanReversion {
    fn name(&self) -> &str {
        "mean_reversion"
    }

    fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![
            Box::new(self.mean.clone()),
            Box::new(self.regime.clone()),
            Box::new(self.atr.clone()),
        ]
    }

    fn evaluate(&self, bars: &[Bar], index: usize, indicators: &IndicatorValues) -> Signal {
        let Some(bar) = bars.get(index) else {
            return Signal::Flat;
        };
        let (Some(mean), Some(regime), Some(atr)) = (
            indicators.valid(self.mean.name(), index),
            indicators.valid(self.regime.name(), index),
            indicators.valid(self.atr.name(), index),
        ) else {
            return Signal::Flat;
        };

        if bar.close > regime || atr <= 0.0 {
            return Signal::Flat;
        }
        if bar.close < mean - self.entry_atr * atr {
            Signal::Long
        } else {
            Signal::Flat
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn flat_until_all_indicators_defined() {
        let bars = make_bars(&[100.0, 99.0, 98.0]);
        assert_eq!(
            MeanReversion::new(2, 5, 2, 1.0).generate_signal(&bars),
            Signal::Flat
        );
    }

    #[test]
    fn long_on_deep_dip_in_downtrend() {
        // Steady decline then a crash: close far below SMA(3) - ATR.
        let bars = make_bars(&[100.0, 100.0, 100.0, 100.0, 60.0]);
        // SMA(5) = 92 > 60 (not an uptrend), SMA(3) = 86.67, ATR(2) = (2 + 42)/2 = 22
        // 60 < 86.67 - 22 = 64.67 -> Long
        assert_eq!(
            MeanReversion::new(3, 5, 2, 1.0).generate_signal(&bars),
            Signal::Long
        );
    }

    #[test]
    fn flat_in_uptrend() {
        let bars = make_bars(&[100.0, 101.0, 102.0, 103.0, 110.0]);
        assert_eq!(
            MeanReversion::new(3, 5, 2, 1.0).generate_signal(&bars),
            Signal::Flat
        );
    }

    #[test]
    fn flat_on_shallow_dip() {
        let bars = make_bars(&[100.0, 100.0, 100.0, 100.0, 99.0]);
        assert_eq!(
            MeanReversion::new(3, 5, 2, 1.0).generate_signal(&bars),
            Signal::Flat
        );
    }
}
