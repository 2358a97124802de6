//! Buy-and-hold: long from the first bar, never exits.

use super::SignalProvider;
use crate::domain::{Bar, Signal};
use crate::indicators::IndicatorValues;

/// Always Long. Used to validate backtest mechanics.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuyAndHold;

impl SignalProvider for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn evaluate(&self, _bars: &[Bar], _index: usize, _indicators: &IndicatorValues) -> Signal {
        Signal::Long
    }
}
