//! No-op provider: always flat.

use super::SignalProvider;
use crate::domain::{Bar, Signal};
use crate::indicators::IndicatorValues;

#[derive(Debug, Clone, Copy, Default)]
pub struct NoOp;

impl SignalProvider for NoOp {
    fn name(&self) -> &str {
        "no_op"
    }

    fn evaluate(&self, _bars: &[Bar], _index: usize, _indicators: &IndicatorValues) -> Signal {
        Signal::Flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn always_flat_even_on_empty_history() {
        assert_eq!(NoOp.generate_signal(&[]), Signal::Flat);
        assert_eq!(NoOp.generate_signal(&make_bars(&[5.0])), Signal::Flat);
    }
}
