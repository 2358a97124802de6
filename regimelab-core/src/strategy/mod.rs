//! Signal providers: the one capability the engine consumes from a strategy.
//!
//! Providers are engine-agnostic: they see bar history and precomputed
//! indicator values, never cash, position or ledger state. Parameters are
//! fixed at construction.

pub mod buy_and_hold;
pub mod mean_reversion;
pub mod no_op;
pub mod sma_trend;

pub use buy_and_hold::BuyAndHold;
pub use mean_reversion::MeanReversion;
pub use no_op::NoOp;
pub use sma_trend::SmaTrend;

use crate::domain::{Bar, Signal};
use crate::indicators::{precompute_indicators, Indicator, IndicatorValues};

/// Trait for signal providers.
///
/// # No look-ahead
/// `evaluate` at `index` must only read `bars[0..=index]` and indicator values
/// at positions `<= index`. Because indicators obey the same rule, the signal
/// at bar i is unchanged when later bars are altered or removed.
pub trait SignalProvider: Send + Sync {
    /// Human-readable name (e.g., "sma_trend").
    fn name(&self) -> &str;

    /// Indicators this provider reads. The engine precomputes them once.
    fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        Vec::new()
    }

    /// Signal for the bar at `index`.
    fn evaluate(&self, bars: &[Bar], index: usize, indicators: &IndicatorValues) -> Signal;

    /// Signal for the last bar of a growing prefix.
    ///
    /// Recomputes indicators over the whole prefix; the engine uses
    /// `evaluate` over precomputed values instead, which yields the same signal.
    fn generate_signal(&self, bars_so_far: &[Bar]) -> Signal {
        let Some(last) = bars_so_far.len().checked_sub(1) else {
            return Signal::Flat;
        };
        let values = precompute_indicators(&self.indicators(), bars_so_far);
        self.evaluate(bars_so_far, last, &values)
    }
}
