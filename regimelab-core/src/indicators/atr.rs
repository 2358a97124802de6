//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|); the first
//! bar has no previous close and uses high-low alone.
//! ATR is the simple moving average of True Range over `period` bars, so the
//! first valid value sits at index period-1.

use super::rolling::RollingSum;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// True Range series. TR[0] = high[0] - low[0].
///
/// A non-finite input yields NaN for that position (`f64::max` would
/// otherwise silently drop it).
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut prev_close: Option<f64> = None;
    bars.iter()
        .map(|bar| {
            let inputs_valid = bar.high.is_finite()
                && bar.low.is_finite()
                && prev_close.map_or(true, f64::is_finite);
            if !inputs_valid {
                prev_close = Some(bar.close);
                return f64::NAN;
            }
            let high_low = bar.high - bar.low;
            let tr = match prev_close {
                Some(pc) => high_low
                    .max((bar.high - pc).abs())
                    .max((bar.low - pc).abs()),
                None => high_low,
            };
            prev_close = Some(bar.close);
            tr
        })
        .collect()
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut window = RollingSum::new(self.period);
        true_range(bars)
            .into_iter()
            .map(|tr| window.push_mean(tr).unwrap_or(f64::NAN))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};
    use chrono::NaiveDate;

    fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
        let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        data.iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn true_range_basic() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),  // TR = 10
            (102.0, 108.0, 100.0, 106.0), // TR = max(8, 6, 2) = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = max(9, 1, 8) = 9
        ]);
        let tr = true_range(&bars);
        assert_approx(tr[0], 10.0, DEFAULT_EPSILON);
        assert_approx(tr[1], 8.0, DEFAULT_EPSILON);
        assert_approx(tr[2], 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bars = make_ohlc_bars(&[
            (98.0, 102.0, 97.0, 100.0),
            (110.0, 115.0, 108.0, 112.0), // TR = max(7, 15, 8) = 15
        ]);
        assert_approx(true_range(&bars)[1], 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_period_3_is_simple_mean_of_tr() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),  // TR = 10
            (102.0, 108.0, 100.0, 106.0), // TR = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = 9
            (99.0, 103.0, 97.0, 101.0),   // TR = 6
        ]);
        let result = Atr::new(3).compute(&bars);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 27.0 / 3.0, DEFAULT_EPSILON);
        assert_approx(result[3], 23.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_nan_input_invalidates_window() {
        let mut bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0),
            (106.0, 107.0, 98.0, 99.0),
        ]);
        bars[1].high = f64::NAN;
        let result = Atr::new(2).compute(&bars);
        assert!(result[1].is_nan());
        assert!(result[2].is_nan());
    }

    #[test]
    fn atr_lookback() {
        assert_eq!(Atr::new(14).lookback(), 13);
    }

    #[test]
    #[should_panic(expected = "ATR period must be >= 1")]
    fn atr_zero_period_panics() {
        let _ = Atr::new(0);
    }
}
