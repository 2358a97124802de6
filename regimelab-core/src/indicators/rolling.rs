//! Incrementally maintained sliding-window sum.

use std::collections::VecDeque;

/// Fixed-width rolling sum with O(1) push/evict.
///
/// Non-finite values are tracked separately: while one sits in the window the
/// window has no valid sum.
#[derive(Debug, Clone)]
pub struct RollingSum {
    window: usize,
    values: VecDeque<f64>,
    sum: f64,
    invalid: usize,
}

impl RollingSum {
    /// # Panics
    ///
    /// Panics if `window` is zero.
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "rolling window must be >= 1");
        Self {
            window,
            values: VecDeque::with_capacity(window + 1),
            sum: 0.0,
            invalid: 0,
        }
    }

    /// Push a value, evicting the oldest once the window is full.
    ///
    /// Returns the window sum once the window is full and every value in it is
    /// finite, otherwise `None`.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        if value.is_finite() {
            self.sum += value;
        } else {
            self.invalid += 1;
        }
        self.values.push_back(value);

        if self.values.len() > self.window {
            if let Some(old) = self.values.pop_front() {
                if old.is_finite() {
                    self.sum -= old;
                } else {
                    self.invalid -= 1;
                }
            }
        }

        if self.invalid == 0 && self.values.len() == self.window {
            Some(self.sum)
        } else {
            None
        }
    }

    /// Mean of the current window, if valid.
    pub fn push_mean(&mut self, value: f64) -> Option<f64> {
        let window = self.window as f64;
        self.push(value).map(|sum| sum / window)
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.window
    }
}
