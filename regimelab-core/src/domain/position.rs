//! Position: engine-internal long/flat state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An open long position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    /// Always > 0.
    pub size: f64,
    /// Protective stop, `None` when stops are disabled.
    pub stop_price: Option<f64>,
}

impl OpenPosition {
    /// P&L of closing the whole position at `price`, before costs.
    pub fn gross_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.size
    }

    /// True if `price` is at or below the recorded stop.
    pub fn stop_breached(&self, price: f64) -> bool {
        self.stop_price.is_some_and(|stop| price <= stop)
    }
}

/// At most one position is ever open; the state machine enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Position {
    #[default]
    Flat,
    Long(OpenPosition),
}

impl Position {
    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }

    pub fn open(&self) -> Option<&OpenPosition> {
        match self {
            Position::Flat => None,
            Position::Long(pos) => Some(pos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long(stop: Option<f64>) -> OpenPosition {
        OpenPosition {
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            entry_price: 100.0,
            size: 10.0,
            stop_price: stop,
        }
    }

    #[test]
    fn stop_breach_is_inclusive() {
        let pos = long(Some(95.0));
        assert!(pos.stop_breached(95.0));
        assert!(pos.stop_breached(90.0));
        assert!(!pos.stop_breached(95.01));
    }

    #[test]
    fn no_stop_never_breaches() {
        assert!(!long(None).stop_breached(0.0));
    }

    #[test]
    fn gross_pnl_scales_with_size() {
        assert_eq!(long(None).gross_pnl(110.0), 100.0);
        assert_eq!(long(None).gross_pnl(95.0), -50.0);
    }

    #[test]
    fn default_is_flat() {
        assert!(Position::default().is_flat());
        assert!(Position::Long(long(None)).open().is_some());
    }
}
