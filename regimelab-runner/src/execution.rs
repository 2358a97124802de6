//! Execution signals: what to do on the next session, derived from a finished run.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use regimelab_core::domain::{Bar, TradeRecord};
use regimelab_core::engine::RunResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
        })
    }
}

/// One line of an order ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSignal {
    pub date: NaiveDate,
    pub strategy: String,
    pub action: Action,
    pub instrument: String,
    pub quantity: f64,
    pub price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub reason: String,
}

/// Derive the actionable signal for the last bar of a run.
///
/// - last ledger record dated on the last bar: BUY, or SELL for SELL/STOP
/// - ledger ends in HALT: SELL the open position if any, else HOLD
/// - otherwise HOLD the open position (size and stop), or HOLD zero when flat
///
/// Returns `None` when there are no bars.
pub fn derive_execution_signal(
    strategy: &str,
    instrument: &str,
    result: &RunResult,
    bars: &[Bar],
) -> Option<ExecutionSignal> {
    let last_bar = bars.last()?;
    let signal = |action, quantity, price, stop_loss, reason: &str| ExecutionSignal {
        date: last_bar.date,
        strategy: strategy.to_string(),
        action,
        instrument: instrument.to_string(),
        quantity,
        price,
        stop_loss,
        reason: reason.to_string(),
    };

    match result.trades.last() {
        Some(TradeRecord::Halt { reason, .. }) => {
            let reason = format!("kill-switch: {reason}");
            return Some(match result.open_position {
                Some(pos) => signal(Action::Sell, pos.size, Some(last_bar.close), None, &reason),
                None => signal(Action::Hold, 0.0, None, None, &reason),
            });
        }
        Some(record) if record.date() == last_bar.date => match record {
            TradeRecord::Buy {
                price, size, stop, ..
            } => return Some(signal(Action::Buy, *size, Some(*price), *stop, "entry signal")),
            TradeRecord::Sell { price, size, .. } => {
                return Some(signal(Action::Sell, *size, Some(*price), None, "regime exit"))
            }
            TradeRecord::Stop { price, size, .. } => {
                return Some(signal(Action::Sell, *size, Some(*price), None, "stop-loss"))
            }
            TradeRecord::Halt { .. } => {}
        },
        _ => {}
    }

    Some(match result.open_position {
        Some(pos) => signal(
            Action::Hold,
            pos.size,
            Some(last_bar.close),
            pos.stop_price,
            "position open",
        ),
        None => signal(Action::Hold, 0.0, None, None, "no position"),
    })
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write signals as CSV. Empty input writes nothing and creates no file.
pub fn write_order_ticket(signals: &[ExecutionSignal], path: &Path) -> Result<()> {
    if signals.is_empty() {
        return Ok(());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create order ticket {}", path.display()))?;
    wtr.write_record([
        "date",
        "strategy",
        "action",
        "instrument",
        "quantity",
        "price",
        "stop_loss",
        "reason",
    ])?;

    for s in signals {
        let quantity = (s.quantity * 100.0).round() / 100.0;
        wtr.write_record([
            s.date.to_string(),
            s.strategy.clone(),
            s.action.to_string(),
            s.instrument.clone(),
            quantity.to_string(),
            optional(s.price),
            optional(s.stop_loss),
            s.reason.clone(),
        ])?;
    }

    wtr.flush()
        .with_context(|| format!("failed to flush order ticket {}", path.display()))?;
    Ok(())
}
