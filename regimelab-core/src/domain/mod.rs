//! Domain types for RegimeLab.

pub mod bar;
pub mod position;
pub mod signal;
pub mod trade;

pub use bar::Bar;
pub use position::{OpenPosition, Position};
pub use signal::{Signal, SignalError};
pub use trade::{TradeKind, TradeRecord};
