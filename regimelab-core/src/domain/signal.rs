//! Signal: directional intent produced fresh on every bar.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Trading signal emitted by a `SignalProvider`.
///
/// The engine is long-only: `Short` is representable so providers can express
/// it, but the engine treats it like "no instruction" (hold).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    Long,
    Flat,
    Short,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("signal direction must be -1, 0, or 1 (got {0})")]
    InvalidDirection(i64),
}

impl Signal {
    /// Integer direction: +1 long, 0 flat, -1 short.
    pub fn direction(self) -> i8 {
        match self {
            Signal::Long => 1,
            Signal::Flat => 0,
            Signal::Short => -1,
        }
    }
}

impl TryFrom<i64> for Signal {
    type Error = SignalError;

    fn try_from(direction: i64) -> Result<Self, Self::Error> {
        match direction {
            1 => Ok(Signal::Long),
            0 => Ok(Signal::Flat),
            -1 => Ok(Signal::Short),
            other => Err(SignalError::InvalidDirection(other)),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Long => write!(f, "LONG"),
            Signal::Flat => write!(f, "FLAT"),
            Signal::Short => write!(f, "SHORT"),
        }
    }
}
