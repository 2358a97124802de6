//! Simulation engine: the bar-by-bar state machine.
//!
//! Per bar, in strict priority order:
//! 1. Peak/drawdown update and kill-switch (terminal `Halted`)
//! 2. Stop-loss check while long (fills at the stop, skips the rest of the bar)
//! 3. Entry while flat on a Long signal (volatility sizing, stop placement)
//! 4. Regime exit while long on a Flat signal
//! 5. Otherwise hold

pub mod config;
pub mod simulation;
pub mod state;

pub use config::{EngineConfig, EngineError, PositionSizing};
pub use simulation::{run_simulation, SimulationEngine};
pub use state::{EngineState, EngineStatus, RunResult};
