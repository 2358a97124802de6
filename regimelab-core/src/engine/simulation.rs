//! The bar loop.

use tracing::{debug, info, trace};

use crate::domain::{Bar, OpenPosition, Position, Signal, TradeRecord};
use crate::indicators::{precompute_indicators, Atr, Indicator};
use crate::strategy::SignalProvider;

use super::config::{EngineConfig, EngineError, PositionSizing};
use super::state::{EngineState, RunResult};

/// One engine instance processes one bar stream once (`run` consumes it).
pub struct SimulationEngine {
    config: EngineConfig,
    provider: Box<dyn SignalProvider>,
    volatility: Box<dyn Indicator>,
}

impl SimulationEngine {
    /// Validate `config` and build an engine using ATR(`atr_period`) as the
    /// volatility measure.
    pub fn new(
        config: EngineConfig,
        provider: Box<dyn SignalProvider>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let volatility = Box::new(Atr::new(config.atr_period));
        Ok(Self {
            config,
            provider,
            volatility,
        })
    }

    /// Replace the volatility indicator used for sizing and stop placement.
    pub fn with_volatility(mut self, indicator: Box<dyn Indicator>) -> Self {
        self.volatility = indicator;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replay `bars` through the state machine.
    ///
    /// Indicators are precomputed once over the full series; since every
    /// indicator value at index i depends only on bars up to i, this is
    /// equivalent to recomputing over the growing prefix on each bar.
    pub fn run(self, bars: &[Bar]) -> RunResult {
        let config = &self.config;
        let signal_values = precompute_indicators(&self.provider.indicators(), bars);
        let volatility = if config.needs_volatility() {
            self.volatility.compute(bars)
        } else {
            Vec::new()
        };

        let mut state = EngineState::new(config.initial_capital);
        let mut trades: Vec<TradeRecord> = Vec::new();
        let mut bars_processed = 0;

        for (i, bar) in bars.iter().enumerate() {
            bars_processed = i + 1;

            // ─── 1. Peak / drawdown kill-switch ───
            let drawdown = state.update_drawdown();
            if config.kill_switch && drawdown <= -config.max_drawdown {
                info!(
                    date = %bar.date,
                    cash = state.cash,
                    peak = state.peak_cash,
                    drawdown,
                    "kill-switch fired, halting run"
                );
                trades.push(TradeRecord::Halt {
                    date: bar.date,
                    reason: format!(
                        "max drawdown breached: {:.2}% (limit {:.2}%)",
                        drawdown * 100.0,
                        config.max_drawdown * 100.0
                    ),
                    cash: state.cash,
                });
                state.halted = true;
                break;
            }

            // ─── 2. Stop-loss ───
            if let Position::Long(pos) = state.position {
                if let Some(stop) = pos.stop_price.filter(|_| pos.stop_breached(bar.close)) {
                    // A stop order fills at its trigger: no slippage.
                    let pnl = pos.gross_pnl(stop) - config.transaction_cost;
                    state.cash += pnl;
                    state.position = Position::Flat;
                    debug!(date = %bar.date, price = stop, size = pos.size, pnl, "stop-loss exit");
                    trades.push(TradeRecord::Stop {
                        date: bar.date,
                        price: stop,
                        size: pos.size,
                        pnl,
                        cash: state.cash,
                    });
                    continue;
                }
            }

            let signal = self.provider.evaluate(bars, i, &signal_values);

            match (state.position, signal) {
                // ─── 3. Entry ───
                (Position::Flat, Signal::Long) => {
                    let atr = volatility.get(i).copied().unwrap_or(f64::NAN);
                    let Some(pos) = self.size_entry(bar, atr, state.cash) else {
                        trace!(date = %bar.date, atr, "entry suppressed");
                        continue;
                    };
                    state.cash -= config.transaction_cost;
                    state.position = Position::Long(pos);
                    debug!(
                        date = %bar.date,
                        price = pos.entry_price,
                        size = pos.size,
                        stop = ?pos.stop_price,
                        "entry"
                    );
                    trades.push(TradeRecord::Buy {
                        date: bar.date,
                        price: pos.entry_price,
                        size: pos.size,
                        stop: pos.stop_price,
                        cash: state.cash,
                    });
                }
                // ─── 4. Regime exit ───
                (Position::Long(pos), Signal::Flat) => {
                    let price = bar.close - config.slippage;
                    if price <= 0.0 {
                        trace!(date = %bar.date, price, "exit suppressed: non-positive price");
                        continue;
                    }
                    let pnl = pos.gross_pnl(price) - config.transaction_cost;
                    state.cash += pnl;
                    state.position = Position::Flat;
                    debug!(date = %bar.date, price, size = pos.size, pnl, "regime exit");
                    trades.push(TradeRecord::Sell {
                        date: bar.date,
                        price,
                        size: pos.size,
                        pnl,
                        cash: state.cash,
                    });
                }
                // ─── 5. Hold ───
                _ => {}
            }
        }

        info!(
            provider = self.provider.name(),
            bars = bars_processed,
            records = trades.len(),
            final_cash = state.cash,
            halted = state.halted,
            "run complete"
        );

        RunResult {
            trades,
            initial_capital: config.initial_capital,
            final_cash: state.cash,
            peak_cash: state.peak_cash,
            bars_processed,
            status: state.status(),
            open_position: state.position.open().copied(),
        }
    }

    /// Size a new long position, or `None` if this bar cannot support an entry
    /// (invalid volatility, non-positive price, stop distance or size).
    fn size_entry(&self, bar: &Bar, atr: f64, cash: f64) -> Option<OpenPosition> {
        let config = &self.config;
        let entry_price = bar.close + config.slippage;
        if !(entry_price > 0.0) {
            return None;
        }

        let stop_distance = if config.needs_volatility() {
            if !(atr.is_finite() && atr > 0.0) {
                return None;
            }
            let distance = config.atr_multiplier * atr;
            if distance <= 0.0 {
                return None;
            }
            Some(distance)
        } else {
            None
        };

        let risk_amount = cash * config.risk_per_trade;
        let size = match config.sizing {
            PositionSizing::AtrRisk => risk_amount / stop_distance?,
            PositionSizing::FixedUnits { units } => units,
            PositionSizing::CashFraction => risk_amount / entry_price,
        };
        if !(size.is_finite() && size > 0.0) {
            return None;
        }

        let stop_price = if config.stop_loss {
            stop_distance.map(|distance| entry_price - distance)
        } else {
            None
        };

        Some(OpenPosition {
            entry_date: bar.date,
            entry_price,
            size,
            stop_price,
        })
    }
}

/// Validate `config`, then run `provider` over `bars` with ATR volatility.
pub fn run_simulation(
    bars: &[Bar],
    config: EngineConfig,
    provider: Box<dyn SignalProvider>,
) -> Result<RunResult, EngineError> {
    Ok(SimulationEngine::new(config, provider)?.run(bars))
}
