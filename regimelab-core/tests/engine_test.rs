//! Engine scenarios: sizing, stop placement, priority order, kill-switch.

use chrono::NaiveDate;
use regimelab_core::domain::{Bar, Signal, TradeKind, TradeRecord};
use regimelab_core::engine::{EngineConfig, EngineStatus, PositionSizing, RunResult, SimulationEngine};
use regimelab_core::indicators::{Indicator, IndicatorValues};
use regimelab_core::stats::TradeStatistics;
use regimelab_core::strategy::{BuyAndHold, SignalProvider};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            date: base + chrono::Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000.0,
        })
        .collect()
}

struct FixedVolatility(f64);

impl Indicator for FixedVolatility {
    fn name(&self) -> &str {
        "fixed_volatility"
    }
    fn lookback(&self) -> usize {
        0
    }
    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        vec![self.0; bars.len()]
    }
}

struct Scripted(Vec<Signal>);

impl SignalProvider for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }
    fn evaluate(&self, _bars: &[Bar], index: usize, _iv: &IndicatorValues) -> Signal {
        self.0.get(index).copied().unwrap_or(Signal::Flat)
    }
}

fn run(config: EngineConfig, signals: Vec<Signal>, atr: f64, closes: &[f64]) -> RunResult {
    SimulationEngine::new(config, Box::new(Scripted(signals)))
        .unwrap()
        .with_volatility(Box::new(FixedVolatility(atr)))
        .run(&make_bars(closes))
}

fn kinds(trades: &[TradeRecord]) -> Vec<TradeKind> {
    trades.iter().map(TradeRecord::kind).collect()
}

use Signal::{Flat, Long};

// ── Scenarios ────────────────────────────────────────────────────────

#[test]
fn three_bar_stop_scenario() {
    let result = run(
        EngineConfig::new(100_000.0),
        vec![Flat, Long, Flat],
        2.0,
        &[100.0, 105.0, 95.0],
    );

    assert_eq!(kinds(&result.trades), vec![TradeKind::Buy, TradeKind::Stop]);
    match &result.trades[0] {
        TradeRecord::Buy {
            price, stop, size, ..
        } => {
            assert_eq!(*price, 105.0);
            assert_eq!(*stop, Some(101.0));
            assert_eq!(*size, 250.0);
        }
        other => panic!("expected BUY, got {other:?}"),
    }
    match &result.trades[1] {
        TradeRecord::Stop { price, pnl, .. } => {
            assert_eq!(*price, 101.0);
            assert_eq!(*pnl, (101.0 - 105.0) * 250.0);
        }
        other => panic!("expected STOP, got {other:?}"),
    }
    assert_eq!(result.final_cash, 99_000.0);
    assert_eq!(result.status, EngineStatus::Flat);
}

#[test]
fn position_size_from_risk_budget() {
    // risk 1% of 100_000 = 1_000; stop distance 2 * 2 = 4 -> 250
    let result = run(EngineConfig::new(100_000.0), vec![Long], 2.0, &[50.0]);
    assert_eq!(result.trades[0].size(), Some(250.0));
}

#[test]
fn stop_beats_regime_exit_on_same_bar() {
    // Bar 2 both breaches the stop and carries a Flat signal.
    let result = run(
        EngineConfig::new(10_000.0),
        vec![Long, Long, Flat],
        1.0,
        &[100.0, 100.0, 90.0],
    );
    assert_eq!(kinds(&result.trades), vec![TradeKind::Buy, TradeKind::Stop]);
}

#[test]
fn stop_exit_skips_fresh_entry_on_same_bar() {
    let result = run(
        EngineConfig::new(10_000.0),
        vec![Long, Long, Long, Long],
        1.0,
        &[100.0, 90.0, 95.0, 96.0],
    );
    // Stop at bar 1; re-entry only on bar 2.
    assert_eq!(
        kinds(&result.trades),
        vec![TradeKind::Buy, TradeKind::Stop, TradeKind::Buy]
    );
    let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    assert_eq!(result.trades[2].date(), base + chrono::Duration::days(2));
    assert_eq!(result.status, EngineStatus::Long);
}

#[test]
fn stop_fill_ignores_slippage_but_charges_cost() {
    let config = EngineConfig::new(10_000.0).with_costs(5.0, 0.5);
    let result = run(config, vec![Long, Long], 1.0, &[100.0, 90.0]);
    // entry 100.5, stop 98.5, size 100 / 2 = 50
    let buy = &result.trades[0];
    assert_eq!(buy.price(), Some(100.5));
    assert_eq!(buy.size(), Some(50.0));
    let stop = &result.trades[1];
    assert_eq!(stop.price(), Some(98.5));
    assert_eq!(stop.pnl(), Some((98.5 - 100.5) * 50.0 - 5.0));
}

#[test]
fn regime_exit_realizes_pnl() {
    let config = EngineConfig::new(10_000.0);
    let result = run(config, vec![Long, Long, Flat], 1.0, &[100.0, 105.0, 110.0]);
    assert_eq!(kinds(&result.trades), vec![TradeKind::Buy, TradeKind::Sell]);
    // size = 100 / 2 = 50, pnl = 10 * 50
    assert_eq!(result.trades[1].pnl(), Some(500.0));
    assert_eq!(result.final_cash, 10_500.0);
}

#[test]
fn drawdown_breach_halts_and_ledger_is_terminal() {
    let mut config = EngineConfig::fixed_units(1_000.0).with_risk(0.01, 0.2);
    config.sizing = PositionSizing::FixedUnits { units: 10.0 };
    let signals = vec![Long, Long, Flat, Long, Long, Flat, Long];
    let result = run(
        config,
        signals,
        1.0,
        &[100.0, 100.0, 70.0, 70.0, 80.0, 90.0, 95.0],
    );

    // Bar 2 realizes -300 (cash 700); bar 3 sees a 30% drawdown and halts.
    assert_eq!(
        kinds(&result.trades),
        vec![TradeKind::Buy, TradeKind::Sell, TradeKind::Halt]
    );
    assert!(result.trades.last().unwrap().is_halt());
    assert_eq!(result.bars_processed, 4);
    assert!(result.is_halted());
    assert_eq!(result.final_cash, 700.0);
}

#[test]
fn drawdown_exactly_at_limit_halts() {
    let mut config = EngineConfig::fixed_units(1_000.0).with_risk(0.01, 0.2);
    config.sizing = PositionSizing::FixedUnits { units: 10.0 };
    let result = run(config, vec![Long, Long, Flat, Long], 1.0, &[100.0, 100.0, 80.0, 80.0]);

    // Cash 800 against a 1000 peak is a 20% drawdown: the limit is inclusive.
    assert_eq!(
        kinds(&result.trades),
        vec![TradeKind::Buy, TradeKind::Sell, TradeKind::Halt]
    );
    assert_eq!(result.final_cash, 800.0);
    assert_eq!(result.bars_processed, 4);
}

#[test]
fn kill_switch_can_be_disabled() {
    let mut config = EngineConfig::fixed_units(1_000.0);
    config.sizing = PositionSizing::FixedUnits { units: 10.0 };
    config.kill_switch = false;
    let result = run(config, vec![Long, Long, Flat, Long], 1.0, &[100.0, 100.0, 70.0, 70.0]);
    assert!(!result.trades.iter().any(TradeRecord::is_halt));
    assert_eq!(result.bars_processed, 4);
}

#[test]
fn unrealized_loss_never_trips_kill_switch() {
    // Price collapses while long with no stop: cash is untouched, no halt.
    let mut config = EngineConfig::fixed_units(1_000.0);
    config.sizing = PositionSizing::FixedUnits { units: 10.0 };
    let result = run(config, vec![Long; 4], 1.0, &[100.0, 60.0, 30.0, 10.0]);
    assert_eq!(kinds(&result.trades), vec![TradeKind::Buy]);
    assert_eq!(result.status, EngineStatus::Long);
    assert_eq!(result.final_cash, 1_000.0);
}

#[test]
fn equity_curve_and_stats_from_run() {
    let bars = make_bars(&[100.0, 105.0, 95.0, 96.0]);
    let result = SimulationEngine::new(
        EngineConfig::new(100_000.0),
        Box::new(Scripted(vec![Flat, Long, Flat, Flat])),
    )
    .unwrap()
    .with_volatility(Box::new(FixedVolatility(2.0)))
    .run(&bars);

    let curve = result.equity_curve(&bars);
    assert_eq!(curve.values(), vec![100_000.0, 100_000.0, 99_000.0, 99_000.0]);
    assert_eq!(curve.max_drawdown(), -1_000.0);

    let stats = TradeStatistics::from_ledger(&result.trades);
    assert_eq!(stats.total_trades, 1);
    assert_eq!(stats.stop_exits, 1);
    assert_eq!(stats.regime_exits, 0);
    assert_eq!(stats.win_rate, 0.0);
}

#[test]
fn zero_trade_run_has_single_point_curve() {
    let bars = make_bars(&[100.0, 101.0]);
    let result = run(EngineConfig::new(5_000.0), vec![Flat, Flat], 1.0, &[100.0, 101.0]);
    let curve = result.equity_curve(&bars);
    assert_eq!(curve.len(), 1);
    assert_eq!(curve.final_equity(), Some(5_000.0));
}

#[test]
fn buy_and_hold_with_real_atr_waits_for_warmup() {
    let bars = make_bars(&[100.0, 101.0, 102.0, 103.0]);
    let config = EngineConfig::new(10_000.0).with_atr(3, 2.0);
    let result = SimulationEngine::new(config, Box::new(BuyAndHold))
        .unwrap()
        .run(&bars);
    // ATR(3) first valid at index 2.
    assert_eq!(result.trades.len(), 1);
    assert_eq!(result.trades[0].date(), bars[2].date);
}
