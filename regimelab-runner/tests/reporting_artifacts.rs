//! Artifact bundle and order ticket round-trips on disk.

use chrono::NaiveDate;
use regimelab_core::engine::EngineConfig;
use regimelab_runner::config::{SignalConfig, StrategySpec};
use regimelab_runner::execution::{Action, ExecutionSignal};
use regimelab_runner::export::{export_json, import_json};
use regimelab_runner::{
    generate_synthetic_bars, load_artifacts, run_strategies, save_artifacts, save_portfolio,
    write_order_ticket, BacktestReport, ReportContext,
};

fn reports() -> (Vec<BacktestReport>, regimelab_core::portfolio::PortfolioCurve) {
    let bars = generate_synthetic_bars(NaiveDate::from_ymd_opt(2022, 1, 3).unwrap(), 300, 11);
    let specs = vec![
        StrategySpec::new(
            "trend",
            SignalConfig::SmaTrend { window: 50 },
            EngineConfig::new(60_000.0).with_costs(10.0, 0.5),
        ),
        StrategySpec::new(
            "hold",
            SignalConfig::BuyAndHold,
            EngineConfig::new(40_000.0),
        ),
    ];
    let multi = run_strategies(&bars, &specs).unwrap();
    let ctx = ReportContext {
        instrument: "SYNTH".into(),
        config_fingerprint: "0123456789abcdef".into(),
        dataset_hash: regimelab_runner::dataset_hash(&bars),
        has_synthetic: true,
    };
    let reports = multi
        .runs
        .iter()
        .map(|run| BacktestReport::new(run, &bars, &ctx))
        .collect();
    (reports, multi.portfolio)
}

#[test]
fn save_artifacts_writes_full_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let (reports, _) = reports();

    let run_dir = save_artifacts(&reports[0], dir.path()).unwrap();
    assert_eq!(run_dir, dir.path().join("trend_0123456789ab"));
    for file in ["manifest.json", "trades.csv", "equity.csv", "report.md"] {
        assert!(run_dir.join(file).exists(), "{file} missing");
    }

    let loaded = load_artifacts(&run_dir).unwrap();
    assert_eq!(loaded.strategy, reports[0].strategy);
    assert_eq!(loaded.trades.len(), reports[0].trades.len());
    assert_eq!(loaded.equity.len(), reports[0].equity.len());
    assert_eq!(loaded.stats.total_trades, reports[0].stats.total_trades);

    let md = std::fs::read_to_string(run_dir.join("report.md")).unwrap();
    assert!(md.contains("# Backtest Report: trend"));
    assert!(md.contains("**SYNTHETIC**"));
}

#[test]
fn newer_schema_is_rejected() {
    let (reports, _) = reports();
    let json = export_json(&reports[1]).unwrap();
    let bumped = json.replacen("\"schema_version\": 1", "\"schema_version\": 99", 1);
    assert!(import_json(&bumped).is_err());
    assert!(import_json(&json).is_ok());
}

#[test]
fn portfolio_files_are_written() {
    let dir = tempfile::tempdir().unwrap();
    let (reports, portfolio) = reports();
    save_portfolio(&reports, &portfolio, dir.path()).unwrap();

    let csv = std::fs::read_to_string(dir.path().join("portfolio.csv")).unwrap();
    assert!(csv.starts_with("date,hold,trend,portfolio_equity\n"));
    let md = std::fs::read_to_string(dir.path().join("portfolio.md")).unwrap();
    assert!(md.contains("## Portfolio"));
    assert!(md.contains("| trend |"));
}

fn signal(action: Action, quantity: f64) -> ExecutionSignal {
    ExecutionSignal {
        date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
        strategy: "trend".into(),
        action,
        instrument: "NIFTY".into(),
        quantity,
        price: Some(22_500.5),
        stop_loss: Some(22_100.0),
        reason: "entry signal".into(),
    }
}

#[test]
fn order_ticket_rounds_quantity() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("order_ticket.csv");
    write_order_ticket(&[signal(Action::Buy, 4.44444)], &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "date,strategy,action,instrument,quantity,price,stop_loss,reason"
    );
    assert_eq!(
        lines[1],
        "2024-06-03,trend,BUY,NIFTY,4.44,22500.5,22100,entry signal"
    );
}

#[test]
fn empty_order_ticket_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("order_ticket.csv");
    write_order_ticket(&[], &path).unwrap();
    assert!(!path.exists());
}
