//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! - **JSON**: full round-trip serialization of a `BacktestReport` with schema versioning
//! - **CSV**: trade ledger, equity curve and combined portfolio curve
//! - **Markdown**: single-strategy reports and a portfolio summary
//!
//! Unknown (newer) schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use regimelab_core::domain::TradeRecord;
use regimelab_core::equity::{max_drawdown_pct, EquityCurve};
use regimelab_core::portfolio::PortfolioCurve;

use crate::report::{BacktestReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &BacktestReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BacktestReport to JSON")
}

/// Deserialize a `BacktestReport`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestReport> {
    let report: BacktestReport =
        serde_json::from_str(json).context("failed to deserialize BacktestReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the ledger, one row per record.
///
/// Columns: type, date, price, size, stop, pnl, cash, reason
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["type", "date", "price", "size", "stop", "pnl", "cash", "reason"])?;

    for t in trades {
        let (stop, reason) = match t {
            TradeRecord::Buy { stop, .. } => (*stop, ""),
            TradeRecord::Halt { reason, .. } => (None, reason.as_str()),
            _ => (None, ""),
        };
        wtr.write_record([
            t.kind().to_string(),
            t.date().to_string(),
            opt(t.price()),
            opt(t.size()),
            opt(stop),
            t.pnl().map(|p| format!("{p:.2}")).unwrap_or_default(),
            format!("{:.2}", t.cash()),
            reason.to_string(),
        ])?;
    }

    finish(wtr)
}

/// Export an equity curve with date and equity columns. The placeholder point
/// of a zero-trade run has an empty date.
pub fn export_equity_csv(curve: &EquityCurve) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "equity"])?;
    for p in curve.points() {
        wtr.write_record([
            p.date.map(|d| d.to_string()).unwrap_or_default(),
            format!("{:.2}", p.equity),
        ])?;
    }
    finish(wtr)
}

/// Export the combined curve: one column per strategy, then the total.
pub fn export_portfolio_csv(portfolio: &PortfolioCurve) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header = vec!["date".to_string()];
    header.extend(portfolio.strategies.iter().cloned());
    header.push("portfolio_equity".to_string());
    wtr.write_record(&header)?;

    for row in &portfolio.rows {
        let mut record = vec![row.date.map(|d| d.to_string()).unwrap_or_default()];
        for name in &portfolio.strategies {
            let value = row.equities.get(name).copied().flatten();
            record.push(value.map(|v| format!("{v:.2}")).unwrap_or_default());
        }
        record.push(format!("{:.2}", row.portfolio_equity));
        wtr.write_record(&record)?;
    }
    finish(wtr)
}

// ─── Markdown reports ───────────────────────────────────────────────

/// Markdown report for a single strategy run.
pub fn generate_report(report: &BacktestReport) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str(&format!("# Backtest Report: {}\n\n", report.strategy));

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Instrument | {} |\n", report.instrument));
    md.push_str(&format!("| Signal | {} |\n", report.provider));
    if let (Some(start), Some(end)) = (report.start_date, report.end_date) {
        md.push_str(&format!("| Period | {start} to {end} |\n"));
    }
    md.push_str(&format!(
        "| Bars | {} ({} processed) |\n",
        report.bar_count, report.bars_processed
    ));
    md.push_str(&format!(
        "| Initial Capital | {:.2} |\n",
        report.initial_capital
    ));
    md.push_str(&format!(
        "| Risk / Max DD | {:.2}% / {:.2}% |\n",
        report.config.risk_per_trade * 100.0,
        report.config.max_drawdown * 100.0
    ));
    md.push_str(&format!(
        "| ATR | {} x {:.2} |\n",
        report.config.atr_period, report.config.atr_multiplier
    ));
    md.push_str(&format!("| Config | {} |\n", report.config_fingerprint));
    md.push_str(&format!("| Dataset Hash | {} |\n", report.dataset_hash));
    if report.has_synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    let s = &report.stats;
    md.push_str("## Performance Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Final Cash | {:.2} |\n", report.final_cash));
    md.push_str(&format!(
        "| Total Return | {:.2}% |\n",
        report.total_return() * 100.0
    ));
    md.push_str(&format!("| Max Drawdown | {:.2} |\n", report.max_drawdown));
    md.push_str(&format!(
        "| Max Drawdown % | {:.2}% |\n",
        report.max_drawdown_pct * 100.0
    ));
    md.push_str(&format!("| Trades | {} |\n", s.total_trades));
    md.push_str(&format!("| Win Rate | {:.1}% |\n", s.win_rate * 100.0));
    md.push_str(&format!("| Avg Win | {:.2} |\n", s.avg_win));
    md.push_str(&format!("| Avg Loss | {:.2} |\n", s.avg_loss));
    md.push_str(&format!("| Expectancy | {:.2} |\n", s.expectancy));
    md.push_str(&format!("| Profit Factor | {:.2} |\n", s.profit_factor));
    md.push_str(&format!(
        "| Exits (stop / regime) | {} / {} |\n",
        s.stop_exits, s.regime_exits
    ));
    md.push_str(&format!(
        "| Max Consecutive Losses | {} |\n",
        s.max_consecutive_losses
    ));
    if report.halted {
        md.push_str("| Status | **HALTED** (kill-switch) |\n");
    }
    md.push('\n');

    if !report.yearly.is_empty() {
        md.push_str("## Yearly Performance\n\n");
        md.push_str("| Year | PnL | Trades |\n");
        md.push_str("| ---: | ---: | ---: |\n");
        for y in &report.yearly {
            md.push_str(&format!(
                "| {} | {:.2} | {} |\n",
                y.year, y.total_pnl, y.trade_count
            ));
        }
        md.push('\n');
    }

    md
}

/// Markdown summary of a multi-strategy run and its combined curve.
pub fn generate_portfolio_report(reports: &[BacktestReport], portfolio: &PortfolioCurve) -> String {
    let mut md = String::with_capacity(1024);

    md.push_str("# Portfolio Report\n\n");
    md.push_str("| Strategy | Capital | Final Cash | Trades | Max DD % | Halted |\n");
    md.push_str("| --- | ---: | ---: | ---: | ---: | --- |\n");
    for r in reports {
        md.push_str(&format!(
            "| {} | {:.2} | {:.2} | {} | {:.2}% | {} |\n",
            r.strategy,
            r.initial_capital,
            r.final_cash,
            r.stats.total_trades,
            r.max_drawdown_pct * 100.0,
            if r.halted { "yes" } else { "no" }
        ));
    }
    md.push('\n');

    md.push_str("## Portfolio\n\n");
    md.push_str(&format!(
        "- Final equity: {:.2}\n",
        portfolio.final_equity().unwrap_or(0.0)
    ));
    md.push_str(&format!("- Max drawdown: {:.2}\n", portfolio.max_drawdown()));
    md.push_str(&format!(
        "- Max drawdown %: {:.2}%\n",
        max_drawdown_pct(&portfolio.portfolio_equity()) * 100.0
    ));

    md
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one strategy run.
///
/// Creates `{strategy}_{fingerprint prefix}/` under `output_dir` containing:
/// - `manifest.json`: the full `BacktestReport`
/// - `trades.csv`: the ledger
/// - `equity.csv`: one point per processed bar
/// - `report.md`: human-readable summary
///
/// Returns the path to the created directory.
pub fn save_artifacts(report: &BacktestReport, output_dir: &Path) -> Result<PathBuf> {
    let prefix: String = report.config_fingerprint.chars().take(12).collect();
    let dirname = if prefix.is_empty() {
        report.strategy.clone()
    } else {
        format!("{}_{}", report.strategy, prefix)
    };
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write(&run_dir.join("manifest.json"), &export_json(report)?)?;
    write(&run_dir.join("trades.csv"), &export_trades_csv(&report.trades)?)?;
    write(&run_dir.join("equity.csv"), &export_equity_csv(&report.equity)?)?;
    write(&run_dir.join("report.md"), &generate_report(report))?;

    Ok(run_dir)
}

/// Save `portfolio.csv` and `portfolio.md` directly under `output_dir`.
pub fn save_portfolio(
    reports: &[BacktestReport],
    portfolio: &PortfolioCurve,
    output_dir: &Path,
) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;
    write(&output_dir.join("portfolio.csv"), &export_portfolio_csv(portfolio)?)?;
    write(
        &output_dir.join("portfolio.md"),
        &generate_portfolio_report(reports, portfolio),
    )
}

/// Load a `BacktestReport` from an artifact directory's manifest.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestReport> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use regimelab_core::equity::EquityPoint;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn trades_csv_has_one_row_per_record() {
        let trades = vec![
            TradeRecord::Buy {
                date: day(1),
                price: 100.0,
                size: 10.0,
                stop: Some(96.0),
                cash: 990.0,
            },
            TradeRecord::Stop {
                date: day(2),
                price: 96.0,
                size: 10.0,
                pnl: -50.0,
                cash: 940.0,
            },
            TradeRecord::Halt {
                date: day(3),
                reason: "max drawdown breached".into(),
                cash: 940.0,
            },
        ];
        let csv = export_trades_csv(&trades).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "type,date,price,size,stop,pnl,cash,reason");
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("BUY,2024-05-01,100.000000,10.000000,96.000000,,990.00"));
        assert!(lines[2].starts_with("STOP,2024-05-02,96.000000"));
        assert!(lines[2].contains(",-50.00,"));
        assert!(lines[3].ends_with("max drawdown breached"));
    }

    #[test]
    fn equity_csv_leaves_placeholder_date_empty() {
        let csv = export_equity_csv(&EquityCurve::flat(1_000.0)).unwrap();
        assert_eq!(csv, "date,equity\n,1000.00\n");

        let dated = EquityCurve::from_points(vec![EquityPoint {
            date: Some(day(4)),
            equity: 1_234.5,
        }]);
        assert_eq!(
            export_equity_csv(&dated).unwrap(),
            "date,equity\n2024-05-04,1234.50\n"
        );
    }
}
