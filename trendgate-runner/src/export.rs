//! Reporting and export — JSON, CSV, and Markdown artifact generation.
//!
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: closed-trade tape and equity curve
//! - **Markdown**: human-readable session summary
//!
//! Unknown schema versions are rejected on load.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use trendgate_core::domain::ClosedTrade;

use crate::session::{SessionReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &SessionReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize SessionReport to JSON")
}

/// Deserialize a `SessionReport`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<SessionReport> {
    let report: SessionReport =
        serde_json::from_str(json).context("failed to deserialize SessionReport from JSON")?;
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

/// Columns: direction, size, entry_price, exit_price, exit_reason,
/// opened_at, closed_at, pnl
pub fn export_trades_csv(trades: &[ClosedTrade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "direction",
        "size",
        "entry_price",
        "exit_price",
        "exit_reason",
        "opened_at",
        "closed_at",
        "pnl",
    ])?;

    let stamp = |ts: Option<chrono::DateTime<chrono::Utc>>| {
        ts.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default()
    };
    for t in trades {
        wtr.write_record([
            &format!("{:?}", t.direction),
            &format!("{:.6}", t.size),
            &format!("{:.6}", t.entry_price),
            &format!("{:.6}", t.exit_price),
            &format!("{:?}", t.exit_reason),
            &stamp(t.opened_at),
            &stamp(t.closed_at),
            &format!("{:.6}", t.pnl),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn export_equity_csv(equity_curve: &[f64]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["bar_index", "equity"])?;
    for (i, eq) in equity_curve.iter().enumerate() {
        wtr.write_record([&i.to_string(), &format!("{:.2}", eq)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `report.json`, `trades.csv`, `equity.csv` and `report.md` into
/// `output_dir/<run id prefix>/`. Returns that directory.
pub fn save_artifacts(report: &SessionReport, output_dir: &Path) -> Result<PathBuf> {
    let prefix: String = report.run_id.chars().take(12).collect();
    let run_dir = output_dir.join(prefix);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("report.json"), export_json(report)?)?;
    std::fs::write(run_dir.join("trades.csv"), export_trades_csv(&report.trades)?)?;
    std::fs::write(run_dir.join("equity.csv"), export_equity_csv(&report.equity_curve)?)?;
    std::fs::write(run_dir.join("report.md"), generate_report(report))?;

    Ok(run_dir)
}

pub fn load_artifacts(dir: &Path) -> Result<SessionReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

pub fn generate_report(report: &SessionReport) -> String {
    let mut md = String::with_capacity(1024);
    let date = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();

    md.push_str("# Session Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    let _ = writeln!(md, "| Run | {} |", report.run_id);
    let _ = writeln!(
        md,
        "| Period | {} to {} |",
        date(report.start_date),
        date(report.end_date)
    );
    let _ = writeln!(md, "| Initial Cash | {:.2} |", report.initial_cash);
    let _ = writeln!(
        md,
        "| Bars | {} ({} warmup) |",
        report.bar_count, report.warmup_bars
    );
    let _ = writeln!(md, "| Dataset Hash | {} |", report.dataset_hash);
    if report.has_synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    let m = &report.metrics;
    md.push_str("## Performance Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    let _ = writeln!(md, "| Final Value | {:.2} |", report.final_value);
    let _ = writeln!(md, "| Total Return | {:.2}% |", m.total_return * 100.0);
    let _ = writeln!(md, "| Max Drawdown | {:.2}% |", m.max_drawdown * 100.0);
    let _ = writeln!(md, "| Realized PnL | {:.2} |", m.realized_pnl);
    let _ = writeln!(md, "| Win Rate | {:.1}% |", m.win_rate * 100.0);
    let _ = writeln!(md, "| Profit Factor | {:.2} |", m.profit_factor);
    let _ = writeln!(md, "| Trades | {} |", m.trade_count);
    let _ = writeln!(md, "| Fills | {} |", report.fill_count);
    let _ = writeln!(md, "| Max Consecutive Wins | {} |", m.max_consecutive_wins);
    let _ = writeln!(md, "| Max Consecutive Losses | {} |", m.max_consecutive_losses);
    md.push('\n');

    md.push_str("## Sizing\n\n");
    let _ = writeln!(
        md,
        "Long multiplier {:.4}, short multiplier {:.4}.",
        report.final_sizing.long_multiplier, report.final_sizing.short_multiplier
    );

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::PerformanceMetrics;
    use chrono::{TimeZone, Utc};
    use trendgate_core::domain::{Direction, ExitReason};
    use trendgate_core::SizingState;

    fn sample_report() -> SessionReport {
        let trades = vec![ClosedTrade {
            direction: Direction::Short,
            size: 1.0,
            entry_price: 100.0,
            exit_price: 96.0,
            exit_reason: ExitReason::TakeProfit,
            opened_at: Some(Utc.with_ymd_and_hms(2022, 2, 1, 0, 15, 0).unwrap()),
            closed_at: Some(Utc.with_ymd_and_hms(2022, 2, 1, 1, 0, 0).unwrap()),
            pnl: 4.0,
        }];
        let equity_curve = vec![1000.0, 1000.0, 1004.0];
        SessionReport {
            schema_version: SCHEMA_VERSION,
            run_id: "ab".repeat(32),
            dataset_hash: "cd".repeat(32),
            has_synthetic: true,
            start_date: Utc.with_ymd_and_hms(2022, 2, 1, 0, 0, 0).single().map(|t| t.date_naive()),
            end_date: None,
            bar_count: 3,
            warmup_bars: 0,
            initial_cash: 1000.0,
            final_value: 1004.0,
            fill_count: 2,
            metrics: PerformanceMetrics::compute(&equity_curve, &trades),
            final_sizing: SizingState {
                long_multiplier: 1.0,
                short_multiplier: 1.04,
            },
            trades,
            equity_curve,
        }
    }

    #[test]
    fn json_round_trip() {
        let report = sample_report();
        let back = import_json(&export_json(&report).unwrap()).unwrap();
        assert_eq!(back.trades, report.trades);
        assert_eq!(back.metrics, report.metrics);
        assert_eq!(back.run_id, report.run_id);
    }

    #[test]
    fn future_schema_rejected() {
        let mut report = sample_report();
        report.schema_version = SCHEMA_VERSION + 1;
        let json = export_json(&report).unwrap();
        assert!(import_json(&json).is_err());
    }

    #[test]
    fn trades_csv_columns() {
        let csv = export_trades_csv(&sample_report().trades).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("direction,size,entry_price,exit_price,exit_reason,opened_at,closed_at,pnl")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("Short,1.000000,100.000000,96.000000,TakeProfit,2022-02-01 00:15:00"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn markdown_flags_synthetic_data() {
        let md = generate_report(&sample_report());
        assert!(md.contains("# Session Report"));
        assert!(md.contains("**SYNTHETIC**"));
        assert!(md.contains("| Trades | 1 |"));
    }

    #[test]
    fn artifacts_written_and_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();
        let run_dir = save_artifacts(&report, dir.path()).unwrap();
        for name in ["report.json", "trades.csv", "equity.csv", "report.md"] {
            assert!(run_dir.join(name).exists(), "missing {name}");
        }
        let back = load_artifacts(&run_dir).unwrap();
        assert_eq!(back.final_value, 1004.0);
    }
}
