//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the simulation code stays clean and testable
//! - output changes are localized (and covered by the tests below)

use crate::analysis::TrackingReport;
use crate::app::pipeline::SweepRow;
use crate::domain::SimulationSummary;

/// Format the run summary: parameters, span, final value, CAGR and max drawdown.
pub fn format_run_summary(summary: &SimulationSummary) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== letf - {} ===\n", summary.label));
    out.push_str(&format!(
        "Leverage: {:.2}x | Expense ratio: {:.2}%\n",
        summary.leverage,
        summary.expense_ratio * 100.0
    ));

    if summary.is_degenerate() {
        out.push_str("No overlapping dates between index prices and rates; nothing to simulate.\n");
        return out;
    }

    out.push_str(&format!(
        "Period: {} -> {} ({} trading days)\n",
        fmt_date(summary.start),
        fmt_date(summary.end),
        summary.trading_days
    ));
    out.push_str(&format!(
        "Value: {:.4} -> {}\n",
        summary.starting_amount,
        summary
            .final_value
            .map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
    ));
    out.push_str(&format!("Total return: {}\n", fmt_pct(summary.total_return)));
    out.push_str(&format!("CAGR: {}\n", fmt_pct(summary.cagr)));

    match &summary.max_drawdown {
        Some(mdd) => out.push_str(&format!(
            "Max drawdown: {:.2}% on {} (peak {})\n",
            mdd.depth * 100.0,
            mdd.trough_date,
            mdd.peak_date
        )),
        None => out.push_str("Max drawdown: -\n"),
    }

    out
}

/// Format the simulated-vs-actual comparison.
pub fn format_tracking(report: &TrackingReport, actual_label: &str) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "\nTracking vs {actual_label}: {} -> {} ({} common days)\n",
        report.start, report.end, report.common_days
    ));
    out.push_str(&format!(
        "  CAGR sim={:.2}% actual={:.2}% | terminal ratio={:.4}\n",
        report.simulated_cagr * 100.0,
        report.actual_cagr * 100.0,
        report.terminal_ratio
    ));
    out.push_str(&format!(
        "  Tracking error: {:.2}% p.a.\n",
        report.tracking_error * 100.0
    ));
    match (report.alpha, report.beta, report.r_squared) {
        (Some(alpha), Some(beta), Some(r2)) => out.push_str(&format!(
            "  actual = {:.6} + {:.4} * sim (R^2={:.4})\n",
            alpha, beta, r2
        )),
        _ => out.push_str("  regression: n/a\n"),
    }

    out
}

/// Format a start-date sweep as a table.
pub fn format_sweep(rows: &[SweepRow]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<12} {:<12} {:>8} {:>12} {:>10} {:>10} {:<12}\n",
            "requested", "start", "days", "final", "cagr", "max_dd", "trough"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<12} {:-<12} {:-<8} {:-<12} {:-<10} {:-<10} {:-<12}\n",
            "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for row in rows {
        let s = &row.summary;
        out.push_str(
            format!(
                "{:<12} {:<12} {:>8} {:>12} {:>10} {:>10} {:<12}\n",
                row.requested_start.to_string(),
                fmt_date(s.start),
                s.trading_days,
                s.final_value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}")),
                fmt_pct(s.cagr),
                fmt_pct(s.max_drawdown.map(|m| m.depth)),
                s.max_drawdown
                    .map_or_else(|| "-".to_string(), |m| m.trough_date.to_string()),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn fmt_pct(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{:.2}%", v * 100.0))
}

fn fmt_date(d: Option<chrono::NaiveDate>) -> String {
    d.map_or_else(|| "-".to_string(), |d| d.to_string())
}
