//! Export simulation results to CSV and JSON.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::analysis::TrackingReport;
use crate::app::pipeline::{SimulationRun, SweepRow};
use crate::domain::{SimConfig, SimulationSummary};
use crate::error::AppError;

/// Per-date CSV. Columns that do not apply to a date (the anchor date has no
/// return) are left empty.
pub fn write_series_csv(path: &Path, run: &SimulationRun) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record([
            "date",
            "index_return",
            "financing",
            "leveraged_return",
            "value",
            "drawdown",
            "actual",
        ])
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for &(date, value) in &run.investment {
        let opt = |v: Option<&f64>| v.map(|v| format!("{v:.10}")).unwrap_or_default();
        let actual = run.actual_rebased.as_ref().and_then(|a| a.get(date));
        writer
            .write_record([
                date.to_string(),
                opt(run.index_returns.get(date)),
                opt(run.financing.get(date)),
                opt(run.leveraged_returns.get(date)),
                format!("{value:.10}"),
                opt(run.drawdown.get(date)),
                opt(actual),
            ])
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))
}

#[derive(Serialize)]
struct SummaryFile<'a> {
    config: &'a SimConfig,
    summary: &'a SimulationSummary,
    tracking: Option<&'a TrackingReport>,
}

/// Config, summary and tracking comparison as pretty-printed JSON.
pub fn write_summary_json(path: &Path, run: &SimulationRun) -> Result<(), AppError> {
    let doc = SummaryFile {
        config: &run.config,
        summary: &run.summary,
        tracking: run.tracking.as_ref(),
    };
    write_json(path, &doc)
}

/// Sweep rows as a JSON array.
pub fn write_sweep_json(path: &Path, rows: &[SweepRow]) -> Result<(), AppError> {
    write_json(path, rows)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| AppError::new(2, format!("Failed to write JSON '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::{SimulationInputs, run_simulation};
    use crate::domain::{RawRateRow, TimeSeries};
    use chrono::NaiveDate;

    fn run() -> SimulationRun {
        let dates: Vec<NaiveDate> = (1..=4)
            .map(|day| NaiveDate::from_ymd_opt(2021, 3, day).unwrap())
            .collect();
        let inputs = SimulationInputs {
            index_prices: TimeSeries::new(dates.iter().copied().zip([100.0, 102.0, 101.0, 105.0]).collect())
                .unwrap(),
            raw_rates: dates.iter().map(|&d| RawRateRow::new(d, "0.1")).collect(),
            actual: None,
        };
        run_simulation(&SimConfig::default(), &inputs).unwrap()
    }

    #[test]
    fn series_csv_has_one_row_per_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");
        write_series_csv(&path, &run()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(
            lines[0],
            "date,index_return,financing,leveraged_return,value,drawdown,actual"
        );
        // The anchor date carries the starting value only.
        assert_eq!(lines[1], "2021-03-01,,,,1.0000000000,0.0000000000,");
        // Financing appears only on dates where it was charged.
        assert!(lines[2].starts_with("2021-03-02,0.0200000000,0.0007000000,"));
    }

    #[test]
    fn summary_json_round_trips_through_serde_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let run = run();
        write_summary_json(&path, &run).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["summary"]["trading_days"], 3);
        assert_eq!(value["config"]["day_count"], "act/360");
        assert!(value["tracking"].is_null());
    }
}
