//! Command-line parsing for the leveraged-ETF simulator.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the simulation code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_RATE_SERIES, DayCount, FundPreset};
use crate::logging::LogFormat;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "letf", version, about = "Leveraged ETF simulator (index + financing cost reconstruction)")]
pub struct Cli {
    /// Log filter directive (e.g. "info", "letf_sim=debug"). RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Log output format (logs go to stderr).
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Simulate one leveraged fund, print its summary and optionally plot/export.
    Simulate(SimArgs),
    /// Run the same simulation from several start dates and compare CAGR/drawdown.
    Sweep(SweepArgs),
    /// Launch the interactive TUI.
    ///
    /// Data is fetched once; leverage and view changes recompute locally.
    Tui(SimArgs),
}

/// Options shared by every command that runs a simulation.
#[derive(Debug, Args, Clone)]
pub struct SimArgs {
    /// Fund preset supplying index, leverage, expense ratio and inception date.
    #[arg(short = 'p', long, value_enum)]
    pub preset: Option<FundPreset>,

    /// Index ticker to lever (Yahoo symbol, e.g. ^IXIC).
    #[arg(long)]
    pub index: Option<String>,

    /// Read index prices from a CSV file (Date + Adj Close/Close columns) instead of Yahoo.
    #[arg(long, value_name = "CSV")]
    pub index_csv: Option<PathBuf>,

    /// FRED series id of the financing rate.
    #[arg(long, default_value = DEFAULT_RATE_SERIES)]
    pub rate_series: String,

    /// Read the rate table from a FRED CSV download instead of the API.
    #[arg(long, value_name = "CSV")]
    pub rates_csv: Option<PathBuf>,

    /// Ticker of the real fund to compare against (defaults to the preset's ticker).
    #[arg(long)]
    pub actual: Option<String>,

    /// Read the real fund's prices from a CSV file.
    #[arg(long, value_name = "CSV")]
    pub actual_csv: Option<PathBuf>,

    /// Skip the comparison against the real fund.
    #[arg(long)]
    pub no_actual: bool,

    /// Daily leverage multiplier.
    #[arg(short = 'l', long)]
    pub leverage: Option<f64>,

    /// Annual expense ratio in percent (0.95 means 0.95%).
    #[arg(long)]
    pub expense_ratio: Option<f64>,

    /// Starting amount.
    #[arg(long, default_value_t = 1.0)]
    pub amount: f64,

    /// First date (YYYY-MM-DD). Defaults to the preset's inception date.
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last date (YYYY-MM-DD).
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Day count used to accrue the financing rate.
    #[arg(long, value_enum, default_value_t = DayCount::Act360)]
    pub day_count: DayCount,

    /// Use a seeded synthetic market instead of network data.
    #[arg(long)]
    pub offline: bool,

    /// Seed for the synthetic market.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Plot on a log scale.
    #[arg(long)]
    pub log_scale: bool,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the per-date series to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export config, summary and tracking comparison to JSON.
    #[arg(long = "export-summary")]
    pub export_summary: Option<PathBuf>,
}

/// Options for a start-date sweep.
#[derive(Debug, Args, Clone)]
pub struct SweepArgs {
    #[command(flatten)]
    pub sim: SimArgs,

    /// Comma-separated start dates (YYYY-MM-DD).
    #[arg(long, value_delimiter = ',', required = true)]
    pub starts: Vec<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulate_flags_parse() {
        let cli = Cli::parse_from([
            "letf",
            "simulate",
            "--preset",
            "tqqq",
            "--expense-ratio",
            "0.95",
            "--start",
            "2010-02-11",
            "--day-count",
            "act/365",
            "--no-plot",
        ]);
        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.preset, Some(FundPreset::Tqqq));
        assert_eq!(args.expense_ratio, Some(0.95));
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2010, 2, 11));
        assert_eq!(args.day_count, DayCount::Act365);
        assert_eq!(args.rate_series, DEFAULT_RATE_SERIES);
        assert!(args.no_plot);
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn sweep_parses_comma_separated_starts() {
        let cli = Cli::parse_from([
            "letf",
            "--log-format",
            "json",
            "sweep",
            "--offline",
            "--starts",
            "1999-03-10,2004-01-02,2007-01-03",
        ]);
        assert_eq!(cli.log_format, LogFormat::Json);
        let Command::Sweep(args) = cli.command else {
            panic!("expected sweep");
        };
        assert!(args.sim.offline);
        assert_eq!(args.starts.len(), 3);
        assert_eq!(args.starts[2], NaiveDate::from_ymd_opt(2007, 1, 3).unwrap());
    }

    #[test]
    fn sweep_requires_starts() {
        assert!(Cli::try_parse_from(["letf", "sweep"]).is_err());
    }
}
