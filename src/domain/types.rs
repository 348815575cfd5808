//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between the simulation stages
//! - exported to JSON/CSV
//! - selected from the command line (`ValueEnum`)

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Trading days used to pro-rate annual costs to a single day.
pub const AVG_TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Calendar days per year used by CAGR.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// FRED series id of 1-month USD LIBOR, the default financing proxy.
pub const DEFAULT_RATE_SERIES: &str = "USD1MTD156N";

/// Day-count convention used to accrue the annual financing rate per calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum DayCount {
    /// Actual/360, the money-market convention for LIBOR.
    #[serde(rename = "act/360")]
    #[value(name = "act/360")]
    Act360,
    /// Actual/365 fixed.
    #[serde(rename = "act/365")]
    #[value(name = "act/365")]
    Act365,
}

impl DayCount {
    pub fn year_denominator(self) -> f64 {
        match self {
            DayCount::Act360 => 360.0,
            DayCount::Act365 => 365.0,
        }
    }
}

/// Whether a differenced series keeps its (undefined) first date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstObservation {
    Drop,
    /// Keep the first date with a missing value.
    Keep,
}

/// One row of a published rate table, before numeric conversion.
///
/// `value` may hold a placeholder such as FRED's `"."` for holidays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRateRow {
    pub date: NaiveDate,
    pub value: String,
}

impl RawRateRow {
    pub fn new(date: NaiveDate, value: impl Into<String>) -> Self {
        Self {
            date,
            value: value.into(),
        }
    }
}

/// Known leveraged funds with the index and costs used to reconstruct them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FundPreset {
    /// ProShares UltraPro QQQ, reconstructed from the Nasdaq Composite.
    Tqqq,
    /// ProShares UltraPro S&P 500.
    Upro,
    /// Direxion Daily 20+ Year Treasury Bull 3X, tracking the ICE index (CSV only).
    Tmf,
}

impl FundPreset {
    pub const ALL: [FundPreset; 3] = [FundPreset::Tqqq, FundPreset::Upro, FundPreset::Tmf];

    pub fn ticker(self) -> &'static str {
        match self {
            FundPreset::Tqqq => "TQQQ",
            FundPreset::Upro => "UPRO",
            FundPreset::Tmf => "TMF",
        }
    }

    /// Underlying index symbol (Yahoo ticker, or ICE code for TMF).
    pub fn index_symbol(self) -> &'static str {
        match self {
            FundPreset::Tqqq => "^IXIC",
            FundPreset::Upro => "^GSPC",
            FundPreset::Tmf => "XIUSA000ML",
        }
    }

    pub fn leverage(self) -> f64 {
        3.0
    }

    /// Annual expense ratio as a decimal fraction.
    pub fn expense_ratio(self) -> f64 {
        match self {
            FundPreset::Tqqq => 0.0095,
            FundPreset::Upro => 0.0093,
            FundPreset::Tmf => 0.0106,
        }
    }

    pub fn inception(self) -> NaiveDate {
        let (y, m, d) = match self {
            FundPreset::Tqqq => (2010, 2, 11),
            FundPreset::Upro => (2009, 6, 25),
            FundPreset::Tmf => (2009, 4, 16),
        };
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
    }
}

/// Parameters of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Label used in reports (e.g. "TQQQ (sim)").
    pub label: String,
    /// Daily leverage multiplier `L`.
    pub leverage: f64,
    /// Annual expense ratio as a decimal fraction (0.0095 = 0.95%).
    pub expense_ratio: f64,
    pub starting_amount: f64,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub day_count: DayCount,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            label: "sim".to_string(),
            leverage: 3.0,
            expense_ratio: 0.0,
            starting_amount: 1.0,
            start: None,
            end: None,
            day_count: DayCount::Act360,
        }
    }
}

impl SimConfig {
    pub fn from_preset(preset: FundPreset) -> Self {
        Self {
            label: format!("{} (sim)", preset.ticker()),
            leverage: preset.leverage(),
            expense_ratio: preset.expense_ratio(),
            ..Self::default()
        }
    }
}

/// Deepest peak-to-trough decline of a value series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaxDrawdown {
    pub peak_date: NaiveDate,
    pub trough_date: NaiveDate,
    /// Fractional depth (<= 0).
    pub depth: f64,
}

/// Scalar results of a simulation, as exported and printed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub label: String,
    pub leverage: f64,
    pub expense_ratio: f64,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub trading_days: usize,
    pub starting_amount: f64,
    pub final_value: Option<f64>,
    pub total_return: Option<f64>,
    pub cagr: Option<f64>,
    pub max_drawdown: Option<MaxDrawdown>,
}

impl SimulationSummary {
    /// True when alignment left nothing to simulate.
    pub fn is_degenerate(&self) -> bool {
        self.trading_days == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_carry_three_x_leverage_and_decimal_expense_ratios() {
        for preset in FundPreset::ALL {
            let cfg = SimConfig::from_preset(preset);
            assert_eq!(cfg.leverage, 3.0);
            assert!(cfg.expense_ratio > 0.0 && cfg.expense_ratio < 0.02);
            assert!(cfg.label.starts_with(preset.ticker()));
        }
        assert_eq!(
            FundPreset::Tqqq.inception(),
            NaiveDate::from_ymd_opt(2010, 2, 11).unwrap()
        );
    }

    #[test]
    fn day_count_denominators() {
        assert_eq!(DayCount::Act360.year_denominator(), 360.0);
        assert_eq!(DayCount::Act365.year_denominator(), 365.0);
    }
}
