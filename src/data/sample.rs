//! Seeded synthetic market for offline runs.
//!
//! Generates, on a Monday-to-Friday calendar:
//!
//! - an index following geometric Brownian motion
//! - a mean-reverting short rate published as a FRED-style table, with `"."`
//!   placeholders on fixed US holidays
//! - a "traded" fund that follows the leveraged index with small daily noise,
//!   standing in for the actual fund history
//!
//! The same seed always produces the same market.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::data::{PriceSource, RateSource};
use crate::domain::{AVG_TRADING_DAYS_PER_YEAR, PriceSeries, RawRateRow, TimeSeries};
use crate::error::AppError;

/// Ticker under which the synthetic leveraged fund is served.
pub const SYNTHETIC_FUND: &str = "SYNTH3X";

#[derive(Debug, Clone)]
pub struct SyntheticMarket {
    days: Vec<NaiveDate>,
    index: Vec<f64>,
    fund: Vec<f64>,
    rates: Vec<RawRateRow>,
}

#[derive(Debug, Clone)]
pub struct SyntheticParams {
    pub seed: u64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Annualized index drift.
    pub drift: f64,
    /// Annualized index volatility.
    pub volatility: f64,
    /// Long-run rate level in percent.
    pub rate_level: f64,
    pub fund_leverage: f64,
    pub fund_expense_ratio: f64,
}

impl Default for SyntheticParams {
    fn default() -> Self {
        Self {
            seed: 42,
            start: NaiveDate::from_ymd_opt(2000, 1, 3).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2021, 9, 1).unwrap_or_default(),
            drift: 0.09,
            volatility: 0.22,
            rate_level: 2.0,
            fund_leverage: 3.0,
            fund_expense_ratio: 0.0095,
        }
    }
}

impl SyntheticMarket {
    pub fn generate(params: &SyntheticParams) -> Result<Self, AppError> {
        if params.end <= params.start {
            return Err(AppError::new(2, "Synthetic market needs end > start."));
        }
        if !(params.volatility.is_finite() && params.volatility >= 0.0) {
            return Err(AppError::new(2, "Synthetic volatility must be >= 0."));
        }

        let mut rng = StdRng::seed_from_u64(params.seed);
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

        let dt = 1.0 / AVG_TRADING_DAYS_PER_YEAR;
        let sigma = params.volatility * dt.sqrt();
        let mu = (params.drift - 0.5 * params.volatility * params.volatility) * dt;
        // Tracking noise of the traded fund, a few basis points a day.
        let fund_noise = 0.0004;

        let days = business_days(params.start, params.end);
        let mut index = Vec::with_capacity(days.len());
        let mut fund = Vec::with_capacity(days.len());
        let mut rates = Vec::with_capacity(days.len());

        let mut level = 1000.0;
        let mut fund_value = 100.0;
        let mut rate = params.rate_level;
        let mut prev_day: Option<NaiveDate> = None;

        for &day in &days {
            // Ornstein-Uhlenbeck around the long-run level, floored at zero.
            rate = (rate + 0.02 * (params.rate_level - rate) + 0.03 * normal.sample(&mut rng)).max(0.0);

            if let Some(prev) = prev_day {
                let z: f64 = normal.sample(&mut rng);
                let r = (mu + sigma * z).exp() - 1.0;
                level *= 1.0 + r;

                let gap = (day - prev).num_days() as f64;
                let financing = rate / 100.0 * gap / 360.0;
                let fund_r = params.fund_leverage * r
                    - params.fund_expense_ratio * dt
                    - (params.fund_leverage - 1.0) * financing
                    + fund_noise * normal.sample(&mut rng);
                fund_value = (fund_value * (1.0 + fund_r)).max(1e-6);
            }

            index.push(level);
            fund.push(fund_value);
            let value = if is_fixed_holiday(day) {
                ".".to_string()
            } else {
                format!("{rate:.5}")
            };
            rates.push(RawRateRow::new(day, value));
            prev_day = Some(day);
        }

        Ok(Self {
            days,
            index,
            fund,
            rates,
        })
    }

    fn series(&self, values: &[f64], start: Option<NaiveDate>, end: Option<NaiveDate>) -> PriceSeries {
        TimeSeries::from_ordered(self.days.iter().copied().zip(values.iter().copied()).collect())
            .between(start, end)
    }
}

impl PriceSource for SyntheticMarket {
    /// Serves [`SYNTHETIC_FUND`] as the traded fund and any other ticker as the index.
    fn fetch_prices(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<PriceSeries, AppError> {
        if ticker.eq_ignore_ascii_case(SYNTHETIC_FUND) {
            Ok(self.series(&self.fund, start, end))
        } else {
            Ok(self.series(&self.index, start, end))
        }
    }
}

impl RateSource for SyntheticMarket {
    fn fetch_rates(
        &self,
        _series_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<RawRateRow>, AppError> {
        Ok(self
            .rates
            .iter()
            .filter(|r| start.is_none_or(|s| r.date >= s) && end.is_none_or(|e| r.date <= e))
            .cloned()
            .collect())
    }
}

fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

/// New Year's Day, Independence Day and Christmas when they fall on a weekday.
fn is_fixed_holiday(day: NaiveDate) -> bool {
    matches!((day.month(), day.day()), (1, 1) | (7, 4) | (12, 25))
}
