//! Comparison of a simulated fund against its actual traded history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analysis::cagr;
use crate::domain::{AVG_TRADING_DAYS_PER_YEAR, InvestmentSeries, PriceSeries};
use crate::error::SimError;
use crate::math::fit_line;
use crate::sim::simple_returns;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub common_days: usize,
    pub simulated_cagr: f64,
    pub actual_cagr: f64,
    /// `simulated_last / actual_last` after rebasing both to the same start value.
    pub terminal_ratio: f64,
    /// Annualized standard deviation of daily return differences.
    pub tracking_error: f64,
    /// Regression of actual daily returns on simulated daily returns.
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub r_squared: Option<f64>,
}

/// Actual prices rebased so they equal `simulated` on the first common date.
pub fn rebase_to(actual: &PriceSeries, simulated: &InvestmentSeries) -> Result<InvestmentSeries, SimError> {
    let joined = simulated.intersect_with(actual);
    let Some(&(_, (sim0, act0))) = joined.first() else {
        return Ok(InvestmentSeries::empty());
    };
    if !(act0.is_finite() && act0 > 0.0) {
        return Err(SimError::invalid("actual", format!("price {act0} must be > 0")));
    }
    let scale = sim0 / act0;
    Ok(joined.map(|&(_, a)| a * scale))
}

/// Compare a simulated series with the actual fund over their common dates.
pub fn compare(simulated: &InvestmentSeries, actual: &PriceSeries) -> Result<TrackingReport, SimError> {
    let joined = simulated.intersect_with(actual);
    if joined.len() < 3 {
        return Err(SimError::InsufficientData {
            required: 3,
            actual: joined.len(),
        });
    }

    let sim = joined.map(|&(s, _)| s);
    let act = rebase_to(actual, &sim)?;

    let sim_returns = simple_returns(&sim)?;
    let act_returns = simple_returns(&act)?;
    let x: Vec<f64> = sim_returns.values().copied().collect();
    let y: Vec<f64> = act_returns.values().copied().collect();

    let diffs: Vec<f64> = x.iter().zip(&y).map(|(s, a)| s - a).collect();
    let tracking_error = sample_std(&diffs) * AVG_TRADING_DAYS_PER_YEAR.sqrt();

    let line = fit_line(&x, &y);

    let (start, _) = joined.points()[0];
    let (end, _) = joined.points()[joined.len() - 1];
    let sim_last = sim.last().map_or(f64::NAN, |p| p.1);
    let act_last = act.last().map_or(f64::NAN, |p| p.1);

    Ok(TrackingReport {
        start,
        end,
        common_days: joined.len(),
        simulated_cagr: cagr(&sim)?,
        actual_cagr: cagr(&act)?,
        terminal_ratio: sim_last / act_last,
        tracking_error,
        alpha: line.map(|l| l.alpha),
        beta: line.map(|l| l.beta),
        r_squared: line.map(|l| l.r_squared),
    })
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}
