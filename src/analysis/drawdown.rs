//! Drawdown and growth statistics of a value series.

use chrono::NaiveDate;

use crate::domain::{DAYS_PER_YEAR, DrawdownSeries, InvestmentSeries, MaxDrawdown};
use crate::error::SimError;

/// `value[d] / running_max(value[..=d]) - 1`.
///
/// Zero at every new high, negative below the running peak.
pub fn drawdown_series(values: &InvestmentSeries) -> DrawdownSeries {
    let mut peak = f64::NEG_INFINITY;
    values.map(|&v| {
        peak = peak.max(v);
        if peak > 0.0 { v / peak - 1.0 } else { 0.0 }
    })
}

/// Deepest drawdown with its peak and trough dates.
///
/// Returns `None` for an empty series. Ties keep the earliest trough.
pub fn max_drawdown(values: &InvestmentSeries) -> Option<MaxDrawdown> {
    let mut points = values.iter();
    let &(first_date, first_value) = points.next()?;

    let mut peak = (first_date, first_value);
    let mut worst = MaxDrawdown {
        peak_date: first_date,
        trough_date: first_date,
        depth: 0.0,
    };

    for &(date, v) in points {
        if v > peak.1 {
            peak = (date, v);
            continue;
        }
        if peak.1 > 0.0 {
            let depth = v / peak.1 - 1.0;
            if depth < worst.depth {
                worst = MaxDrawdown {
                    peak_date: peak.0,
                    trough_date: date,
                    depth,
                };
            }
        }
    }

    Some(worst)
}

/// Compound annual growth rate over the full span:
/// `(last / first)^(365.25 / elapsed_days) - 1`.
///
/// A series that ends at or below zero (ruin) reports -100%.
pub fn cagr(values: &InvestmentSeries) -> Result<f64, SimError> {
    let (first, last) = endpoints(values)?;
    let elapsed_days = (last.0 - first.0).num_days();
    if elapsed_days <= 0 {
        return Err(SimError::invalid("series", "CAGR needs a positive elapsed time"));
    }
    if last.1 <= 0.0 {
        return Ok(-1.0);
    }
    let years = elapsed_days as f64 / DAYS_PER_YEAR;
    Ok((last.1 / first.1).powf(1.0 / years) - 1.0)
}

/// `last / first - 1`.
pub fn total_return(values: &InvestmentSeries) -> Result<f64, SimError> {
    let (first, last) = endpoints(values)?;
    Ok(last.1 / first.1 - 1.0)
}

type Endpoint = (NaiveDate, f64);

fn endpoints(values: &InvestmentSeries) -> Result<(Endpoint, Endpoint), SimError> {
    let (Some(&first), Some(&last)) = (values.first(), values.last()) else {
        return Err(SimError::InsufficientData {
            required: 2,
            actual: 0,
        });
    };
    if values.len() < 2 {
        return Err(SimError::InsufficientData {
            required: 2,
            actual: values.len(),
        });
    }
    if !(first.1.is_finite() && first.1 > 0.0) {
        return Err(SimError::invalid(
            "series",
            format!("first value {} must be > 0", first.1),
        ));
    }
    Ok((first, last))
}
