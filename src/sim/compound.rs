//! Compounding of daily returns into an investment value series.

use chrono::NaiveDate;
use tracing::warn;

use crate::domain::{InvestmentSeries, ReturnSeries, TimeSeries};
use crate::error::SimError;

/// Where the starting amount sits relative to the return series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// The first return date holds the starting amount; its return is not applied.
    FirstReturn,
    /// The starting amount sits on an earlier date and every return is applied.
    Before(NaiveDate),
}

/// Left fold `value[d] = value[prev] * (1 + r[d])`, in date order.
///
/// A return of -100% or worse drives the position to zero or below. From then
/// on the position is gone: later dates carry the same non-positive value.
///
/// Empty returns give an empty series for either anchor.
pub fn compound(
    returns: &ReturnSeries,
    starting_amount: f64,
    anchor: Anchor,
) -> Result<InvestmentSeries, SimError> {
    if !(starting_amount.is_finite() && starting_amount > 0.0) {
        return Err(SimError::invalid(
            "starting_amount",
            format!("{starting_amount} (must be > 0)"),
        ));
    }

    let points = returns.points();
    let Some(&(first_date, _)) = points.first() else {
        return Ok(TimeSeries::empty());
    };
    let mut out = Vec::with_capacity(points.len() + 1);

    let rest = match anchor {
        Anchor::FirstReturn => {
            out.push((first_date, starting_amount));
            &points[1..]
        }
        Anchor::Before(date) => {
            if date >= first_date {
                return Err(SimError::invalid(
                    "anchor",
                    format!("{date} must precede the first return date {first_date}"),
                ));
            }
            out.push((date, starting_amount));
            points
        }
    };

    let mut value = starting_amount;
    let mut ruined = false;
    for &(date, r) in rest {
        if !ruined {
            value *= 1.0 + r;
            if value <= 0.0 {
                ruined = true;
                warn!(%date, daily_return = r, value, "position wiped out");
            }
        }
        out.push((date, value));
    }

    Ok(TimeSeries::from_ordered(out))
}
