//! Leveraged daily return synthesis.
//!
//! A daily-reset leveraged fund returns `L` times the index move, minus a
//! daily slice of its expense ratio, minus the cost of borrowing the extra
//! `L - 1` units of notional:
//!
//! ```text
//! r_lev[d] = L * r_idx[d] - ER / 252 - (L - 1) * financing[d] / 252
//! ```

use rayon::prelude::*;
use tracing::debug;

use crate::domain::{AVG_TRADING_DAYS_PER_YEAR, FinancingCostSeries, ReturnSeries, TimeSeries};
use crate::error::SimError;

/// Above this many aligned rows the per-date arithmetic is spread over rayon.
const PARALLEL_THRESHOLD: usize = 8192;

/// Leverage and cost parameters of a fund.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeverageParams {
    pub leverage: f64,
    /// Annual expense ratio as a decimal fraction.
    pub expense_ratio: f64,
}

impl LeverageParams {
    pub fn new(leverage: f64, expense_ratio: f64) -> Result<Self, SimError> {
        if !(leverage.is_finite() && leverage >= 1.0) {
            return Err(SimError::invalid("leverage", format!("{leverage} (must be >= 1)")));
        }
        if !(expense_ratio.is_finite() && expense_ratio >= 0.0) {
            return Err(SimError::invalid(
                "expense_ratio",
                format!("{expense_ratio} (must be >= 0)"),
            ));
        }
        Ok(Self {
            leverage,
            expense_ratio,
        })
    }

    fn apply(&self, index_return: f64, financing: f64) -> f64 {
        let l = self.leverage;
        l * index_return
            - self.expense_ratio / AVG_TRADING_DAYS_PER_YEAR
            - (l - 1.0) * financing / AVG_TRADING_DAYS_PER_YEAR
    }
}

/// Combine index returns with financing costs (decimal daily fraction).
///
/// Only dates present in both inputs are kept; rows with a non-finite operand
/// are dropped rather than zero-filled.
pub fn leveraged_returns(
    index_returns: &ReturnSeries,
    financing: &FinancingCostSeries,
    params: LeverageParams,
) -> ReturnSeries {
    let aligned: Vec<_> = index_returns
        .intersect_with(financing)
        .into_points()
        .into_iter()
        .filter(|(_, (r, f))| r.is_finite() && f.is_finite())
        .collect();

    debug!(
        index_rows = index_returns.len(),
        financing_rows = financing.len(),
        aligned = aligned.len(),
        "aligned index returns with financing"
    );

    let points = if aligned.len() >= PARALLEL_THRESHOLD {
        aligned
            .into_par_iter()
            .map(|(d, (r, f))| (d, params.apply(r, f)))
            .collect()
    } else {
        aligned
            .into_iter()
            .map(|(d, (r, f))| (d, params.apply(r, f)))
            .collect()
    };

    TimeSeries::from_ordered(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn series(start_day: i64, values: &[f64]) -> TimeSeries<f64> {
        let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        TimeSeries::new(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| (base + Duration::days(start_day + i as i64), v))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn unit_leverage_without_costs_is_identity() {
        let idx = series(0, &[0.01, -0.02, 0.005]);
        let fin = series(0, &[0.5, 0.7, 0.9]);
        let out = leveraged_returns(&idx, &fin, LeverageParams::new(1.0, 0.0).unwrap());
        assert_eq!(out, idx);
    }

    #[test]
    fn three_x_with_zero_rate_matches_known_values() {
        let idx = series(1, &[0.02, -1.0 / 102.0, 4.0 / 101.0]);
        let fin = series(1, &[0.0, 0.0, 0.0]);
        let out = leveraged_returns(&idx, &fin, LeverageParams::new(3.0, 0.0).unwrap());
        let v: Vec<f64> = out.values().copied().collect();
        assert!((v[0] - 0.06).abs() < 1e-12);
        assert!((v[1] - (-0.02941)).abs() < 1e-5);
        assert!((v[2] - 0.11881).abs() < 1e-5);
    }

    #[test]
    fn costs_are_pro_rated_per_trading_day() {
        let idx = series(0, &[0.0]);
        let fin = series(0, &[0.252]);
        let out = leveraged_returns(&idx, &fin, LeverageParams::new(3.0, 0.0252).unwrap());
        // -0.0252/252 - 2 * 0.252/252
        let expected = -0.0001 - 0.002;
        assert!((out.points()[0].1 - expected).abs() < 1e-15);
    }

    #[test]
    fn only_common_finite_dates_survive() {
        let idx = series(0, &[0.01, f64::NAN, 0.02, 0.03]);
        let fin = series(1, &[0.0, 0.0, 0.0, 0.0]);
        let out = leveraged_returns(&idx, &fin, LeverageParams::new(2.0, 0.0).unwrap());
        assert_eq!(out.len(), 2);
        assert!((out.points()[0].1 - 0.04).abs() < 1e-12);
        assert!((out.points()[1].1 - 0.06).abs() < 1e-12);
    }

    #[test]
    fn disjoint_inputs_produce_empty_output() {
        let idx = series(0, &[0.01, 0.02]);
        let fin = series(10, &[0.0, 0.0]);
        let out = leveraged_returns(&idx, &fin, LeverageParams::new(3.0, 0.0).unwrap());
        assert!(out.is_empty());
    }

    #[test]
    fn parallel_path_matches_sequential_order() {
        let n = PARALLEL_THRESHOLD + 10;
        let values: Vec<f64> = (0..n).map(|i| (i as f64 * 0.37).sin() * 0.01).collect();
        let idx = series(0, &values);
        let fin = series(0, &vec![1.0; n]);
        let params = LeverageParams::new(2.0, 0.01).unwrap();
        let out = leveraged_returns(&idx, &fin, params);
        assert_eq!(out.len(), n);
        for ((d_out, v_out), (d_in, v_in)) in out.iter().zip(idx.iter()) {
            assert_eq!(d_out, d_in);
            assert_eq!(*v_out, params.apply(*v_in, 1.0));
        }
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(LeverageParams::new(0.5, 0.0).is_err());
        assert!(LeverageParams::new(f64::NAN, 0.0).is_err());
        assert!(LeverageParams::new(3.0, -0.01).is_err());
    }
}
