//! Simple daily returns from a price series.

use crate::domain::{FirstObservation, PriceSeries, ReturnSeries, TimeSeries};
use crate::error::SimError;

/// `price[d] / price[prev] - 1` where `prev` is the previous entry of the series.
///
/// With `FirstObservation::Keep` the first date is retained as `None`. Series
/// with fewer than two entries produce an empty result either way.
pub fn daily_returns(
    prices: &PriceSeries,
    first: FirstObservation,
) -> Result<TimeSeries<Option<f64>>, SimError> {
    if let Some((date, price)) = prices.iter().find(|(_, p)| !(p.is_finite() && *p > 0.0)) {
        return Err(SimError::invalid(
            "price",
            format!("{price} on {date} (prices must be finite and > 0)"),
        ));
    }
    if prices.len() < 2 {
        return Ok(TimeSeries::empty());
    }

    let points = prices.points();
    let mut out = Vec::with_capacity(points.len());
    if first == FirstObservation::Keep {
        out.push((points[0].0, None));
    }
    for w in points.windows(2) {
        let (_, prev) = w[0];
        let (date, curr) = w[1];
        out.push((date, Some(curr / prev - 1.0)));
    }

    Ok(TimeSeries::from_ordered(out))
}

/// Daily returns with the first date dropped.
pub fn simple_returns(prices: &PriceSeries) -> Result<ReturnSeries, SimError> {
    Ok(daily_returns(prices, FirstObservation::Drop)?.flatten())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn prices(values: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2021, 1, 4).unwrap();
        TimeSeries::new(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| (start + chrono::Duration::days(i as i64), v))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn returns_match_known_values() {
        let r = simple_returns(&prices(&[100.0, 102.0, 101.0, 105.0])).unwrap();
        let v: Vec<f64> = r.values().copied().collect();
        assert_eq!(v.len(), 3);
        assert!((v[0] - 0.02).abs() < 1e-12);
        assert!((v[1] - (-0.009_803_921_568_627_4)).abs() < 1e-12);
        assert!((v[2] - 0.039_603_960_396_039_6).abs() < 1e-12);
    }

    #[test]
    fn keep_retains_first_date_as_missing() {
        let p = prices(&[100.0, 110.0]);
        let r = daily_returns(&p, FirstObservation::Keep).unwrap();
        assert_eq!(r.len(), 2);
        assert_eq!(r.points()[0].1, None);
        assert_eq!(r.first_date(), p.first_date());
    }

    #[test]
    fn short_series_yield_empty_results() {
        assert!(simple_returns(&prices(&[])).unwrap().is_empty());
        assert!(simple_returns(&prices(&[100.0])).unwrap().is_empty());
        assert!(
            daily_returns(&prices(&[100.0]), FirstObservation::Keep)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn non_positive_price_is_rejected() {
        let err = simple_returns(&prices(&[100.0, 0.0, 101.0])).unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter { name: "price", .. }));
    }
}
