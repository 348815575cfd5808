//! Rate normalization: raw benchmark-rate table to per-entry financing cost.
//!
//! Short-term rates are published on business days only. A rate published on a
//! Monday accrues over Saturday and Sunday too, so each entry is scaled by the
//! number of calendar days since the previous published entry.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use tracing::debug;

use crate::domain::{
    AVG_TRADING_DAYS_PER_YEAR, DayCount, FinancingCostSeries, RateSeries, RawRateRow, TimeSeries,
};

/// Parse a published rate value. Placeholders (`"."`, blanks) and non-finite
/// numbers yield `None`.
pub fn parse_rate_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed == "." || trimmed.is_empty() {
        return None;
    }
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Numeric rate series from raw rows. Unparseable rows are skipped; if a date
/// appears twice the later row wins.
pub fn parse_rate_table(rows: &[RawRateRow]) -> RateSeries {
    let mut by_date = BTreeMap::new();
    let mut skipped = 0usize;
    for row in rows {
        match parse_rate_value(&row.value) {
            Some(v) => {
                by_date.insert(row.date, v);
            }
            None => skipped += 1,
        }
    }
    debug!(rows = rows.len(), skipped, kept = by_date.len(), "parsed rate table");
    TimeSeries::from_ordered(by_date.into_iter().collect())
}

/// `rate[d] * (d - d_prev)` in calendar days, `d_prev` being the previous entry.
///
/// The first entry has no predecessor; it accrues from the previous business
/// day instead (3 days on a Monday, 1 otherwise).
pub fn financing_costs(rates: &RateSeries) -> FinancingCostSeries {
    let mut prev: Option<NaiveDate> = None;
    rates.map_with_date(|date, rate| {
        let delta_days = match prev {
            Some(p) => (date - p).num_days(),
            None => days_since_previous_business_day(date),
        };
        prev = Some(date);
        rate * delta_days as f64
    })
}

/// Filter placeholders, then scale by calendar-day gaps.
pub fn normalize_rates(rows: &[RawRateRow]) -> FinancingCostSeries {
    financing_costs(&parse_rate_table(rows))
}

/// Convert percent-day contributions into the decimal unit consumed by
/// [`crate::sim::leveraged_returns`], whose `/252` then yields
/// `rate * days / day_count.year_denominator()`.
pub fn daily_fraction(costs: &FinancingCostSeries, day_count: DayCount) -> FinancingCostSeries {
    let scale = AVG_TRADING_DAYS_PER_YEAR / (100.0 * day_count.year_denominator());
    costs.map(|v| v * scale)
}

fn days_since_previous_business_day(date: NaiveDate) -> i64 {
    match date.weekday() {
        Weekday::Mon => 3,
        Weekday::Sun => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekend_gap_triples_monday_contribution() {
        // 2021-08-27 is a Friday, 2021-08-30 the following Monday.
        let rows = vec![
            RawRateRow::new(date(2021, 8, 27), "1.0"),
            RawRateRow::new(date(2021, 8, 30), "1.0"),
        ];
        let costs = normalize_rates(&rows);
        assert_eq!(costs.get(date(2021, 8, 30)), Some(&3.0));
        // Friday's predecessor business day is Thursday.
        assert_eq!(costs.get(date(2021, 8, 27)), Some(&1.0));
    }

    #[test]
    fn placeholders_are_dropped_before_differencing() {
        // Monday 2021-09-06 (Labor Day) is published as ".".
        let rows = vec![
            RawRateRow::new(date(2021, 9, 3), "0.08"),
            RawRateRow::new(date(2021, 9, 6), "."),
            RawRateRow::new(date(2021, 9, 7), "0.09"),
        ];
        let costs = normalize_rates(&rows);
        assert_eq!(costs.len(), 2);
        assert!(costs.get(date(2021, 9, 6)).is_none());
        let tue = *costs.get(date(2021, 9, 7)).unwrap();
        assert!((tue - 0.09 * 4.0).abs() < 1e-12);
    }

    #[test]
    fn empty_table_yields_empty_series() {
        assert!(normalize_rates(&[]).is_empty());
        assert!(normalize_rates(&[RawRateRow::new(date(2021, 1, 4), ".")]).is_empty());
    }

    #[test]
    fn parse_rate_value_rejects_sentinels() {
        assert_eq!(parse_rate_value(" 1.25 "), Some(1.25));
        assert_eq!(parse_rate_value("."), None);
        assert_eq!(parse_rate_value(""), None);
        assert_eq!(parse_rate_value("NaN"), None);
        assert_eq!(parse_rate_value("abc"), None);
    }

    #[test]
    fn daily_fraction_uses_day_count() {
        let costs = TimeSeries::new(vec![(date(2021, 8, 30), 3.6)]).unwrap();
        let act360 = daily_fraction(&costs, DayCount::Act360);
        let v = *act360.get(date(2021, 8, 30)).unwrap();
        // After the synthesizer's /252 this is 3.6% * 1 / 360.
        assert!((v / AVG_TRADING_DAYS_PER_YEAR - 0.036 / 360.0).abs() < 1e-15);
    }
}
