//! Date-indexed series.
//!
//! Every stage of the simulation consumes and produces a `TimeSeries`: an ordered
//! list of `(date, value)` pairs with strictly increasing, unique dates. Gaps
//! (weekends, holidays, missing feed days) are allowed and never filled.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries<T> {
    points: Vec<(NaiveDate, T)>,
}

/// Adjusted closing prices, one entry per trading day. Values must be > 0.
pub type PriceSeries = TimeSeries<f64>;
/// Annualized short-term rate in percent (1.5 means 1.5%).
pub type RateSeries = TimeSeries<f64>;
/// Rate accrued since the previous published entry, in percent-days.
pub type FinancingCostSeries = TimeSeries<f64>;
/// Fractional day-over-day change (0.01 means +1%).
pub type ReturnSeries = TimeSeries<f64>;
/// Compounded value of a hypothetical position.
pub type InvestmentSeries = TimeSeries<f64>;
/// Fractional decline from the running peak (always <= 0).
pub type DrawdownSeries = TimeSeries<f64>;

impl<T> Default for TimeSeries<T> {
    fn default() -> Self {
        Self { points: Vec::new() }
    }
}

impl<T> TimeSeries<T> {
    /// Build a series from points that must already be in strictly increasing date order.
    pub fn new(points: Vec<(NaiveDate, T)>) -> Result<Self, SimError> {
        for w in points.windows(2) {
            let (prev, next) = (w[0].0, w[1].0);
            if prev == next {
                return Err(SimError::DuplicateDate(next));
            }
            if prev > next {
                return Err(SimError::Unordered { prev, next });
            }
        }
        Ok(Self { points })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Internal constructor for transforms that preserve the order of an existing series.
    pub(crate) fn from_ordered(points: Vec<(NaiveDate, T)>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].0 < w[1].0));
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[(NaiveDate, T)] {
        &self.points
    }

    pub fn into_points(self) -> Vec<(NaiveDate, T)> {
        self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (NaiveDate, T)> {
        self.points.iter()
    }

    pub fn first(&self) -> Option<&(NaiveDate, T)> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&(NaiveDate, T)> {
        self.points.last()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|(d, _)| *d)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|(d, _)| *d)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|(d, _)| *d)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.points.iter().map(|(_, v)| v)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&T> {
        self.points
            .binary_search_by_key(&date, |(d, _)| *d)
            .ok()
            .map(|idx| &self.points[idx].1)
    }

    /// Last date strictly before `date`, if any.
    pub fn date_before(&self, date: NaiveDate) -> Option<NaiveDate> {
        let idx = self.points.partition_point(|(d, _)| *d < date);
        idx.checked_sub(1).map(|i| self.points[i].0)
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> TimeSeries<U> {
        TimeSeries::from_ordered(self.points.iter().map(|(d, v)| (*d, f(v))).collect())
    }

    pub fn map_with_date<U>(&self, mut f: impl FnMut(NaiveDate, &T) -> U) -> TimeSeries<U> {
        TimeSeries::from_ordered(self.points.iter().map(|(d, v)| (*d, f(*d, v))).collect())
    }
}

impl<T: Clone> TimeSeries<T> {
    /// Entries with `start <= date <= end`; open bounds are unbounded.
    pub fn between(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let lo = start.map_or(0, |s| self.points.partition_point(|(d, _)| *d < s));
        let hi = end.map_or(self.points.len(), |e| self.points.partition_point(|(d, _)| *d <= e));
        if lo >= hi {
            return Self::empty();
        }
        Self::from_ordered(self.points[lo..hi].to_vec())
    }

    /// Inner join on dates. Dates present in only one series are dropped.
    pub fn intersect_with<U: Clone>(&self, other: &TimeSeries<U>) -> TimeSeries<(T, U)> {
        let mut out = Vec::with_capacity(self.len().min(other.len()));
        let (mut i, mut j) = (0, 0);
        while i < self.points.len() && j < other.points.len() {
            let (da, a) = &self.points[i];
            let (db, b) = &other.points[j];
            match da.cmp(db) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    out.push((*da, (a.clone(), b.clone())));
                    i += 1;
                    j += 1;
                }
            }
        }
        TimeSeries::from_ordered(out)
    }
}

impl<T> TimeSeries<Option<T>> {
    /// Drop missing entries.
    pub fn flatten(self) -> TimeSeries<T> {
        TimeSeries::from_ordered(
            self.points
                .into_iter()
                .filter_map(|(d, v)| v.map(|v| (d, v)))
                .collect(),
        )
    }
}

impl<'a, T> IntoIterator for &'a TimeSeries<T> {
    type Item = &'a (NaiveDate, T);
    type IntoIter = std::slice::Iter<'a, (NaiveDate, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
