//! Market data sources.
//!
//! The simulation only needs two inputs: an index price series and a raw
//! benchmark-rate table. Each source implements one (or both) of the traits
//! below so the pipeline does not care whether data comes from HTTP, a CSV
//! export or the synthetic generator.

use chrono::NaiveDate;

use crate::domain::{PriceSeries, RawRateRow};
use crate::error::AppError;

pub mod fred;
pub mod sample;
pub mod yahoo;

pub use fred::FredClient;
pub use sample::SyntheticMarket;
pub use yahoo::YahooClient;

/// Daily adjusted closing prices for a ticker.
pub trait PriceSource {
    fn fetch_prices(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<PriceSeries, AppError>;
}

/// Published benchmark-rate observations, placeholders included.
pub trait RateSource {
    fn fetch_rates(
        &self,
        series_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<RawRateRow>, AppError>;
}
