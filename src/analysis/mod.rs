//! Read-only statistics over computed series: drawdown, CAGR, tracking.

pub mod drawdown;
pub mod tracking;

pub use drawdown::{cagr, drawdown_series, max_drawdown, total_return};
pub use tracking::{TrackingReport, compare, rebase_to};
