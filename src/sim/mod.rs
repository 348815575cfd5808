//! Leveraged-return reconstruction and compounding.
//!
//! Stages, in pipeline order:
//!
//! - `returns`: prices to simple daily returns
//! - `rates`: raw rate table to calendar-day-scaled financing cost
//! - `leverage`: index returns + financing to leveraged fund returns
//! - `compound`: returns to an investment value series
//!
//! Everything here is pure; only `compound` depends on date order.

pub mod compound;
pub mod leverage;
pub mod rates;
pub mod returns;

pub use compound::{Anchor, compound};
pub use leverage::{LeverageParams, leveraged_returns};
pub use rates::{daily_fraction, financing_costs, normalize_rates, parse_rate_table, parse_rate_value};
pub use returns::{daily_returns, simple_returns};
