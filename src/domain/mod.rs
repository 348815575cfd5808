//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the date-indexed series every stage passes along (`TimeSeries`)
//! - run configuration (`SimConfig`, `DayCount`, `FundPreset`)
//! - summary outputs (`SimulationSummary`, `MaxDrawdown`)

pub mod series;
pub mod types;

pub use series::*;
pub use types::*;
