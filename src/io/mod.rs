//! Input/output helpers.
//!
//! - CSV ingest for prices and FRED rate downloads (`ingest`)
//! - result exports (CSV/JSON) (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
