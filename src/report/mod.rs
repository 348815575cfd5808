//! Reporting utilities: run summaries, tracking comparison and sweep tables.

pub mod format;

pub use format::{format_run_summary, format_sweep, format_tracking};
