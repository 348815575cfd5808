//! `letf-sim` library crate.
//!
//! The binary (`letf`) is a thin wrapper around this library so that:
//!
//! - the simulation core is testable without spawning processes
//! - data adapters and front-ends stay swappable
//! - code stays easy to navigate as the project grows

pub mod analysis;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod math;
pub mod plot;
pub mod report;
pub mod sim;
pub mod tui;
