//! Numerical helpers shared by the analysis code.

pub mod ols;

pub use ols::*;
