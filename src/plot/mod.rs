//! Terminal plots.

pub mod ascii;

pub use ascii::{PlotLine, render_ascii_plot, render_drawdown_plot};
