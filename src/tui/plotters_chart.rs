//! Plotters-powered value/drawdown chart widget for Ratatui.
//!
//! Why Plotters instead of Ratatui's built-in `Chart` widget?
//! - nicer axis + mesh rendering
//! - less manual work for ticks/labels
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A lightweight, render-only chart description.
///
/// All series and bounds are computed outside the render call; x values are
/// days since the first simulated date.
pub struct LetfPlottersChart<'a> {
    /// Simulated value, or drawdown in the drawdown view.
    pub primary: &'a [(f64, f64)],
    /// Rebased actual fund value (empty when unavailable or in drawdown view).
    pub secondary: &'a [(f64, f64)],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    /// Draw the primary series in the drawdown palette.
    pub drawdown: bool,
}

impl<'a> Widget for LetfPlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Tick labels are drawn by the caller with Ratatui text, which reads
            // better in a terminal than Plotters' font rendering.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .axis_style(&WHITE)
                .draw()?;

            let sim_color = RGBColor(0, 255, 255); // cyan
            let actual_color = WHITE;
            let drawdown_color = RGBColor(255, 0, 0); // red

            // Actual first so the simulated line stays on top where they overlap.
            if !self.secondary.is_empty() {
                chart.draw_series(LineSeries::new(self.secondary.iter().copied(), &actual_color))?;
            }
            let primary_color = if self.drawdown { drawdown_color } else { sim_color };
            chart.draw_series(LineSeries::new(self.primary.iter().copied(), &primary_color))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
