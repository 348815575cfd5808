//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Each series is drawn as a connected line with its own glyph. Series are drawn
//! in order and earlier ones win where lines overlap, so pass the most
//! important series first.

use chrono::NaiveDate;

use crate::domain::{DrawdownSeries, TimeSeries};

/// One line on the plot.
pub struct PlotLine<'a> {
    pub label: &'a str,
    pub glyph: char,
    pub series: &'a TimeSeries<f64>,
}

/// Render value series against calendar time.
///
/// With `log_scale`, values are plotted as `ln(v)` and non-positive values are
/// skipped; long leveraged histories are unreadable on a linear axis.
pub fn render_ascii_plot(lines: &[PlotLine<'_>], width: usize, height: usize, log_scale: bool) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let transform = |v: f64| if log_scale { v.ln() } else { v };
    let projected: Vec<Vec<(NaiveDate, f64)>> = lines
        .iter()
        .map(|line| {
            line.series
                .iter()
                .filter(|(_, v)| !log_scale || *v > 0.0)
                .map(|&(d, v)| (d, transform(v)))
                .filter(|(_, y)| y.is_finite())
                .collect()
        })
        .collect();

    let Some((d_min, d_max)) = date_range(&projected) else {
        return "Plot: no data\n".to_string();
    };
    let x_span = ((d_max - d_min).num_days() as f64).max(1.0);

    let (y_min, y_max) = y_range(&projected).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    for (line, points) in lines.iter().zip(&projected) {
        let cells: Vec<(usize, usize)> = points
            .iter()
            .map(|&(d, y)| {
                let x = (d - d_min).num_days() as f64;
                (map_x(x, 0.0, x_span, width), map_y(y, y_min, y_max, height))
            })
            .collect();
        draw_polyline(&mut grid, &cells, line.glyph);
    }

    let (lo, hi) = if log_scale {
        (y_min.exp(), y_max.exp())
    } else {
        (y_min, y_max)
    };
    let scale = if log_scale { " (log)" } else { "" };

    let mut out = String::new();
    out.push_str(&format!("Plot: {d_min} -> {d_max} | y=[{lo:.4}, {hi:.4}]{scale}\n"));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    let legend: Vec<String> = lines.iter().map(|l| format!("{} {}", l.glyph, l.label)).collect();
    out.push_str(&format!("legend: {}\n", legend.join("  ")));

    out
}

/// Render a drawdown series (fractions <= 0) on a linear axis.
pub fn render_drawdown_plot(drawdown: &DrawdownSeries, width: usize, height: usize) -> String {
    let line = PlotLine {
        label: "drawdown",
        glyph: '.',
        series: drawdown,
    };
    render_ascii_plot(&[line], width, height, false)
}

fn date_range(series: &[Vec<(NaiveDate, f64)>]) -> Option<(NaiveDate, NaiveDate)> {
    let min = series.iter().filter_map(|s| s.first().map(|p| p.0)).min()?;
    let max = series.iter().filter_map(|s| s.last().map(|p| p.0)).max()?;
    Some((min, max))
}

fn y_range(series: &[Vec<(NaiveDate, f64)>]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in series.iter().flatten() {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else if min_y.is_finite() {
        // Flat series: center it.
        Some((min_y - 0.5, min_y + 0.5))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_polyline(grid: &mut [Vec<char>], cells: &[(usize, usize)], ch: char) {
    let mut prev = None;
    for &(x, y) in cells {
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, x, y, ch),
            None => draw_line(grid, x, y, x, y, ch),
        }
        prev = Some((x, y));
    }
}

/// Integer line drawing (Bresenham-ish). Occupied cells are left alone.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, day).unwrap()
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let sim = TimeSeries::new(vec![(d(1), 1.0), (d(10), 2.0)]).unwrap();
        let line = PlotLine {
            label: "sim",
            glyph: '*',
            series: &sim,
        };

        let txt = render_ascii_plot(&[line], 10, 5, false);
        let expected = concat!(
            "Plot: 2021-03-01 -> 2021-03-10 | y=[0.9500, 2.0500]\n",
            "        **\n",
            "      **  \n",
            "    **    \n",
            "  **      \n",
            "**        \n",
            "legend: * sim\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn earlier_series_win_overlaps() {
        let sim = TimeSeries::new(vec![(d(1), 1.0), (d(10), 2.0)]).unwrap();
        let actual = sim.clone();
        let txt = render_ascii_plot(
            &[
                PlotLine { label: "sim", glyph: '*', series: &sim },
                PlotLine { label: "actual", glyph: 'o', series: &actual },
            ],
            10,
            5,
            false,
        );
        assert!(!txt.lines().skip(1).take(5).any(|row| row.contains('o')));
        assert!(txt.ends_with("legend: * sim  o actual\n"));
    }

    #[test]
    fn log_scale_skips_non_positive_values() {
        let ruined = TimeSeries::new(vec![(d(1), 1.0), (d(2), 4.0), (d(3), 0.0)]).unwrap();
        let line = PlotLine {
            label: "sim",
            glyph: '*',
            series: &ruined,
        };
        let txt = render_ascii_plot(&[line], 20, 6, true);
        assert!(txt.starts_with("Plot: 2021-03-01 -> 2021-03-02"));
        assert!(txt.lines().next().unwrap().ends_with("(log)"));
    }

    #[test]
    fn empty_input_is_reported() {
        let empty = TimeSeries::empty();
        let txt = render_drawdown_plot(&empty, 20, 6);
        assert_eq!(txt, "Plot: no data\n");
    }
}
