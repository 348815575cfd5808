//! Ratatui-based terminal UI.
//!
//! Shows the simulated value (and the rebased actual fund, when available) or
//! the drawdown curve. Market data is fetched once by the caller; changing the
//! leverage, expense ratio or day count reruns the pipeline locally.

use std::io;
use std::time::Duration;

use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::app::pipeline::{SimulationInputs, SimulationRun, run_simulation};
use crate::domain::{DayCount, SimConfig};
use crate::error::AppError;

mod plotters_chart;

use plotters_chart::LetfPlottersChart;

const LEVERAGE_STEP: f64 = 0.5;
const EXPENSE_STEP: f64 = 0.001;

/// Start the TUI with pre-fetched inputs.
pub fn run(config: SimConfig, inputs: SimulationInputs, actual_label: Option<String>) -> Result<(), AppError> {
    let mut app = App::new(config, inputs, actual_label);

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Value,
    Drawdown,
}

struct App {
    config: SimConfig,
    inputs: SimulationInputs,
    actual_label: Option<String>,
    view: View,
    log_scale: bool,
    status: String,
    run: Option<SimulationRun>,
}

impl App {
    fn new(config: SimConfig, inputs: SimulationInputs, actual_label: Option<String>) -> Self {
        let mut app = Self {
            config,
            inputs,
            actual_label,
            view: View::Value,
            log_scale: true,
            status: String::new(),
            run: None,
        };
        app.rerun();
        app
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('l') => {
                self.log_scale = !self.log_scale;
                self.status = format!("log scale: {}", if self.log_scale { "on" } else { "off" });
            }
            KeyCode::Char('d') => {
                self.view = match self.view {
                    View::Value => View::Drawdown,
                    View::Drawdown => View::Value,
                };
                self.status = format!("view: {:?}", self.view).to_lowercase();
            }
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Right => {
                self.config.leverage += LEVERAGE_STEP;
                self.rerun();
            }
            KeyCode::Char('-') | KeyCode::Left => {
                self.config.leverage = (self.config.leverage - LEVERAGE_STEP).max(1.0);
                self.rerun();
            }
            KeyCode::Char(']') | KeyCode::Up => {
                self.config.expense_ratio += EXPENSE_STEP;
                self.rerun();
            }
            KeyCode::Char('[') | KeyCode::Down => {
                self.config.expense_ratio = (self.config.expense_ratio - EXPENSE_STEP).max(0.0);
                self.rerun();
            }
            KeyCode::Char('c') => {
                self.config.day_count = match self.config.day_count {
                    DayCount::Act360 => DayCount::Act365,
                    DayCount::Act365 => DayCount::Act360,
                };
                self.rerun();
            }
            _ => {}
        }
        false
    }

    fn rerun(&mut self) {
        match run_simulation(&self.config, &self.inputs) {
            Ok(run) => {
                self.status = match (run.summary.is_degenerate(), run.summary.cagr) {
                    (true, _) => "No overlapping dates; nothing to simulate.".to_string(),
                    (false, Some(cagr)) => format!("CAGR {:.2}%", cagr * 100.0),
                    (false, None) => "CAGR n/a".to_string(),
                };
                self.run = Some(run);
            }
            Err(err) => {
                self.status = format!("Simulation failed: {err}");
                self.run = None;
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_chart(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("letf", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" - {}", self.config.label)),
        ]));

        lines.push(Line::from(Span::styled(
            format!(
                "leverage: {:.1}x | expense ratio: {:.2}% | day count: {:?} | amount: {}",
                self.config.leverage,
                self.config.expense_ratio * 100.0,
                self.config.day_count,
                self.config.starting_amount,
            ),
            Style::default().fg(Color::Gray),
        )));

        if let Some(run) = &self.run {
            let s = &run.summary;
            let mut text = format!(
                "{} -> {} | final: {} | CAGR: {} | max DD: {}",
                fmt_opt_date(s.start),
                fmt_opt_date(s.end),
                s.final_value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}")),
                fmt_opt_pct(s.cagr),
                fmt_opt_pct(s.max_drawdown.map(|m| m.depth)),
            );
            if let (Some(t), Some(label)) = (&run.tracking, &self.actual_label) {
                text.push_str(&format!(
                    " | {label} CAGR: {:.2}% | TE: {:.2}%",
                    t.actual_cagr * 100.0,
                    t.tracking_error * 100.0
                ));
            }
            lines.push(Line::from(Span::styled(text, Style::default().fg(Color::Gray))));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = match (self.view, self.log_scale) {
            (View::Drawdown, _) => "Drawdown",
            (View::Value, true) => "Value (log)",
            (View::Value, false) => "Value",
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(data) = self.run.as_ref().and_then(|run| chart_series(run, self.view, self.log_scale)) else {
            let msg = Paragraph::new("No data to plot.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let (chart_rect, insets) = chart_layout(inner);
        let widget = LetfPlottersChart {
            primary: &data.primary,
            secondary: &data.secondary,
            x_bounds: data.x_bounds,
            y_bounds: data.y_bounds,
            drawdown: self.view == View::Drawdown,
        };
        frame.render_widget(widget, chart_rect);

        if let Some(insets) = insets {
            let fmt_y: fn(f64) -> String = match (self.view, self.log_scale) {
                (View::Drawdown, _) => |v| format!("{:.0}%", v * 100.0),
                (View::Value, true) => |v| format!("{:.2}", v.exp()),
                (View::Value, false) => |v| format!("{v:.2}"),
            };
            draw_axis_ticks(frame, inner, chart_rect, insets, &data, fmt_y);
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "+/- leverage  [/] expense  c day count  l log  d drawdown  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Series and bounds prepared for the chart widget.
#[derive(Debug, Clone, PartialEq)]
struct ChartData {
    origin: NaiveDate,
    primary: Vec<(f64, f64)>,
    secondary: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

/// Build chart series for Plotters. `None` when there is nothing to draw.
fn chart_series(run: &SimulationRun, view: View, log_scale: bool) -> Option<ChartData> {
    let origin = run.investment.first_date()?;
    let x = |d: NaiveDate| (d - origin).num_days() as f64;
    let project = |series: &crate::domain::TimeSeries<f64>, log: bool| -> Vec<(f64, f64)> {
        series
            .iter()
            .filter(|(_, v)| !log || *v > 0.0)
            .map(|&(d, v)| (x(d), if log { v.ln() } else { v }))
            .filter(|(_, y)| y.is_finite())
            .collect()
    };

    let (primary, secondary) = match view {
        View::Value => (
            project(&run.investment, log_scale),
            run.actual_rebased
                .as_ref()
                .map(|a| project(a, log_scale))
                .unwrap_or_default(),
        ),
        View::Drawdown => (project(&run.drawdown, false), Vec::new()),
    };
    if primary.is_empty() {
        return None;
    }

    let x_max = run.investment.last_date().map_or(1.0, x).max(1.0);

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in primary.iter().chain(&secondary) {
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if y_max <= y_min {
        y_min -= 0.5;
        y_max += 0.5;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);

    Some(ChartData {
        origin,
        primary,
        secondary,
        x_bounds: [0.0, x_max],
        y_bounds: [y_min - pad, y_max + pad],
    })
}

fn fmt_opt_pct(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{:.2}%", v * 100.0))
}

fn fmt_opt_date(d: Option<NaiveDate>) -> String {
    d.map_or_else(|| "-".to_string(), |d| d.to_string())
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 9,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    data: &ChartData,
    fmt_y: fn(f64) -> String,
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);
    let [x0, x1] = data.x_bounds;
    let [y0, y1] = data.y_bounds;

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let days = (x0 + u * (x1 - x0)).round() as i64;
        let label = (data.origin + chrono::Duration::days(days)).format("%Y-%m").to_string();
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label_len = label.len() as u16;
        let start = x
            .saturating_sub(label_len / 2)
            .min((inner.x + inner.width).saturating_sub(label_len));
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let label = fmt_y(y0 + u * (y1 - y0));
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("date")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new("value")
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RawRateRow, TimeSeries};

    fn inputs() -> SimulationInputs {
        let dates: Vec<NaiveDate> = (1..=5)
            .map(|day| NaiveDate::from_ymd_opt(2021, 3, day).unwrap())
            .collect();
        let prices = [100.0, 110.0, 90.0, 95.0, 120.0];
        SimulationInputs {
            index_prices: TimeSeries::new(dates.iter().copied().zip(prices).collect()).unwrap(),
            raw_rates: dates.iter().map(|&d| RawRateRow::new(d, "1.0")).collect(),
            actual: None,
        }
    }

    #[test]
    fn leverage_keys_rerun_without_refetching() {
        let mut app = App::new(SimConfig::default(), inputs(), None);
        let before = app.run.as_ref().unwrap().summary.final_value.unwrap();

        assert!(!app.handle_key(KeyCode::Char('-')));
        assert_eq!(app.config.leverage, 2.5);
        let after = app.run.as_ref().unwrap().summary.final_value.unwrap();
        assert_ne!(before, after);

        for _ in 0..10 {
            app.handle_key(KeyCode::Char('-'));
        }
        assert_eq!(app.config.leverage, 1.0);
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn view_toggles() {
        let mut app = App::new(SimConfig::default(), inputs(), None);
        app.handle_key(KeyCode::Char('d'));
        assert_eq!(app.view, View::Drawdown);
        app.handle_key(KeyCode::Char('l'));
        assert!(!app.log_scale);
        app.handle_key(KeyCode::Char('c'));
        assert_eq!(app.config.day_count, DayCount::Act365);
    }

    #[test]
    fn chart_series_projects_days_and_log_values() {
        let app = App::new(SimConfig::default(), inputs(), None);
        let run = app.run.as_ref().unwrap();

        let data = chart_series(run, View::Value, true).unwrap();
        assert_eq!(data.primary.len(), run.investment.len());
        assert_eq!(data.primary[0], (0.0, 0.0));
        assert_eq!(data.x_bounds, [0.0, 4.0]);
        assert!(data.secondary.is_empty());

        let dd = chart_series(run, View::Drawdown, true).unwrap();
        assert!(dd.primary.iter().all(|&(_, y)| y <= 0.0));
        assert!(dd.y_bounds[1] > 0.0);
    }
}
