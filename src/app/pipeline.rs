//! Shared simulation pipeline used by the CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! prices -> returns -> financing -> leveraged returns -> compounding -> statistics
//!
//! Fetching is separated from computation so the TUI (and the sweep) can rerun
//! with different parameters without hitting the network again.

use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analysis::{TrackingReport, cagr, compare, drawdown_series, max_drawdown, rebase_to, total_return};
use crate::data::{PriceSource, RateSource};
use crate::domain::{
    DrawdownSeries, FinancingCostSeries, InvestmentSeries, PriceSeries, RawRateRow, ReturnSeries,
    SimConfig, SimulationSummary,
};
use crate::error::{AppError, SimError};
use crate::sim::{Anchor, LeverageParams, compound, daily_fraction, leveraged_returns, normalize_rates, simple_returns};

/// Rates are requested from a little before the first price so the first
/// financing entry has a real predecessor.
const RATE_LOOKBACK_DAYS: i64 = 7;

/// Raw market data for one or more simulations.
#[derive(Debug, Clone)]
pub struct SimulationInputs {
    pub index_prices: PriceSeries,
    pub raw_rates: Vec<RawRateRow>,
    /// Traded history of the real fund, when available.
    pub actual: Option<PriceSeries>,
}

/// What to fetch.
#[derive(Debug, Clone)]
pub struct DataRequest {
    pub index_ticker: String,
    pub rate_series: String,
    pub actual_ticker: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// All computed outputs of a single simulation.
#[derive(Debug, Clone)]
pub struct SimulationRun {
    pub config: SimConfig,
    pub index_returns: ReturnSeries,
    /// Financing cost in the decimal unit consumed by the synthesizer, on the
    /// dates it was applied (the leveraged-return dates).
    pub financing: FinancingCostSeries,
    pub leveraged_returns: ReturnSeries,
    pub investment: InvestmentSeries,
    pub drawdown: DrawdownSeries,
    /// Actual fund prices rebased to the simulated value on the first common date.
    pub actual_rebased: Option<InvestmentSeries>,
    pub summary: SimulationSummary,
    pub tracking: Option<TrackingReport>,
}

/// One row of a start-date sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepRow {
    pub requested_start: NaiveDate,
    pub summary: SimulationSummary,
}

/// Fetch index prices, rates and (optionally) the actual fund history.
pub fn fetch_inputs(
    prices: &dyn PriceSource,
    rates: &dyn RateSource,
    actual: Option<&dyn PriceSource>,
    request: &DataRequest,
) -> Result<SimulationInputs, AppError> {
    let index_prices = prices.fetch_prices(&request.index_ticker, request.start, request.end)?;
    if index_prices.is_empty() {
        return Err(AppError::new(
            4,
            format!("No prices returned for {}.", request.index_ticker),
        ));
    }

    let rate_start = index_prices
        .first_date()
        .map(|d| d - Duration::days(RATE_LOOKBACK_DAYS));
    let raw_rates = rates.fetch_rates(&request.rate_series, rate_start, request.end)?;

    let actual = match (actual, &request.actual_ticker) {
        (Some(source), Some(ticker)) => {
            Some(source.fetch_prices(ticker, request.start, request.end)?)
        }
        _ => None,
    };

    info!(
        index = %request.index_ticker,
        prices = index_prices.len(),
        rates = raw_rates.len(),
        actual = actual.as_ref().map_or(0, |a| a.len()),
        "fetched inputs"
    );

    Ok(SimulationInputs {
        index_prices,
        raw_rates,
        actual,
    })
}

/// Run one simulation over `config.start..=config.end`.
///
/// A window with no usable dates is not an error: the run comes back empty and
/// `summary.is_degenerate()` is true.
pub fn run_simulation(config: &SimConfig, inputs: &SimulationInputs) -> Result<SimulationRun, SimError> {
    let params = LeverageParams::new(config.leverage, config.expense_ratio)?;

    let prices = inputs.index_prices.between(config.start, config.end);
    let index_returns = simple_returns(&prices)?;
    let financing = daily_fraction(&normalize_rates(&inputs.raw_rates), config.day_count);
    let leveraged = leveraged_returns(&index_returns, &financing, params);
    let applied_financing = leveraged.intersect_with(&financing).map(|(_, cost)| *cost);

    // The starting amount sits on the last price date before the first
    // simulated return, so that return is applied too.
    let anchor = leveraged
        .first_date()
        .and_then(|d| prices.date_before(d))
        .map_or(Anchor::FirstReturn, Anchor::Before);
    let investment = compound(&leveraged, config.starting_amount, anchor)?;
    let drawdown = drawdown_series(&investment);

    debug!(
        label = %config.label,
        prices = prices.len(),
        returns = index_returns.len(),
        financing = financing.len(),
        leveraged = leveraged.len(),
        values = investment.len(),
        "simulation stages complete"
    );

    let summary = summarize(config, &leveraged, &investment);
    if summary.is_degenerate() {
        warn!(
            label = %config.label,
            start = ?config.start,
            end = ?config.end,
            "no overlapping dates between prices and rates"
        );
    }

    let (actual_rebased, tracking) = match &inputs.actual {
        Some(actual) if !investment.is_empty() => {
            let rebased = rebase_to(actual, &investment)?;
            let tracking = match compare(&investment, actual) {
                Ok(report) => Some(report),
                Err(err) => {
                    warn!(%err, "skipping tracking comparison");
                    None
                }
            };
            (Some(rebased), tracking)
        }
        _ => (None, None),
    };

    Ok(SimulationRun {
        config: config.clone(),
        index_returns,
        financing: applied_financing,
        leveraged_returns: leveraged,
        investment,
        drawdown,
        actual_rebased,
        summary,
        tracking,
    })
}

/// Simulate once per start date, in parallel. Rows come back in `starts` order.
pub fn run_sweep(
    config: &SimConfig,
    starts: &[NaiveDate],
    inputs: &SimulationInputs,
) -> Result<Vec<SweepRow>, SimError> {
    starts
        .par_iter()
        .map(|&start| {
            let cfg = SimConfig {
                start: Some(start),
                ..config.clone()
            };
            run_simulation(&cfg, inputs).map(|run| SweepRow {
                requested_start: start,
                summary: run.summary,
            })
        })
        .collect()
}

fn summarize(
    config: &SimConfig,
    leveraged: &ReturnSeries,
    investment: &InvestmentSeries,
) -> SimulationSummary {
    SimulationSummary {
        label: config.label.clone(),
        leverage: config.leverage,
        expense_ratio: config.expense_ratio,
        start: investment.first_date(),
        end: investment.last_date(),
        trading_days: leveraged.len(),
        starting_amount: config.starting_amount,
        final_value: investment.last().map(|p| p.1),
        total_return: total_return(investment).ok(),
        cagr: cagr(investment).ok(),
        max_drawdown: max_drawdown(investment),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DayCount, TimeSeries};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn flat_rates(dates: &[NaiveDate]) -> Vec<RawRateRow> {
        dates.iter().map(|&date| RawRateRow::new(date, "0")).collect()
    }

    fn scenario_inputs() -> SimulationInputs {
        let dates = [d(2021, 3, 1), d(2021, 3, 2), d(2021, 3, 3), d(2021, 3, 4)];
        let prices = [100.0, 102.0, 101.0, 105.0];
        SimulationInputs {
            index_prices: TimeSeries::new(dates.iter().copied().zip(prices).collect()).unwrap(),
            raw_rates: flat_rates(&dates),
            actual: None,
        }
    }

    fn three_x() -> SimConfig {
        SimConfig {
            label: "3x".to_string(),
            leverage: 3.0,
            expense_ratio: 0.0,
            ..SimConfig::default()
        }
    }

    #[test]
    fn three_x_scenario_anchors_on_first_price_date() {
        let run = run_simulation(&three_x(), &scenario_inputs()).unwrap();
        let values: Vec<f64> = run.investment.values().copied().collect();
        let expected = [1.0, 1.06, 1.028824, 1.151060];
        assert_eq!(values.len(), expected.len());
        for (v, e) in values.iter().zip(expected) {
            assert!((v - e).abs() < 1e-6, "{v} vs {e}");
        }
        assert_eq!(run.investment.first_date(), Some(d(2021, 3, 1)));
        assert_eq!(run.summary.trading_days, 3);
        assert_eq!(run.drawdown.len(), 4);
        // Financing is kept only where it was charged; the anchor date has none.
        assert!(run.financing.dates().eq(run.leveraged_returns.dates()));
        assert_eq!(run.financing.get(d(2021, 3, 1)), None);
        let mdd = run.summary.max_drawdown.unwrap();
        assert_eq!(mdd.trough_date, d(2021, 3, 3));
    }

    #[test]
    fn ruined_run_reports_total_loss() {
        let mut inputs = scenario_inputs();
        let dates: Vec<NaiveDate> = inputs.index_prices.dates().collect();
        inputs.index_prices =
            TimeSeries::new(dates.iter().copied().zip([100.0, 60.0, 66.0, 70.0]).collect()).unwrap();
        let run = run_simulation(&three_x(), &inputs).unwrap();

        let values: Vec<f64> = run.investment.values().copied().collect();
        assert!((values[1] + 0.2).abs() < 1e-12);
        assert_eq!(values[3], values[1]);
        assert_eq!(run.summary.cagr, Some(-1.0));

        let text = crate::report::format_run_summary(&run.summary);
        assert!(text.contains("CAGR: -100.00%"), "{text}");
        assert!(!text.contains("NaN"));
    }

    #[test]
    fn disjoint_rates_give_degenerate_run() {
        let mut inputs = scenario_inputs();
        inputs.raw_rates = flat_rates(&[d(2019, 1, 2), d(2019, 1, 3)]);
        let run = run_simulation(&three_x(), &inputs).unwrap();
        assert!(run.investment.is_empty());
        assert!(run.summary.is_degenerate());
        assert_eq!(run.summary.cagr, None);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let mut cfg = three_x();
        cfg.starting_amount = 0.0;
        assert!(matches!(
            run_simulation(&cfg, &scenario_inputs()),
            Err(SimError::InvalidParameter { name: "starting_amount", .. })
        ));
        cfg.starting_amount = 1.0;
        cfg.leverage = 0.5;
        assert!(run_simulation(&cfg, &scenario_inputs()).is_err());
    }

    #[test]
    fn actual_history_is_rebased_and_compared() {
        let mut inputs = scenario_inputs();
        let sim = run_simulation(&three_x(), &inputs).unwrap();
        // A "fund" that tracks the simulation exactly, at a different price level.
        inputs.actual = Some(sim.investment.map(|v| v * 40.0));
        let run = run_simulation(&three_x(), &inputs).unwrap();

        let rebased = run.actual_rebased.unwrap();
        for ((_, a), (_, s)) in rebased.iter().zip(run.investment.iter()) {
            assert!((a - s).abs() < 1e-12);
        }
        let tracking = run.tracking.unwrap();
        assert!((tracking.terminal_ratio - 1.0).abs() < 1e-12);
        assert!(tracking.tracking_error < 1e-9);
    }

    #[test]
    fn act_365_charges_less_than_act_360() {
        let mut inputs = scenario_inputs();
        inputs.raw_rates = inputs
            .raw_rates
            .iter()
            .map(|r| RawRateRow::new(r.date, "5.0"))
            .collect();
        let act360 = run_simulation(&three_x(), &inputs).unwrap();
        let cfg = SimConfig {
            day_count: DayCount::Act365,
            ..three_x()
        };
        let act365 = run_simulation(&cfg, &inputs).unwrap();
        assert!(act365.summary.final_value.unwrap() > act360.summary.final_value.unwrap());
    }

    #[test]
    fn sweep_preserves_start_order() {
        let inputs = scenario_inputs();
        let starts = [d(2021, 3, 2), d(2021, 3, 1), d(2022, 1, 1)];
        let rows = run_sweep(&three_x(), &starts, &inputs).unwrap();
        let got: Vec<_> = rows.iter().map(|r| r.requested_start).collect();
        assert_eq!(got, starts);
        assert_eq!(rows[0].summary.start, Some(d(2021, 3, 2)));
        assert_eq!(rows[1].summary.trading_days, 3);
        assert!(rows[2].summary.is_degenerate());
    }

    struct FixedSource(SimulationInputs);

    impl PriceSource for FixedSource {
        fn fetch_prices(
            &self,
            _ticker: &str,
            start: Option<NaiveDate>,
            end: Option<NaiveDate>,
        ) -> Result<PriceSeries, AppError> {
            Ok(self.0.index_prices.between(start, end))
        }
    }

    impl RateSource for FixedSource {
        fn fetch_rates(
            &self,
            _series_id: &str,
            start: Option<NaiveDate>,
            _end: Option<NaiveDate>,
        ) -> Result<Vec<RawRateRow>, AppError> {
            Ok(self
                .0
                .raw_rates
                .iter()
                .filter(|r| start.is_none_or(|s| r.date >= s))
                .cloned()
                .collect())
        }
    }

    #[test]
    fn fetch_inputs_uses_each_source() {
        let source = FixedSource(scenario_inputs());
        let request = DataRequest {
            index_ticker: "^IXIC".to_string(),
            rate_series: "USD1MTD156N".to_string(),
            actual_ticker: Some("TQQQ".to_string()),
            start: Some(d(2021, 3, 2)),
            end: None,
        };
        let inputs = fetch_inputs(&source, &source, Some(&source as &dyn PriceSource), &request).unwrap();
        assert_eq!(inputs.index_prices.len(), 3);
        assert_eq!(inputs.raw_rates.len(), 4);
        assert_eq!(inputs.actual.map(|a| a.len()), Some(3));

        let late = DataRequest {
            start: Some(d(2030, 1, 1)),
            ..request
        };
        assert_eq!(
            fetch_inputs(&source, &source, None, &late).unwrap_err().exit_code(),
            4
        );
    }
}
