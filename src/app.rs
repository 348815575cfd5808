//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and initializes logging
//! - resolves presets and flags into a `SimConfig`
//! - picks data sources (Yahoo/FRED, CSV files or the synthetic market)
//! - runs the simulation pipeline
//! - prints reports/plots and writes optional exports

use clap::Parser;
use tracing::info;

use crate::app::pipeline::{DataRequest, SimulationInputs, SimulationRun};
use crate::cli::{Cli, Command, SimArgs, SweepArgs};
use crate::data::sample::{SYNTHETIC_FUND, SyntheticParams};
use crate::data::{FredClient, PriceSource, RateSource, SyntheticMarket, YahooClient};
use crate::domain::{FundPreset, SimConfig};
use crate::error::AppError;
use crate::io::{CsvPriceSource, CsvRateSource};
use crate::logging::{LogConfig, init_logging};
use crate::plot::PlotLine;

pub mod pipeline;

/// Entry point for the `letf` binary.
pub fn run() -> Result<(), AppError> {
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);

    if let Some(log_config) = log_config_for(&cli) {
        init_logging(&log_config)?;
    }

    match cli.command {
        Command::Simulate(args) => handle_simulate(args),
        Command::Sweep(args) => handle_sweep(args),
        Command::Tui(args) => handle_tui(args),
    }
}

fn handle_simulate(args: SimArgs) -> Result<(), AppError> {
    let config = sim_config_from_args(&args)?;
    let request = data_request(&args, &config)?;
    let inputs = load_inputs(&args, &request)?;
    let run = pipeline::run_simulation(&config, &inputs)?;

    println!("{}", crate::report::format_run_summary(&run.summary));
    if let (Some(report), Some(ticker)) = (&run.tracking, &request.actual_ticker) {
        println!("{}", crate::report::format_tracking(report, ticker));
    }

    if args.plot && !args.no_plot && !run.summary.is_degenerate() {
        println!("{}", render_value_plot(&run, &args));
        println!(
            "{}",
            crate::plot::render_drawdown_plot(&run.drawdown, args.width, (args.height / 2).max(5))
        );
    }

    if let Some(path) = &args.export {
        crate::io::write_series_csv(path, &run)?;
        info!(path = %path.display(), "wrote series CSV");
    }
    if let Some(path) = &args.export_summary {
        crate::io::write_summary_json(path, &run)?;
        info!(path = %path.display(), "wrote summary JSON");
    }

    Ok(())
}

fn handle_sweep(args: SweepArgs) -> Result<(), AppError> {
    let mut config = sim_config_from_args(&args.sim)?;
    // Fetch once from the earliest requested start.
    config.start = args.starts.iter().min().copied().or(config.start);
    let mut request = data_request(&args.sim, &config)?;
    request.actual_ticker = None;
    let inputs = load_inputs(&args.sim, &request)?;

    let rows = pipeline::run_sweep(&config, &args.starts, &inputs)?;
    println!("{}", crate::report::format_sweep(&rows));

    if let Some(path) = &args.sim.export_summary {
        crate::io::write_sweep_json(path, &rows)?;
        info!(path = %path.display(), "wrote sweep JSON");
    }
    Ok(())
}

fn handle_tui(args: SimArgs) -> Result<(), AppError> {
    let config = sim_config_from_args(&args)?;
    let request = data_request(&args, &config)?;
    // Fetch before taking over the terminal so errors print normally.
    let inputs = load_inputs(&args, &request)?;
    crate::tui::run(config, inputs, request.actual_ticker)
}

/// Preset values first, explicit flags override.
pub fn sim_config_from_args(args: &SimArgs) -> Result<SimConfig, AppError> {
    let mut config = args.preset.map(SimConfig::from_preset).unwrap_or_default();

    if let Some(leverage) = args.leverage {
        config.leverage = leverage;
    }
    if let Some(pct) = args.expense_ratio {
        config.expense_ratio = pct / 100.0;
    }
    config.starting_amount = args.amount;
    config.start = args.start.or_else(|| args.preset.map(FundPreset::inception));
    config.end = args.end;
    config.day_count = args.day_count;

    if args.preset.is_none() || args.leverage.is_some() {
        let index = index_label(args);
        config.label = format!("{}x {index} (sim)", fmt_leverage(config.leverage));
    }
    Ok(config)
}

/// Resolve tickers and the fetch window.
pub fn data_request(args: &SimArgs, config: &SimConfig) -> Result<DataRequest, AppError> {
    let index_ticker = match (&args.index, args.preset) {
        (Some(index), _) => index.clone(),
        (None, Some(preset)) => preset.index_symbol().to_string(),
        (None, None) if args.offline || args.index_csv.is_some() => "index".to_string(),
        (None, None) => {
            return Err(AppError::new(2, "Provide --preset or --index (or --index-csv)."));
        }
    };

    if args.preset == Some(FundPreset::Tmf)
        && args.index.is_none()
        && args.index_csv.is_none()
        && !args.offline
    {
        return Err(AppError::new(
            2,
            "The TMF index (XIUSA000ML) is not on Yahoo; pass its export with --index-csv.",
        ));
    }

    let actual_ticker = if args.no_actual {
        None
    } else if args.offline {
        Some(SYNTHETIC_FUND.to_string())
    } else {
        args.actual
            .clone()
            .or_else(|| args.preset.map(|p| p.ticker().to_string()))
            .or_else(|| args.actual_csv.as_ref().map(|_| "actual".to_string()))
    };

    Ok(DataRequest {
        index_ticker,
        rate_series: args.rate_series.clone(),
        actual_ticker,
        start: config.start,
        end: config.end,
    })
}

/// Build the configured sources and fetch everything the run needs.
pub fn load_inputs(args: &SimArgs, request: &DataRequest) -> Result<SimulationInputs, AppError> {
    if args.offline {
        let defaults = SyntheticParams::default();
        let market = SyntheticMarket::generate(&SyntheticParams {
            seed: args.seed,
            end: args.end.unwrap_or(defaults.end),
            ..defaults
        })?;
        let actual = request
            .actual_ticker
            .as_ref()
            .map(|_| &market as &dyn PriceSource);
        return pipeline::fetch_inputs(&market, &market, actual, request);
    }

    let prices: Box<dyn PriceSource> = match &args.index_csv {
        Some(path) => Box::new(CsvPriceSource::new(path)),
        None => Box::new(YahooClient::new()?),
    };
    let rates: Box<dyn RateSource> = match &args.rates_csv {
        Some(path) => Box::new(CsvRateSource::new(path)),
        None => Box::new(FredClient::from_env()?),
    };
    let actual: Option<Box<dyn PriceSource>> = match (&request.actual_ticker, &args.actual_csv) {
        (None, _) => None,
        (Some(_), Some(path)) => Some(Box::new(CsvPriceSource::new(path)) as Box<dyn PriceSource>),
        (Some(_), None) => Some(Box::new(YahooClient::new()?) as Box<dyn PriceSource>),
    };

    pipeline::fetch_inputs(prices.as_ref(), rates.as_ref(), actual.as_deref(), request)
}

fn render_value_plot(run: &SimulationRun, args: &SimArgs) -> String {
    let mut lines = vec![PlotLine {
        label: "simulated",
        glyph: '*',
        series: &run.investment,
    }];
    if let Some(actual) = &run.actual_rebased {
        lines.push(PlotLine {
            label: "actual",
            glyph: 'o',
            series: actual,
        });
    }
    crate::plot::render_ascii_plot(&lines, args.width, args.height, args.log_scale)
}

fn index_label(args: &SimArgs) -> String {
    if let Some(index) = &args.index {
        return index.clone();
    }
    if let Some(path) = &args.index_csv {
        return path
            .file_stem()
            .map_or_else(|| "index".to_string(), |s| s.to_string_lossy().into_owned());
    }
    match args.preset {
        Some(preset) => preset.index_symbol().to_string(),
        None if args.offline => "synthetic".to_string(),
        None => "index".to_string(),
    }
}

fn fmt_leverage(leverage: f64) -> String {
    if leverage.fract() == 0.0 {
        format!("{leverage:.0}")
    } else {
        format!("{leverage}")
    }
}

/// No subscriber for the TUI: it owns the terminal, and `RUST_LOG` would
/// otherwise still write over the alternate screen.
fn log_config_for(cli: &Cli) -> Option<LogConfig> {
    match cli.command {
        Command::Tui(_) => None,
        _ => Some(LogConfig::new(cli.log_level.clone()).with_format(cli.log_format)),
    }
}

/// Rewrite argv so `letf` defaults to `letf simulate`.
///
/// Rules:
/// - `letf`                       -> `letf simulate --offline`
/// - `letf -p tqqq ...`           -> `letf simulate -p tqqq ...`
/// - `letf --help/--version/-h`   -> unchanged (show top-level help/version)
/// - leading `--log-*` flags are skipped before applying the rules above
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    // Global logging flags may precede the subcommand; skip them and their values.
    let mut idx = 1;
    while let Some(arg) = argv.get(idx) {
        if !arg.starts_with("--log-") {
            break;
        }
        idx += if arg.contains('=') { 1 } else { 2 };
    }

    let Some(arg) = argv.get(idx).cloned() else {
        if idx == argv.len() {
            argv.push("simulate".to_string());
            argv.push("--offline".to_string());
        }
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg.as_str(), "simulate" | "sweep" | "tui");
    if !is_subcommand && arg.starts_with('-') {
        argv.insert(idx, "simulate".to_string());
    }
    argv
}
