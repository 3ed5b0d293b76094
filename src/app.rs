//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads and windows the input table
//! - runs the requested analysis
//! - prints text reports or JSON
//! - writes optional exports

use std::time::Duration;

use clap::Parser;
use serde::Serialize;

use crate::cli::{Cli, Command, ForecastArgs, GrowthArgs, RangeArgs, TotalsArgs};
use crate::domain::{ForecastConfig, TimeSeriesTable};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `gm` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let table = pipeline::load_window(&cli.input, cli.from, cli.to)?;
    let json = cli.json;

    match cli.command {
        Command::Growth(args) => handle_growth(&table, args, json),
        Command::Change => handle_change(&table, json),
        Command::Range(args) => handle_range(&table, args, json),
        Command::Totals(args) => handle_totals(&table, args, json),
        Command::Forecast(args) => handle_forecast(&table, args, json),
    }
}

fn handle_growth(table: &TimeSeriesTable, args: GrowthArgs, json: bool) -> Result<(), AppError> {
    let growth = pipeline::run_growth(table, args.overrides.as_deref())?;
    if json {
        print_json(&growth)?;
    } else {
        println!("{}", crate::report::format_growth(&growth));
    }
    if let Some(path) = &args.export {
        crate::io::write_growth_csv(path, &growth)?;
    }
    Ok(())
}

fn handle_change(table: &TimeSeriesTable, json: bool) -> Result<(), AppError> {
    let report = pipeline::run_change(table);
    if json {
        print_json(&report)
    } else {
        println!("{}", crate::report::format_changes(&report.changes, &report.medians));
        Ok(())
    }
}

fn handle_range(table: &TimeSeriesTable, args: RangeArgs, json: bool) -> Result<(), AppError> {
    let range = crate::analysis::range_change(table, args.start, args.end)?;
    if json {
        print_json(&range)
    } else {
        println!("{}", crate::report::format_range(&range));
        Ok(())
    }
}

fn handle_totals(table: &TimeSeriesTable, args: TotalsArgs, json: bool) -> Result<(), AppError> {
    let (year, month) = args.month;
    let totals = crate::analysis::month_totals(table, year, month)?;
    if json {
        print_json(&totals)
    } else {
        println!("{}", crate::report::format_totals(year, month, &totals));
        Ok(())
    }
}

fn handle_forecast(table: &TimeSeriesTable, args: ForecastArgs, json: bool) -> Result<(), AppError> {
    let config = forecast_config_from_args(&args)?;
    let forecasts = pipeline::run_forecast(table, args.series.as_deref(), args.horizon, &config)?;
    if json {
        print_json(&forecasts)?;
    } else {
        println!("{}", crate::report::format_forecasts(&forecasts));
    }
    if let Some(path) = &args.export {
        crate::io::write_forecast_csv(path, &forecasts)?;
    }
    Ok(())
}

pub fn forecast_config_from_args(args: &ForecastArgs) -> Result<ForecastConfig, AppError> {
    let time_budget = match args.budget_secs {
        None => None,
        Some(secs) if secs.is_finite() && secs > 0.0 => Some(Duration::from_secs_f64(secs)),
        Some(secs) => {
            return Err(AppError::new(
                2,
                format!("`--budget-secs` must be a positive number of seconds, got {secs}."),
            ));
        }
    };

    Ok(ForecastConfig {
        order: args.order,
        seasonal_order: args.seasonal_order,
        confidence_level: args.confidence,
        seed: args.seed,
        restarts: args.restarts,
        max_iterations: args.max_iter,
        time_budget,
        ..ForecastConfig::default()
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::new(2, format!("Failed to serialize JSON output: {e}")))?;
    println!("{text}");
    Ok(())
}
