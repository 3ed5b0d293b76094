//! Shared workflow steps used by every subcommand.
//!
//! Keeping this in one place avoids duplicating the core flow:
//! CSV ingest -> optional date window -> analysis
//!
//! `app` then only decides how to present the outputs (text vs JSON).

use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::analysis;
use crate::domain::{
    BatchOutput, ForecastConfig, ForecastResult, GrowthSeries, OverrideSet, PeriodChange, TimeSeriesTable,
};
use crate::error::{AnalyticsError, AppError};

/// Period changes and their medians, reported together by `gm change`.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeReport {
    pub changes: BatchOutput<Vec<PeriodChange>>,
    pub medians: BatchOutput<Option<f64>>,
}

/// Load the input CSV and apply the optional `--from/--to` window.
pub fn load_window(
    input: &Path,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<TimeSeriesTable, AppError> {
    let table = crate::io::load_table(input)?;
    Ok(apply_window(table, from, to)?)
}

/// Restrict `table` to `[from, to]`; a missing bound means the table's own edge.
pub fn apply_window(
    table: TimeSeriesTable,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<TimeSeriesTable, AnalyticsError> {
    if from.is_none() && to.is_none() {
        return Ok(table);
    }
    match (from.or(table.first_date()), to.or(table.last_date())) {
        (Some(start), Some(end)) => analysis::filter(&table, start, end),
        _ => Ok(table),
    }
}

pub fn run_growth(table: &TimeSeriesTable, overrides: Option<&Path>) -> Result<BatchOutput<GrowthSeries>, AppError> {
    let overrides = match overrides {
        Some(path) => crate::io::read_overrides_json(path)?,
        None => OverrideSet::default(),
    };
    Ok(analysis::rebase(table, &overrides))
}

pub fn run_change(table: &TimeSeriesTable) -> ChangeReport {
    let changes = analysis::period_change(table);
    let medians = analysis::median_change(table);
    log_batch("change", &changes);
    ChangeReport { changes, medians }
}

/// Forecast one named series (a failure aborts the run) or every series
/// (failures are recorded per series).
pub fn run_forecast(
    table: &TimeSeriesTable,
    series: Option<&str>,
    horizon: usize,
    config: &ForecastConfig,
) -> Result<BatchOutput<ForecastResult>, AppError> {
    config.validate()?;
    if horizon == 0 {
        return Err(AnalyticsError::invalid_input("horizon must be >= 1.").into());
    }

    let out = match series {
        Some(name) => {
            let result = crate::fit::forecast_series(table, name, horizon, config)?;
            let mut out = BatchOutput::default();
            out.record(name, Ok(result));
            out
        }
        None => crate::fit::forecast_table(table, horizon, config),
    };
    log_batch("forecast", &out);
    Ok(out)
}

fn log_batch<T>(what: &str, batch: &BatchOutput<T>) {
    log::info!(
        "{what}: {} ok, {} failed, {} skipped",
        batch.results.len(),
        batch.failures.len(),
        batch.skipped.len()
    );
}
