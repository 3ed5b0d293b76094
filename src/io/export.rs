//! Export results to CSV.
//!
//! Long format (one row per series and date) so the files load straight into
//! spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{BatchOutput, ForecastResult, GrowthSeries};
use crate::error::AppError;

/// Write rebased growth series to a CSV file.
pub fn write_growth_csv(path: &Path, growth: &BatchOutput<GrowthSeries>) -> Result<(), AppError> {
    let mut file = create(path)?;
    write_growth(&mut file, growth).map_err(|e| AppError::new(2, format!("Failed to write export CSV: {e}")))
}

/// Write forecasts to a CSV file.
pub fn write_forecast_csv(path: &Path, forecasts: &BatchOutput<ForecastResult>) -> Result<(), AppError> {
    let mut file = create(path)?;
    write_forecasts(&mut file, forecasts)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV: {e}")))
}

fn create(path: &Path) -> Result<File, AppError> {
    File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))
}

fn write_growth<W: Write>(out: &mut W, growth: &BatchOutput<GrowthSeries>) -> std::io::Result<()> {
    writeln!(out, "series,date,growth_percent,anchor_date,anchor_value")?;
    for (name, series) in &growth.results {
        for p in &series.points {
            writeln!(
                out,
                "{},{},{:.6},{},{}",
                csv_field(name),
                p.date,
                p.growth_percent,
                series.anchor_date,
                series.anchor_value
            )?;
        }
    }
    Ok(())
}

fn write_forecasts<W: Write>(out: &mut W, forecasts: &BatchOutput<ForecastResult>) -> std::io::Result<()> {
    writeln!(out, "series,date,point_estimate,lower_bound,upper_bound,confidence_level")?;
    for (name, res) in &forecasts.results {
        for p in &res.points {
            writeln!(
                out,
                "{},{},{:.6},{:.6},{:.6},{}",
                csv_field(name),
                p.date,
                p.point_estimate,
                p.lower_bound,
                p.upper_bound,
                res.confidence_level
            )?;
        }
    }
    Ok(())
}

/// Quote a field when it contains a delimiter, quote or newline.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
