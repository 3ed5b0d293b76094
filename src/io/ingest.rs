//! Wide CSV ingest.
//!
//! Turns a `date,<series>,<series>,...` export into a `TimeSeriesTable`.
//!
//! - header names are trimmed (BOM stripped); the date column is matched
//!   case-insensitively, series names keep their case
//! - blank cells (and `NA`/`null`) are missing observations
//! - rows are sorted by date; duplicate dates are rejected
//!
//! No analytics here: the table constructor does the remaining validation.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use csv::StringRecord;

use crate::domain::{SeriesColumn, TimeSeriesTable};
use crate::error::AppError;

const DATE_COLUMN: &str = "date";

/// Read a wide CSV file into a table.
pub fn load_table(path: &Path) -> Result<TimeSeriesTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let table = read_table(file)?;
    log::info!(
        "loaded '{}': {} rows x {} series",
        path.display(),
        table.n_rows(),
        table.columns().len()
    );
    Ok(table)
}

/// Read wide CSV data from any reader.
pub fn read_table<R: Read>(input: R) -> Result<TimeSeriesTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let date_idx = headers
        .iter()
        .position(|h| normalize_header_name(h).eq_ignore_ascii_case(DATE_COLUMN))
        .ok_or_else(|| AppError::new(2, "Missing required column: `date`"))?;

    let series: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != date_idx)
        .map(|(idx, name)| (idx, normalize_header_name(name).to_string()))
        .collect();
    if series.is_empty() {
        return Err(AppError::new(2, "CSV has no series columns besides `date`."));
    }

    let mut rows: Vec<(NaiveDate, Vec<Option<f64>>)> = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header and lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::new(2, format!("CSV parse error on line {line}: {e}")))?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        rows.push(parse_row(&record, date_idx, &series, line)?);
    }

    rows.sort_by_key(|(date, _)| *date);
    if let Some(pair) = rows.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(AppError::new(2, format!("Duplicate date in CSV: {}", pair[0].0)));
    }

    let dates: Vec<NaiveDate> = rows.iter().map(|(date, _)| *date).collect();
    let columns = series
        .iter()
        .enumerate()
        .map(|(col, (_, name))| {
            SeriesColumn::new(name.clone(), rows.iter().map(|(_, values)| values[col]).collect())
        })
        .collect();

    Ok(TimeSeriesTable::new(dates, columns)?)
}

fn parse_row(
    record: &StringRecord,
    date_idx: usize,
    series: &[(usize, String)],
    line: usize,
) -> Result<(NaiveDate, Vec<Option<f64>>), AppError> {
    let raw_date = record
        .get(date_idx)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::new(2, format!("Missing date on line {line}.")))?;
    let date = parse_date(raw_date).map_err(|e| AppError::new(2, format!("Line {line}: {e}")))?;

    let mut values = Vec::with_capacity(series.len());
    for (idx, name) in series {
        let cell = record.get(*idx).unwrap_or("");
        let value = parse_cell(cell)
            .map_err(|e| AppError::new(2, format!("Line {line}, column '{name}': {e}")))?;
        values.push(value);
    }
    Ok((date, values))
}

fn normalize_header_name(name: &str) -> &str {
    // Spreadsheet exports often carry a UTF-8 BOM on the first header.
    name.trim().trim_start_matches('\u{feff}').trim()
}

/// Parse one observation cell: blank means missing; thousands separators are
/// tolerated.
fn parse_cell(cell: &str) -> Result<Option<f64>, String> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("na") || cell.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    let cleaned: String = cell.chars().filter(|c| *c != ',' && *c != '_').collect();
    let v = cleaned
        .parse::<f64>()
        .map_err(|_| format!("Invalid number '{cell}'."))?;
    if v.is_finite() {
        Ok(Some(v))
    } else {
        Err(format!("Non-finite number '{cell}'."))
    }
}

/// Parse a date cell. Month-only values (`YYYY-MM`) map to the first day.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    let s = s.trim();
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
        return Ok(d);
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, YYYY-MM, DD/MM/YYYY, DD-MM-YYYY, YYYY/MM/DD."
    ))
}

/// Parse a `YYYY-MM` month selector.
pub fn parse_month(s: &str) -> Result<(i32, u32), String> {
    let d = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .map_err(|_| format!("Invalid month '{s}'. Expected YYYY-MM."))?;
    Ok((d.year(), d.month()))
}
