//! Closed date-interval slicing.

use chrono::NaiveDate;

use crate::domain::TimeSeriesTable;
use crate::error::AnalyticsError;

/// Return a new table holding only rows dated within `[start, end]`.
///
/// Every series survives, possibly empty. `start > end` is an error; the bounds
/// are never swapped.
pub fn filter(
    table: &TimeSeriesTable,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<TimeSeriesTable, AnalyticsError> {
    if start > end {
        return Err(AnalyticsError::InvalidRange { start, end });
    }
    let out = table.select_rows(|d| d >= start && d <= end);
    log::debug!(
        "filter [{start}, {end}]: kept {} of {} rows",
        out.n_rows(),
        table.n_rows()
    );
    Ok(out)
}
