//! Calendar-month totals per series (the "total for the selected month" view).

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::domain::{MonthTotal, TimeSeriesTable};
use crate::error::AnalyticsError;

/// Sum each series' present values dated inside `year`-`month`.
///
/// Series with nothing in that month report `count = 0`.
pub fn month_totals(
    table: &TimeSeriesTable,
    year: i32,
    month: u32,
) -> Result<BTreeMap<String, MonthTotal>, AnalyticsError> {
    if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
        return Err(AnalyticsError::invalid_input(format!(
            "invalid month {year}-{month:02}."
        )));
    }

    let totals = table
        .iter_series()
        .map(|view| {
            let (total, count) = view
                .observations()
                .filter(|(d, _)| d.year() == year && d.month() == month)
                .fold((0.0, 0usize), |(t, c), (_, v)| (t + v, c + 1));
            (view.name.to_string(), MonthTotal { total, count })
        })
        .collect();
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeriesColumn;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn sums_only_the_selected_year_and_month() {
        let t = TimeSeriesTable::new(
            vec![d(2023, 3, 1), d(2024, 3, 1), d(2024, 3, 15), d(2024, 4, 1)],
            vec![
                SeriesColumn::new("a", vec![Some(100.0), Some(1.0), Some(2.0), Some(50.0)]),
                SeriesColumn::new("b", vec![Some(9.0), None, None, Some(3.0)]),
            ],
        )
        .unwrap();

        let totals = month_totals(&t, 2024, 3).unwrap();
        assert_eq!(totals["a"], MonthTotal { total: 3.0, count: 2 });
        assert_eq!(totals["b"], MonthTotal { total: 0.0, count: 0 });
    }

    #[test]
    fn rejects_invalid_month() {
        let t = TimeSeriesTable::from_dense(vec![d(2024, 1, 1)], vec![("a", vec![1.0])]).unwrap();
        assert!(month_totals(&t, 2024, 13).is_err());
    }
}
