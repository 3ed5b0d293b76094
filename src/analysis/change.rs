//! Period-over-period and endpoint percent change.
//!
//! - `period_change`: change between each pair of consecutive rows where both
//!   values are present (pairs touching a missing value are skipped)
//! - `median_change`: the median of that sequence, `None` when it is empty
//! - `range_change`: change between the rows nearest two user-picked dates
//!
//! `range_change` compares two endpoint values picked in a dashboard, not
//! consecutive deltas.

use chrono::NaiveDate;

use crate::domain::{BatchOutput, PeriodChange, RangeChange, SeriesView, TimeSeriesTable};
use crate::error::AnalyticsError;
use crate::math::median_mut;

/// Consecutive-row percent changes for every series.
pub fn period_change(table: &TimeSeriesTable) -> BatchOutput<Vec<PeriodChange>> {
    let mut out = BatchOutput::default();
    for view in table.iter_series() {
        out.record(view.name, series_period_change(&view));
    }
    out
}

/// Median consecutive-row percent change for every series.
///
/// A series with no consecutive present pair maps to `None` ("no data").
pub fn median_change(table: &TimeSeriesTable) -> BatchOutput<Option<f64>> {
    let changes = period_change(table);
    let results = changes
        .results
        .into_iter()
        .map(|(name, seq)| {
            let mut pct: Vec<f64> = seq.iter().map(|c| c.percent).collect();
            (name, median_mut(&mut pct))
        })
        .collect();

    BatchOutput {
        results,
        failures: changes.failures,
        skipped: changes.skipped,
    }
}

/// Percent change between the observations nearest `start` and `end`.
pub fn range_change(
    table: &TimeSeriesTable,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<BatchOutput<RangeChange>, AnalyticsError> {
    if start > end {
        return Err(AnalyticsError::InvalidRange { start, end });
    }

    let start_idx = nearest_index(table.dates(), start);
    let end_idx = nearest_index(table.dates(), end);

    let mut out = BatchOutput::default();
    for view in table.iter_series() {
        let outcome = match (start_idx, end_idx) {
            (Some(i), Some(j)) => series_range_change(&view, i, j),
            _ => Err(AnalyticsError::InsufficientData {
                series: view.name.to_string(),
                date: None,
            }),
        };
        out.record(view.name, outcome);
    }
    Ok(out)
}

fn series_period_change(view: &SeriesView<'_>) -> Result<Vec<PeriodChange>, AnalyticsError> {
    let dates = view.dates();
    let values = view.values();
    let mut out = Vec::new();

    for i in 1..dates.len() {
        let (Some(prev), Some(cur)) = (values[i - 1], values[i]) else {
            continue;
        };
        if prev == 0.0 {
            return Err(AnalyticsError::DegenerateBaseline {
                series: view.name.to_string(),
                date: dates[i - 1],
            });
        }
        out.push(PeriodChange {
            previous_date: dates[i - 1],
            date: dates[i],
            percent: (cur - prev) / prev * 100.0,
        });
    }
    Ok(out)
}

fn series_range_change(view: &SeriesView<'_>, i: usize, j: usize) -> Result<RangeChange, AnalyticsError> {
    let dates = view.dates();
    let values = view.values();
    let missing = |idx: usize| AnalyticsError::InsufficientData {
        series: view.name.to_string(),
        date: Some(dates[idx]),
    };

    let start_value = values[i].ok_or_else(|| missing(i))?;
    let end_value = values[j].ok_or_else(|| missing(j))?;
    if start_value == 0.0 {
        return Err(AnalyticsError::DegenerateBaseline {
            series: view.name.to_string(),
            date: dates[i],
        });
    }

    Ok(RangeChange {
        start_date: dates[i],
        start_value,
        end_date: dates[j],
        end_value,
        percent: (end_value - start_value) / start_value * 100.0,
    })
}

/// Index of the axis date closest to `target`; ties go to the earlier date.
fn nearest_index(dates: &[NaiveDate], target: NaiveDate) -> Option<usize> {
    match dates.binary_search(&target) {
        Ok(i) => Some(i),
        Err(0) => (!dates.is_empty()).then_some(0),
        Err(i) if i == dates.len() => Some(i - 1),
        Err(i) => {
            let before = (target - dates[i - 1]).num_days();
            let after = (dates[i] - target).num_days();
            Some(if after < before { i } else { i - 1 })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeriesColumn;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn months(n: u32) -> Vec<NaiveDate> {
        (1..=n).map(|m| d(2024, m)).collect()
    }

    fn percents(seq: &[PeriodChange]) -> Vec<f64> {
        seq.iter().map(|c| c.percent).collect()
    }

    #[test]
    fn compounding_series_changes_ten_percent() {
        let t = TimeSeriesTable::from_dense(months(3), vec![("a", vec![100.0, 110.0, 121.0])]).unwrap();
        let pc = period_change(&t);
        let p = percents(&pc.results["a"]);
        assert_eq!(p.len(), 2);
        assert!(p.iter().all(|v| (v - 10.0).abs() < 1e-9), "{p:?}");

        let med = median_change(&t).results["a"].unwrap();
        assert!((med - 10.0).abs() < 1e-9);
    }

    #[test]
    fn missing_values_break_pairs() {
        let t = TimeSeriesTable::new(
            months(6),
            vec![SeriesColumn::new(
                "a",
                vec![Some(1.0), Some(2.0), None, Some(4.0), Some(8.0), Some(4.0)],
            )],
        )
        .unwrap();
        let seq = &period_change(&t).results["a"];
        // Pairs (1,2), (4,5), (5,6) are present; (2,3) and (3,4) touch the gap.
        assert_eq!(seq.len(), 3);
        assert_eq!(percents(seq), vec![100.0, 100.0, -50.0]);
        assert_eq!(seq[1].previous_date, d(2024, 4));
    }

    #[test]
    fn single_observation_has_no_changes() {
        let t = TimeSeriesTable::from_dense(months(1), vec![("a", vec![5.0])]).unwrap();
        assert!(period_change(&t).results["a"].is_empty());
        assert_eq!(median_change(&t).results["a"], None);
    }

    #[test]
    fn flat_series_has_zero_median() {
        let t = TimeSeriesTable::from_dense(months(5), vec![("a", vec![7.0; 5])]).unwrap();
        assert_eq!(median_change(&t).results["a"], Some(0.0));
    }

    #[test]
    fn even_count_median_averages_middle() {
        // Changes: +100, -50, +100, +50 -> sorted [-50, 50, 100, 100] -> 75.
        let t = TimeSeriesTable::from_dense(months(5), vec![("a", vec![1.0, 2.0, 1.0, 2.0, 3.0])]).unwrap();
        assert_eq!(median_change(&t).results["a"], Some(75.0));
    }

    #[test]
    fn zero_previous_value_fails_only_that_series() {
        let t = TimeSeriesTable::from_dense(
            months(3),
            vec![("z", vec![0.0, 1.0, 2.0]), ("ok", vec![1.0, 2.0, 4.0])],
        )
        .unwrap();
        let med = median_change(&t);
        assert!(matches!(med.failure("z"), Some(AnalyticsError::DegenerateBaseline { .. })));
        assert_eq!(med.results["ok"], Some(100.0));
    }

    #[test]
    fn range_change_uses_nearest_rows() {
        let t = TimeSeriesTable::from_dense(months(4), vec![("a", vec![100.0, 120.0, 150.0, 200.0])]).unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(); // nearer Feb 1
        let end = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(); // past the axis
        let rc = range_change(&t, start, end).unwrap().results["a"];
        assert_eq!(rc.start_date, d(2024, 2));
        assert_eq!(rc.end_date, d(2024, 4));
        assert!((rc.percent - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn range_change_missing_endpoint_is_insufficient_data() {
        let t = TimeSeriesTable::new(
            months(3),
            vec![
                SeriesColumn::new("gap", vec![Some(1.0), Some(2.0), None]),
                SeriesColumn::new("ok", vec![Some(2.0), Some(3.0), Some(4.0)]),
            ],
        )
        .unwrap();
        let out = range_change(&t, d(2024, 1), d(2024, 3)).unwrap();
        assert_eq!(
            out.failure("gap"),
            Some(&AnalyticsError::InsufficientData {
                series: "gap".to_string(),
                date: Some(d(2024, 3))
            })
        );
        assert_eq!(out.results["ok"].percent, 100.0);
    }

    #[test]
    fn range_change_zero_start_fails_only_that_series() {
        let t = TimeSeriesTable::from_dense(
            months(3),
            vec![("zero", vec![0.0, 5.0, 10.0]), ("ok", vec![50.0, 60.0, 75.0])],
        )
        .unwrap();
        let out = range_change(&t, d(2024, 1), d(2024, 3)).unwrap();
        assert_eq!(
            out.failure("zero"),
            Some(&AnalyticsError::DegenerateBaseline {
                series: "zero".to_string(),
                date: d(2024, 1)
            })
        );
        assert!(!out.results.contains_key("zero"));
        assert_eq!(out.results["ok"].percent, 50.0);
    }

    #[test]
    fn range_change_rejects_reversed_range() {
        let t = TimeSeriesTable::from_dense(months(2), vec![("a", vec![1.0, 2.0])]).unwrap();
        let err = range_change(&t, d(2024, 2), d(2024, 1)).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidRange { .. }));
    }

    #[test]
    fn nearest_index_ties_go_earlier() {
        let dates = vec![d(2024, 1), NaiveDate::from_ymd_opt(2024, 1, 11).unwrap()];
        let mid = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        assert_eq!(nearest_index(&dates, mid), Some(0));
        assert_eq!(nearest_index(&[], mid), None);
    }
}
