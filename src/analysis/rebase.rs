//! Anchor-relative growth ("rebasing").
//!
//! Each series is expressed as percent growth over one anchor observation:
//!
//! ```text
//! growth(t) = (value(t) - anchor) / anchor * 100
//! ```
//!
//! By default the anchor is the table's first date. An `AnchorOverride` moves
//! the anchor (and optionally the first reported date) for one series, or
//! excludes the series altogether via `skip`.

use chrono::NaiveDate;

use crate::domain::{
    AnchorOverride, BatchOutput, GrowthPoint, GrowthSeries, OverrideSet, SeriesView, TimeSeriesTable,
};
use crate::error::AnalyticsError;

/// Rebase every series of `table` onto its anchor observation.
///
/// Failures are recorded per series; the batch always completes.
pub fn rebase(table: &TimeSeriesTable, overrides: &OverrideSet) -> BatchOutput<GrowthSeries> {
    let mut out = BatchOutput::default();

    for o in overrides.iter() {
        if table.series(&o.series_name).is_none() {
            log::warn!("Ignoring override for unknown series '{}'.", o.series_name);
        }
    }

    let Some(global_start) = table.first_date() else {
        for view in table.iter_series() {
            out.record(
                view.name,
                Err(AnalyticsError::InsufficientData {
                    series: view.name.to_string(),
                    date: None,
                }),
            );
        }
        return out;
    };

    for view in table.iter_series() {
        let policy = overrides.get(view.name);
        if policy.is_some_and(|o| o.skip) {
            log::debug!("Skipping '{}' by override.", view.name);
            out.skipped.push(view.name.to_string());
            continue;
        }
        out.record(view.name, rebase_series(&view, global_start, policy));
    }

    log::info!(
        "rebase: {} series rebased, {} failed, {} skipped",
        out.results.len(),
        out.failures.len(),
        out.skipped.len()
    );
    out
}

fn rebase_series(
    view: &SeriesView<'_>,
    global_start: NaiveDate,
    policy: Option<&AnchorOverride>,
) -> Result<GrowthSeries, AnalyticsError> {
    let series = view.name.to_string();

    let anchor_date = match policy {
        Some(o) => resolve_anchor_date(view, o)?,
        None => global_start,
    };

    let anchor_value = view
        .value_at(anchor_date)
        .ok_or_else(|| AnalyticsError::MissingBaseline {
            series: series.clone(),
            date: anchor_date,
        })?;
    if anchor_value == 0.0 {
        return Err(AnalyticsError::DegenerateBaseline {
            series,
            date: anchor_date,
        });
    }

    let display_start = policy
        .and_then(|o| o.display_start_date)
        .unwrap_or(anchor_date);

    let points = view
        .observations()
        .filter(|(d, _)| *d >= display_start)
        .map(|(date, value)| GrowthPoint {
            date,
            growth_percent: growth_percent(value, anchor_value),
        })
        .collect();

    Ok(GrowthSeries {
        series_name: series,
        anchor_date,
        anchor_value,
        points,
    })
}

/// Map an override's anchor date onto the axis: the first axis date on or
/// after it. The anchor may not precede the series' first present value.
fn resolve_anchor_date(view: &SeriesView<'_>, o: &AnchorOverride) -> Result<NaiveDate, AnalyticsError> {
    if let Some((first, _)) = view.first_observation() {
        if o.anchor_date < first {
            return Err(AnalyticsError::InvalidOverride {
                series: o.series_name.clone(),
                reason: format!(
                    "anchor date {} precedes the first observation {first}.",
                    o.anchor_date
                ),
            });
        }
    }

    view.dates()
        .iter()
        .copied()
        .find(|d| *d >= o.anchor_date)
        .ok_or_else(|| AnalyticsError::MissingBaseline {
            series: o.series_name.clone(),
            date: o.anchor_date,
        })
}

fn growth_percent(value: f64, anchor: f64) -> f64 {
    let g = (value - anchor) / anchor * 100.0;
    // Normalize -0.0 (negative anchors) so the anchor row reads exactly 0.
    if g == 0.0 { 0.0 } else { g }
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

    fn growth_values(g: &GrowthSeries) -> Vec<f64> {
        g.points.iter().map(|p| p.growth_percent).collect()
    }

    #[test]
    fn rebases_simple_compounding_series() {
        let t = TimeSeriesTable::from_dense(months(3), vec![("a", vec![100.0, 110.0, 121.0])]).unwrap();
        let out = rebase(&t, &OverrideSet::default());
        let g = &out.results["a"];
        let v = growth_values(g);
        assert_eq!(v[0], 0.0);
        assert!((v[1] - 10.0).abs() < 1e-9);
        assert!((v[2] - 21.0).abs() < 1e-9);
        assert_eq!(g.anchor_value, 100.0);
        assert!(out.failures.is_empty());
    }

    #[test]
    fn zero_anchor_fails_only_that_series() {
        let t = TimeSeriesTable::from_dense(
            months(3),
            vec![("zero", vec![0.0, 5.0, 6.0]), ("ok", vec![50.0, 75.0, 100.0])],
        )
        .unwrap();
        let out = rebase(&t, &OverrideSet::default());

        assert!(!out.results.contains_key("zero"));
        assert_eq!(
            out.failure("zero"),
            Some(&AnalyticsError::DegenerateBaseline {
                series: "zero".to_string(),
                date: d(2024, 1)
            })
        );
        assert_eq!(growth_values(&out.results["ok"]), vec![0.0, 50.0, 100.0]);
    }

    #[test]
    fn override_moves_anchor_and_display_start() {
        // A late-joining series: collected from March, charted from April.
        let t = TimeSeriesTable::new(
            months(5),
            vec![
                SeriesColumn::new("late", vec![None, None, Some(20.0), Some(30.0), Some(40.0)]),
                SeriesColumn::new("base", (1..=5).map(|v| Some(v as f64 * 10.0)).collect()),
            ],
        )
        .unwrap();
        let overrides = OverrideSet::new(vec![
            AnchorOverride::anchored("late", d(2024, 3)).with_display_start(d(2024, 4)),
        ])
        .unwrap();

        let out = rebase(&t, &overrides);
        let late = &out.results["late"];
        assert_eq!(late.anchor_date, d(2024, 3));
        assert_eq!(late.points.first().map(|p| p.date), Some(d(2024, 4)));
        assert_eq!(growth_values(late), vec![50.0, 100.0]);
        assert_eq!(out.results["base"].points.len(), 5);
    }

    #[test]
    fn anchor_between_axis_dates_resolves_forward() {
        let t = TimeSeriesTable::from_dense(months(3), vec![("a", vec![10.0, 20.0, 40.0])]).unwrap();
        let mid_jan = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let overrides = OverrideSet::new(vec![AnchorOverride::anchored("a", mid_jan)]).unwrap();
        let g = &rebase(&t, &overrides).results["a"];
        assert_eq!(g.anchor_date, d(2024, 2));
        assert_eq!(growth_values(g), vec![0.0, 100.0]);
    }

    #[test]
    fn growth_is_zero_at_every_anchor() {
        let values = vec![3.0, -4.0, 7.5, 12.0, 0.5, 9.0];
        let t = TimeSeriesTable::from_dense(months(6), vec![("a", values)]).unwrap();
        for &anchor in t.dates() {
            let overrides = OverrideSet::new(vec![AnchorOverride::anchored("a", anchor)]).unwrap();
            let g = &rebase(&t, &overrides).results["a"];
            let at_anchor = g.points.iter().find(|p| p.date == anchor).unwrap();
            assert_eq!(at_anchor.growth_percent, 0.0);
            assert!(at_anchor.growth_percent.is_sign_positive());
        }
    }

    #[test]
    fn skip_policy_excludes_series() {
        let t = TimeSeriesTable::from_dense(months(2), vec![("a", vec![1.0, 2.0]), ("b", vec![1.0, 3.0])])
            .unwrap();
        let overrides = OverrideSet::new(vec![AnchorOverride::skipped("b", d(2024, 1))]).unwrap();
        let out = rebase(&t, &overrides);
        assert_eq!(out.skipped, vec!["b".to_string()]);
        assert!(out.results.contains_key("a"));
        assert!(!out.results.contains_key("b"));
        assert!(out.failures.is_empty());
    }

    #[test]
    fn missing_values_are_omitted_not_imputed() {
        let t = TimeSeriesTable::new(
            months(4),
            vec![SeriesColumn::new("a", vec![Some(10.0), None, Some(15.0), None])],
        )
        .unwrap();
        let g = &rebase(&t, &OverrideSet::default()).results["a"];
        let dates: Vec<NaiveDate> = g.points.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![d(2024, 1), d(2024, 3)]);
    }

    #[test]
    fn missing_default_anchor_and_early_override_are_recorded() {
        let t = TimeSeriesTable::new(
            months(3),
            vec![
                SeriesColumn::new("late", vec![None, Some(5.0), Some(6.0)]),
                SeriesColumn::new("early", vec![None, Some(5.0), Some(6.0)]),
            ],
        )
        .unwrap();
        let overrides = OverrideSet::new(vec![AnchorOverride::anchored("early", d(2024, 1))]).unwrap();
        let out = rebase(&t, &overrides);

        assert!(matches!(out.failure("late"), Some(AnalyticsError::MissingBaseline { .. })));
        assert!(matches!(out.failure("early"), Some(AnalyticsError::InvalidOverride { .. })));
    }
}
