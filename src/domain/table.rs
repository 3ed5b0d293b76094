//! The in-memory table every analysis runs on.
//!
//! A `TimeSeriesTable` is a single ascending date axis plus any number of named
//! columns, each holding one optional value per axis date. It is built once by
//! the ingestion side and never mutated; filters and analyses produce new
//! values instead.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::AnalyticsError;

/// One named metric column aligned to the table's date axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesColumn {
    pub name: String,
    /// `None` marks a missing observation. Present values are always finite.
    pub values: Vec<Option<f64>>,
}

impl SeriesColumn {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Validated table of dated metric columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesTable {
    dates: Vec<NaiveDate>,
    columns: Vec<SeriesColumn>,
}

/// Borrowed view of a single series: `(date, value)` pairs in axis order.
#[derive(Debug, Clone, Copy)]
pub struct SeriesView<'a> {
    pub name: &'a str,
    dates: &'a [NaiveDate],
    values: &'a [Option<f64>],
}

impl<'a> SeriesView<'a> {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &'a [NaiveDate] {
        self.dates
    }

    pub fn values(&self) -> &'a [Option<f64>] {
        self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Option<f64>)> + 'a {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Present observations only, in axis order.
    pub fn observations(&self) -> impl Iterator<Item = (NaiveDate, f64)> + 'a {
        self.iter().filter_map(|(d, v)| v.map(|v| (d, v)))
    }

    pub fn first_observation(&self) -> Option<(NaiveDate, f64)> {
        self.observations().next()
    }

    pub fn last_observation(&self) -> Option<(NaiveDate, f64)> {
        self.observations().last()
    }

    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        let idx = self.dates.binary_search(&date).ok()?;
        self.values[idx]
    }
}

impl TimeSeriesTable {
    /// Build a table, enforcing the structural invariants:
    ///
    /// - dates strictly increasing (sorted, no duplicates)
    /// - series names non-empty and unique
    /// - one value per date in every column
    /// - present values finite
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<SeriesColumn>) -> Result<Self, AnalyticsError> {
        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(AnalyticsError::invalid_table(format!(
                "dates must be strictly increasing ({} is followed by {}).",
                w[0], w[1]
            )));
        }

        let mut seen = HashSet::new();
        for col in &columns {
            if col.name.trim().is_empty() {
                return Err(AnalyticsError::invalid_table("series name cannot be empty."));
            }
            if !seen.insert(col.name.as_str()) {
                return Err(AnalyticsError::invalid_table(format!(
                    "duplicate series name '{}'.",
                    col.name
                )));
            }
            if col.values.len() != dates.len() {
                return Err(AnalyticsError::invalid_table(format!(
                    "series '{}' has {} values for {} dates.",
                    col.name,
                    col.values.len(),
                    dates.len()
                )));
            }
            if let Some(idx) = col.values.iter().position(|v| v.is_some_and(|v| !v.is_finite())) {
                return Err(AnalyticsError::invalid_table(format!(
                    "series '{}' has a non-finite value at {}.",
                    col.name, dates[idx]
                )));
            }
        }

        Ok(Self { dates, columns })
    }

    /// Build a table whose columns are fully populated.
    pub fn from_dense(
        dates: Vec<NaiveDate>,
        columns: Vec<(&str, Vec<f64>)>,
    ) -> Result<Self, AnalyticsError> {
        let columns = columns
            .into_iter()
            .map(|(name, values)| SeriesColumn::new(name, values.into_iter().map(Some).collect()))
            .collect();
        Self::new(dates, columns)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[SeriesColumn] {
        &self.columns
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    pub fn series_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn series(&self, name: &str) -> Option<SeriesView<'_>> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| self.view(c))
    }

    pub fn require_series(&self, name: &str) -> Result<SeriesView<'_>, AnalyticsError> {
        self.series(name).ok_or_else(|| AnalyticsError::UnknownSeries {
            series: name.to_string(),
        })
    }

    pub fn iter_series(&self) -> impl Iterator<Item = SeriesView<'_>> {
        self.columns.iter().map(|c| self.view(c))
    }

    /// Keep the rows whose index satisfies `keep`, preserving every column.
    pub(crate) fn select_rows(&self, keep: impl Fn(NaiveDate) -> bool) -> Self {
        let idx: Vec<usize> = self
            .dates
            .iter()
            .enumerate()
            .filter_map(|(i, &d)| keep(d).then_some(i))
            .collect();

        let dates = idx.iter().map(|&i| self.dates[i]).collect();
        let columns = self
            .columns
            .iter()
            .map(|c| SeriesColumn {
                name: c.name.clone(),
                values: idx.iter().map(|&i| c.values[i]).collect(),
            })
            .collect();

        // Row selection cannot break any invariant of an already valid table.
        Self { dates, columns }
    }

    fn view<'a>(&'a self, col: &'a SeriesColumn) -> SeriesView<'a> {
        SeriesView {
            name: &col.name,
            dates: &self.dates,
            values: &col.values,
        }
    }
}
