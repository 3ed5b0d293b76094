//! Shared domain types.
//!
//! These types are kept lightweight and serializable so that results can be:
//!
//! - consumed in-memory by a presentation layer
//! - printed as JSON by the `gm` binary
//! - exported to CSV

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

/// Per-series anchor policy for growth rebasing.
///
/// Mirrors a small static configuration table:
/// `{series_name, anchor_date, display_start_date?, skip?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorOverride {
    pub series_name: String,
    /// First date considered the "start" for this series.
    pub anchor_date: NaiveDate,
    /// First date actually reported. Defaults to the resolved anchor date.
    #[serde(default)]
    pub display_start_date: Option<NaiveDate>,
    /// Exclude this series from growth output entirely.
    #[serde(default)]
    pub skip: bool,
}

impl AnchorOverride {
    pub fn anchored(series_name: impl Into<String>, anchor_date: NaiveDate) -> Self {
        Self {
            series_name: series_name.into(),
            anchor_date,
            display_start_date: None,
            skip: false,
        }
    }

    pub fn skipped(series_name: impl Into<String>, anchor_date: NaiveDate) -> Self {
        Self {
            skip: true,
            ..Self::anchored(series_name, anchor_date)
        }
    }

    pub fn with_display_start(mut self, date: NaiveDate) -> Self {
        self.display_start_date = Some(date);
        self
    }
}

/// At most one `AnchorOverride` per series name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideSet {
    by_series: BTreeMap<String, AnchorOverride>,
}

impl OverrideSet {
    pub fn new(overrides: Vec<AnchorOverride>) -> Result<Self, AnalyticsError> {
        let mut by_series = BTreeMap::new();
        for o in overrides {
            if o.series_name.trim().is_empty() {
                return Err(AnalyticsError::InvalidOverride {
                    series: o.series_name,
                    reason: "series name cannot be empty.".to_string(),
                });
            }
            if by_series.contains_key(&o.series_name) {
                return Err(AnalyticsError::InvalidOverride {
                    series: o.series_name,
                    reason: "listed more than once.".to_string(),
                });
            }
            by_series.insert(o.series_name.clone(), o);
        }
        Ok(Self { by_series })
    }

    pub fn get(&self, series: &str) -> Option<&AnchorOverride> {
        self.by_series.get(series)
    }

    pub fn is_empty(&self) -> bool {
        self.by_series.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_series.len()
    }

    /// Overrides in series-name order.
    pub fn iter(&self) -> impl Iterator<Item = &AnchorOverride> {
        self.by_series.values()
    }
}

/// A series whose computation failed inside a batch operation.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesFailure {
    pub series: String,
    pub error: AnalyticsError,
}

impl Serialize for SeriesFailure {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("SeriesFailure", 2)?;
        s.serialize_field("series", &self.series)?;
        s.serialize_field("error", &self.error.to_string())?;
        s.end()
    }
}

/// Result of a per-series batch operation.
///
/// One bad series never aborts the batch: it lands in `failures` and every
/// other series still gets a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutput<T> {
    pub results: BTreeMap<String, T>,
    pub failures: Vec<SeriesFailure>,
    /// Series excluded by policy (not an error).
    pub skipped: Vec<String>,
}

impl<T> Default for BatchOutput<T> {
    fn default() -> Self {
        Self {
            results: BTreeMap::new(),
            failures: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> BatchOutput<T> {
    pub fn record(&mut self, series: &str, outcome: Result<T, AnalyticsError>) {
        match outcome {
            Ok(value) => {
                self.results.insert(series.to_string(), value);
            }
            Err(error) => {
                log::warn!("{error}");
                self.failures.push(SeriesFailure {
                    series: series.to_string(),
                    error,
                });
            }
        }
    }

    pub fn failure(&self, series: &str) -> Option<&AnalyticsError> {
        self.failures.iter().find(|f| f.series == series).map(|f| &f.error)
    }
}

/// One rebased observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrowthPoint {
    pub date: NaiveDate,
    pub growth_percent: f64,
}

/// Growth of one series relative to its anchor observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthSeries {
    pub series_name: String,
    pub anchor_date: NaiveDate,
    pub anchor_value: f64,
    pub points: Vec<GrowthPoint>,
}

/// Percent change between two consecutive present rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodChange {
    pub previous_date: NaiveDate,
    pub date: NaiveDate,
    pub percent: f64,
}

/// Percent change between two user-picked endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeChange {
    pub start_date: NaiveDate,
    pub start_value: f64,
    pub end_date: NaiveDate,
    pub end_value: f64,
    pub percent: f64,
}

/// Sum of a series' present values inside one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthTotal {
    pub total: f64,
    pub count: usize,
}

/// Non-seasonal ARIMA order `(p, d, q)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

/// Seasonal order `(P, D, Q, s)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub period: usize,
}

impl Default for SarimaOrder {
    fn default() -> Self {
        Self { p: 1, d: 1, q: 1 }
    }
}

impl Default for SeasonalOrder {
    fn default() -> Self {
        Self {
            p: 1,
            d: 1,
            q: 1,
            period: 12,
        }
    }
}

fn parse_usize_list(s: &str, expected: usize) -> Result<Vec<usize>, String> {
    let parts: Vec<&str> = s
        .trim_matches(|c| c == '(' || c == ')')
        .split(',')
        .map(str::trim)
        .collect();
    if parts.len() != expected {
        return Err(format!("expected {expected} comma-separated integers, got '{s}'"));
    }
    parts
        .iter()
        .map(|p| p.parse::<usize>().map_err(|_| format!("'{p}' is not a non-negative integer")))
        .collect()
}

impl FromStr for SarimaOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = parse_usize_list(s, 3)?;
        Ok(Self {
            p: v[0],
            d: v[1],
            q: v[2],
        })
    }
}

impl FromStr for SeasonalOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = parse_usize_list(s, 4)?;
        Ok(Self {
            p: v[0],
            d: v[1],
            q: v[2],
            period: v[3],
        })
    }
}

/// Seasonal forecaster configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    pub order: SarimaOrder,
    pub seasonal_order: SeasonalOrder,
    /// Two-sided interval coverage, in `(0, 1)`.
    pub confidence_level: f64,
    /// Seed for the jittered optimizer starts.
    pub seed: u64,
    /// Number of jittered starts on top of the two deterministic ones.
    pub restarts: usize,
    /// Nelder–Mead iteration cap per start.
    pub max_iterations: usize,
    /// Relative objective tolerance for convergence.
    pub tolerance: f64,
    /// Optional wall-clock budget for the whole fit.
    pub time_budget: Option<Duration>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            order: SarimaOrder::default(),
            seasonal_order: SeasonalOrder::default(),
            confidence_level: 0.95,
            seed: 42,
            restarts: 4,
            max_iterations: 5_000,
            tolerance: 1e-10,
            time_budget: None,
        }
    }
}

/// Largest AR/MA order (either part) we accept.
pub const MAX_ARMA_ORDER: usize = 3;
/// Largest differencing order (either part) we accept.
pub const MAX_DIFF_ORDER: usize = 2;

impl ForecastConfig {
    pub fn with_period(mut self, period: usize) -> Self {
        self.seasonal_order.period = period;
        self
    }

    pub fn validate(&self) -> Result<(), AnalyticsError> {
        let o = self.order;
        let s = self.seasonal_order;
        if [o.p, o.q, s.p, s.q].iter().any(|&k| k > MAX_ARMA_ORDER) {
            return Err(AnalyticsError::invalid_input(format!(
                "AR/MA orders must be <= {MAX_ARMA_ORDER}."
            )));
        }
        if o.d > MAX_DIFF_ORDER || s.d > MAX_DIFF_ORDER {
            return Err(AnalyticsError::invalid_input(format!(
                "differencing orders must be <= {MAX_DIFF_ORDER}."
            )));
        }
        if s.period < 2 {
            return Err(AnalyticsError::invalid_input("seasonal period must be >= 2."));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(AnalyticsError::invalid_input(
                "confidence_level must be between 0.0 and 1.0 (exclusive).",
            ));
        }
        if self.max_iterations == 0 {
            return Err(AnalyticsError::invalid_input("max_iterations must be > 0."));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(AnalyticsError::invalid_input("tolerance must be finite and > 0."));
        }
        Ok(())
    }
}

/// One forecast step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Fitted coefficients and fit statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitDiagnostics {
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
    /// Innovation variance estimate.
    pub sigma2: f64,
    /// Conditional sum of squares at the optimum.
    pub css: f64,
    /// Observations used (after dropping missing values).
    pub n_obs: usize,
    pub iterations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub series_name: String,
    pub horizon: usize,
    pub confidence_level: f64,
    pub order: SarimaOrder,
    pub seasonal_order: SeasonalOrder,
    pub points: Vec<ForecastPoint>,
    pub diagnostics: FitDiagnostics,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn override_set_rejects_duplicates() {
        let err = OverrideSet::new(vec![
            AnchorOverride::anchored("TikTok", d(2023, 1, 1)),
            AnchorOverride::skipped("TikTok", d(2023, 1, 1)),
        ])
        .unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidOverride { .. }));
    }

    #[test]
    fn override_set_iterates_in_name_order() {
        let set = OverrideSet::new(vec![
            AnchorOverride::anchored("YouTube", d(2023, 1, 1)),
            AnchorOverride::anchored("Instagram", d(2023, 1, 1)),
            AnchorOverride::anchored("TikTok", d(2023, 1, 1)),
        ])
        .unwrap();
        let names: Vec<&str> = set.iter().map(|o| o.series_name.as_str()).collect();
        assert_eq!(names, ["Instagram", "TikTok", "YouTube"]);
    }

    #[test]
    fn override_record_deserializes_with_defaults() {
        let json = r#"[
            {"series_name": "TikTok", "anchor_date": "2023-01-01"},
            {"series_name": "Threads", "anchor_date": "2023-07-01", "display_start_date": "2023-09-01", "skip": true}
        ]"#;
        let records: Vec<AnchorOverride> = serde_json::from_str(json).unwrap();
        assert!(!records[0].skip);
        assert_eq!(records[0].display_start_date, None);
        assert!(records[1].skip);
        assert_eq!(records[1].display_start_date, Some(d(2023, 9, 1)));
    }

    #[test]
    fn orders_parse_from_comma_lists() {
        assert_eq!("2,1,0".parse::<SarimaOrder>().unwrap(), SarimaOrder { p: 2, d: 1, q: 0 });
        assert_eq!(
            "(1,1,1,12)".parse::<SeasonalOrder>().unwrap(),
            SeasonalOrder::default()
        );
        assert!("1,1".parse::<SarimaOrder>().is_err());
        assert!("1,x,1,12".parse::<SeasonalOrder>().is_err());
    }

    #[test]
    fn config_validation_catches_bad_settings() {
        assert!(ForecastConfig::default().validate().is_ok());

        let mut cfg = ForecastConfig::default();
        cfg.confidence_level = 1.0;
        assert!(cfg.validate().is_err());

        let cfg = ForecastConfig::default().with_period(1);
        assert!(cfg.validate().is_err());

        let mut cfg = ForecastConfig::default();
        cfg.order.p = 4;
        assert!(cfg.validate().is_err());
    }
}
