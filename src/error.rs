use chrono::NaiveDate;
use thiserror::Error;

/// Failures raised by the analytics core.
///
/// Batch operations record these per series (see `domain::BatchOutput`);
/// single-target operations (range filter, forecast) return them directly.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyticsError {
    #[error("Invalid date range: start {start} is after end {end}.")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Series '{series}': baseline value at {date} is zero.")]
    DegenerateBaseline { series: String, date: NaiveDate },

    #[error("Series '{series}': no observation at endpoint {}.", fmt_opt_date(.date))]
    InsufficientData { series: String, date: Option<NaiveDate> },

    #[error(
        "Series '{series}': need at least {required} monthly observations for seasonal period {period}, got {actual}."
    )]
    InsufficientHistory {
        series: String,
        required: usize,
        actual: usize,
        period: usize,
    },

    #[error("Series '{series}': model fit failed: {reason}")]
    ModelFit { series: String, reason: String },

    #[error("Series '{series}': no value at anchor date {date}.")]
    MissingBaseline { series: String, date: NaiveDate },

    #[error("Override for '{series}': {reason}")]
    InvalidOverride { series: String, reason: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Invalid table: {reason}")]
    InvalidTable { reason: String },

    #[error("Unknown series '{series}'.")]
    UnknownSeries { series: String },
}

fn fmt_opt_date(date: &Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.to_string(),
        None => "(empty table)".to_string(),
    }
}

impl AnalyticsError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn invalid_table(reason: impl Into<String>) -> Self {
        Self::InvalidTable {
            reason: reason.into(),
        }
    }

    /// Process exit code used when this error aborts a CLI run.
    pub fn exit_code(&self) -> u8 {
        match self {
            AnalyticsError::InvalidRange { .. }
            | AnalyticsError::InvalidOverride { .. }
            | AnalyticsError::InvalidInput { .. }
            | AnalyticsError::InvalidTable { .. }
            | AnalyticsError::UnknownSeries { .. } => 2,
            AnalyticsError::InsufficientData { .. }
            | AnalyticsError::InsufficientHistory { .. }
            | AnalyticsError::MissingBaseline { .. } => 3,
            AnalyticsError::DegenerateBaseline { .. } | AnalyticsError::ModelFit { .. } => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<AnalyticsError> for AppError {
    fn from(err: AnalyticsError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analytics_errors_map_to_exit_codes() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let range: AppError = AnalyticsError::InvalidRange { start: d, end: d }.into();
        assert_eq!(range.exit_code(), 2);

        let history: AppError = AnalyticsError::InsufficientHistory {
            series: "x".to_string(),
            required: 24,
            actual: 10,
            period: 12,
        }
        .into();
        assert_eq!(history.exit_code(), 3);
        assert!(history.to_string().contains("got 10"));

        let fit: AppError = AnalyticsError::ModelFit {
            series: "x".to_string(),
            reason: "no start converged".to_string(),
        }
        .into();
        assert_eq!(fit.exit_code(), 4);
    }

    #[test]
    fn insufficient_data_formats_with_and_without_date() {
        let dated = AnalyticsError::InsufficientData {
            series: "x".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1),
        };
        assert_eq!(dated.to_string(), "Series 'x': no observation at endpoint 2024-03-01.");

        let empty = AnalyticsError::InsufficientData {
            series: "x".to_string(),
            date: None,
        };
        assert_eq!(empty.to_string(), "Series 'x': no observation at endpoint (empty table).");
        assert_eq!(empty.exit_code(), 3);
    }
}
