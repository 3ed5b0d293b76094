//! Domain types used throughout the analytics core.
//!
//! This module defines:
//!
//! - the validated input table (`TimeSeriesTable`)
//! - anchor override policy (`AnchorOverride`, `OverrideSet`)
//! - analysis outputs (`GrowthSeries`, `PeriodChange`, `ForecastResult`, etc.)
//! - forecaster configuration (`ForecastConfig`)

pub mod table;
pub mod types;

pub use table::*;
pub use types::*;
