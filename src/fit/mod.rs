//! Seasonal model fitting and forecasting.
//!
//! Responsibilities:
//!
//! - build optimizer starts (Hannan–Rissanen, zeros, seeded jitter)
//! - minimize the conditional sum of squares from each start (parallel)
//! - select the best converged fit and produce interval forecasts

pub mod forecaster;
pub mod optimizer;
pub mod start;

pub use forecaster::*;
pub use optimizer::*;
pub use start::*;
