//! Seasonal ARIMA model algebra.
//!
//! Kept as small, pure functions over flat parameter vectors so the fitting
//! code can stay generic.

pub mod sarima;

pub use sarima::*;
