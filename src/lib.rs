//! `growth-metrics` library crate.
//!
//! The binary (`gm`) is a thin wrapper around this library so that:
//!
//! - core analytics are testable without spawning processes
//! - a dashboard or service can embed the same functions
//! - code stays easy to navigate as the project grows

pub mod analysis;
pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
