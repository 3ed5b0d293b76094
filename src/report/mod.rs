//! Reporting utilities: text tables for every analysis and qualified
//! per-series failure notes.

pub mod format;

pub use format::*;
