//! Input/output helpers.
//!
//! - wide CSV ingest (`ingest`)
//! - anchor override JSON (`overrides`)
//! - result exports to CSV (`export`)

pub mod export;
pub mod ingest;
pub mod overrides;

pub use export::*;
pub use ingest::*;
pub use overrides::*;
