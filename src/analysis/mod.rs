//! Table analyses: date filtering, growth rebasing, change aggregation and
//! month totals.
//!
//! Everything here is a pure function over an immutable `TimeSeriesTable`.
//! Per-series problems are reported through `BatchOutput::failures`.

pub mod change;
pub mod filter;
pub mod rebase;
pub mod totals;

pub use change::*;
pub use filter::*;
pub use rebase::*;
pub use totals::*;
