//! Metrics primitives for the node dashboard.
//!
//! - [`BoundedSeries`]: fixed-capacity ring buffer of timestamped samples,
//!   the storage behind every chartable history.
//! - [`Counter`]: an atomic tally for ingest statistics, zeroed together
//!   with the store.

mod counter;
mod series;

pub use counter::Counter;
pub use series::{format_epoch_hms, now_hms, BoundedSeries, Pairs, Sample};
