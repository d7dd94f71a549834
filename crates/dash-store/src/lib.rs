//! Node dashboard store.
//!
//! Ingests the multiplexed metric feed of a node into bounded, time-ordered
//! histories, tracks the peer population with per-peer history and derives
//! secondary series on demand.
//!
//! Wire side: `dash-transport` (topics, framing, subscription state machine).
//! History primitive: `dash-metrics::BoundedSeries`.

pub mod chart;
pub mod derived;
pub mod error;
pub mod peers;
pub mod router;
pub mod runtime;
pub mod store;
pub mod types;

pub use chart::{Chart, ChartSeries, SeriesBuilder};
pub use error::DashStoreError;
pub use peers::{BatchOutcome, PeerEntry, PeerRegistry};
pub use router::{Dispatch, Handler, IngestRouter, RouterStats};
pub use runtime::{DashRuntime, RuntimeChannels, RuntimeCommand, RuntimeHandle};
pub use store::{NodeStore, StoreChange, StoreHandle};
pub use types::{
    AvgSpamMetric, CacheMetric, CacheMetrics, ConfirmedMilestoneMetric, DbCleanupEvent,
    DbSizeMetric, Heartbeat, MemoryMetrics, Milestone, MpsMetric, NetworkIo, PeerInfo,
    PeerMetric, ReqQueueMetric, ServerMetrics, SpamMetric, Status, SyncStatus, TipSelMetric,
};
