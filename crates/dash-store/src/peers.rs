/// Peer metric registry: per-peer history keyed by identity.
///
/// Every peer-metrics message carries the complete current peer set, so a
/// batch both updates and reconciles membership: a peer absent from one
/// batch is gone, together with its history.
use indexmap::IndexMap;
use serde::Serialize;

use dash_metrics::BoundedSeries;

use crate::types::{NetworkIo, PeerMetric};

/// Samples retained per peer, raw and network I/O alike.
pub const PEER_HISTORY: usize = 900;

/// Raw samples and derived network I/O for one peer.
#[derive(Debug, Clone, Serialize)]
pub struct PeerEntry {
    identity: String,
    raw: BoundedSeries<PeerMetric>,
    net_io: BoundedSeries<NetworkIo>,
}

impl PeerEntry {
    fn new(identity: String) -> Self {
        Self {
            identity,
            raw: BoundedSeries::new(PEER_HISTORY),
            net_io: BoundedSeries::new(PEER_HISTORY),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Raw samples, oldest first.
    pub fn raw(&self) -> &BoundedSeries<PeerMetric> {
        &self.raw
    }

    /// Network I/O deltas. One shorter than `raw` until eviction kicks in.
    pub fn net_io(&self) -> &BoundedSeries<NetworkIo> {
        &self.net_io
    }

    /// Most recent raw sample.
    pub fn current(&self) -> Option<&PeerMetric> {
        self.raw.latest().map(|s| &s.value)
    }

    fn add(&mut self, metric: PeerMetric) {
        let io = self.current().map(|prev| NetworkIo {
            tx: signed_delta(metric.bytes_written, prev.bytes_written),
            rx: signed_delta(metric.bytes_read, prev.bytes_read),
        });
        self.raw.push(metric);
        if let Some(io) = io {
            self.net_io.push(io);
        }
    }
}

/// Result of one batch, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
}

/// Peers in first-seen order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PeerRegistry {
    entries: IndexMap<String, PeerEntry>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one full peer-set message.
    ///
    /// `None` (a `null` payload) leaves the registry untouched; an empty
    /// batch removes every peer.
    pub fn update_batch(&mut self, batch: Option<Vec<PeerMetric>>) -> BatchOutcome {
        let Some(batch) = batch else {
            return BatchOutcome::default();
        };

        let mut outcome = BatchOutcome::default();
        let mut seen = std::collections::HashSet::with_capacity(batch.len());
        for metric in batch {
            seen.insert(metric.identity.clone());
            match self.entries.get_mut(&metric.identity) {
                Some(entry) => {
                    entry.add(metric);
                    outcome.updated += 1;
                }
                None => {
                    let mut entry = PeerEntry::new(metric.identity.clone());
                    entry.add(metric);
                    self.entries.insert(entry.identity.clone(), entry);
                    outcome.added += 1;
                }
            }
        }

        let before = self.entries.len();
        self.entries.retain(|identity, _| seen.contains(identity));
        outcome.removed = before - self.entries.len();
        if outcome.removed > 0 {
            tracing::debug!(removed = outcome.removed, "peers left");
        }
        outcome
    }

    pub fn get(&self, identity: &str) -> Option<&PeerEntry> {
        self.entries.get(identity)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.entries.contains_key(identity)
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &PeerEntry> {
        self.entries.values()
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

fn signed_delta(curr: u64, prev: u64) -> i64 {
    (curr as i64).wrapping_sub(prev as i64)
}
