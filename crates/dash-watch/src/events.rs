use crate::output;
use dash_store::{NodeStore, RouterStats};
use dash_transport::{FeedConfig, TopicBundle};
use serde::Serialize;
use std::io::Write;

/// Emit a JSONL event to stdout (flushed immediately for piped output).
/// If --output-dir was provided, also writes to the JSONL file.
pub fn emit<T: Serialize>(event: &T) {
    if let Ok(json) = serde_json::to_string(event) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        let _ = writeln!(lock, "{json}");
        let _ = lock.flush();

        output::write_jsonl_line(&json);
    }
}

/// Local wall-clock timestamp for JSONL events.
pub fn now_iso() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        .to_string()
}

// ── Session events ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventStarted {
    pub event: &'static str,
    pub addr: String,
    pub bundles: Vec<&'static str>,
    pub reconnect_delay_s: f64,
    pub timestamp: String,
}

impl EventStarted {
    pub fn new(config: &FeedConfig, bundles: &[TopicBundle]) -> Self {
        Self {
            event: "started",
            addr: config.addr.clone(),
            bundles: bundles.iter().map(|b| b.name()).collect(),
            reconnect_delay_s: config.reconnect_delay.as_secs_f64(),
            timestamp: now_iso(),
        }
    }
}

#[derive(Serialize)]
pub struct EventStopped {
    pub event: &'static str,
    pub elapsed_s: f64,
    pub timestamp: String,
}

// ── Connectivity ────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventConnectivity {
    pub event: &'static str,
    pub connected: bool,
    pub elapsed_s: f64,
    pub timestamp: String,
}

impl EventConnectivity {
    pub fn new(connected: bool, elapsed_s: f64) -> Self {
        Self {
            event: if connected { "connected" } else { "disconnected" },
            connected,
            elapsed_s,
            timestamp: now_iso(),
        }
    }
}

// ── Summary ─────────────────────────────────────────────────────

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct SeriesLengths {
    pub mps: usize,
    pub req_queue: usize,
    pub server: usize,
    pub mem: usize,
    pub cache: usize,
    pub tip_sel: usize,
    pub confirmed_ms: usize,
    pub db_size: usize,
    pub spam: usize,
    pub avg_spam: usize,
}

#[derive(Serialize)]
pub struct EventSummary {
    pub event: &'static str,
    pub connected: bool,
    pub title: String,
    pub synced_pct: u64,
    pub lsmi: u64,
    pub lmi: u64,
    pub uptime: String,
    pub peers: usize,
    pub mps_incoming: Option<u64>,
    pub mps_new: Option<u64>,
    pub mps_outgoing: Option<u64>,
    pub cleanup_running: bool,
    pub series: SeriesLengths,
    pub frames_applied: u64,
    pub frames_dropped: u64,
    pub frames_rejected: u64,
    pub elapsed_s: f64,
    pub timestamp: String,
}

impl EventSummary {
    /// Snapshot the store. Call with the read guard held only for the
    /// duration of this function.
    pub fn from_store(store: &NodeStore, stats: &RouterStats, elapsed_s: f64) -> Self {
        let mps = store.last_mps();
        let sync = store.sync_status();
        Self {
            event: "summary",
            connected: store.is_connected(),
            title: store.document_title(),
            synced_pct: store.percentage_synced(),
            lsmi: sync.lsmi,
            lmi: sync.lmi,
            uptime: store.uptime(),
            peers: store.peers().len(),
            mps_incoming: mps.map(|m| m.incoming),
            mps_new: mps.map(|m| m.new),
            mps_outgoing: mps.map(|m| m.outgoing),
            cleanup_running: store.is_cleanup_running(),
            series: SeriesLengths {
                mps: store.mps().len(),
                req_queue: store.req_queue().len(),
                server: store.server().len(),
                mem: store.mem().len(),
                cache: store.cache().len(),
                tip_sel: store.tip_sel().len(),
                confirmed_ms: store.confirmed_ms().len(),
                db_size: store.db_size().len(),
                spam: store.spam().len(),
                avg_spam: store.avg_spam().len(),
            },
            frames_applied: stats.dispatched.get(),
            frames_dropped: stats.dropped.get(),
            frames_rejected: stats.rejected.get(),
            elapsed_s,
            timestamp: now_iso(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_store::{MpsMetric, PeerMetric, Status, SyncStatus};

    #[test]
    fn empty_store_summary() {
        let store = NodeStore::new();
        let stats = RouterStats::default();
        let summary = EventSummary::from_store(&store, &stats, 1.5);

        assert!(!summary.connected);
        assert_eq!(summary.synced_pct, 0);
        assert_eq!(summary.uptime, "");
        assert_eq!(summary.peers, 0);
        assert_eq!(summary.mps_incoming, None);
        assert_eq!(summary.series, SeriesLengths::default());
    }

    #[test]
    fn summary_reflects_ingested_values() {
        let mut store = NodeStore::new();
        store.apply_sync_status(SyncStatus { lsmi: 50, lmi: 100 });
        store.apply_status(Status {
            uptime: 61_000,
            ..Status::default()
        });
        store.apply_mps(MpsMetric {
            incoming: 12,
            new: 4,
            outgoing: 9,
        });
        store.apply_peer_batch(Some(vec![PeerMetric {
            identity: "peer-a".into(),
            ..PeerMetric::default()
        }]));

        let stats = RouterStats::default();
        stats.dispatched.add(4);

        let summary = EventSummary::from_store(&store, &stats, 10.0);
        assert_eq!(summary.synced_pct, 50);
        assert_eq!(summary.uptime, "00:01:01");
        assert_eq!(summary.peers, 1);
        assert_eq!(summary.mps_incoming, Some(12));
        assert_eq!(summary.series.mps, 1);
        assert_eq!(summary.series.server, 1);
        assert_eq!(summary.frames_applied, 4);

        let line = serde_json::to_value(&summary).unwrap();
        assert_eq!(line["event"], "summary");
        assert_eq!(line["series"]["req_queue"], 1);
    }
}
