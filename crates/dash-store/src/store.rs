/// NodeStore: every bounded history, latest-sample slot and the peer
/// registry, behind one shared handle.
///
/// The runtime loop is the only writer. Readers go through
/// [`StoreHandle::read`] and observe whole updates only: the write lock is
/// held for exactly one handler.
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use serde::Serialize;
use tokio::sync::broadcast;

use dash_metrics::BoundedSeries;
use dash_transport::Topic;

use crate::peers::{BatchOutcome, PeerRegistry};
use crate::types::{
    AvgSpamMetric, CacheMetrics, ConfirmedMilestoneMetric, DbCleanupEvent, DbSizeMetric,
    MemoryMetrics, Milestone, MpsMetric, PeerMetric, ReqQueueMetric, ServerMetrics, SpamMetric,
    Status, SyncStatus, TipSelMetric,
};

// ── Capacities ───────────────────────────────────────────────────────

/// Message rate and every series fed by the status document.
pub const MAX_METRICS_DATA_POINTS: usize = 900;
pub const DB_SIZE_CAPACITY: usize = 600;
pub const SPAM_CAPACITY: usize = 500;
pub const TIP_SEL_CAPACITY: usize = 100;
pub const AVG_SPAM_CAPACITY: usize = 100;
pub const CONFIRMED_MS_CAPACITY: usize = 20;

/// Pending notifications per subscriber before the oldest are skipped.
const CHANGE_BUFFER: usize = 256;

// ── Change notification ─────────────────────────────────────────────

/// What changed in the store. Carries no data; read the store for that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    /// A handler for this topic applied a payload.
    Updated(Topic),
    /// Every history was cleared.
    Reset,
    /// The feed connection came up (`true`) or went down (`false`).
    Connectivity(bool),
}

// ── NodeStore ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct NodeStore {
    connected: bool,
    sync_status: SyncStatus,
    status: Option<Status>,

    mps: BoundedSeries<MpsMetric>,
    req_queue: BoundedSeries<ReqQueueMetric>,
    server: BoundedSeries<ServerMetrics>,
    mem: BoundedSeries<MemoryMetrics>,
    cache: BoundedSeries<CacheMetrics>,
    tip_sel: BoundedSeries<TipSelMetric>,
    spam: BoundedSeries<SpamMetric>,
    avg_spam: BoundedSeries<AvgSpamMetric>,
    confirmed_ms: BoundedSeries<ConfirmedMilestoneMetric>,
    db_size: BoundedSeries<DbSizeMetric>,

    db_cleanup: DbCleanupEvent,
    milestone: Option<Milestone>,
    peers: PeerRegistry,
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore {
    pub fn new() -> Self {
        Self {
            connected: false,
            sync_status: SyncStatus::default(),
            status: None,
            mps: BoundedSeries::new(MAX_METRICS_DATA_POINTS),
            req_queue: BoundedSeries::new(MAX_METRICS_DATA_POINTS),
            server: BoundedSeries::new(MAX_METRICS_DATA_POINTS),
            mem: BoundedSeries::new(MAX_METRICS_DATA_POINTS),
            cache: BoundedSeries::new(MAX_METRICS_DATA_POINTS),
            tip_sel: BoundedSeries::new(TIP_SEL_CAPACITY),
            spam: BoundedSeries::new(SPAM_CAPACITY),
            avg_spam: BoundedSeries::new(AVG_SPAM_CAPACITY),
            confirmed_ms: BoundedSeries::new(CONFIRMED_MS_CAPACITY),
            db_size: BoundedSeries::new(DB_SIZE_CAPACITY),
            db_cleanup: DbCleanupEvent::default(),
            milestone: None,
            peers: PeerRegistry::new(),
        }
    }

    /// Clear every history, latest slot and peer. Idempotent.
    ///
    /// The connectivity flag tracks the transport and is left alone.
    pub fn reset(&mut self) {
        let connected = self.connected;
        *self = Self::new();
        self.connected = connected;
    }

    // ── Writers (one per topic) ─────────────────────────────────────

    pub fn apply_sync_status(&mut self, sync: SyncStatus) {
        self.sync_status = sync;
    }

    /// Replace the status snapshot and append its four sub-records.
    pub fn apply_status(&mut self, status: Status) {
        self.req_queue.push(status.request_queue());
        self.server.push(status.server_metrics.clone());
        self.mem.push(status.mem.clone());
        self.cache.push(status.caches.clone());
        self.status = Some(status);
    }

    pub fn apply_mps(&mut self, metric: MpsMetric) {
        self.mps.push(metric);
    }

    pub fn apply_tip_sel(&mut self, metric: TipSelMetric) {
        self.tip_sel.push(metric);
    }

    /// Append a batch of confirmed milestones. `None` and empty are no-ops.
    pub fn apply_confirmed_ms(&mut self, batch: Option<Vec<ConfirmedMilestoneMetric>>) {
        if let Some(batch) = batch {
            self.confirmed_ms.extend(batch);
        }
    }

    /// Append a batch of database size samples. `None` and empty are no-ops.
    pub fn apply_db_size(&mut self, batch: Option<Vec<DbSizeMetric>>) {
        if let Some(batch) = batch {
            self.db_size.extend(batch);
        }
    }

    pub fn apply_db_cleanup(&mut self, event: DbCleanupEvent) {
        self.db_cleanup = event;
    }

    pub fn apply_spam(&mut self, metric: SpamMetric) {
        self.spam.push(metric);
    }

    pub fn apply_avg_spam(&mut self, metric: AvgSpamMetric) {
        self.avg_spam.push(metric);
    }

    pub fn apply_milestone(&mut self, milestone: Milestone) {
        self.milestone = Some(milestone);
    }

    pub fn apply_peer_batch(&mut self, batch: Option<Vec<PeerMetric>>) -> BatchOutcome {
        self.peers.update_batch(batch)
    }

    pub(crate) fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    // ── Readers ─────────────────────────────────────────────────────

    /// Whether the feed connection is currently up.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn sync_status(&self) -> &SyncStatus {
        &self.sync_status
    }

    /// Latest status document, `None` until the first one arrives.
    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn last_mps(&self) -> Option<&MpsMetric> {
        self.mps.latest().map(|s| &s.value)
    }

    pub fn last_tip_sel(&self) -> Option<&TipSelMetric> {
        self.tip_sel.latest().map(|s| &s.value)
    }

    pub fn last_confirmed_ms(&self) -> Option<&ConfirmedMilestoneMetric> {
        self.confirmed_ms.latest().map(|s| &s.value)
    }

    pub fn last_db_size(&self) -> Option<&DbSizeMetric> {
        self.db_size.latest().map(|s| &s.value)
    }

    pub fn last_spam(&self) -> Option<&SpamMetric> {
        self.spam.latest().map(|s| &s.value)
    }

    pub fn last_avg_spam(&self) -> Option<&AvgSpamMetric> {
        self.avg_spam.latest().map(|s| &s.value)
    }

    pub fn last_db_cleanup(&self) -> &DbCleanupEvent {
        &self.db_cleanup
    }

    /// Latest explorer milestone.
    pub fn milestone(&self) -> Option<&Milestone> {
        self.milestone.as_ref()
    }

    pub fn mps(&self) -> &BoundedSeries<MpsMetric> {
        &self.mps
    }

    pub fn req_queue(&self) -> &BoundedSeries<ReqQueueMetric> {
        &self.req_queue
    }

    pub fn server(&self) -> &BoundedSeries<ServerMetrics> {
        &self.server
    }

    pub fn mem(&self) -> &BoundedSeries<MemoryMetrics> {
        &self.mem
    }

    pub fn cache(&self) -> &BoundedSeries<CacheMetrics> {
        &self.cache
    }

    pub fn tip_sel(&self) -> &BoundedSeries<TipSelMetric> {
        &self.tip_sel
    }

    pub fn spam(&self) -> &BoundedSeries<SpamMetric> {
        &self.spam
    }

    pub fn avg_spam(&self) -> &BoundedSeries<AvgSpamMetric> {
        &self.avg_spam
    }

    pub fn confirmed_ms(&self) -> &BoundedSeries<ConfirmedMilestoneMetric> {
        &self.confirmed_ms
    }

    pub fn db_size(&self) -> &BoundedSeries<DbSizeMetric> {
        &self.db_size
    }

    pub fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    /// True when nothing but the connectivity flag is set.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.sync_status == SyncStatus::default()
            && self.db_cleanup == DbCleanupEvent::default()
            && self.milestone.is_none()
            && self.peers.is_empty()
            && self.mps.is_empty()
            && self.req_queue.is_empty()
            && self.server.is_empty()
            && self.mem.is_empty()
            && self.cache.is_empty()
            && self.tip_sel.is_empty()
            && self.spam.is_empty()
            && self.avg_spam.is_empty()
            && self.confirmed_ms.is_empty()
            && self.db_size.is_empty()
    }
}

// ── StoreHandle ──────────────────────────────────────────────────────

/// Shared, cheap-to-clone access to the [`NodeStore`].
#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<RwLock<NodeStore>>,
    changes: broadcast::Sender<StoreChange>,
}

impl Default for StoreHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreHandle {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            inner: Arc::new(RwLock::new(NodeStore::new())),
            changes,
        }
    }

    /// Read access. Do not hold the guard across an `.await`.
    pub fn read(&self) -> RwLockReadGuard<'_, NodeStore> {
        self.inner.read()
    }

    /// Subscribe to change notifications. A lagging subscriber loses
    /// notifications, never data.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    /// Run `f` under the write lock.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut NodeStore) -> R) -> R {
        let mut store = self.inner.write();
        f(&mut store)
    }

    pub(crate) fn notify(&self, change: StoreChange) {
        // No subscribers is fine.
        let _ = self.changes.send(change);
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.update(|s| s.set_connected(connected));
        self.notify(StoreChange::Connectivity(connected));
    }

    pub(crate) fn reset(&self) {
        self.update(NodeStore::reset);
        self.notify(StoreChange::Reset);
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle")
            .field("subscribers", &self.changes.receiver_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(uptime: u64) -> Status {
        Status {
            uptime,
            node_alias: "alpha".into(),
            ..Default::default()
        }
    }

    #[test]
    fn status_appends_to_four_series() {
        let mut store = NodeStore::new();
        store.apply_status(status(1_000));
        store.apply_status(status(2_000));

        assert_eq!(store.req_queue().len(), 2);
        assert_eq!(store.server().len(), 2);
        assert_eq!(store.mem().len(), 2);
        assert_eq!(store.cache().len(), 2);
        assert_eq!(store.status().unwrap().uptime, 2_000);
    }

    #[test]
    fn mps_is_bounded_at_900() {
        let mut store = NodeStore::new();
        for i in 0..901 {
            store.apply_mps(MpsMetric {
                incoming: i,
                ..Default::default()
            });
        }
        assert_eq!(store.mps().len(), 900);
        assert_eq!(store.mps().get(0).unwrap().value.incoming, 1);
        assert_eq!(store.last_mps().unwrap().incoming, 900);
    }

    #[test]
    fn confirmed_ms_batches_capped_at_20() {
        let mut store = NodeStore::new();
        let batch = |from: u64| {
            (from..from + 15)
                .map(|ms_index| ConfirmedMilestoneMetric {
                    ms_index,
                    ..Default::default()
                })
                .collect::<Vec<_>>()
        };
        store.apply_confirmed_ms(Some(batch(0)));
        store.apply_confirmed_ms(Some(batch(15)));

        assert_eq!(store.confirmed_ms().len(), CONFIRMED_MS_CAPACITY);
        assert_eq!(store.confirmed_ms().get(0).unwrap().value.ms_index, 10);
        assert_eq!(store.last_confirmed_ms().unwrap().ms_index, 29);

        store.apply_confirmed_ms(None);
        store.apply_confirmed_ms(Some(vec![]));
        assert_eq!(store.last_confirmed_ms().unwrap().ms_index, 29);
    }

    #[test]
    fn db_size_capped_at_600() {
        let mut store = NodeStore::new();
        let batch: Vec<_> = (0..700)
            .map(|i| DbSizeMetric { total: i, ts: i as i64 })
            .collect();
        store.apply_db_size(Some(batch));
        assert_eq!(store.db_size().len(), DB_SIZE_CAPACITY);
        assert_eq!(store.db_size().get(0).unwrap().value.total, 100);
    }

    #[test]
    fn reset_twice_equals_reset_once() {
        let mut store = NodeStore::new();
        store.set_connected(true);
        store.apply_status(status(5));
        store.apply_sync_status(SyncStatus { lsmi: 1, lmi: 2 });
        store.apply_spam(SpamMetric::default());
        store.apply_db_cleanup(DbCleanupEvent { start: 1, end: 0 });
        store.apply_peer_batch(Some(vec![PeerMetric {
            identity: "A".into(),
            ..Default::default()
        }]));
        assert!(!store.is_empty());

        store.reset();
        let once = serde_json::to_value(&store).unwrap();
        store.reset();
        let twice = serde_json::to_value(&store).unwrap();

        let mut fresh = NodeStore::new();
        fresh.set_connected(true);

        assert!(store.is_empty());
        assert_eq!(once, twice);
        assert_eq!(once, serde_json::to_value(&fresh).unwrap());
        assert!(store.is_connected());
    }

    #[tokio::test]
    async fn handle_notifies_subscribers() {
        let handle = StoreHandle::new();
        let mut rx = handle.subscribe();

        handle.set_connected(true);
        handle.reset();

        assert_eq!(rx.recv().await.unwrap(), StoreChange::Connectivity(true));
        assert_eq!(rx.recv().await.unwrap(), StoreChange::Reset);
        assert!(handle.read().is_connected());
    }
}
