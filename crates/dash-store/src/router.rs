/// Ingest router: topic → handler dispatch into the [`NodeStore`].
///
/// Decodes the `{type, data}` envelope, looks up the single handler
/// registered for the topic and applies it under the store's write lock.
/// Unknown topics and topics without a handler are dropped, not errors.
use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use dash_metrics::Counter;
use dash_transport::{InboundFrame, Topic};

use crate::error::DashStoreError;
use crate::store::{NodeStore, StoreChange, StoreHandle};

/// A topic handler: decode `data` and mutate the store.
pub type Handler = fn(&mut NodeStore, Value) -> Result<(), DashStoreError>;

/// What happened to one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A handler applied the payload.
    Applied(Topic),
    /// Unknown topic id, or no handler for the topic.
    Dropped { topic_id: i64 },
}

/// Ingest counters, shared with whoever wants to report them.
#[derive(Debug, Default, Serialize)]
pub struct RouterStats {
    pub dispatched: Counter,
    pub dropped: Counter,
    pub rejected: Counter,
}

impl RouterStats {
    /// Zero every counter. Runs with the store reset, so the tallies always
    /// describe the histories currently held.
    pub fn reset(&self) {
        self.dispatched.reset();
        self.dropped.reset();
        self.rejected.reset();
    }
}

pub struct IngestRouter {
    handlers: HashMap<Topic, Handler>,
    stats: Arc<RouterStats>,
}

impl Default for IngestRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestRouter {
    /// Router with the store's handlers registered.
    ///
    /// Visualizer topics have no handler here and are dropped.
    pub fn new() -> Self {
        let mut router = Self::empty();
        // main
        router.register(Topic::SyncStatus, |store, data| {
            store.apply_sync_status(decode(Topic::SyncStatus, data)?);
            Ok(())
        });
        router.register(Topic::Status, |store, data| {
            store.apply_status(decode(Topic::Status, data)?);
            Ok(())
        });
        router.register(Topic::MpsMetrics, |store, data| {
            store.apply_mps(decode(Topic::MpsMetrics, data)?);
            Ok(())
        });
        router.register(Topic::ConfirmedMsMetrics, |store, data| {
            store.apply_confirmed_ms(decode(Topic::ConfirmedMsMetrics, data)?);
            Ok(())
        });
        router.register(Topic::Milestone, |store, data| {
            store.apply_milestone(decode(Topic::Milestone, data)?);
            Ok(())
        });
        // peers
        router.register(Topic::PeerMetric, |store, data| {
            let outcome = store.apply_peer_batch(decode(Topic::PeerMetric, data)?);
            tracing::trace!(?outcome, "peer batch applied");
            Ok(())
        });
        // misc
        router.register(Topic::TipSelMetric, |store, data| {
            store.apply_tip_sel(decode(Topic::TipSelMetric, data)?);
            Ok(())
        });
        router.register(Topic::DbCleanup, |store, data| {
            store.apply_db_cleanup(decode(Topic::DbCleanup, data)?);
            Ok(())
        });
        router.register(Topic::DbSizeMetric, |store, data| {
            store.apply_db_size(decode(Topic::DbSizeMetric, data)?);
            Ok(())
        });
        router.register(Topic::SpamMetrics, |store, data| {
            store.apply_spam(decode(Topic::SpamMetrics, data)?);
            Ok(())
        });
        router.register(Topic::AvgSpamMetrics, |store, data| {
            store.apply_avg_spam(decode(Topic::AvgSpamMetrics, data)?);
            Ok(())
        });
        router
    }

    /// Router with no handlers: every frame is dropped.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
            stats: Arc::new(RouterStats::default()),
        }
    }

    /// Set the handler for `topic`, replacing any previous one.
    pub fn register(&mut self, topic: Topic, handler: Handler) {
        self.handlers.insert(topic, handler);
    }

    pub fn unregister(&mut self, topic: Topic) {
        self.handlers.remove(&topic);
    }

    pub fn has_handler(&self, topic: Topic) -> bool {
        self.handlers.contains_key(&topic)
    }

    pub fn stats(&self) -> Arc<RouterStats> {
        Arc::clone(&self.stats)
    }

    /// Decode one raw frame and apply it. Notifies `Updated(topic)` on
    /// success.
    ///
    /// A malformed envelope or payload is counted and returned as an error;
    /// the store is left untouched.
    pub fn dispatch(&self, store: &StoreHandle, raw: &[u8]) -> Result<Dispatch, DashStoreError> {
        let frame = InboundFrame::from_bytes(raw).inspect_err(|_| self.stats.rejected.inc())?;

        let Some((topic, handler)) = frame
            .topic()
            .and_then(|topic| self.handlers.get(&topic).map(|h| (topic, *h)))
        else {
            tracing::trace!(topic_id = frame.topic_id, "no handler, frame dropped");
            self.stats.dropped.inc();
            return Ok(Dispatch::Dropped {
                topic_id: frame.topic_id,
            });
        };

        store
            .update(|s| handler(s, frame.data))
            .inspect_err(|_| self.stats.rejected.inc())?;
        self.stats.dispatched.inc();
        store.notify(StoreChange::Updated(topic));
        Ok(Dispatch::Applied(topic))
    }
}

/// Decode a topic payload. Errors carry the topic for the log line.
fn decode<T: DeserializeOwned>(topic: Topic, data: Value) -> Result<T, DashStoreError> {
    serde_json::from_value(data).map_err(|e| DashStoreError::payload(topic, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(topic: Topic, data: Value) -> Vec<u8> {
        InboundFrame::new(topic, data).to_bytes().unwrap()
    }

    #[test]
    fn applies_known_topic_and_notifies() {
        let store = StoreHandle::new();
        let mut changes = store.subscribe();
        let router = IngestRouter::new();

        let out = router
            .dispatch(&store, &frame(Topic::SyncStatus, json!({"lsmi": 50, "lmi": 100})))
            .unwrap();

        assert_eq!(out, Dispatch::Applied(Topic::SyncStatus));
        assert_eq!(store.read().percentage_synced(), 50);
        assert_eq!(changes.try_recv().unwrap(), StoreChange::Updated(Topic::SyncStatus));
        assert_eq!(router.stats().dispatched.get(), 1);
    }

    #[test]
    fn unknown_topic_is_dropped() {
        let store = StoreHandle::new();
        let router = IngestRouter::new();

        let out = router
            .dispatch(&store, br#"{"type": 99, "data": {"x": 1}}"#)
            .unwrap();
        assert_eq!(out, Dispatch::Dropped { topic_id: 99 });
        assert_eq!(router.stats().dropped.get(), 1);
        assert!(store.read().is_empty());
    }

    #[test]
    fn ids_beyond_a_byte_are_dropped_not_rejected() {
        let store = StoreHandle::new();
        let router = IngestRouter::new();

        let out = router.dispatch(&store, br#"{"type": 256, "data": {}}"#).unwrap();
        assert_eq!(out, Dispatch::Dropped { topic_id: 256 });
        let out = router.dispatch(&store, br#"{"type": -3, "data": {}}"#).unwrap();
        assert_eq!(out, Dispatch::Dropped { topic_id: -3 });

        assert_eq!(router.stats().dropped.get(), 2);
        assert_eq!(router.stats().rejected.get(), 0);
    }

    #[test]
    fn visualizer_topics_have_no_handler() {
        let store = StoreHandle::new();
        let router = IngestRouter::new();
        for topic in dash_transport::TopicBundle::Visualizer.topics() {
            assert!(!router.has_handler(*topic));
            let out = router.dispatch(&store, &frame(*topic, json!({}))).unwrap();
            assert!(matches!(out, Dispatch::Dropped { .. }));
        }
    }

    #[test]
    fn wrong_typed_payload_is_rejected() {
        let store = StoreHandle::new();
        let router = IngestRouter::new();

        let err = router
            .dispatch(&store, &frame(Topic::MpsMetrics, json!({"incoming": "lots"})))
            .unwrap_err();
        assert!(matches!(err, DashStoreError::Payload { topic: Topic::MpsMetrics, .. }));
        assert_eq!(router.stats().rejected.get(), 1);
        assert!(store.read().mps().is_empty());

        assert!(matches!(
            router.dispatch(&store, b"{not json"),
            Err(DashStoreError::Transport(_))
        ));
        assert_eq!(router.stats().rejected.get(), 2);
    }

    #[test]
    fn null_peer_batch_keeps_registry() {
        let store = StoreHandle::new();
        let router = IngestRouter::new();
        router
            .dispatch(
                &store,
                &frame(Topic::PeerMetric, json!([{"identity": "A"}, {"identity": "B"}])),
            )
            .unwrap();
        router
            .dispatch(&store, &frame(Topic::PeerMetric, Value::Null))
            .unwrap();
        assert_eq!(store.read().peers().len(), 2);

        router
            .dispatch(&store, &frame(Topic::PeerMetric, json!([{"identity": "B"}])))
            .unwrap();
        let ids: Vec<String> = store.read().peers().identities().map(String::from).collect();
        assert_eq!(ids, vec!["B"]);
    }

    #[test]
    fn null_heartbeat_still_reconciles_peers() {
        let store = StoreHandle::new();
        let router = IngestRouter::new();
        router
            .dispatch(
                &store,
                &frame(Topic::PeerMetric, json!([{"identity": "A"}, {"identity": "B"}])),
            )
            .unwrap();
        router
            .dispatch(
                &store,
                &frame(Topic::PeerMetric, json!([{"identity": "B", "heartbeat": null}])),
            )
            .unwrap();

        let ids: Vec<String> = store.read().peers().identities().map(String::from).collect();
        assert_eq!(ids, vec!["B"]);
        assert_eq!(router.stats().rejected.get(), 0);
    }

    #[test]
    fn status_feeds_four_series() {
        let store = StoreHandle::new();
        let router = IngestRouter::new();
        router
            .dispatch(
                &store,
                &frame(Topic::Status, json!({"uptime": 90_061_000u64, "node_alias": "n1"})),
            )
            .unwrap();
        let s = store.read();
        assert_eq!(s.req_queue().len(), 1);
        assert_eq!(s.server().len(), 1);
        assert_eq!(s.mem().len(), 1);
        assert_eq!(s.cache().len(), 1);
        assert_eq!(s.uptime(), "1 Day, 01:01:01");
    }

    #[test]
    fn handler_can_be_replaced() {
        let store = StoreHandle::new();
        let mut router = IngestRouter::empty();
        router.register(Topic::Milestone, |store, _| {
            store.apply_milestone(crate::types::Milestone {
                index: 7,
                milestone_id: "fixed".into(),
            });
            Ok(())
        });
        router
            .dispatch(&store, &frame(Topic::Milestone, json!({"index": 1})))
            .unwrap();
        assert_eq!(store.read().milestone().unwrap().index, 7);

        router.unregister(Topic::Milestone);
        let out = router
            .dispatch(&store, &frame(Topic::Milestone, json!({"index": 1})))
            .unwrap();
        assert_eq!(out, Dispatch::Dropped { topic_id: 4 });
    }
}
