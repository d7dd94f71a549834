//! Topic payload records.
//!
//! Every record decodes leniently: a missing field takes its default value
//! (0, empty string, false), and a nested record sent as `null` decodes as
//! its default. A field of the wrong JSON type is still an error and rejects
//! the whole payload.
use serde::{Deserialize, Deserializer, Serialize};

/// `null` decodes as `T::default()`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// ── Main ─────────────────────────────────────────────────────────────

/// Sync position: latest solid and latest known milestone index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncStatus {
    pub lsmi: u64,
    pub lmi: u64,
}

/// Full node status document. Replaced wholesale on every update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Status {
    pub snapshot_index: u64,
    pub pruning_index: u64,
    pub is_healthy: bool,
    pub version: String,
    pub latest_version: String,
    /// Milliseconds.
    pub uptime: u64,
    pub autopeering_id: String,
    pub node_alias: String,
    pub connected_peers_count: u64,
    pub current_requested_ms: u64,
    pub ms_request_queue_size: u64,
    pub request_queue_queued: u64,
    pub request_queue_pending: u64,
    pub request_queue_processing: u64,
    pub request_queue_avg_latency: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub server_metrics: ServerMetrics,
    #[serde(deserialize_with = "null_as_default")]
    pub mem: MemoryMetrics,
    #[serde(deserialize_with = "null_as_default")]
    pub caches: CacheMetrics,
}

impl Status {
    /// The request-queue sub-record appended to its own series.
    pub fn request_queue(&self) -> ReqQueueMetric {
        ReqQueueMetric {
            queued: self.request_queue_queued,
            pending: self.request_queue_pending,
            processing: self.request_queue_processing,
            latency: self.request_queue_avg_latency,
        }
    }
}

/// Cumulative gossip server counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerMetrics {
    pub all_msgs: u64,
    pub new_msgs: u64,
    pub known_msgs: u64,
    pub invalid_msgs: u64,
    pub invalid_req: u64,
    pub rec_msg_req: u64,
    pub rec_ms_req: u64,
    pub rec_heartbeat: u64,
    pub sent_msgs: u64,
    pub sent_msg_req: u64,
    pub sent_ms_req: u64,
    pub sent_heartbeat: u64,
    pub dropped_sent_packets: u64,
    pub sent_spam_msgs: u64,
}

/// Runtime memory statistics, in bytes unless noted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryMetrics {
    pub sys: u64,
    pub heap_sys: u64,
    pub heap_inuse: u64,
    pub heap_idle: u64,
    pub heap_released: u64,
    pub heap_objects: u64,
    pub m_span_inuse: u64,
    pub m_cache_inuse: u64,
    pub stack_sys: u64,
    pub last_pause_gc: u64,
    pub num_gc: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheMetric {
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheMetrics {
    #[serde(deserialize_with = "null_as_default")]
    pub approvers: CacheMetric,
    #[serde(deserialize_with = "null_as_default")]
    pub request_queue: CacheMetric,
    #[serde(deserialize_with = "null_as_default")]
    pub milestones: CacheMetric,
    #[serde(deserialize_with = "null_as_default")]
    pub messages: CacheMetric,
    #[serde(deserialize_with = "null_as_default")]
    pub incoming_message_work_units: CacheMetric,
}

/// Request queue sizes, derived from [`Status`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReqQueueMetric {
    pub queued: u64,
    pub pending: u64,
    pub processing: u64,
    pub latency: i64,
}

/// Messages per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MpsMetric {
    pub incoming: u64,
    pub new: u64,
    pub outgoing: u64,
}

/// One confirmed milestone. Delivered in arrays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmedMilestoneMetric {
    pub ms_index: u64,
    pub mps: f64,
    pub cmps: f64,
    pub conf_rate: f64,
    pub time_since_last_ms: f64,
}

/// Explorer milestone announcement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Milestone {
    pub index: u64,
    pub milestone_id: String,
}

// ── Misc ─────────────────────────────────────────────────────────────

/// Tip-selection duration in nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TipSelMetric {
    pub duration: u64,
}

/// Database size sample. `ts` is unix seconds from the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbSizeMetric {
    pub total: u64,
    pub ts: i64,
}

/// Database cleanup progress, unix seconds (0 = not set).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbCleanupEvent {
    pub start: i64,
    pub end: i64,
}

/// Spammer timings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpamMetric {
    pub gtta: f64,
    pub pow: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvgSpamMetric {
    pub new: u64,
    pub avg: f64,
}

// ── Peers ────────────────────────────────────────────────────────────

/// One peer's sample. Peer metrics always arrive as the full current set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerMetric {
    pub identity: String,
    pub alias: String,
    pub origin_addr: String,
    pub connection_origin: u64,
    pub protocol_version: u64,
    /// Cumulative.
    pub bytes_read: u64,
    /// Cumulative.
    pub bytes_written: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub heartbeat: Heartbeat,
    #[serde(deserialize_with = "null_as_default")]
    pub info: PeerInfo,
    pub connected: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Heartbeat {
    pub solid_milestone_index: u64,
    pub pruned_milestone_index: u64,
    pub latest_milestone_index: u64,
    pub connected_peers: u64,
    pub synced_peers: u64,
}

/// Per-peer protocol counters (camelCase on the wire).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PeerInfo {
    pub multi_address: String,
    pub number_of_all_messages: u64,
    pub number_of_new_messages: u64,
    pub number_of_known_messages: u64,
    pub number_of_received_message_reqs: u64,
    pub number_of_received_milestone_reqs: u64,
    pub number_of_received_heartbeats: u64,
    pub number_of_sent_messages: u64,
    pub number_of_sent_message_reqs: u64,
    pub number_of_sent_milestone_reqs: u64,
    pub number_of_sent_heartbeats: u64,
    pub number_of_dropped_sent_packets: u64,
    pub connection_type: String,
    pub autopeering_id: String,
    pub connected: bool,
}

/// Per-interval traffic derived from consecutive peer samples.
///
/// Signed: a counter reset on the peer yields a negative delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkIo {
    pub tx: i64,
    pub rx: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default() {
        let status: Status = serde_json::from_str(r#"{"node_alias": "alpha"}"#).unwrap();
        assert_eq!(status.node_alias, "alpha");
        assert_eq!(status.uptime, 0);
        assert!(!status.is_healthy);
        assert_eq!(status.caches.messages.size, 0);
    }

    #[test]
    fn null_nested_records_default() {
        let peer: PeerMetric = serde_json::from_str(
            r#"{"identity": "B", "heartbeat": null, "info": null, "bytes_read": 9}"#,
        )
        .unwrap();
        assert_eq!(peer.identity, "B");
        assert_eq!(peer.heartbeat, Heartbeat::default());
        assert_eq!(peer.info, PeerInfo::default());
        assert_eq!(peer.bytes_read, 9);

        let status: Status = serde_json::from_str(
            r#"{"uptime": 5, "server_metrics": null, "mem": null, "caches": {"messages": null}}"#,
        )
        .unwrap();
        assert_eq!(status.uptime, 5);
        assert_eq!(status.server_metrics, ServerMetrics::default());
        assert_eq!(status.caches.messages.size, 0);
    }

    #[test]
    fn wrong_type_is_rejected() {
        assert!(serde_json::from_str::<SyncStatus>(r#"{"lmi": "many"}"#).is_err());
    }

    #[test]
    fn peer_info_is_camel_case() {
        let info: PeerInfo = serde_json::from_str(
            r#"{"multiAddress": "/ip4/1.2.3.4", "numberOfNewMessages": 7, "connectionType": "gossip"}"#,
        )
        .unwrap();
        assert_eq!(info.multi_address, "/ip4/1.2.3.4");
        assert_eq!(info.number_of_new_messages, 7);
        assert_eq!(info.connection_type, "gossip");
    }

    #[test]
    fn status_request_queue_projection() {
        let status = Status {
            request_queue_queued: 3,
            request_queue_pending: 4,
            request_queue_processing: 1,
            request_queue_avg_latency: 12,
            ..Default::default()
        };
        assert_eq!(
            status.request_queue(),
            ReqQueueMetric {
                queued: 3,
                pending: 4,
                processing: 1,
                latency: 12
            }
        );
    }
}
