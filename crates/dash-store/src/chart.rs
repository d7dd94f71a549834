//! Chart materializers.
//!
//! Each function turns one or more bounded series into an immutable
//! [`Chart`]: one label per sample plus one dataset per plotted field.
//! Rendering is left to the consumer; a dataset only carries its label,
//! colors and points.
use serde::Serialize;

use dash_metrics::{format_epoch_hms, BoundedSeries};

use crate::derived::deltas;
use crate::peers::PeerEntry;
use crate::store::NodeStore;
use crate::types::{
    AvgSpamMetric, CacheMetrics, ConfirmedMilestoneMetric, DbSizeMetric, MemoryMetrics,
    MpsMetric, PeerInfo, PeerMetric, ReqQueueMetric, ServerMetrics, SpamMetric, TipSelMetric,
};

/// `(r, g, b)`.
pub type Rgb = (u8, u8, u8);

/// Fill alpha applied under every line.
const FILL_ALPHA: &str = "0.4";

// ── Descriptors ──────────────────────────────────────────────────────

/// One plotted line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub border_color: String,
    pub background_color: String,
    pub data: Vec<f64>,
}

/// Labels (x axis) plus datasets of the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Chart {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartSeries>,
}

impl Chart {
    /// Dataset by label.
    pub fn dataset(&self, label: &str) -> Option<&ChartSeries> {
        self.datasets.iter().find(|d| d.label == label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Accumulates the points of one [`ChartSeries`].
#[derive(Debug, Clone)]
pub struct SeriesBuilder {
    label: String,
    color: Rgb,
    points: Vec<f64>,
}

impl SeriesBuilder {
    pub fn new(label: impl Into<String>, color: Rgb) -> Self {
        Self {
            label: label.into(),
            color,
            points: Vec::new(),
        }
    }

    pub fn push(&mut self, value: f64) {
        self.points.push(value);
    }

    pub fn build(self) -> ChartSeries {
        let (r, g, b) = self.color;
        ChartSeries {
            label: self.label,
            border_color: format!("rgba({r}, {g}, {b},1)"),
            background_color: format!("rgba({r}, {g}, {b},{FILL_ALPHA})"),
            data: self.points,
        }
    }
}

/// A dataset definition: label, color and the field it plots.
struct Line<T> {
    label: &'static str,
    color: Rgb,
    value: fn(&T) -> f64,
}

impl<T> Line<T> {
    fn new(label: &'static str, color: Rgb, value: fn(&T) -> f64) -> Self {
        Self { label, color, value }
    }
}

fn materialize<'a, T: 'a>(
    points: impl IntoIterator<Item = (String, &'a T)>,
    lines: &[Line<T>],
) -> Chart {
    let mut builders: Vec<SeriesBuilder> = lines
        .iter()
        .map(|line| SeriesBuilder::new(line.label, line.color))
        .collect();
    let mut labels = Vec::new();
    for (label, sample) in points {
        labels.push(label);
        for (builder, line) in builders.iter_mut().zip(lines) {
            builder.push((line.value)(sample));
        }
    }
    Chart {
        labels,
        datasets: builders.into_iter().map(SeriesBuilder::build).collect(),
    }
}

/// Points labelled with their ingest timestamp.
fn stamped<T>(series: &BoundedSeries<T>) -> impl Iterator<Item = (String, &T)> {
    series.iter().map(|s| (s.ts.clone(), &s.value))
}

// ── Palette ──────────────────────────────────────────────────────────

const PURPLE: Rgb = (159, 53, 230);
const BLUE: Rgb = (53, 109, 230);
const YELLOW: Rgb = (230, 201, 14);
const TURQUOISE: Rgb = (14, 230, 183);
const GREEN: Rgb = (14, 230, 100);
const RED: Rgb = (219, 53, 53);
const MAGENTA: Rgb = (219, 53, 219);
const VIOLET: Rgb = (114, 53, 219);
const ORANGE: Rgb = (219, 144, 53);
const PINK: Rgb = (230, 14, 147);
const SKY: Rgb = (53, 180, 219);
const RUST: Rgb = (219, 111, 53);

// ── Main ─────────────────────────────────────────────────────────────

/// Incoming, new and outgoing messages per second (outgoing negated).
pub fn mps(store: &NodeStore) -> Chart {
    materialize(
        stamped(store.mps()),
        &[
            Line::new("Incoming", PURPLE, |m: &MpsMetric| m.incoming as f64),
            Line::new("New", YELLOW, |m: &MpsMetric| m.new as f64),
            Line::new("Outgoing", BLUE, |m: &MpsMetric| -(m.outgoing as f64)),
        ],
    )
}

fn by_ms_index(
    series: &BoundedSeries<ConfirmedMilestoneMetric>,
) -> impl Iterator<Item = (String, &ConfirmedMilestoneMetric)> {
    series.iter().map(|s| (s.value.ms_index.to_string(), &s.value))
}

/// Confirmed milestones: MPS and CMPS, labelled by milestone index.
pub fn confirmed_ms_rate(store: &NodeStore) -> Chart {
    materialize(
        by_ms_index(store.confirmed_ms()),
        &[
            Line::new("MPS", PURPLE, |m: &ConfirmedMilestoneMetric| m.mps),
            Line::new("CMPS", BLUE, |m: &ConfirmedMilestoneMetric| m.cmps),
        ],
    )
}

pub fn confirmed_ms_confirmation(store: &NodeStore) -> Chart {
    materialize(
        by_ms_index(store.confirmed_ms()),
        &[Line::new("Confirmation", YELLOW, |m: &ConfirmedMilestoneMetric| {
            m.conf_rate
        })],
    )
}

pub fn confirmed_ms_time_between(store: &NodeStore) -> Chart {
    materialize(
        by_ms_index(store.confirmed_ms()),
        &[Line::new(
            "Time Between Milestones",
            PINK,
            |m: &ConfirmedMilestoneMetric| m.time_since_last_ms,
        )],
    )
}

/// Database size, labelled with the source's own timestamp.
pub fn db_size(store: &NodeStore) -> Chart {
    materialize(
        store
            .db_size()
            .iter()
            .map(|s| (format_epoch_hms(s.value.ts), &s.value)),
        &[Line::new("Total", ORANGE, |m: &DbSizeMetric| m.total as f64)],
    )
}

// ── Status sub-series ────────────────────────────────────────────────

pub fn cache(store: &NodeStore) -> Chart {
    materialize(
        stamped(store.cache()),
        &[
            Line::new("Request Queue", TURQUOISE, |m: &CacheMetrics| {
                m.request_queue.size as f64
            }),
            Line::new("Approvers", RED, |m: &CacheMetrics| m.approvers.size as f64),
            Line::new("Milestones", YELLOW, |m: &CacheMetrics| m.milestones.size as f64),
            Line::new("Messages", VIOLET, |m: &CacheMetrics| m.messages.size as f64),
            Line::new("Incoming msg work units", MAGENTA, |m: &CacheMetrics| {
                m.incoming_message_work_units.size as f64
            }),
        ],
    )
}

pub fn server(store: &NodeStore) -> Chart {
    materialize(
        stamped(store.server()),
        &[
            Line::new("All msgs", TURQUOISE, |m: &ServerMetrics| m.all_msgs as f64),
            Line::new("New msgs", YELLOW, |m: &ServerMetrics| m.new_msgs as f64),
            Line::new("Known msgs", MAGENTA, |m: &ServerMetrics| m.known_msgs as f64),
            Line::new("Invalid msgs", RED, |m: &ServerMetrics| m.invalid_msgs as f64),
            Line::new("Sent msgs", GREEN, |m: &ServerMetrics| m.sent_msgs as f64),
            Line::new("Dropped packets", ORANGE, |m: &ServerMetrics| {
                m.dropped_sent_packets as f64
            }),
            Line::new("Sent spam msgs", BLUE, |m: &ServerMetrics| m.sent_spam_msgs as f64),
        ],
    )
}

/// Request and heartbeat traffic; received counters are negated.
pub fn requests(store: &NodeStore) -> Chart {
    materialize(
        stamped(store.server()),
        &[
            Line::new("Sent msg requests", SKY, |m: &ServerMetrics| m.sent_msg_req as f64),
            Line::new("Received msg requests", RUST, |m: &ServerMetrics| {
                -(m.rec_msg_req as f64)
            }),
            Line::new("Sent MS requests", BLUE, |m: &ServerMetrics| m.sent_ms_req as f64),
            Line::new("Received MS requests", PURPLE, |m: &ServerMetrics| {
                -(m.rec_ms_req as f64)
            }),
            Line::new("Sent heartbeats", TURQUOISE, |m: &ServerMetrics| {
                m.sent_heartbeat as f64
            }),
            Line::new("Received heartbeats", GREEN, |m: &ServerMetrics| {
                -(m.rec_heartbeat as f64)
            }),
        ],
    )
}

/// Request queue sizes; `Total` is pending + queued.
pub fn req_queue(store: &NodeStore) -> Chart {
    materialize(
        stamped(store.req_queue()),
        &[
            Line::new("Total", (222, 49, 87), |m: &ReqQueueMetric| {
                (m.pending + m.queued) as f64
            }),
            Line::new("Queued", TURQUOISE, |m: &ReqQueueMetric| m.queued as f64),
            Line::new("Pending", (222, 49, 182), |m: &ReqQueueMetric| m.pending as f64),
            Line::new("Processing", YELLOW, |m: &ReqQueueMetric| m.processing as f64),
            Line::new("Request latency", RUST, |m: &ReqQueueMetric| m.latency as f64),
        ],
    )
}

pub fn mem(store: &NodeStore) -> Chart {
    materialize(
        stamped(store.mem()),
        &[
            Line::new("Stack alloc", BLUE, |m: &MemoryMetrics| m.stack_sys as f64),
            Line::new("Heap released", GREEN, |m: &MemoryMetrics| m.heap_released as f64),
            Line::new("Heap in-use", RED, |m: &MemoryMetrics| m.heap_inuse as f64),
            Line::new("Heap idle", YELLOW, |m: &MemoryMetrics| m.heap_idle as f64),
            Line::new("Heap sys", (168, 50, 76), |m: &MemoryMetrics| m.heap_sys as f64),
            Line::new("Total alloc", (160, 50, 168), |m: &MemoryMetrics| m.sys as f64),
        ],
    )
}

// ── Misc ─────────────────────────────────────────────────────────────

/// Tip-selection duration in ms (source is ns / 1000, floored).
pub fn tip_sel(store: &NodeStore) -> Chart {
    materialize(
        stamped(store.tip_sel()),
        &[Line::new("Duration (ms)", YELLOW, |m: &TipSelMetric| {
            (m.duration / 1000) as f64
        })],
    )
}

pub fn spam(store: &NodeStore) -> Chart {
    materialize(
        stamped(store.spam()),
        &[
            Line::new("GTTA", TURQUOISE, |m: &SpamMetric| m.gtta),
            Line::new("PoW", GREEN, |m: &SpamMetric| m.pow),
            Line::new("Total", YELLOW, |m: &SpamMetric| m.gtta + m.pow),
        ],
    )
}

pub fn avg_spam(store: &NodeStore) -> Chart {
    materialize(
        stamped(store.avg_spam()),
        &[
            Line::new("New spam messages", PINK, |m: &AvgSpamMetric| m.new as f64),
            Line::new("Avg. spam messages per second", (230, 165, 14), |m: &AvgSpamMetric| {
                m.avg
            }),
        ],
    )
}

// ── Peers ────────────────────────────────────────────────────────────

/// Per-peer traffic; rx is negated.
pub fn peer_net_io(peer: &PeerEntry) -> Chart {
    materialize(
        stamped(peer.net_io()),
        &[
            Line::new("Tx", SKY, |io: &crate::types::NetworkIo| io.tx as f64),
            Line::new("Rx", (235, 134, 52), |io: &crate::types::NetworkIo| {
                -(io.rx as f64)
            }),
        ],
    )
}

/// Per-interval protocol counters for one peer. One point per consecutive
/// raw sample pair.
pub fn peer_protocol(peer: &PeerEntry) -> Chart {
    let raw = peer.raw();
    let line = |label: &str, color: Rgb, counter: fn(&PeerInfo) -> u64| {
        let mut builder = SeriesBuilder::new(label, color);
        for delta in deltas(raw, |m: &PeerMetric| counter(&m.info)) {
            builder.push(delta as f64);
        }
        builder.build()
    };

    Chart {
        labels: raw.iter().skip(1).map(|s| s.ts.clone()).collect(),
        datasets: vec![
            line("New msgs", MAGENTA, |i| i.number_of_new_messages),
            line("Known msgs", (53, 219, 175), |i| i.number_of_known_messages),
            line("Sent msgs", VIOLET, |i| i.number_of_sent_messages),
            line("Dropped packets", ORANGE, |i| i.number_of_dropped_sent_packets),
        ],
    }
}
