use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DashTransportError;

/// A logical channel multiplexed over the feed connection.
///
/// The discriminant is the wire id carried in the `type` field of every
/// inbound frame and in the second byte of a control frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Topic {
    SyncStatus = 0,
    Status = 1,
    MpsMetrics = 2,
    TipSelMetric = 3,
    /// Explorer milestone feed.
    Milestone = 4,
    PeerMetric = 5,
    ConfirmedMsMetrics = 6,
    // Visualizer
    Vertex = 7,
    SolidInfo = 8,
    ConfirmedInfo = 9,
    MilestoneInfo = 10,
    TipInfo = 11,
    // Database
    DbSizeMetric = 12,
    DbCleanup = 13,
    // Spammer
    SpamMetrics = 14,
    AvgSpamMetrics = 15,
}

impl Topic {
    /// Every topic, in wire id order.
    pub const ALL: [Topic; 16] = [
        Topic::SyncStatus,
        Topic::Status,
        Topic::MpsMetrics,
        Topic::TipSelMetric,
        Topic::Milestone,
        Topic::PeerMetric,
        Topic::ConfirmedMsMetrics,
        Topic::Vertex,
        Topic::SolidInfo,
        Topic::ConfirmedInfo,
        Topic::MilestoneInfo,
        Topic::TipInfo,
        Topic::DbSizeMetric,
        Topic::DbCleanup,
        Topic::SpamMetrics,
        Topic::AvgSpamMetrics,
    ];

    /// Wire id.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Look up a topic by wire id. `None` for ids this build does not know.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    /// Stable snake_case name, used in logs and JSON output.
    pub fn name(self) -> &'static str {
        match self {
            Topic::SyncStatus => "sync_status",
            Topic::Status => "status",
            Topic::MpsMetrics => "mps_metrics",
            Topic::TipSelMetric => "tip_sel_metric",
            Topic::Milestone => "milestone",
            Topic::PeerMetric => "peer_metric",
            Topic::ConfirmedMsMetrics => "confirmed_ms_metrics",
            Topic::Vertex => "vertex",
            Topic::SolidInfo => "solid_info",
            Topic::ConfirmedInfo => "confirmed_info",
            Topic::MilestoneInfo => "milestone_info",
            Topic::TipInfo => "tip_info",
            Topic::DbSizeMetric => "db_size_metric",
            Topic::DbCleanup => "db_cleanup",
            Topic::SpamMetrics => "spam_metrics",
            Topic::AvgSpamMetrics => "avg_spam_metrics",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A group of topics a view activates and deactivates together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicBundle {
    /// Registered automatically on every successful connect.
    Main,
    Peer,
    Visualizer,
    Misc,
}

impl TopicBundle {
    pub const ALL: [TopicBundle; 4] = [
        TopicBundle::Main,
        TopicBundle::Peer,
        TopicBundle::Visualizer,
        TopicBundle::Misc,
    ];

    /// Topics in this bundle, in registration order.
    pub fn topics(self) -> &'static [Topic] {
        match self {
            TopicBundle::Main => &[
                Topic::SyncStatus,
                Topic::Status,
                Topic::MpsMetrics,
                Topic::ConfirmedMsMetrics,
                Topic::Milestone,
                Topic::DbSizeMetric,
            ],
            TopicBundle::Peer => &[Topic::PeerMetric],
            TopicBundle::Visualizer => &[
                Topic::Vertex,
                Topic::SolidInfo,
                Topic::ConfirmedInfo,
                Topic::MilestoneInfo,
                Topic::TipInfo,
            ],
            TopicBundle::Misc => &[
                Topic::TipSelMetric,
                Topic::DbCleanup,
                Topic::SpamMetrics,
                Topic::AvgSpamMetrics,
            ],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TopicBundle::Main => "main",
            TopicBundle::Peer => "peer",
            TopicBundle::Visualizer => "visualizer",
            TopicBundle::Misc => "misc",
        }
    }
}

impl fmt::Display for TopicBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TopicBundle {
    type Err = DashTransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DashTransportError::UnknownBundle(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn wire_ids_match_positions() {
        for (i, topic) in Topic::ALL.iter().enumerate() {
            assert_eq!(topic.id() as usize, i);
            assert_eq!(Topic::from_id(i as u8), Some(*topic));
        }
        assert_eq!(Topic::from_id(16), None);
        assert_eq!(Topic::from_id(255), None);
    }

    #[test]
    fn bundles_partition_all_topics() {
        let mut seen = HashSet::new();
        for bundle in TopicBundle::ALL {
            for topic in bundle.topics() {
                assert!(seen.insert(*topic), "{topic} appears in two bundles");
            }
        }
        assert_eq!(seen.len(), Topic::ALL.len());
    }

    #[test]
    fn main_bundle_carries_explorer_and_db_size() {
        let main = TopicBundle::Main.topics();
        assert!(main.contains(&Topic::Milestone));
        assert!(main.contains(&Topic::DbSizeMetric));
        assert!(!main.contains(&Topic::DbCleanup));
    }

    #[test]
    fn bundle_from_str() {
        assert_eq!("peer".parse::<TopicBundle>().unwrap(), TopicBundle::Peer);
        assert_eq!(" MISC ".parse::<TopicBundle>().unwrap(), TopicBundle::Misc);
        assert!("charts".parse::<TopicBundle>().is_err());
    }
}
