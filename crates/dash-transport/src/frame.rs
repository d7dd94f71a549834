use serde::{Deserialize, Serialize};

use crate::{DashTransportError, Topic};

/// Inbound frame envelope: `{ "type": <topic id>, "data": <payload> }`.
///
/// The payload shape is fixed per topic and decoded by the store's
/// handlers. Unknown ids, including ones outside the byte range, are kept
/// as raw numbers so that callers can drop them without failing the decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundFrame {
    /// Topic wire id.
    #[serde(rename = "type")]
    pub topic_id: i64,

    /// Topic payload (arbitrary JSON, `null` when absent).
    #[serde(default)]
    pub data: serde_json::Value,
}

impl InboundFrame {
    /// Build a frame for a known topic.
    pub fn new(topic: Topic, data: serde_json::Value) -> Self {
        Self {
            topic_id: i64::from(topic.id()),
            data,
        }
    }

    /// The decoded topic, or `None` for ids this build does not know.
    pub fn topic(&self) -> Option<Topic> {
        u8::try_from(self.topic_id).ok().and_then(Topic::from_id)
    }

    /// Serialize to JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DashTransportError> {
        serde_json::to_vec(self).map_err(DashTransportError::Serialization)
    }

    /// Deserialize from JSON bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, DashTransportError> {
        serde_json::from_slice(data).map_err(DashTransportError::Deserialization)
    }
}

/// Control frame action byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ControlAction {
    Register = 0,
    Unregister = 1,
}

/// Topic (un)registration sent on the same connection as the payloads.
///
/// Wire format: two bytes, `[action, topic_id]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlFrame {
    pub action: ControlAction,
    pub topic: Topic,
}

impl ControlFrame {
    pub fn register(topic: Topic) -> Self {
        Self {
            action: ControlAction::Register,
            topic,
        }
    }

    pub fn unregister(topic: Topic) -> Self {
        Self {
            action: ControlAction::Unregister,
            topic,
        }
    }

    pub fn to_bytes(&self) -> [u8; 2] {
        [self.action as u8, self.topic.id()]
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, DashTransportError> {
        let &[action, topic_id] = data else {
            return Err(DashTransportError::MalformedControl { len: data.len() });
        };
        let action = match action {
            0 => ControlAction::Register,
            1 => ControlAction::Unregister,
            _ => return Err(DashTransportError::MalformedControl { len: data.len() }),
        };
        let topic = Topic::from_id(topic_id).ok_or(DashTransportError::UnknownTopic(topic_id))?;
        Ok(Self { action, topic })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_topic() {
        let json = br#"{"type": 0, "data": {"lsmi": 50, "lmi": 100}}"#;
        let frame = InboundFrame::from_bytes(json).unwrap();
        assert_eq!(frame.topic(), Some(Topic::SyncStatus));
        assert_eq!(frame.data["lmi"], 100);
    }

    #[test]
    fn keeps_unknown_topic_id() {
        let json = br#"{"type": 42, "data": [1, 2, 3]}"#;
        let frame = InboundFrame::from_bytes(json).unwrap();
        assert_eq!(frame.topic_id, 42);
        assert_eq!(frame.topic(), None);
    }

    #[test]
    fn out_of_range_ids_decode_as_unknown() {
        let frame = InboundFrame::from_bytes(br#"{"type": 256, "data": {}}"#).unwrap();
        assert_eq!(frame.topic_id, 256);
        assert_eq!(frame.topic(), None);

        let frame = InboundFrame::from_bytes(br#"{"type": -1, "data": {}}"#).unwrap();
        assert_eq!(frame.topic(), None);
    }

    #[test]
    fn missing_data_is_null() {
        let frame = InboundFrame::from_bytes(br#"{"type": 5}"#).unwrap();
        assert!(frame.data.is_null());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            InboundFrame::from_bytes(b"not json"),
            Err(DashTransportError::Deserialization(_))
        ));
    }

    #[test]
    fn control_frame_wire_layout() {
        assert_eq!(ControlFrame::register(Topic::PeerMetric).to_bytes(), [0, 5]);
        assert_eq!(ControlFrame::unregister(Topic::AvgSpamMetrics).to_bytes(), [1, 15]);
    }

    #[test]
    fn control_frame_parse() {
        let frame = ControlFrame::from_bytes(&[1, 13]).unwrap();
        assert_eq!(frame, ControlFrame::unregister(Topic::DbCleanup));
        assert!(matches!(
            ControlFrame::from_bytes(&[0]),
            Err(DashTransportError::MalformedControl { len: 1 })
        ));
        assert!(matches!(
            ControlFrame::from_bytes(&[7, 1]),
            Err(DashTransportError::MalformedControl { .. })
        ));
        assert!(matches!(
            ControlFrame::from_bytes(&[0, 99]),
            Err(DashTransportError::UnknownTopic(99))
        ));
    }
}
