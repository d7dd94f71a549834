use dash_transport::{DashTransportError, Topic};

/// Store-level errors.
///
/// Wraps transport errors and adds the payload and runtime variants.
#[derive(Debug, thiserror::Error)]
pub enum DashStoreError {
    #[error("transport error: {0}")]
    Transport(#[from] DashTransportError),

    #[error("invalid {topic} payload: {source}")]
    Payload {
        topic: Topic,
        #[source]
        source: serde_json::Error,
    },

    #[error("runtime shut down")]
    RuntimeShutDown,
}

impl DashStoreError {
    pub(crate) fn payload(topic: Topic, source: serde_json::Error) -> Self {
        DashStoreError::Payload { topic, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_payload() {
        let source = serde_json::from_str::<u64>("\"x\"").unwrap_err();
        let err = DashStoreError::payload(Topic::Status, source);
        assert!(err.to_string().starts_with("invalid status payload: "));
    }

    #[test]
    fn test_display_transport() {
        let err = DashStoreError::from(DashTransportError::UnknownTopic(42));
        assert_eq!(err.to_string(), "transport error: unknown topic id: 42");
    }

    #[test]
    fn test_display_shut_down() {
        assert_eq!(DashStoreError::RuntimeShutDown.to_string(), "runtime shut down");
    }
}
