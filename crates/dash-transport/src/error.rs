use std::time::Duration;

/// Errors returned by the dashboard feed transport.
#[derive(Debug, thiserror::Error)]
pub enum DashTransportError {
    #[error("connection to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connection to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    #[error("send failed: {0}")]
    Send(#[source] std::io::Error),

    #[error("receive failed: {0}")]
    Receive(#[source] std::io::Error),

    #[error("frame serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("frame deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    #[error("malformed control frame ({len} bytes)")]
    MalformedControl { len: usize },

    #[error("unknown topic id: {0}")]
    UnknownTopic(u8),

    #[error("unknown topic bundle: {0}")]
    UnknownBundle(String),

    #[error("channel is closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_frame_too_large() {
        let err = DashTransportError::FrameTooLarge { size: 128, max: 64 };
        assert_eq!(err.to_string(), "frame too large: 128 bytes (max 64)");
    }

    #[test]
    fn display_connect_timeout() {
        let err = DashTransportError::ConnectTimeout {
            addr: "10.0.0.1:8081".into(),
            timeout: Duration::from_secs(3),
        };
        assert_eq!(err.to_string(), "connection to 10.0.0.1:8081 timed out after 3s");
    }

    #[test]
    fn display_unknown_bundle() {
        let err = DashTransportError::UnknownBundle("charts".into());
        assert_eq!(err.to_string(), "unknown topic bundle: charts");
    }
}
