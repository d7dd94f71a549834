use std::time::Duration;

/// Default feed address (the node's dashboard port).
const DEFAULT_ADDR: &str = "127.0.0.1:8081";

/// Configuration for the dashboard feed connection.
///
/// All fields have sensible defaults. Use the builder pattern:
///
/// ```rust
/// use std::time::Duration;
/// use dash_transport::FeedConfig;
///
/// let config = FeedConfig::new()
///     .addr("192.168.0.21:8081")
///     .reconnect_delay(Duration::from_secs(2))
///     .max_frame_size(512 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// `host:port` of the node's feed endpoint.
    pub addr: String,
    /// Fixed delay before the single reconnect attempt after a loss.
    pub reconnect_delay: Duration,
    /// Upper bound on a single dial.
    pub connect_timeout: Duration,
    /// Maximum accepted inbound frame size in bytes.
    pub max_frame_size: usize,
    /// Channel buffer size for inbound frames and runtime commands.
    pub recv_buffer: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedConfig {
    /// Create a new config with defaults.
    ///
    /// If the `DASH_FEED_ADDR` environment variable is set, it is used as
    /// the feed address. This can be overridden with [`.addr()`](Self::addr).
    pub fn new() -> Self {
        let addr = std::env::var("DASH_FEED_ADDR")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());

        Self {
            addr,
            reconnect_delay: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(10),
            max_frame_size: 1024 * 1024, // 1 MB
            recv_buffer: 256,
        }
    }

    /// Set the feed address (`host:port`).
    pub fn addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = addr.into();
        self
    }

    /// Set the reconnect backoff (default: 5 s).
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set the dial timeout (default: 10 s).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the maximum inbound frame size (default: 1 MB).
    pub fn max_frame_size(mut self, bytes: usize) -> Self {
        self.max_frame_size = bytes;
        self
    }

    /// Set the channel buffer size (default: 256).
    pub fn recv_buffer(mut self, capacity: usize) -> Self {
        self.recv_buffer = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FeedConfig::new();
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
        assert_eq!(config.max_frame_size, 1024 * 1024);
        assert!(!config.addr.is_empty());
    }

    #[test]
    fn builder_overrides() {
        let config = FeedConfig::new()
            .addr("10.1.1.1:9000")
            .reconnect_delay(Duration::from_millis(250))
            .connect_timeout(Duration::from_secs(1))
            .max_frame_size(64)
            .recv_buffer(0);
        assert_eq!(config.addr, "10.1.1.1:9000");
        assert_eq!(config.reconnect_delay, Duration::from_millis(250));
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
        assert_eq!(config.max_frame_size, 64);
        assert_eq!(config.recv_buffer, 1);
    }
}
