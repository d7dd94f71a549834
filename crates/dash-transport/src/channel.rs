use crate::DashTransportError;

/// One established feed connection.
///
/// In production: [`TcpChannel`](crate::TcpChannel).
/// In tests: `mock::MockChannel` (feature `test-utils`).
#[async_trait::async_trait]
pub trait Channel: Send {
    /// Send one raw frame (control frames are two bytes).
    async fn send(&mut self, data: &[u8]) -> Result<(), DashTransportError>;

    /// Receive the next inbound frame. `Ok(None)` once the remote closed.
    ///
    /// Must be cancel-safe: the runtime polls it inside `tokio::select!`.
    async fn recv(&mut self) -> Result<Option<Vec<u8>>, DashTransportError>;

    /// Close the connection. Idempotent.
    async fn close(&mut self);
}

/// Dials the feed. Called once per connect attempt.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    type Channel: Channel + 'static;

    async fn connect(&self) -> Result<Self::Channel, DashTransportError>;
}
