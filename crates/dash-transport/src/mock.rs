// ── MockConnector (tests) ───────────────────────────────────────────

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::mpsc;

use crate::channel::{Channel, Connector};
use crate::{ControlFrame, DashTransportError, InboundFrame, Topic};

#[derive(Default)]
struct MockState {
    dials: usize,
    fail_dials: bool,
    sent: Vec<Vec<u8>>,
    /// Sender feeding the most recent channel. `None` item = remote close.
    inbound: Option<mpsc::UnboundedSender<Option<Vec<u8>>>>,
}

/// Fake feed endpoint: counts dials, records sent frames and lets the test
/// push inbound frames or close the connection from the remote side.
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of connect attempts so far, failed ones included.
    pub fn dial_count(&self) -> usize {
        self.state.lock().unwrap().dials
    }

    pub fn set_fail_dials(&self, fail: bool) {
        self.state.lock().unwrap().fail_dials = fail;
    }

    /// Raw frames written by the client, across all connections.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Sent frames decoded as control frames (anything else is skipped).
    pub fn sent_controls(&self) -> Vec<ControlFrame> {
        self.sent()
            .iter()
            .filter_map(|raw| ControlFrame::from_bytes(raw).ok())
            .collect()
    }

    pub fn clear_sent(&self) {
        self.state.lock().unwrap().sent.clear();
    }

    /// Deliver a raw frame on the live channel. Returns false if none is open.
    pub fn push_frame(&self, frame: Vec<u8>) -> bool {
        match &self.state.lock().unwrap().inbound {
            Some(tx) => tx.send(Some(frame)).is_ok(),
            None => false,
        }
    }

    /// Deliver a `{type, data}` envelope for `topic`.
    pub fn push_json(&self, topic: Topic, data: Value) -> bool {
        match InboundFrame::new(topic, data).to_bytes() {
            Ok(bytes) => self.push_frame(bytes),
            Err(_) => false,
        }
    }

    /// Close the live channel from the remote side.
    pub fn close_remote(&self) {
        if let Some(tx) = self.state.lock().unwrap().inbound.take() {
            let _ = tx.send(None);
        }
    }
}

#[async_trait::async_trait]
impl Connector for MockConnector {
    type Channel = MockChannel;

    async fn connect(&self) -> Result<MockChannel, DashTransportError> {
        let mut state = self.state.lock().unwrap();
        state.dials += 1;
        if state.fail_dials {
            return Err(DashTransportError::Connect {
                addr: "mock".to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "mock: dial refused",
                ),
            });
        }
        let (tx, rx) = mpsc::unbounded_channel();
        state.inbound = Some(tx);
        Ok(MockChannel {
            state: Arc::clone(&self.state),
            inbound: rx,
            closed: false,
        })
    }
}

/// Channel handed out by [`MockConnector`].
pub struct MockChannel {
    state: Arc<Mutex<MockState>>,
    inbound: mpsc::UnboundedReceiver<Option<Vec<u8>>>,
    closed: bool,
}

#[async_trait::async_trait]
impl Channel for MockChannel {
    async fn send(&mut self, data: &[u8]) -> Result<(), DashTransportError> {
        if self.closed {
            return Err(DashTransportError::Closed);
        }
        self.state.lock().unwrap().sent.push(data.to_vec());
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<Vec<u8>>, DashTransportError> {
        if self.closed {
            return Ok(None);
        }
        match self.inbound.recv().await {
            Some(Some(frame)) => Ok(Some(frame)),
            Some(None) | None => Ok(None),
        }
    }

    async fn close(&mut self) {
        self.closed = true;
        self.inbound.close();
    }
}
