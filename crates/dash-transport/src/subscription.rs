/// SubscriptionManager: feed connection lifecycle and topic registration.
///
/// Pure state machine, no I/O. Every operation returns the list of
/// [`TransportEffect`]s the caller must execute (dial, send control frames,
/// arm or disarm the reconnect timer). The caller reports transport outcomes
/// back through `on_connected` / `on_connect_failed` / `on_closed`.
///
/// State machine:
/// `Disconnected → Connecting → Connected`, `Connected → Disconnected` on
/// close/error. `Disconnected → Connecting` only through `connect()` or the
/// reconnect timer. At most one reconnect timer is ever armed.
use std::collections::BTreeSet;
use std::time::Duration;

use crate::{ControlFrame, Topic, TopicBundle};

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Intention produced by the manager, executed by the runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEffect {
    /// Open the physical channel, then report `on_connected` or
    /// `on_connect_failed`.
    Dial,
    /// Write a control frame on the active channel.
    Send(ControlFrame),
    /// Close the active channel.
    Close,
    /// Arm the single reconnect timer; call `reconnect_due` when it fires.
    ScheduleReconnect(Duration),
    /// Disarm the reconnect timer.
    CancelReconnect,
    /// The connectivity flag flipped.
    ConnectivityChanged(bool),
}

/// Owns connection state and the set of registered topics.
#[derive(Debug)]
pub struct SubscriptionManager {
    state: ConnectionState,
    reconnect_delay: Duration,
    reconnect_pending: bool,
    registered: BTreeSet<Topic>,
}

impl SubscriptionManager {
    pub fn new(reconnect_delay: Duration) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            reconnect_delay,
            reconnect_pending: false,
            registered: BTreeSet::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Whether a reconnect timer is currently armed.
    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    /// Topics registered on the current connection.
    pub fn registered_topics(&self) -> impl Iterator<Item = Topic> + '_ {
        self.registered.iter().copied()
    }

    pub fn is_registered(&self, topic: Topic) -> bool {
        self.registered.contains(&topic)
    }

    // ── Lifecycle ──────────────────────────────────────────────────────

    /// Start a connection attempt. No-op unless Disconnected.
    ///
    /// An explicit connect supersedes an armed reconnect timer.
    pub fn connect(&mut self) -> Vec<TransportEffect> {
        if self.state != ConnectionState::Disconnected {
            return vec![];
        }
        let mut effects = self.cancel_reconnect();
        self.state = ConnectionState::Connecting;
        effects.push(TransportEffect::Dial);
        effects
    }

    /// The reconnect timer fired.
    pub fn reconnect_due(&mut self) -> Vec<TransportEffect> {
        if !self.reconnect_pending {
            return vec![];
        }
        self.reconnect_pending = false;
        if self.state != ConnectionState::Disconnected {
            return vec![];
        }
        tracing::debug!("reconnecting to feed");
        self.state = ConnectionState::Connecting;
        vec![TransportEffect::Dial]
    }

    /// The dial succeeded. Registers the main bundle.
    ///
    /// If the attempt was abandoned meanwhile (explicit disconnect), the new
    /// channel is closed again.
    pub fn on_connected(&mut self) -> Vec<TransportEffect> {
        if self.state != ConnectionState::Connecting {
            return vec![TransportEffect::Close];
        }
        let mut effects = self.cancel_reconnect();
        self.state = ConnectionState::Connected;
        effects.push(TransportEffect::ConnectivityChanged(true));
        effects.extend(self.register_bundle(TopicBundle::Main));
        effects
    }

    /// The dial failed. Arms the reconnect timer.
    pub fn on_connect_failed(&mut self) -> Vec<TransportEffect> {
        if self.state != ConnectionState::Connecting {
            return vec![];
        }
        self.state = ConnectionState::Disconnected;
        self.schedule_reconnect()
    }

    /// The active channel closed or errored. Arms the reconnect timer.
    ///
    /// Ignored unless Connected, so an error followed by a close yields a
    /// single timer.
    pub fn on_closed(&mut self) -> Vec<TransportEffect> {
        if self.state != ConnectionState::Connected {
            return vec![];
        }
        self.state = ConnectionState::Disconnected;
        self.registered.clear();
        let mut effects = vec![TransportEffect::ConnectivityChanged(false)];
        effects.extend(self.schedule_reconnect());
        effects
    }

    /// Explicit teardown: unregister the main bundle and close. Does not
    /// schedule a reconnect.
    pub fn disconnect(&mut self) -> Vec<TransportEffect> {
        let mut effects = self.cancel_reconnect();
        match self.state {
            ConnectionState::Connected => {
                effects.extend(self.unregister_bundle(TopicBundle::Main));
                effects.push(TransportEffect::Close);
                effects.push(TransportEffect::ConnectivityChanged(false));
            }
            ConnectionState::Connecting => effects.push(TransportEffect::Close),
            ConnectionState::Disconnected => {}
        }
        self.state = ConnectionState::Disconnected;
        self.registered.clear();
        effects
    }

    // ── Topics ─────────────────────────────────────────────────────────

    /// Register a topic. Silently ignored when not Connected; the caller
    /// must register again after the next successful connect.
    pub fn register_topic(&mut self, topic: Topic) -> Vec<TransportEffect> {
        if !self.is_connected() {
            tracing::debug!(%topic, "not connected, register ignored");
            return vec![];
        }
        self.registered.insert(topic);
        vec![TransportEffect::Send(ControlFrame::register(topic))]
    }

    /// Unregister a topic. Silently ignored when not Connected.
    pub fn unregister_topic(&mut self, topic: Topic) -> Vec<TransportEffect> {
        if !self.is_connected() {
            tracing::debug!(%topic, "not connected, unregister ignored");
            return vec![];
        }
        self.registered.remove(&topic);
        vec![TransportEffect::Send(ControlFrame::unregister(topic))]
    }

    pub fn register_bundle(&mut self, bundle: TopicBundle) -> Vec<TransportEffect> {
        bundle
            .topics()
            .iter()
            .flat_map(|&topic| self.register_topic(topic))
            .collect()
    }

    pub fn unregister_bundle(&mut self, bundle: TopicBundle) -> Vec<TransportEffect> {
        bundle
            .topics()
            .iter()
            .flat_map(|&topic| self.unregister_topic(topic))
            .collect()
    }

    // ── Internal ───────────────────────────────────────────────────────

    fn schedule_reconnect(&mut self) -> Vec<TransportEffect> {
        if self.reconnect_pending {
            return vec![];
        }
        self.reconnect_pending = true;
        vec![TransportEffect::ScheduleReconnect(self.reconnect_delay)]
    }

    fn cancel_reconnect(&mut self) -> Vec<TransportEffect> {
        if !self.reconnect_pending {
            return vec![];
        }
        self.reconnect_pending = false;
        vec![TransportEffect::CancelReconnect]
    }
}
