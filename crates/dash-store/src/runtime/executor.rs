//! Effect executor: the only place that touches the transport.
//!
//! Takes the `TransportEffect`s returned by the subscription manager and
//! executes them concretely:
//! - Dial -> connector.connect(), then feed the outcome back to the manager
//! - Send -> channel.send()
//! - Close -> channel.close()
//! - ScheduleReconnect / CancelReconnect -> arm / disarm the single timer
//! - ConnectivityChanged -> store flag + `StoreChange::Connectivity`

use std::collections::VecDeque;
use std::pin::Pin;

use tokio::time::Sleep;

use dash_transport::{
    Channel, Connector, DashTransportError, SubscriptionManager, TransportEffect,
};

use crate::store::StoreHandle;

/// Something happened on the transport side.
#[derive(Debug)]
pub(super) enum LinkEvent {
    Frame(Vec<u8>),
    /// Remote close (`None`) or read failure.
    Closed(Option<DashTransportError>),
    /// The reconnect timer fired.
    ReconnectDue,
}

/// Connection state owned by the runtime loop.
pub(super) struct FeedLink<C: Connector> {
    connector: C,
    pub(super) manager: SubscriptionManager,
    channel: Option<C::Channel>,
    /// At most one armed reconnect timer.
    reconnect: Option<Pin<Box<Sleep>>>,
}

impl<C: Connector> FeedLink<C> {
    pub(super) fn new(connector: C, manager: SubscriptionManager) -> Self {
        Self {
            connector,
            manager,
            channel: None,
            reconnect: None,
        }
    }

    /// Wait for the next transport-side event.
    ///
    /// Cancel-safe: the channel's `recv` is cancel-safe and the timer
    /// survives being polled from a dropped future.
    pub(super) async fn next_event(&mut self) -> LinkEvent {
        let Self {
            channel, reconnect, ..
        } = self;
        tokio::select! {
            result = recv_frame(channel) => match result {
                Ok(Some(frame)) => LinkEvent::Frame(frame),
                Ok(None) => LinkEvent::Closed(None),
                Err(e) => LinkEvent::Closed(Some(e)),
            },
            _ = timer_elapsed(reconnect) => LinkEvent::ReconnectDue,
        }
    }

    /// The timer fired: disarm it and ask the manager what to do.
    pub(super) async fn on_reconnect_elapsed(&mut self, store: &StoreHandle) {
        self.reconnect = None;
        let effects = self.manager.reconnect_due();
        self.execute(effects, store).await;
    }

    /// The channel closed or failed: drop it and report to the manager.
    pub(super) async fn on_channel_closed(&mut self, store: &StoreHandle) {
        if let Some(mut channel) = self.channel.take() {
            channel.close().await;
        }
        let effects = self.manager.on_closed();
        self.execute(effects, store).await;
    }

    /// Execute effects in order, including those produced while executing
    /// (a successful dial yields the main bundle registration).
    pub(super) async fn execute(&mut self, effects: Vec<TransportEffect>, store: &StoreHandle) {
        let mut queue = VecDeque::from(effects);
        while let Some(effect) = queue.pop_front() {
            match effect {
                TransportEffect::Dial => match self.connector.connect().await {
                    Ok(channel) => {
                        self.channel = Some(channel);
                        queue.extend(self.manager.on_connected());
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "feed dial failed");
                        queue.extend(self.manager.on_connect_failed());
                    }
                },
                TransportEffect::Send(frame) => match self.channel.as_mut() {
                    Some(channel) => {
                        if let Err(e) = channel.send(&frame.to_bytes()).await {
                            // The reader side reports the loss.
                            tracing::warn!(error = %e, topic = %frame.topic, "control frame send failed");
                        }
                    }
                    None => tracing::debug!(topic = %frame.topic, "no channel, control frame skipped"),
                },
                TransportEffect::Close => {
                    if let Some(mut channel) = self.channel.take() {
                        channel.close().await;
                    }
                }
                TransportEffect::ScheduleReconnect(delay) => {
                    tracing::debug!(?delay, "reconnect scheduled");
                    self.reconnect = Some(Box::pin(tokio::time::sleep(delay)));
                }
                TransportEffect::CancelReconnect => {
                    self.reconnect = None;
                }
                TransportEffect::ConnectivityChanged(up) => {
                    tracing::debug!(connected = up, "feed connectivity changed");
                    store.set_connected(up);
                }
            }
        }
    }
}

/// Pends forever while no channel is open.
async fn recv_frame<Ch: Channel>(
    channel: &mut Option<Ch>,
) -> Result<Option<Vec<u8>>, DashTransportError> {
    match channel.as_mut() {
        Some(channel) => channel.recv().await,
        None => std::future::pending().await,
    }
}

/// Pends forever while no timer is armed.
async fn timer_elapsed(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer.as_mut() {
        Some(timer) => timer.as_mut().await,
        None => std::future::pending().await,
    }
}
